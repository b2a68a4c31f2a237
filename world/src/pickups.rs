//! One-shot crystal pickups stored inside the static map.

use crystal_slide_core::{CrystalType, GridCoord};
use log::debug;

use crate::grid::{SpatialGrid, StaticKind};

/// Arena index of a pickup registered for the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickupId(u32);

impl PickupId {
    pub(crate) const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Crystal placed on the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pickup {
    crystal: CrystalType,
    value: u32,
    collected: bool,
}

impl Pickup {
    /// Type of the crystal.
    #[must_use]
    pub const fn crystal(&self) -> CrystalType {
        self.crystal
    }

    /// Value granted on collection.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Whether the pickup has been collected. Never reverts once set.
    #[must_use]
    pub const fn is_collected(&self) -> bool {
        self.collected
    }
}

/// Outcome of a successful collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Collected {
    pub(crate) crystal: CrystalType,
    pub(crate) value: u32,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PickupRegistry {
    pickups: Vec<Pickup>,
}

/// Pickup ids are dense `u32` indices; a level may hold at most this many.
pub(crate) const MAX_PICKUPS: usize = u32::MAX as usize;

impl PickupRegistry {
    /// Registers a crystal under the next dense id.
    ///
    /// Level validation caps crystals at [`MAX_PICKUPS`], so ids never alias.
    pub(crate) fn register(&mut self, crystal: CrystalType, value: u32) -> PickupId {
        debug_assert!(
            self.pickups.len() < MAX_PICKUPS,
            "pickup ids exhausted after {} crystals",
            self.pickups.len()
        );
        let id = PickupId::new(u32::try_from(self.pickups.len()).unwrap_or(u32::MAX));
        self.pickups.push(Pickup {
            crystal,
            value,
            collected: false,
        });
        id
    }

    pub(crate) fn get(&self, id: PickupId) -> Option<&Pickup> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.pickups.get(index))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.pickups.clear();
    }

    /// Collects the pickup lying on `cell`, if any.
    ///
    /// Marks the pickup collected and removes it from the static map in the
    /// same step. Cells without a pickup, and pickups that were already
    /// collected, yield `None`.
    pub(crate) fn resolve(&mut self, grid: &mut SpatialGrid, cell: GridCoord) -> Option<Collected> {
        let occupant = grid.static_occupant_at(cell)?;
        let StaticKind::Pickup(id) = occupant.kind() else {
            return None;
        };
        let index = usize::try_from(id.get()).ok()?;
        let pickup = self.pickups.get_mut(index)?;
        if pickup.collected {
            debug!("pickup {} at {cell} already collected", id.get());
            return None;
        }

        pickup.collected = true;
        let _ = grid.remove_static_occupant(cell);
        Some(Collected {
            crystal: pickup.crystal,
            value: pickup.value,
        })
    }
}
