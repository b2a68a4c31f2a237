//! Dual coordinate maps backing the level grid.
//!
//! The static map holds immobile level features (walls, doors, uncollected
//! pickups) while the mobile map tracks where each agent currently stands.
//! Both maps are keyed by [`GridCoord`] and are only mutated by the world.

use std::collections::HashMap;

use crystal_slide_core::{AgentId, GridCoord, TileKind};
use glam::Vec2;
use log::debug;

use crate::pickups::PickupId;

/// Kind of immobile feature stored in the static map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StaticKind {
    /// Solid wall.
    Wall,
    /// Solid block.
    Block,
    /// Closed door.
    Door,
    /// Sensor plate.
    Sensor,
    /// Trap.
    Trap,
    /// Decorative or inactive portal.
    Portal,
    /// Uncollected pickup tracked by the pickup registry.
    Pickup(PickupId),
}

/// Immobile occupant of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticCell {
    kind: StaticKind,
    obstructs: bool,
}

impl StaticCell {
    /// Builds the static cell for a level tile. Crystal tiles must already be
    /// registered so their pickup identifier is known.
    pub(crate) fn from_tile(kind: TileKind, pickup: Option<PickupId>) -> Option<Self> {
        let kind = match (kind, pickup) {
            (TileKind::Wall, _) => StaticKind::Wall,
            (TileKind::Block, _) => StaticKind::Block,
            (TileKind::Door, _) => StaticKind::Door,
            (TileKind::Sensor, _) => StaticKind::Sensor,
            (TileKind::Trap, _) => StaticKind::Trap,
            (TileKind::Portal, _) => StaticKind::Portal,
            (TileKind::Crystal { .. }, Some(id)) => StaticKind::Pickup(id),
            (TileKind::Crystal { .. }, None) => return None,
        };
        Some(Self {
            kind,
            obstructs: !matches!(kind, StaticKind::Pickup(_)),
        })
    }

    /// Kind of feature occupying the cell.
    #[must_use]
    pub const fn kind(&self) -> StaticKind {
        self.kind
    }

    /// Whether the feature stops a slide.
    #[must_use]
    pub const fn obstructs(&self) -> bool {
        self.obstructs
    }
}

/// Coordinate-keyed registry of static and mobile occupants.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    statics: HashMap<GridCoord, StaticCell>,
    mobiles: HashMap<GridCoord, AgentId>,
}

impl SpatialGrid {
    pub(crate) fn new(columns: u32, rows: u32, cell_size: f32) -> Self {
        Self {
            columns,
            rows,
            cell_size,
            statics: HashMap::new(),
            mobiles: HashMap::new(),
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Reports whether the coordinate lies inside the grid bounds.
    #[must_use]
    pub fn contains(&self, cell: GridCoord) -> bool {
        cell.within(self.columns, self.rows)
    }

    /// Converts a grid coordinate into the world-space centre of that cell.
    ///
    /// The grid is centred on the world origin.
    #[must_use]
    pub fn grid_to_world(&self, cell: GridCoord) -> Vec2 {
        Vec2::new(cell.x() as f32, cell.y() as f32) * self.cell_size + self.origin_offset()
    }

    /// Converts a world-space position into the nearest grid coordinate.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec2) -> GridCoord {
        let local = (position - self.origin_offset()) / self.cell_size;
        GridCoord::new(local.x.round() as i32, local.y.round() as i32)
    }

    fn origin_offset(&self) -> Vec2 {
        let extent = Vec2::new(self.columns as f32, self.rows as f32) * self.cell_size;
        -extent / 2.0 + Vec2::splat(self.cell_size / 2.0)
    }

    /// Reports whether an agent may not enter the cell.
    ///
    /// Cells outside the grid, cells holding an obstructing static feature and
    /// cells holding another agent are blocked. Pickup cells are not.
    #[must_use]
    pub fn is_blocked(&self, cell: GridCoord) -> bool {
        if !self.contains(cell) {
            return true;
        }
        if self
            .statics
            .get(&cell)
            .map_or(false, |occupant| occupant.obstructs())
        {
            return true;
        }
        self.mobiles.contains_key(&cell)
    }

    /// Returns the static feature occupying the cell, if any.
    #[must_use]
    pub fn static_occupant_at(&self, cell: GridCoord) -> Option<StaticCell> {
        self.statics.get(&cell).copied()
    }

    /// Returns the agent occupying the cell, if any.
    #[must_use]
    pub fn occupant_at(&self, cell: GridCoord) -> Option<AgentId> {
        self.mobiles.get(&cell).copied()
    }

    /// Iterates over every tracked agent position in arbitrary order.
    pub fn occupants(&self) -> impl Iterator<Item = (GridCoord, AgentId)> + '_ {
        self.mobiles.iter().map(|(cell, agent)| (*cell, *agent))
    }

    /// Number of features held in the static map.
    #[must_use]
    pub fn static_len(&self) -> usize {
        self.statics.len()
    }

    pub(crate) fn resize(&mut self, columns: u32, rows: u32, cell_size: f32) {
        self.columns = columns;
        self.rows = rows;
        self.cell_size = cell_size;
    }

    pub(crate) fn insert_static(&mut self, cell: GridCoord, occupant: StaticCell) {
        if let Some(previous) = self.statics.insert(cell, occupant) {
            debug!("static occupant {:?} at {cell} was replaced", previous.kind());
        }
    }

    pub(crate) fn remove_static_occupant(&mut self, cell: GridCoord) -> Option<StaticCell> {
        self.statics.remove(&cell)
    }

    pub(crate) fn place_occupant(&mut self, agent: AgentId, cell: GridCoord) {
        if let Some(previous) = self.mobiles.insert(cell, agent) {
            if previous != agent {
                debug!(
                    "agent {} displaced agent {} at {cell}",
                    agent.get(),
                    previous.get()
                );
            }
        }
    }

    /// Moves the agent's mobile entry from `from` to `to`.
    ///
    /// The entry at `from` is only removed while it still maps to `agent`; a
    /// stale or missing entry is tolerated and left untouched.
    pub(crate) fn move_occupant(&mut self, agent: AgentId, from: GridCoord, to: GridCoord) {
        let _ = self.remove_occupant(agent, from);
        self.place_occupant(agent, to);
    }

    pub(crate) fn remove_occupant(&mut self, agent: AgentId, cell: GridCoord) -> bool {
        match self.mobiles.get(&cell) {
            Some(occupant) if *occupant == agent => {
                let _ = self.mobiles.remove(&cell);
                true
            }
            Some(occupant) => {
                debug!(
                    "stale mobile entry at {cell}: expected agent {}, found agent {}",
                    agent.get(),
                    occupant.get()
                );
                false
            }
            None => {
                debug!("agent {} was not tracked at {cell}", agent.get());
                false
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.statics.clear();
        self.mobiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_grid() -> SpatialGrid {
        let mut grid = SpatialGrid::new(9, 16, 1.0);
        let wall = StaticCell::from_tile(TileKind::Wall, None).expect("wall cell");
        grid.insert_static(GridCoord::new(4, 5), wall);
        grid
    }

    #[test]
    fn world_transform_is_centred_and_invertible() {
        let grid = SpatialGrid::new(9, 16, 0.5);
        let origin = grid.grid_to_world(GridCoord::new(0, 0));
        assert!((origin.x - -2.0).abs() < f32::EPSILON);
        assert!((origin.y - -3.75).abs() < f32::EPSILON);

        for x in 0..9 {
            for y in 0..16 {
                let cell = GridCoord::new(x, y);
                assert_eq!(grid.world_to_grid(grid.grid_to_world(cell)), cell);
            }
        }
    }

    #[test]
    fn world_to_grid_rounds_to_nearest_cell() {
        let grid = SpatialGrid::new(4, 4, 2.0);
        let centre = grid.grid_to_world(GridCoord::new(1, 2));
        let nudged = centre + Vec2::new(0.9, -0.9);
        assert_eq!(grid.world_to_grid(nudged), GridCoord::new(1, 2));
        let past_half = centre + Vec2::new(1.1, 0.0);
        assert_eq!(grid.world_to_grid(past_half), GridCoord::new(2, 2));
    }

    #[test]
    fn out_of_bounds_cells_are_blocked() {
        let grid = walled_grid();
        assert!(grid.is_blocked(GridCoord::new(-1, 0)));
        assert!(grid.is_blocked(GridCoord::new(9, 0)));
        assert!(grid.is_blocked(GridCoord::new(0, 16)));
        assert!(!grid.is_blocked(GridCoord::new(8, 15)));
    }

    #[test]
    fn obstructing_statics_and_agents_block_but_pickups_do_not() {
        let mut grid = walled_grid();
        let pickup = StaticCell::from_tile(
            TileKind::Crystal {
                crystal: crystal_slide_core::CrystalType::Red,
                value: 1,
            },
            Some(PickupId::new(0)),
        )
        .expect("pickup cell");
        grid.insert_static(GridCoord::new(2, 2), pickup);
        grid.place_occupant(AgentId::new(7), GridCoord::new(3, 3));

        assert!(grid.is_blocked(GridCoord::new(4, 5)));
        assert!(!grid.is_blocked(GridCoord::new(2, 2)));
        assert!(grid.is_blocked(GridCoord::new(3, 3)));
    }

    #[test]
    fn crystal_tiles_require_a_registered_pickup() {
        let kind = TileKind::Crystal {
            crystal: crystal_slide_core::CrystalType::Blue,
            value: 1,
        };
        assert!(StaticCell::from_tile(kind, None).is_none());
    }

    #[test]
    fn move_occupant_updates_both_keys() {
        let mut grid = walled_grid();
        let agent = AgentId::new(1);
        grid.place_occupant(agent, GridCoord::new(0, 0));
        grid.move_occupant(agent, GridCoord::new(0, 0), GridCoord::new(0, 1));

        assert_eq!(grid.occupant_at(GridCoord::new(0, 0)), None);
        assert_eq!(grid.occupant_at(GridCoord::new(0, 1)), Some(agent));
        assert_eq!(grid.occupants().count(), 1);
    }

    #[test]
    fn move_occupant_leaves_stale_entries_of_other_agents() {
        let mut grid = walled_grid();
        let mover = AgentId::new(1);
        let bystander = AgentId::new(2);
        grid.place_occupant(bystander, GridCoord::new(0, 0));

        grid.move_occupant(mover, GridCoord::new(0, 0), GridCoord::new(1, 0));

        assert_eq!(grid.occupant_at(GridCoord::new(0, 0)), Some(bystander));
        assert_eq!(grid.occupant_at(GridCoord::new(1, 0)), Some(mover));
    }

    #[test]
    fn move_occupant_tolerates_untracked_agents() {
        let mut grid = walled_grid();
        let agent = AgentId::new(3);
        grid.move_occupant(agent, GridCoord::new(6, 6), GridCoord::new(6, 7));
        assert_eq!(grid.occupant_at(GridCoord::new(6, 7)), Some(agent));
    }

    #[test]
    fn clear_empties_both_maps() {
        let mut grid = walled_grid();
        grid.place_occupant(AgentId::new(1), GridCoord::new(0, 0));
        grid.clear();
        assert_eq!(grid.static_len(), 0);
        assert_eq!(grid.occupants().count(), 0);
        assert!(!grid.is_blocked(GridCoord::new(4, 5)));
    }
}
