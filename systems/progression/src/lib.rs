#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Progression system that turns world events into player-facing milestones.
//!
//! Crystal collections feed per-type counters that unlock abilities once a
//! threshold is reached, portal arrivals advance the level index, and the
//! host may spend or grant lives directly. Every change is reported as a
//! [`Notification`].

use std::collections::BTreeSet;

use crystal_slide_core::{AbilitySnapshot, CrystalType, Event, Notification, ProgressSnapshot};
use log::{debug, info, warn};

const DEFAULT_STARTING_LIVES: u32 = 5;
const DEFAULT_STARTING_LEVEL: u32 = 1;
const DEFAULT_UNLOCK_THRESHOLD: u32 = 3;

/// Configuration parameters required to construct the progression system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    starting_lives: u32,
    starting_level: u32,
    thresholds: [u32; CrystalType::ALL.len()],
}

impl Config {
    /// Creates a configuration applying `unlock_threshold` to every crystal type.
    ///
    /// Thresholds are clamped to at least one collection.
    #[must_use]
    pub const fn new(starting_lives: u32, starting_level: u32, unlock_threshold: u32) -> Self {
        let threshold = if unlock_threshold == 0 {
            1
        } else {
            unlock_threshold
        };
        Self {
            starting_lives,
            starting_level,
            thresholds: [threshold; CrystalType::ALL.len()],
        }
    }

    /// Overrides the unlock threshold of a single crystal type.
    #[must_use]
    pub fn with_threshold(mut self, crystal: CrystalType, threshold: u32) -> Self {
        self.thresholds[crystal.index()] = if threshold == 0 { 1 } else { threshold };
        self
    }

    /// Threshold configured for the crystal type.
    #[must_use]
    pub const fn threshold(&self, crystal: CrystalType) -> u32 {
        self.thresholds[crystal.index()]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_STARTING_LIVES,
            DEFAULT_STARTING_LEVEL,
            DEFAULT_UNLOCK_THRESHOLD,
        )
    }
}

/// Collection progress of the ability backed by one crystal type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AbilityState {
    count: u32,
    unlocked: bool,
    threshold: u32,
}

impl AbilityState {
    const fn locked(threshold: u32) -> Self {
        Self {
            count: 0,
            unlocked: false,
            threshold,
        }
    }

    /// Number of crystals of this type collected so far.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Whether the ability has been unlocked.
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Collections required to unlock the ability.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// Pure system that tracks crystals, abilities, lives and the level index.
#[derive(Debug)]
pub struct Progression {
    lives: u32,
    level: u32,
    crystals: u64,
    abilities: [AbilityState; CrystalType::ALL.len()],
    unlocked_levels: BTreeSet<u32>,
}

impl Progression {
    /// Creates a new progression tracker using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let abilities =
            CrystalType::ALL.map(|crystal| AbilityState::locked(config.threshold(crystal)));
        Self {
            lives: config.starting_lives,
            level: config.starting_level,
            crystals: 0,
            abilities,
            unlocked_levels: BTreeSet::from([config.starting_level]),
        }
    }

    /// Consumes world events and appends the resulting notifications in order.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Notification>) {
        for event in events {
            match *event {
                Event::CrystalCollected { crystal, value, .. } => {
                    self.on_crystal_collected(crystal, value, out);
                }
                Event::PortalReached { .. } => self.on_portal_reached(out),
                _ => {}
            }
        }
    }

    /// Records a collected crystal and unlocks its ability on reaching the threshold.
    pub fn on_crystal_collected(
        &mut self,
        crystal: CrystalType,
        value: u32,
        out: &mut Vec<Notification>,
    ) {
        self.crystals = self.crystals.saturating_add(u64::from(value));
        let ability = &mut self.abilities[crystal.index()];
        ability.count = ability.count.saturating_add(1);
        debug!(
            "{crystal:?} crystal collected ({}/{}), total {}",
            ability.count, ability.threshold, self.crystals
        );
        out.push(Notification::CrystalCollected {
            crystal,
            total: self.crystals,
        });

        if !ability.unlocked && ability.count >= ability.threshold {
            ability.unlocked = true;
            info!("{} unlocked", crystal.ability_name());
            out.push(Notification::AbilityUnlocked { crystal });
        }
    }

    /// Completes the current level and advances to the next one.
    pub fn on_portal_reached(&mut self, out: &mut Vec<Notification>) {
        let completed = self.level;
        self.level = completed.saturating_add(1);
        let _ = self.unlocked_levels.insert(self.level);
        info!("level {completed} completed, level {} unlocked", self.level);
        out.push(Notification::LevelCompleted { level: completed });
    }

    /// Removes one life, reporting game over when none remain.
    pub fn spend_life(&mut self, out: &mut Vec<Notification>) {
        if self.lives == 0 {
            warn!("life spent with none remaining; ignored");
            return;
        }
        self.lives -= 1;
        out.push(Notification::LifeLost {
            remaining: self.lives,
        });
        if self.lives == 0 {
            info!("no lives remaining");
            out.push(Notification::GameOver);
        }
    }

    /// Grants one life.
    pub fn add_life(&mut self, out: &mut Vec<Notification>) {
        self.lives = self.lives.saturating_add(1);
        out.push(Notification::LifeGained { lives: self.lives });
    }

    /// Captures the counters for an external save system.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            level: self.level,
            lives: self.lives,
            crystals: self.crystals,
            abilities: CrystalType::ALL
                .iter()
                .map(|&crystal| {
                    let state = self.abilities[crystal.index()];
                    AbilitySnapshot {
                        crystal,
                        count: state.count,
                        unlocked: state.unlocked,
                    }
                })
                .collect(),
            unlocked_levels: self.unlocked_levels.clone(),
        }
    }

    /// Replaces every counter with the saved values.
    ///
    /// Thresholds stay as configured. Crystal types missing from the snapshot
    /// are reset to zero and the current level is always kept selectable.
    pub fn restore(&mut self, snapshot: &ProgressSnapshot) {
        self.level = snapshot.level;
        self.lives = snapshot.lives;
        self.crystals = snapshot.crystals;
        for ability in &mut self.abilities {
            *ability = AbilityState::locked(ability.threshold);
        }
        for saved in &snapshot.abilities {
            let ability = &mut self.abilities[saved.crystal.index()];
            ability.count = saved.count;
            ability.unlocked = saved.unlocked;
        }
        self.unlocked_levels = snapshot.unlocked_levels.clone();
        let _ = self.unlocked_levels.insert(self.level);
        info!(
            "progress restored: level {}, {} lives, {} crystals",
            self.level, self.lives, self.crystals
        );
    }

    /// Lives remaining.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Reports whether every life has been spent.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    /// Index of the level currently being played.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Total crystal value collected.
    #[must_use]
    pub const fn crystals(&self) -> u64 {
        self.crystals
    }

    /// Progress of the ability backed by the crystal type.
    #[must_use]
    pub const fn ability(&self, crystal: CrystalType) -> AbilityState {
        self.abilities[crystal.index()]
    }

    /// Level indices the player may select.
    #[must_use]
    pub fn unlocked_levels(&self) -> &BTreeSet<u32> {
        &self.unlocked_levels
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
