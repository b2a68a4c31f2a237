//! Tunables shared by the systems a session wires together.

use std::{collections::BTreeMap, time::Duration};

use crystal_slide_core::CrystalType;
use crystal_slide_system_movement as movement;
use crystal_slide_system_progression as progression;
use serde::{Deserialize, Serialize};

const DEFAULT_CELLS_PER_SECOND: u32 = 12;
const DEFAULT_STARTING_LIVES: u32 = 5;
const DEFAULT_STARTING_LEVEL: u32 = 1;
const DEFAULT_UNLOCK_THRESHOLD: u32 = 3;

/// Session configuration, usually deserialized from a host-provided file.
///
/// Every field is optional in serialized form and falls back to its default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Cells a sliding agent travels per second of simulated time.
    pub cells_per_second: u32,
    /// Lives granted at the start of a session.
    pub starting_lives: u32,
    /// Level index the session starts on.
    pub starting_level: u32,
    /// Collections required to unlock an ability.
    pub unlock_threshold: u32,
    /// Per-type overrides of `unlock_threshold`.
    pub thresholds: BTreeMap<CrystalType, u32>,
}

impl SessionConfig {
    /// Simulated time a sliding agent needs to cross a single cell.
    #[must_use]
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs(1) / self.cells_per_second.max(1)
    }

    pub(crate) fn movement(&self) -> movement::Config {
        movement::Config::new(self.step_duration())
    }

    pub(crate) fn progression(&self) -> progression::Config {
        self.thresholds.iter().fold(
            progression::Config::new(
                self.starting_lives,
                self.starting_level,
                self.unlock_threshold,
            ),
            |config, (&crystal, &threshold)| config.with_threshold(crystal, threshold),
        )
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cells_per_second: DEFAULT_CELLS_PER_SECOND,
            starting_lives: DEFAULT_STARTING_LIVES,
            starting_level: DEFAULT_STARTING_LEVEL,
            unlock_threshold: DEFAULT_UNLOCK_THRESHOLD,
            thresholds: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_systems() {
        let config = SessionConfig::default();
        assert_eq!(config.step_duration(), movement::Movement::default().step_duration());
        assert_eq!(config.progression(), progression::Config::default());
    }

    #[test]
    fn zero_speed_falls_back_to_one_cell_per_second() {
        let config = SessionConfig {
            cells_per_second: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.step_duration(), Duration::from_secs(1));
    }

    #[test]
    fn per_type_thresholds_override_the_shared_one() {
        let config = SessionConfig {
            unlock_threshold: 4,
            thresholds: BTreeMap::from([(CrystalType::Yellow, 2)]),
            ..SessionConfig::default()
        };
        let progression = config.progression();
        assert_eq!(progression.threshold(CrystalType::Yellow), 2);
        assert_eq!(progression.threshold(CrystalType::Red), 4);
    }
}
