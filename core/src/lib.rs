#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Crystal Slide engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams and respond with
//! new command batches, or with [`Notification`] values meant for the
//! presentation layer.

use std::{collections::BTreeSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an agent commit a single step in the specified direction.
    StepAgent {
        /// Identifier of the agent attempting to move.
        agent: AgentId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that a braking agent settle on its last committed cell.
    SettleAgent {
        /// Identifier of the agent that finished braking.
        agent: AgentId,
    },
    /// Requests that a new agent be placed on the grid.
    SpawnAgent {
        /// Kind of agent to create.
        kind: AgentKind,
        /// Cell the agent should occupy after spawning.
        cell: GridCoord,
    },
    /// Requests removal of an agent from the grid.
    RemoveAgent {
        /// Identifier of the agent targeted for removal.
        agent: AgentId,
    },
    /// Tears down the active level, emptying both coordinate maps.
    ClearLevel,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a level finished loading.
    LevelBuilt {
        /// Number of columns in the level grid.
        columns: u32,
        /// Number of rows in the level grid.
        rows: u32,
        /// Cell the player spawns on.
        start: GridCoord,
        /// Cell whose arrival completes the level.
        exit: GridCoord,
    },
    /// Announces that the active level was torn down.
    LevelCleared,
    /// Confirms that an agent was placed on the grid.
    AgentSpawned {
        /// Identifier assigned to the agent.
        agent: AgentId,
        /// Kind of agent that spawned.
        kind: AgentKind,
        /// Cell the agent occupies after spawning.
        cell: GridCoord,
    },
    /// Reports that a spawn request targeted a blocked cell.
    AgentSpawnRejected {
        /// Kind of agent requested.
        kind: AgentKind,
        /// Cell provided in the spawn request.
        cell: GridCoord,
    },
    /// Confirms that an agent left the grid.
    AgentRemoved {
        /// Identifier of the removed agent.
        agent: AgentId,
        /// Cell the agent occupied before removal.
        cell: GridCoord,
    },
    /// Confirms that an agent committed a move between two adjacent cells.
    AgentAdvanced {
        /// Identifier of the agent that advanced.
        agent: AgentId,
        /// Cell the agent occupied before moving.
        from: GridCoord,
        /// Cell the agent occupies after the committed move.
        to: GridCoord,
    },
    /// Reports that the next cell of a slide is blocked.
    SlideBlocked {
        /// Identifier of the agent whose slide stopped.
        agent: AgentId,
        /// Cell the agent rests on.
        at: GridCoord,
        /// Direction of the rejected step.
        direction: Direction,
    },
    /// Confirms that a braking agent snapped back onto its committed cell.
    SlideSettled {
        /// Identifier of the agent that settled.
        agent: AgentId,
        /// Committed cell the agent rests on.
        at: GridCoord,
    },
    /// Reports that an agent collected a crystal on the cell it entered.
    CrystalCollected {
        /// Identifier of the collecting agent.
        agent: AgentId,
        /// Cell that held the crystal.
        cell: GridCoord,
        /// Type of the collected crystal.
        crystal: CrystalType,
        /// Value granted by the crystal.
        value: u32,
    },
    /// Reports that the player committed a move onto the level exit.
    PortalReached {
        /// Identifier of the agent that reached the exit.
        agent: AgentId,
        /// Exit cell.
        cell: GridCoord,
    },
}

/// Progression updates meant for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    /// A crystal was collected.
    CrystalCollected {
        /// Type of the collected crystal.
        crystal: CrystalType,
        /// Running total of crystal value collected during the session.
        total: u64,
    },
    /// An ability became available for the first time.
    AbilityUnlocked {
        /// Crystal type whose ability unlocked.
        crystal: CrystalType,
    },
    /// The player finished a level.
    LevelCompleted {
        /// Index of the level that was completed.
        level: u32,
    },
    /// The player lost a life.
    LifeLost {
        /// Lives remaining after the loss.
        remaining: u32,
    },
    /// The player gained a life.
    LifeGained {
        /// Lives available after the gain.
        lives: u32,
    },
    /// The player ran out of lives.
    GameOver,
}

/// Cardinal directions available to sliding agents.
///
/// `Up` increases the `y` coordinate and `Right` increases `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing `y`.
    Up,
    /// Movement toward decreasing `y`.
    Down,
    /// Movement toward decreasing `x`.
    Left,
    /// Movement toward increasing `x`.
    Right,
}

impl Direction {
    /// Every direction in a stable order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset applied to a coordinate when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Location of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component of the coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the adjacent coordinate in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Reports whether the coordinate lies inside a `columns` by `rows` grid.
    #[must_use]
    pub fn within(self, columns: u32, rows: u32) -> bool {
        u32::try_from(self.x).map_or(false, |x| x < columns)
            && u32::try_from(self.y).map_or(false, |y| y < rows)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Kinds of agents that occupy the mobile-occupant map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// The player-controlled agent. Only the player collects crystals.
    Player,
    /// A hostile agent.
    Enemy,
    /// A block that can be pushed around the grid.
    PushableBlock,
}

impl AgentKind {
    /// Reports whether entering a cell with this agent resolves pickups and the exit.
    #[must_use]
    pub const fn collects_pickups(self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Types of collectible crystals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrystalType {
    /// Red crystal, grants the beam sword.
    Red,
    /// Blue crystal, grants the EMP.
    Blue,
    /// Yellow crystal, grants the shield.
    Yellow,
    /// Purple crystal, grants the phase shift.
    Purple,
}

impl CrystalType {
    /// Every crystal type in a stable order.
    pub const ALL: [CrystalType; 4] = [
        CrystalType::Red,
        CrystalType::Blue,
        CrystalType::Yellow,
        CrystalType::Purple,
    ];

    /// Display name of the ability unlocked by this crystal type.
    #[must_use]
    pub const fn ability_name(self) -> &'static str {
        match self {
            Self::Red => "Beam Sword",
            Self::Blue => "EMP Crystal",
            Self::Yellow => "Shield",
            Self::Purple => "Phase Shift",
        }
    }

    /// Dense index of the type, usable for fixed-size tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Blue => 1,
            Self::Yellow => 2,
            Self::Purple => 3,
        }
    }
}

/// Tile kinds a level may place in the static map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
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
    /// Collectible crystal.
    Crystal {
        /// Type of the crystal.
        crystal: CrystalType,
        /// Value granted on collection. Must be at least one.
        value: u32,
    },
}

impl TileKind {
    /// Reports whether the tile stops a slide. Crystals never obstruct.
    #[must_use]
    pub const fn obstructs(self) -> bool {
        !matches!(self, Self::Crystal { .. })
    }
}

/// Single tile placement within a level description.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileSpec {
    /// Cell the tile occupies.
    pub cell: GridCoord,
    /// Kind of tile placed on the cell.
    pub kind: TileKind,
}

impl TileSpec {
    /// Creates a new tile placement.
    #[must_use]
    pub const fn new(cell: GridCoord, kind: TileKind) -> Self {
        Self { cell, kind }
    }
}

/// Level description supplied by a level loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Side length of a cell in world units.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Cell the player spawns on.
    pub start: GridCoord,
    /// Cell whose arrival completes the level.
    pub exit: GridCoord,
    /// Ordered tile placements populating the static map.
    #[serde(default)]
    pub tiles: Vec<TileSpec>,
}

fn default_cell_size() -> f32 {
    1.0
}

impl LevelData {
    /// Creates an empty level of the provided size with unit cells.
    #[must_use]
    pub fn new(columns: u32, rows: u32, start: GridCoord, exit: GridCoord) -> Self {
        Self {
            columns,
            rows,
            cell_size: default_cell_size(),
            start,
            exit,
            tiles: Vec::new(),
        }
    }

    /// Appends a tile placement, returning the updated level.
    #[must_use]
    pub fn with_tile(mut self, cell: GridCoord, kind: TileKind) -> Self {
        self.tiles.push(TileSpec::new(cell, kind));
        self
    }

    /// Overrides the cell size, returning the updated level.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }
}

/// Reasons a level description may be rejected at load time.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The grid has no cells.
    #[error("level grid {columns}x{rows} contains no cells")]
    EmptyGrid {
        /// Declared column count.
        columns: u32,
        /// Declared row count.
        rows: u32,
    },
    /// The cell size is not a positive finite number.
    #[error("cell size {cell_size} must be positive and finite")]
    InvalidCellSize {
        /// Declared cell size.
        cell_size: f32,
    },
    /// The start coordinate lies outside the grid.
    #[error("start coordinate {start} lies outside the grid")]
    StartOutOfBounds {
        /// Declared start coordinate.
        start: GridCoord,
    },
    /// The exit coordinate lies outside the grid.
    #[error("exit coordinate {exit} lies outside the grid")]
    ExitOutOfBounds {
        /// Declared exit coordinate.
        exit: GridCoord,
    },
    /// A tile lies outside the grid.
    #[error("tile at {cell} lies outside the grid")]
    TileOutOfBounds {
        /// Coordinate of the offending tile.
        cell: GridCoord,
    },
    /// Two tiles share a coordinate.
    #[error("more than one tile declared at {cell}")]
    DuplicateTile {
        /// Coordinate declared twice.
        cell: GridCoord,
    },
    /// An obstructing tile sits on the start coordinate.
    #[error("start coordinate {start} is obstructed")]
    StartObstructed {
        /// Declared start coordinate.
        start: GridCoord,
    },
    /// An obstructing tile other than a portal sits on the exit coordinate.
    ///
    /// A portal tile on the exit is accepted as the exit marker.
    #[error("exit coordinate {exit} is obstructed")]
    ExitObstructed {
        /// Declared exit coordinate.
        exit: GridCoord,
    },
    /// A crystal grants no value.
    #[error("crystal at {cell} must be worth at least one")]
    InvalidCrystalValue {
        /// Coordinate of the offending crystal.
        cell: GridCoord,
    },
    /// The level holds more crystals than pickup ids can address.
    #[error("level holds {count} crystals, more than pickup ids can address")]
    TooManyPickups {
        /// Number of crystal tiles in the level.
        count: usize,
    },
}

/// Saved state of a single ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilitySnapshot {
    /// Crystal type backing the ability.
    pub crystal: CrystalType,
    /// Number of crystals of this type collected.
    pub count: u32,
    /// Whether the ability has been unlocked.
    pub unlocked: bool,
}

/// Progression counters exposed to an external save system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Index of the level currently being played.
    pub level: u32,
    /// Lives remaining.
    pub lives: u32,
    /// Total crystal value collected.
    pub crystals: u64,
    /// Per-type ability progress.
    pub abilities: Vec<AbilitySnapshot>,
    /// Level indices the player may select.
    pub unlocked_levels: BTreeSet<u32>,
}

#[cfg(test)]
mod tests {
    use super::{
        AbilitySnapshot, CrystalType, Direction, GridCoord, LevelData, ProgressSnapshot, TileKind,
    };
    use serde::{de::DeserializeOwned, Serialize};
    use std::collections::BTreeSet;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn opposite_directions_cancel_out() {
        for direction in Direction::ALL {
            let origin = GridCoord::new(3, 3);
            assert_eq!(origin.step(direction).step(direction.opposite()), origin);
            assert_ne!(direction, direction.opposite());
        }
    }

    #[test]
    fn up_increases_y() {
        assert_eq!(GridCoord::new(4, 1).step(Direction::Up), GridCoord::new(4, 2));
        assert_eq!(GridCoord::new(0, 0).step(Direction::Left), GridCoord::new(-1, 0));
    }

    #[test]
    fn within_rejects_negative_and_overflowing_coordinates() {
        assert!(GridCoord::new(0, 0).within(9, 16));
        assert!(GridCoord::new(8, 15).within(9, 16));
        assert!(!GridCoord::new(9, 0).within(9, 16));
        assert!(!GridCoord::new(0, 16).within(9, 16));
        assert!(!GridCoord::new(-1, 3).within(9, 16));
    }

    #[test]
    fn only_crystals_are_passable() {
        assert!(TileKind::Wall.obstructs());
        assert!(TileKind::Portal.obstructs());
        assert!(!TileKind::Crystal {
            crystal: CrystalType::Red,
            value: 1
        }
        .obstructs());
    }

    #[test]
    fn crystal_indices_are_dense() {
        for (position, crystal) in CrystalType::ALL.iter().enumerate() {
            assert_eq!(crystal.index(), position);
        }
    }

    #[test]
    fn level_data_round_trips_through_bincode() {
        let level = LevelData::new(9, 16, GridCoord::new(4, 1), GridCoord::new(4, 14))
            .with_tile(GridCoord::new(4, 5), TileKind::Wall)
            .with_tile(
                GridCoord::new(5, 2),
                TileKind::Crystal {
                    crystal: CrystalType::Purple,
                    value: 2,
                },
            );
        assert_round_trip(&level);
    }

    #[test]
    fn progress_snapshot_round_trips_through_bincode() {
        let snapshot = ProgressSnapshot {
            level: 3,
            lives: 4,
            crystals: 11,
            abilities: vec![AbilitySnapshot {
                crystal: CrystalType::Blue,
                count: 3,
                unlocked: true,
            }],
            unlocked_levels: BTreeSet::from([1, 2, 3]),
        };
        assert_round_trip(&snapshot);
    }
}
