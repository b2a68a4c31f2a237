#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Crystal Slide.
//!
//! The world owns the [`SpatialGrid`], the pickup arena and every agent. It
//! validates and builds levels, commits single-cell steps requested by the
//! movement system and resolves pickups and the level exit for each cell an
//! agent enters.

mod grid;
mod level;
mod pickups;

use crystal_slide_core::{
    AgentId, AgentKind, Command, Direction, Event, GridCoord, LevelData, LevelError, TileKind,
};
use log::{debug, info, warn};

pub use grid::{SpatialGrid, StaticCell, StaticKind};
pub use pickups::{Pickup, PickupId};

use level::LevelLayout;
use pickups::PickupRegistry;

/// Represents the authoritative Crystal Slide world state.
#[derive(Debug)]
pub struct World {
    grid: SpatialGrid,
    pickups: PickupRegistry,
    agents: Vec<Agent>,
    next_agent_id: u32,
    layout: Option<LevelLayout>,
}

impl World {
    /// Creates an empty world with no level loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: SpatialGrid::new(0, 0, 1.0),
            pickups: PickupRegistry::default(),
            agents: Vec::new(),
            next_agent_id: 0,
            layout: None,
        }
    }

    fn agent_index(&self, agent: AgentId) -> Option<usize> {
        self.agents.iter().position(|candidate| candidate.id == agent)
    }

    fn player(&self) -> Option<&Agent> {
        self.agents
            .iter()
            .find(|agent| agent.kind == AgentKind::Player)
    }

    fn teardown(&mut self, out_events: &mut Vec<Event>) {
        self.grid.clear();
        self.pickups.clear();
        self.agents.clear();
        self.layout = None;
        out_events.push(Event::LevelCleared);
    }

    fn spawn(&mut self, kind: AgentKind, cell: GridCoord, out_events: &mut Vec<Event>) {
        if self.layout.is_none() {
            warn!("spawn of {kind:?} at {cell} ignored: no level loaded");
            out_events.push(Event::AgentSpawnRejected { kind, cell });
            return;
        }
        if kind == AgentKind::Player && self.player().is_some() {
            warn!("spawn of a second player at {cell} rejected");
            out_events.push(Event::AgentSpawnRejected { kind, cell });
            return;
        }
        if self.grid.is_blocked(cell) {
            debug!("spawn of {kind:?} at {cell} rejected: cell blocked");
            out_events.push(Event::AgentSpawnRejected { kind, cell });
            return;
        }

        let agent = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.saturating_add(1);
        self.agents.push(Agent {
            id: agent,
            kind,
            cell,
        });
        self.grid.place_occupant(agent, cell);
        out_events.push(Event::AgentSpawned { agent, kind, cell });

        if kind.collects_pickups() {
            self.collect_pickup(agent, cell, out_events);
        }
    }

    fn remove(&mut self, agent: AgentId, out_events: &mut Vec<Event>) {
        let Some(index) = self.agent_index(agent) else {
            warn!("removal of unknown agent {} ignored", agent.get());
            return;
        };
        let removed = self.agents.remove(index);
        let _ = self.grid.remove_occupant(removed.id, removed.cell);
        out_events.push(Event::AgentRemoved {
            agent,
            cell: removed.cell,
        });
    }

    fn step(&mut self, agent: AgentId, direction: Direction, out_events: &mut Vec<Event>) {
        let Some(index) = self.agent_index(agent) else {
            warn!("step for unknown agent {} ignored", agent.get());
            return;
        };

        let from = self.agents[index].cell;
        let to = from.step(direction);
        if self.grid.is_blocked(to) {
            debug!("agent {} blocked at {to}, resting on {from}", agent.get());
            out_events.push(Event::SlideBlocked {
                agent,
                at: from,
                direction,
            });
            return;
        }

        self.grid.move_occupant(agent, from, to);
        let moved = &mut self.agents[index];
        moved.cell = to;
        let kind = moved.kind;
        debug!("agent {} moved {from} -> {to}", agent.get());
        out_events.push(Event::AgentAdvanced { agent, from, to });

        if kind.collects_pickups() {
            self.collect_pickup(agent, to, out_events);
            self.check_portal(agent, to, out_events);
        }
    }

    fn settle(&mut self, agent: AgentId, out_events: &mut Vec<Event>) {
        let Some(index) = self.agent_index(agent) else {
            warn!("settle for unknown agent {} ignored", agent.get());
            return;
        };
        let at = self.agents[index].cell;
        self.grid.move_occupant(agent, at, at);
        out_events.push(Event::SlideSettled { agent, at });
    }

    fn collect_pickup(&mut self, agent: AgentId, cell: GridCoord, out_events: &mut Vec<Event>) {
        if let Some(collected) = self.pickups.resolve(&mut self.grid, cell) {
            debug!(
                "agent {} collected {:?} crystal worth {} at {cell}",
                agent.get(),
                collected.crystal,
                collected.value
            );
            out_events.push(Event::CrystalCollected {
                agent,
                cell,
                crystal: collected.crystal,
                value: collected.value,
            });
        }
    }

    fn check_portal(&self, agent: AgentId, cell: GridCoord, out_events: &mut Vec<Event>) {
        if self.layout.map_or(false, |layout| layout.exit == cell) {
            info!("agent {} reached the exit at {cell}", agent.get());
            out_events.push(Event::PortalReached { agent, cell });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates and loads a level, replacing whatever level was active.
///
/// Validation runs before any state is touched, so a rejected level leaves
/// the previous level intact and emits no events. On success the player is
/// spawned on the start cell and collects any crystal lying there.
pub fn build_level(
    world: &mut World,
    level: LevelData,
    out_events: &mut Vec<Event>,
) -> Result<(), LevelError> {
    let layout = level::validate(&level)?;

    if world.layout.is_some() {
        world.teardown(out_events);
    }

    world.grid.resize(level.columns, level.rows, level.cell_size);
    for tile in &level.tiles {
        if level::marks_exit(&level, tile) {
            debug!("portal tile marks the exit {}", tile.cell);
            continue;
        }
        let pickup = match tile.kind {
            TileKind::Crystal { crystal, value } => Some(world.pickups.register(crystal, value)),
            _ => None,
        };
        if let Some(occupant) = StaticCell::from_tile(tile.kind, pickup) {
            world.grid.insert_static(tile.cell, occupant);
        }
    }
    world.layout = Some(layout);

    info!(
        "level {}x{} built with {} tiles, start {} exit {}",
        level.columns,
        level.rows,
        level.tiles.len(),
        layout.start,
        layout.exit
    );
    out_events.push(Event::LevelBuilt {
        columns: level.columns,
        rows: level.rows,
        start: layout.start,
        exit: layout.exit,
    });

    world.spawn(AgentKind::Player, layout.start, out_events);
    Ok(())
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::StepAgent { agent, direction } => world.step(agent, direction, out_events),
        Command::SettleAgent { agent } => world.settle(agent, out_events),
        Command::SpawnAgent { kind, cell } => world.spawn(kind, cell, out_events),
        Command::RemoveAgent { agent } => world.remove(agent, out_events),
        Command::ClearLevel => {
            info!("level cleared");
            world.teardown(out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Pickup, SpatialGrid, World};
    use crystal_slide_core::{AgentId, AgentKind, GridCoord};

    /// Provides read-only access to the spatial grid.
    #[must_use]
    pub fn grid(world: &World) -> &SpatialGrid {
        &world.grid
    }

    /// Reports whether a level is currently loaded.
    #[must_use]
    pub fn is_level_loaded(world: &World) -> bool {
        world.layout.is_some()
    }

    /// Start cell of the active level.
    #[must_use]
    pub fn start(world: &World) -> Option<GridCoord> {
        world.layout.map(|layout| layout.start)
    }

    /// Exit cell of the active level.
    #[must_use]
    pub fn exit(world: &World) -> Option<GridCoord> {
        world.layout.map(|layout| layout.exit)
    }

    /// Identifier of the player agent, if one is on the grid.
    #[must_use]
    pub fn player(world: &World) -> Option<AgentId> {
        world.player().map(|agent| agent.id)
    }

    /// Cell currently occupied by the agent.
    #[must_use]
    pub fn agent_cell(world: &World, agent: AgentId) -> Option<GridCoord> {
        world
            .agent_index(agent)
            .map(|index| world.agents[index].cell)
    }

    /// Captures a read-only view of every agent on the grid.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let mut snapshots: Vec<AgentSnapshot> = world
            .agents
            .iter()
            .map(|agent| AgentSnapshot {
                id: agent.id,
                kind: agent.kind,
                cell: agent.cell,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        AgentView { snapshots }
    }

    /// Returns the uncollected pickup lying on the cell, if any.
    #[must_use]
    pub fn pickup_at(world: &World, cell: GridCoord) -> Option<&Pickup> {
        let occupant = world.grid.static_occupant_at(cell)?;
        match occupant.kind() {
            super::StaticKind::Pickup(id) => world.pickups.get(id),
            _ => None,
        }
    }

    /// Iterates over every pickup registered for the level, collected or not.
    pub fn pickups(world: &World) -> impl Iterator<Item = &Pickup> {
        world.pickups.iter()
    }

    /// Number of pickups still waiting to be collected.
    #[must_use]
    pub fn remaining_pickups(world: &World) -> usize {
        world
            .pickups
            .iter()
            .filter(|pickup| !pickup.is_collected())
            .count()
    }

    /// Read-only snapshot describing all agents on the grid.
    #[derive(Clone, Debug, Default)]
    pub struct AgentView {
        snapshots: Vec<AgentSnapshot>,
    }

    impl AgentView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<AgentSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single agent used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AgentSnapshot {
        /// Unique identifier assigned to the agent.
        pub id: AgentId,
        /// Kind of the agent.
        pub kind: AgentKind,
        /// Grid cell currently occupied by the agent.
        pub cell: GridCoord,
    }
}

#[derive(Clone, Copy, Debug)]
struct Agent {
    id: AgentId,
    kind: AgentKind,
    cell: GridCoord,
}
