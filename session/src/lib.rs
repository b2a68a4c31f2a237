#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation context that wires the Crystal Slide world to its systems.
//!
//! A [`Session`] owns the world together with the movement and progression
//! systems. Each call to [`Session::tick`] advances time, forwards the latest
//! input to the movement system, feeds the resulting commands back into the
//! world until none remain and finally hands every emitted event, in order,
//! to progression.

mod config;

use std::time::Duration;

use crystal_slide_core::{
    AgentId, AgentKind, Command, Direction, Event, GridCoord, LevelData, LevelError,
    Notification, ProgressSnapshot,
};
use crystal_slide_system_movement::{Movement, SlideInput};
use crystal_slide_system_progression::Progression;
use crystal_slide_world::{self as world, query, World};
use glam::Vec2;
use log::{debug, info, warn};

pub use config::SessionConfig;

/// Explicit simulation context for a single player.
#[derive(Debug)]
pub struct Session {
    world: World,
    movement: Movement,
    progression: Progression,
    pending_input: Option<Direction>,
}

impl Session {
    /// Creates a session with no level loaded.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            world: World::new(),
            movement: Movement::new(config.movement()),
            progression: Progression::new(config.progression()),
            pending_input: None,
        }
    }

    /// Loads a level, replacing the active one.
    ///
    /// A rejected level leaves the previous level and every slide untouched.
    /// Notifications caused by the build, such as a crystal lying on the
    /// start cell, are appended to `out`.
    pub fn build_level(
        &mut self,
        level: LevelData,
        out: &mut Vec<Notification>,
    ) -> Result<(), LevelError> {
        let mut events = Vec::new();
        world::build_level(&mut self.world, level, &mut events)?;
        self.pending_input = None;
        self.dispatch(events, None, out);
        Ok(())
    }

    /// Unloads the active level. Progression counters are kept.
    pub fn clear_level(&mut self) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::ClearLevel, &mut events);
        self.pending_input = None;
        let _ = self.pump(events, None);
    }

    /// Stores a direction for the player; the next tick consumes it.
    ///
    /// Only the latest direction submitted between two ticks is kept.
    pub fn submit_input(&mut self, direction: Direction) {
        if let Some(replaced) = self.pending_input.replace(direction) {
            debug!("input {replaced:?} superseded by {direction:?}");
        }
    }

    /// Advances the simulation by `dt`, appending notifications to `out`.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Notification>) {
        let direction = self.pending_input.take();
        if !query::is_level_loaded(&self.world) {
            warn!("tick ignored: no level loaded");
            return;
        }

        let input = direction.and_then(|direction| match query::player(&self.world) {
            Some(player) => Some(SlideInput::new(player, direction)),
            None => {
                warn!("input {direction:?} dropped: no player on the grid");
                None
            }
        });

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        self.dispatch(events, input, out);
    }

    /// Places an enemy or pushable block on the grid.
    ///
    /// Returns the new agent identifier, or `None` when the cell is blocked
    /// or the spawn is otherwise rejected.
    pub fn spawn_agent(
        &mut self,
        kind: AgentKind,
        cell: GridCoord,
        out: &mut Vec<Notification>,
    ) -> Option<AgentId> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::SpawnAgent { kind, cell }, &mut events);
        let spawned = events.iter().find_map(|event| match *event {
            Event::AgentSpawned { agent, .. } => Some(agent),
            _ => None,
        });
        self.dispatch(events, None, out);
        spawned
    }

    /// Removes one life from the player.
    pub fn spend_life(&mut self, out: &mut Vec<Notification>) {
        self.progression.spend_life(out);
    }

    /// Grants one life to the player.
    pub fn add_life(&mut self, out: &mut Vec<Notification>) {
        self.progression.add_life(out);
    }

    /// Captures progression counters for an external save system.
    #[must_use]
    pub fn progress(&self) -> ProgressSnapshot {
        self.progression.snapshot()
    }

    /// Replaces progression counters with previously saved ones.
    pub fn restore_progress(&mut self, snapshot: &ProgressSnapshot) {
        self.progression.restore(snapshot);
    }

    /// Identifier of the player agent, if a level is loaded.
    #[must_use]
    pub fn player(&self) -> Option<AgentId> {
        query::player(&self.world)
    }

    /// Reports whether a level is currently loaded.
    #[must_use]
    pub fn is_level_loaded(&self) -> bool {
        query::is_level_loaded(&self.world)
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the movement system.
    #[must_use]
    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    /// Read-only access to the progression system.
    #[must_use]
    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// World-space position of the agent, interpolated toward the next cell
    /// while it slides. Purely cosmetic; the committed cell is authoritative.
    #[must_use]
    pub fn render_position(&self, agent: AgentId) -> Option<Vec2> {
        let cell = query::agent_cell(&self.world, agent)?;
        let grid = query::grid(&self.world);
        let anchor = grid.grid_to_world(cell);
        let Some(direction) = self.movement.slide_direction(agent) else {
            return Some(anchor);
        };
        let (dx, dy) = direction.offset();
        let heading = Vec2::new(dx as f32, dy as f32);
        Some(anchor + heading * self.movement.glide_fraction(agent) * grid.cell_size())
    }

    fn dispatch(
        &mut self,
        pending: Vec<Event>,
        input: Option<SlideInput>,
        out: &mut Vec<Notification>,
    ) {
        let events = self.pump(pending, input);
        let before = out.len();
        self.progression.handle(&events, out);
        for notification in &out[before..] {
            if matches!(
                notification,
                Notification::LevelCompleted { .. } | Notification::AbilityUnlocked { .. }
            ) {
                info!("{notification:?}");
            }
        }
    }

    /// Runs movement over world events until it stops requesting commands.
    ///
    /// Returns every event observed, in emission order.
    fn pump(&mut self, pending: Vec<Event>, input: Option<SlideInput>) -> Vec<Event> {
        let mut log = Vec::new();
        let mut events = pending;
        let mut input = input;

        while !events.is_empty() {
            let mut commands = Vec::new();
            self.movement.handle(&events, input.take(), &mut commands);
            log.append(&mut events);
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }

        log
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_slide_core::{CrystalType, TileKind};

    fn open_level() -> LevelData {
        LevelData::new(5, 5, GridCoord::new(2, 2), GridCoord::new(0, 4))
    }

    #[test]
    fn tick_without_level_is_a_no_op() {
        let mut session = Session::default();
        let mut out = Vec::new();
        session.submit_input(Direction::Up);
        session.tick(Duration::from_millis(100), &mut out);

        assert!(out.is_empty());
        assert!(session.player().is_none());
        assert!(!session.is_level_loaded());
    }

    #[test]
    fn latest_input_between_ticks_wins() {
        let mut session = Session::default();
        let mut out = Vec::new();
        session.build_level(open_level(), &mut out).expect("level builds");
        let player = session.player().expect("player");

        session.submit_input(Direction::Up);
        session.submit_input(Direction::Left);
        session.tick(session.movement().step_duration(), &mut out);

        assert_eq!(
            query::agent_cell(session.world(), player),
            Some(GridCoord::new(1, 2))
        );
    }

    #[test]
    fn input_is_consumed_by_a_single_tick() {
        let mut session = Session::default();
        let mut out = Vec::new();
        session.build_level(open_level(), &mut out).expect("level builds");
        let player = session.player().expect("player");
        let step = session.movement().step_duration();

        session.submit_input(Direction::Right);
        for _ in 0..4 {
            session.tick(step, &mut out);
        }
        assert_eq!(
            query::agent_cell(session.world(), player),
            Some(GridCoord::new(4, 2))
        );
        assert!(!session.movement().is_sliding(player));

        for _ in 0..4 {
            session.tick(step, &mut out);
        }
        assert_eq!(
            query::agent_cell(session.world(), player),
            Some(GridCoord::new(4, 2))
        );
    }

    #[test]
    fn render_position_interpolates_only_while_sliding() {
        let mut session = Session::default();
        let mut out = Vec::new();
        session
            .build_level(open_level().with_tile(GridCoord::new(2, 4), TileKind::Wall), &mut out)
            .expect("level builds");
        let player = session.player().expect("player");
        let step = session.movement().step_duration();
        let resting = session.render_position(player).expect("position");
        assert_eq!(resting, Vec2::ZERO);

        session.submit_input(Direction::Up);
        session.tick(step + step / 2, &mut out);

        let gliding = session.render_position(player).expect("position");
        assert!((gliding.x - 0.0).abs() < 1e-4);
        assert!((gliding.y - 1.5).abs() < 1e-4);

        session.tick(step, &mut out);
        session.tick(step, &mut out);
        let stopped = session.render_position(player).expect("position");
        assert_eq!(stopped, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn spawned_enemy_obstructs_the_player() {
        let mut session = Session::default();
        let mut out = Vec::new();
        session.build_level(open_level(), &mut out).expect("level builds");
        let enemy = session.spawn_agent(AgentKind::Enemy, GridCoord::new(2, 4), &mut out);
        assert!(enemy.is_some());
        assert_eq!(
            session.spawn_agent(AgentKind::Enemy, GridCoord::new(2, 4), &mut out),
            None
        );

        let player = session.player().expect("player");
        let step = session.movement().step_duration();
        session.submit_input(Direction::Up);
        for _ in 0..4 {
            session.tick(step, &mut out);
        }
        assert_eq!(
            query::agent_cell(session.world(), player),
            Some(GridCoord::new(2, 3))
        );
    }

    #[test]
    fn clear_level_keeps_progress() {
        let mut session = Session::default();
        let mut out = Vec::new();
        let level = open_level().with_tile(
            GridCoord::new(2, 2),
            TileKind::Crystal {
                crystal: CrystalType::Blue,
                value: 1,
            },
        );
        session.build_level(level, &mut out).expect("level builds");
        session.clear_level();

        assert!(!session.is_level_loaded());
        assert_eq!(session.progress().crystals, 1);
        assert_eq!(session.progression().ability(CrystalType::Blue).count(), 1);
    }
}
