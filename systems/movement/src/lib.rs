#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that drives slide-until-blocked motion.
//!
//! Each agent carries a [`SlideState`]. A directional input starts a slide,
//! after which the system requests one committed step per tick until the
//! world reports that the next cell is blocked. Reversing direction mid-slide
//! brakes the agent: no further step is requested and on the following tick
//! the agent settles on its last committed cell.

use std::{collections::BTreeMap, time::Duration};

use crystal_slide_core::{AgentId, Command, Direction, Event, GridCoord};
use log::{debug, warn};

/// Cells travelled per second by a sliding agent unless configured otherwise.
const DEFAULT_CELLS_PER_SECOND: u32 = 12;

/// Phase of an agent's slide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlidePhase {
    /// The agent rests on its committed cell.
    Idle,
    /// The agent advances one cell per step in its slide direction.
    Sliding,
    /// A reversal was requested; the agent settles on its committed cell next tick.
    Braking,
}

/// Slide bookkeeping for a single agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlideState {
    direction: Option<Direction>,
    phase: SlidePhase,
    cell: GridCoord,
    glide: Duration,
}

impl SlideState {
    fn idle(cell: GridCoord) -> Self {
        Self {
            direction: None,
            phase: SlidePhase::Idle,
            cell,
            glide: Duration::ZERO,
        }
    }

    fn settle(&mut self, cell: GridCoord) {
        self.direction = None;
        self.phase = SlidePhase::Idle;
        self.cell = cell;
        self.glide = Duration::ZERO;
    }

    /// Direction of the active slide or braking slide.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Current phase of the slide.
    #[must_use]
    pub const fn phase(&self) -> SlidePhase {
        self.phase
    }

    /// Last committed cell of the agent.
    #[must_use]
    pub const fn cell(&self) -> GridCoord {
        self.cell
    }

    /// Time accumulated toward the next step.
    #[must_use]
    pub const fn glide(&self) -> Duration {
        self.glide
    }
}

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step_duration: Duration,
}

impl Config {
    /// Creates a configuration where each step takes `step_duration` of simulated time.
    #[must_use]
    pub const fn new(step_duration: Duration) -> Self {
        Self { step_duration }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(1) / DEFAULT_CELLS_PER_SECOND)
    }
}

/// Directional input addressed to a single agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlideInput {
    /// Agent the input controls.
    pub agent: AgentId,
    /// Requested direction.
    pub direction: Direction,
}

impl SlideInput {
    /// Creates a new input descriptor.
    #[must_use]
    pub const fn new(agent: AgentId, direction: Direction) -> Self {
        Self { agent, direction }
    }
}

/// Pure system that reacts to world events and emits step and settle commands.
#[derive(Debug)]
pub struct Movement {
    step_duration: Duration,
    slides: BTreeMap<AgentId, SlideState>,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            step_duration: config.step_duration,
            slides: BTreeMap::new(),
        }
    }

    /// Consumes world events and the sampled input to emit movement commands.
    ///
    /// Events are folded into the slide states first, then the input is
    /// applied, and finally, when the batch contains a tick, every sliding
    /// agent that accrued a full step requests exactly one `StepAgent`.
    /// Agents that started braking during this call settle on the next tick.
    pub fn handle(&mut self, events: &[Event], input: Option<SlideInput>, out: &mut Vec<Command>) {
        let mut elapsed: Option<Duration> = None;
        for event in events {
            match *event {
                Event::TimeAdvanced { dt } => {
                    elapsed = Some(elapsed.unwrap_or_default().saturating_add(dt));
                }
                Event::AgentSpawned { agent, cell, .. } => {
                    let _ = self.slides.insert(agent, SlideState::idle(cell));
                }
                Event::AgentRemoved { agent, .. } => {
                    let _ = self.slides.remove(&agent);
                }
                Event::LevelCleared => self.slides.clear(),
                Event::AgentAdvanced { agent, to, .. } => {
                    if let Some(state) = self.slides.get_mut(&agent) {
                        state.cell = to;
                    }
                }
                Event::SlideBlocked { agent, at, .. }
                | Event::SlideSettled { agent, at }
                | Event::PortalReached { agent, cell: at } => {
                    if let Some(state) = self.slides.get_mut(&agent) {
                        debug!("agent {} came to rest on {at}", agent.get());
                        state.settle(at);
                    }
                }
                Event::LevelBuilt { .. }
                | Event::AgentSpawnRejected { .. }
                | Event::CrystalCollected { .. } => {}
            }
        }

        let braked = input.and_then(|input| self.apply_input(input));

        if let Some(dt) = elapsed {
            self.advance(dt, braked, out);
        }
    }

    fn apply_input(&mut self, input: SlideInput) -> Option<AgentId> {
        let Some(state) = self.slides.get_mut(&input.agent) else {
            warn!("input for untracked agent {} ignored", input.agent.get());
            return None;
        };

        match state.phase {
            SlidePhase::Idle => {
                debug!(
                    "agent {} starts sliding {:?} from {}",
                    input.agent.get(),
                    input.direction,
                    state.cell
                );
                state.phase = SlidePhase::Sliding;
                state.direction = Some(input.direction);
                state.glide = Duration::ZERO;
                None
            }
            SlidePhase::Sliding if state.direction == Some(input.direction.opposite()) => {
                debug!(
                    "agent {} reverses, braking on {}",
                    input.agent.get(),
                    state.cell
                );
                state.phase = SlidePhase::Braking;
                Some(input.agent)
            }
            SlidePhase::Sliding | SlidePhase::Braking => {
                debug!(
                    "agent {} already moving, {:?} ignored",
                    input.agent.get(),
                    input.direction
                );
                None
            }
        }
    }

    fn advance(&mut self, dt: Duration, braked: Option<AgentId>, out: &mut Vec<Command>) {
        for (agent, state) in &mut self.slides {
            match state.phase {
                SlidePhase::Idle => {}
                SlidePhase::Braking => {
                    if braked != Some(*agent) {
                        out.push(Command::SettleAgent { agent: *agent });
                    }
                }
                SlidePhase::Sliding => {
                    let Some(direction) = state.direction else {
                        continue;
                    };
                    state.glide = state.glide.saturating_add(dt);
                    if state.glide >= self.step_duration {
                        // One step per tick; a long frame must not bank further steps.
                        state.glide = state
                            .glide
                            .saturating_sub(self.step_duration)
                            .min(self.step_duration.saturating_sub(Duration::from_nanos(1)));
                        out.push(Command::StepAgent {
                            agent: *agent,
                            direction,
                        });
                    }
                }
            }
        }
    }

    /// Simulated time needed for a single committed step.
    #[must_use]
    pub const fn step_duration(&self) -> Duration {
        self.step_duration
    }

    /// Slide state tracked for the agent, if any.
    #[must_use]
    pub fn slide(&self, agent: AgentId) -> Option<&SlideState> {
        self.slides.get(&agent)
    }

    /// Reports whether the agent is currently sliding.
    #[must_use]
    pub fn is_sliding(&self, agent: AgentId) -> bool {
        self.slide(agent)
            .map_or(false, |state| state.phase == SlidePhase::Sliding)
    }

    /// Direction of the agent's active slide; `None` unless sliding.
    #[must_use]
    pub fn slide_direction(&self, agent: AgentId) -> Option<Direction> {
        self.slide(agent)
            .filter(|state| state.phase == SlidePhase::Sliding)
            .and_then(|state| state.direction)
    }

    /// Progress toward the next cell in `0.0..=1.0`, for cosmetic interpolation only.
    #[must_use]
    pub fn glide_fraction(&self, agent: AgentId) -> f32 {
        let Some(state) = self.slide(agent) else {
            return 0.0;
        };
        if state.phase != SlidePhase::Sliding || self.step_duration.is_zero() {
            return 0.0;
        }
        (state.glide.as_secs_f32() / self.step_duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    fn tracked(cell: GridCoord) -> (Movement, AgentId) {
        let agent = AgentId::new(0);
        let mut movement = Movement::new(Config::new(STEP));
        let mut out = Vec::new();
        movement.handle(
            &[Event::AgentSpawned {
                agent,
                kind: crystal_slide_core::AgentKind::Player,
                cell,
            }],
            None,
            &mut out,
        );
        assert!(out.is_empty());
        (movement, agent)
    }

    fn tick(movement: &mut Movement, dt: Duration, input: Option<SlideInput>) -> Vec<Command> {
        let mut out = Vec::new();
        movement.handle(&[Event::TimeAdvanced { dt }], input, &mut out);
        out
    }

    #[test]
    fn default_step_matches_twelve_cells_per_second() {
        let movement = Movement::default();
        assert_eq!(movement.step_duration(), Duration::from_secs(1) / 12);
    }

    #[test]
    fn input_starts_slide_and_requests_one_step_per_tick() {
        let (mut movement, agent) = tracked(GridCoord::new(2, 2));
        let commands = tick(
            &mut movement,
            STEP * 3,
            Some(SlideInput::new(agent, Direction::Right)),
        );

        assert_eq!(
            commands,
            vec![Command::StepAgent {
                agent,
                direction: Direction::Right
            }]
        );
        assert!(movement.is_sliding(agent));
        assert_eq!(movement.slide_direction(agent), Some(Direction::Right));
    }

    #[test]
    fn partial_ticks_accumulate_before_stepping() {
        let (mut movement, agent) = tracked(GridCoord::new(0, 0));
        let first = tick(
            &mut movement,
            STEP / 2,
            Some(SlideInput::new(agent, Direction::Up)),
        );
        assert!(first.is_empty());
        assert!((movement.glide_fraction(agent) - 0.5).abs() < 1e-6);

        let second = tick(&mut movement, STEP / 2, None);
        assert_eq!(second.len(), 1);
        assert_eq!(movement.glide_fraction(agent), 0.0);
    }

    #[test]
    fn non_opposite_input_while_sliding_is_ignored() {
        let (mut movement, agent) = tracked(GridCoord::new(0, 0));
        let _ = tick(&mut movement, STEP, Some(SlideInput::new(agent, Direction::Up)));
        let commands = tick(
            &mut movement,
            STEP,
            Some(SlideInput::new(agent, Direction::Right)),
        );

        assert_eq!(
            commands,
            vec![Command::StepAgent {
                agent,
                direction: Direction::Up
            }]
        );
    }

    #[test]
    fn reversal_brakes_then_settles_next_tick() {
        let (mut movement, agent) = tracked(GridCoord::new(0, 0));
        let _ = tick(&mut movement, STEP, Some(SlideInput::new(agent, Direction::Up)));

        let braking = tick(
            &mut movement,
            STEP,
            Some(SlideInput::new(agent, Direction::Down)),
        );
        assert!(braking.is_empty());
        assert_eq!(
            movement.slide(agent).map(SlideState::phase),
            Some(SlidePhase::Braking)
        );
        assert_eq!(movement.slide_direction(agent), None);

        let settling = tick(&mut movement, STEP, None);
        assert_eq!(settling, vec![Command::SettleAgent { agent }]);
    }

    #[test]
    fn long_frame_does_not_bank_extra_steps() {
        let (mut movement, agent) = tracked(GridCoord::new(0, 0));
        let long = tick(
            &mut movement,
            STEP * 5,
            Some(SlideInput::new(agent, Direction::Up)),
        );
        assert_eq!(long.len(), 1);
        let glide = movement.slide(agent).map(SlideState::glide).expect("tracked agent");
        assert!(glide < STEP);
        assert!(movement.glide_fraction(agent) < 1.0);

        let steps: usize = (0..4)
            .map(|_| tick(&mut movement, STEP / 10, None).len())
            .sum();
        assert!(steps <= 1, "{steps} steps committed in 0.4 of a step");
    }

    #[test]
    fn input_while_braking_only_settles() {
        for input in [Direction::Up, Direction::Right] {
            let (mut movement, agent) = tracked(GridCoord::new(0, 0));
            let _ = tick(&mut movement, STEP, Some(SlideInput::new(agent, Direction::Up)));
            let mut out = Vec::new();
            movement.handle(
                &[Event::AgentAdvanced {
                    agent,
                    from: GridCoord::new(0, 0),
                    to: GridCoord::new(0, 1),
                }],
                None,
                &mut out,
            );
            assert!(out.is_empty());

            let braking = tick(
                &mut movement,
                STEP,
                Some(SlideInput::new(agent, Direction::Down)),
            );
            assert!(braking.is_empty());

            let settling = tick(&mut movement, STEP, Some(SlideInput::new(agent, input)));
            assert_eq!(settling, vec![Command::SettleAgent { agent }], "input {input:?}");

            movement.handle(
                &[Event::SlideSettled {
                    agent,
                    at: GridCoord::new(0, 1),
                }],
                None,
                &mut out,
            );
            assert!(out.is_empty());
            let state = movement.slide(agent).copied().expect("tracked agent");
            assert_eq!(state.phase(), SlidePhase::Idle);
            assert_eq!(state.cell(), GridCoord::new(0, 1));
        }
    }

    #[test]
    fn blocked_and_settled_events_return_agent_to_idle() {
        let (mut movement, agent) = tracked(GridCoord::new(0, 0));
        let _ = tick(&mut movement, STEP, Some(SlideInput::new(agent, Direction::Up)));

        let mut out = Vec::new();
        movement.handle(
            &[Event::SlideBlocked {
                agent,
                at: GridCoord::new(0, 0),
                direction: Direction::Up,
            }],
            None,
            &mut out,
        );

        assert!(out.is_empty());
        let state = movement.slide(agent).copied().expect("tracked agent");
        assert_eq!(state.phase(), SlidePhase::Idle);
        assert_eq!(state.direction(), None);
        assert_eq!(state.glide(), Duration::ZERO);
        assert!(tick(&mut movement, STEP, None).is_empty());
    }

    #[test]
    fn advanced_events_track_committed_cell() {
        let (mut movement, agent) = tracked(GridCoord::new(0, 0));
        let mut out = Vec::new();
        movement.handle(
            &[Event::AgentAdvanced {
                agent,
                from: GridCoord::new(0, 0),
                to: GridCoord::new(0, 1),
            }],
            None,
            &mut out,
        );
        assert_eq!(
            movement.slide(agent).map(SlideState::cell),
            Some(GridCoord::new(0, 1))
        );
    }

    #[test]
    fn untracked_input_is_ignored() {
        let mut movement = Movement::new(Config::new(STEP));
        let commands = tick(
            &mut movement,
            STEP,
            Some(SlideInput::new(AgentId::new(9), Direction::Left)),
        );
        assert!(commands.is_empty());
        assert!(!movement.is_sliding(AgentId::new(9)));
    }

    #[test]
    fn level_clear_forgets_all_agents() {
        let (mut movement, agent) = tracked(GridCoord::new(0, 0));
        let mut out = Vec::new();
        movement.handle(&[Event::LevelCleared], None, &mut out);
        assert!(movement.slide(agent).is_none());
    }
}
