#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Crystal Slide levels from files.

mod progress_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crystal_slide_core::{Direction, LevelData, Notification};
use crystal_slide_session::{Session, SessionConfig};
use crystal_slide_world::query;
use log::info;
use serde::Deserialize;

/// Command-line arguments for the Crystal Slide host.
#[derive(Debug, Parser)]
#[command(name = "crystal-slide", about = "Plays a Crystal Slide level from the terminal")]
struct CliArgs {
    /// Level description in TOML.
    #[arg(long, value_name = "FILE")]
    level: PathBuf,
    /// Session configuration in TOML. Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Comma-separated swipes to play, e.g. `up,right,down`.
    #[arg(long, value_enum, value_delimiter = ',')]
    moves: Vec<Swipe>,
    /// Ticks simulated after each swipe, each lasting one step.
    #[arg(long, default_value_t = 32, value_name = "COUNT")]
    ticks_per_move: u32,
    /// Progress string printed by a previous run.
    #[arg(long, value_name = "STRING")]
    progress: Option<String>,
}

/// Swipe directions accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Swipe {
    Up,
    Down,
    Left,
    Right,
}

impl From<Swipe> for Direction {
    fn from(swipe: Swipe) -> Self {
        match swipe {
            Swipe::Up => Direction::Up,
            Swipe::Down => Direction::Down,
            Swipe::Left => Direction::Left,
            Swipe::Right => Direction::Right,
        }
    }
}

/// Level file layout: level data plus an optional display name.
#[derive(Debug, Deserialize)]
struct LevelFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    level: LevelData,
}

/// Entry point for the Crystal Slide command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    let level_file = load_level(&args.level)?;

    let mut session = Session::new(&config);
    if let Some(encoded) = &args.progress {
        let snapshot =
            progress_transfer::decode(encoded).context("failed to decode progress string")?;
        session.restore_progress(&snapshot);
    }

    let mut notifications = Vec::new();
    session
        .build_level(level_file.level, &mut notifications)
        .with_context(|| format!("level {} was rejected", args.level.display()))?;
    println!(
        "playing {} (level {}, {} lives)",
        level_file.name.as_deref().unwrap_or("unnamed level"),
        session.progression().level(),
        session.progression().lives()
    );
    print_notifications(&mut notifications);

    let step = config.step_duration();
    for swipe in &args.moves {
        session.submit_input(Direction::from(*swipe));
        for _ in 0..args.ticks_per_move {
            session.tick(step, &mut notifications);
        }
        print_notifications(&mut notifications);
        if let Some(cell) = session
            .player()
            .and_then(|player| query::agent_cell(session.world(), player))
        {
            println!("{swipe:?} -> {cell}");
        }
    }

    let encoded = progress_transfer::encode(&session.progress())
        .context("failed to encode progress string")?;
    info!("{} crystals remaining", query::remaining_pickups(session.world()));
    println!("progress: {encoded}");
    Ok(())
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config in {}", path.display()))
}

fn parse_config(contents: &str) -> Result<SessionConfig> {
    toml::from_str(contents).context("failed to parse session config toml contents")
}

fn load_level(path: &Path) -> Result<LevelFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level at {}", path.display()))?;
    parse_level(&contents).with_context(|| format!("invalid level in {}", path.display()))
}

fn parse_level(contents: &str) -> Result<LevelFile> {
    toml::from_str(contents).context("failed to parse level toml contents")
}

fn print_notifications(notifications: &mut Vec<Notification>) {
    for notification in notifications.drain(..) {
        println!("{}", describe(notification));
    }
}

fn describe(notification: Notification) -> String {
    match notification {
        Notification::CrystalCollected { crystal, total } => {
            format!("collected a {crystal:?} crystal ({total} total)")
        }
        Notification::AbilityUnlocked { crystal } => {
            format!("unlocked {}", crystal.ability_name())
        }
        Notification::LevelCompleted { level } => format!("level {level} complete"),
        Notification::LifeLost { remaining } => format!("life lost, {remaining} remaining"),
        Notification::LifeGained { lives } => format!("life gained, {lives} lives"),
        Notification::GameOver => "game over".to_owned(),
    }
}
