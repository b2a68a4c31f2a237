//! Load-time validation of level descriptions.

use std::collections::HashSet;

use crystal_slide_core::{GridCoord, LevelData, LevelError, TileKind, TileSpec};

use crate::pickups::MAX_PICKUPS;

/// Exit and start cells of the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LevelLayout {
    pub(crate) start: GridCoord,
    pub(crate) exit: GridCoord,
}

/// Checks a level description before any world state is touched.
pub(crate) fn validate(level: &LevelData) -> Result<LevelLayout, LevelError> {
    let (columns, rows) = (level.columns, level.rows);
    if columns == 0 || rows == 0 {
        return Err(LevelError::EmptyGrid { columns, rows });
    }
    if !level.cell_size.is_finite() || level.cell_size <= 0.0 {
        return Err(LevelError::InvalidCellSize {
            cell_size: level.cell_size,
        });
    }
    if !level.start.within(columns, rows) {
        return Err(LevelError::StartOutOfBounds { start: level.start });
    }
    if !level.exit.within(columns, rows) {
        return Err(LevelError::ExitOutOfBounds { exit: level.exit });
    }

    check_pickup_count(
        level
            .tiles
            .iter()
            .filter(|tile| matches!(tile.kind, TileKind::Crystal { .. }))
            .count(),
    )?;

    let mut seen = HashSet::with_capacity(level.tiles.len());
    for tile in &level.tiles {
        if !tile.cell.within(columns, rows) {
            return Err(LevelError::TileOutOfBounds { cell: tile.cell });
        }
        if !seen.insert(tile.cell) {
            return Err(LevelError::DuplicateTile { cell: tile.cell });
        }
        if let TileKind::Crystal { value: 0, .. } = tile.kind {
            return Err(LevelError::InvalidCrystalValue { cell: tile.cell });
        }
        if tile.kind.obstructs() {
            if tile.cell == level.start {
                return Err(LevelError::StartObstructed { start: level.start });
            }
            if tile.cell == level.exit && !marks_exit(level, tile) {
                return Err(LevelError::ExitObstructed { exit: level.exit });
            }
        }
    }

    Ok(LevelLayout {
        start: level.start,
        exit: level.exit,
    })
}

fn check_pickup_count(count: usize) -> Result<(), LevelError> {
    if count > MAX_PICKUPS {
        return Err(LevelError::TooManyPickups { count });
    }
    Ok(())
}

/// A portal tile on the exit cell only marks the exit; it never obstructs.
pub(crate) fn marks_exit(level: &LevelData, tile: &TileSpec) -> bool {
    tile.cell == level.exit && matches!(tile.kind, TileKind::Portal)
}
