//! Endless world generation
//!
//! Rows are generated in batches ahead of the deepest point the camera or any
//! body needs. Cell types are rolled lazily: once per cell, the first time a
//! body comes within the reveal distance (or at creation if one already is).

use rand::Rng;
use rand_pcg::Pcg32;

use super::body::PhysicsBody;
use super::cell::{CellKind, CellMap, CellType, GridCoord, HexCell};
use super::geometry::GridGeometry;
use super::progression::{ProgressionState, UpgradeTrack};
use crate::consts::GRID_COLUMNS;
use crate::tuning::Tuning;

/// Frontier bookkeeping for the generated part of the shaft
#[derive(Debug, Clone, PartialEq)]
pub struct WorldGenerator {
    /// Rows `0..frontier_row` have been generated
    pub frontier_row: u32,
}

impl Default for WorldGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldGenerator {
    pub fn new() -> Self {
        Self { frontier_row: 0 }
    }

    pub fn with_frontier(frontier_row: u32) -> Self {
        Self { frontier_row }
    }

    /// World y just past the last generated row
    pub fn frontier_y(&self, geometry: &GridGeometry) -> f64 {
        geometry.row_y(self.frontier_row as i32)
    }

    /// Generate batches until terrain reaches `required_y`.
    ///
    /// Returns the number of batches generated.
    pub fn ensure_frontier(&mut self, required_y: f64, ctx: &mut GenContext<'_>) -> u32 {
        let mut batches = 0;
        while self.frontier_y(ctx.geometry) <= required_y {
            self.generate_batch(ctx);
            batches += 1;
        }
        if batches > 0 {
            log::debug!(
                "Generated {} batch(es), frontier now row {}",
                batches,
                self.frontier_row
            );
        }
        batches
    }

    /// Generate the next `rows_per_batch` rows
    pub fn generate_batch(&mut self, ctx: &mut GenContext<'_>) {
        let first = self.frontier_row;
        let last = first.saturating_add(ctx.tuning.rows_per_batch.max(1));
        for row in first..last {
            for col in 0..GRID_COLUMNS as i32 {
                let coord = GridCoord::new(row as i32, col);
                let mut cell = HexCell::new(coord, ctx.geometry);
                if within_reveal(&cell, ctx.bodies, ctx.reveal_distance) {
                    cell.kind = roll_kind(&cell, ctx.geometry, ctx.progression, ctx.tuning, ctx.rng);
                }
                ctx.cells.insert(coord, cell);
            }
        }
        self.frontier_row = last;
    }
}

/// Everything generation reads, borrowed from the engine for one call
pub struct GenContext<'a> {
    pub cells: &'a mut CellMap,
    pub bodies: &'a [PhysicsBody],
    pub geometry: &'a GridGeometry,
    pub progression: &'a ProgressionState,
    pub tuning: &'a Tuning,
    pub rng: &'a mut Pcg32,
    /// Vertical distance at which a pending cell gets its type
    pub reveal_distance: f64,
}

fn within_reveal(cell: &HexCell, bodies: &[PhysicsBody], reveal_distance: f64) -> bool {
    bodies
        .iter()
        .any(|b| (b.pos.y - cell.center.y).abs() <= reveal_distance)
}

/// Roll a special type: damage booster, then explosive, then reward booster;
/// first success wins
pub fn roll_cell_type(
    progression: &ProgressionState,
    tuning: &Tuning,
    rng: &mut Pcg32,
) -> CellType {
    const ORDER: [(UpgradeTrack, CellType); 3] = [
        (UpgradeTrack::DamageBoosterChance, CellType::DamageBooster),
        (UpgradeTrack::ExplosiveChance, CellType::Explosive),
        (UpgradeTrack::RewardBoosterChance, CellType::RewardBooster),
    ];
    for (track, cell_type) in ORDER {
        let chance = progression.chance(track, tuning);
        if chance > 0.0 && rng.random::<f64>() < chance {
            return cell_type;
        }
    }
    CellType::Normal
}

/// Resolved kind for a cell; cells outside the shaft never roll
pub fn roll_kind(
    cell: &HexCell,
    geometry: &GridGeometry,
    progression: &ProgressionState,
    tuning: &Tuning,
    rng: &mut Pcg32,
) -> CellKind {
    if geometry.contains_x(cell.center.x) {
        CellKind::Resolved(roll_cell_type(progression, tuning, rng))
    } else {
        CellKind::Resolved(CellType::Normal)
    }
}

/// Resolve pending cells near any body.
///
/// Returns how many cells were resolved.
pub fn resolve_pending(ctx: &mut GenContext<'_>) -> usize {
    let Some((min_y, max_y)) = body_y_span(ctx.bodies) else {
        return 0;
    };
    let first_row = ctx.geometry.row_at(min_y - ctx.reveal_distance).floor() as i32;
    let last_row = ctx.geometry.row_at(max_y + ctx.reveal_distance).ceil() as i32;

    let mut resolved = 0;
    let range = GridCoord::row_start(first_row)..=GridCoord::row_end(last_row);
    for cell in ctx.cells.range_mut(range).map(|(_, c)| c) {
        if cell.kind.is_pending() && within_reveal(cell, ctx.bodies, ctx.reveal_distance) {
            cell.kind = roll_kind(cell, ctx.geometry, ctx.progression, ctx.tuning, ctx.rng);
            resolved += 1;
        }
    }
    resolved
}

/// Re-roll every resolved in-bounds cell after a chance upgrade
pub fn reroll_resolved(ctx: &mut GenContext<'_>) -> usize {
    let mut rerolled = 0;
    for cell in ctx.cells.values_mut() {
        if !cell.kind.is_pending() && ctx.geometry.contains_x(cell.center.x) {
            cell.kind = CellKind::Resolved(roll_cell_type(ctx.progression, ctx.tuning, ctx.rng));
            rerolled += 1;
        }
    }
    rerolled
}

/// Drop rows far above every body; returns how many cells were removed
pub fn cull_behind(
    cells: &mut CellMap,
    bodies: &[PhysicsBody],
    geometry: &GridGeometry,
    rows_behind: i32,
) -> usize {
    let Some((min_y, _)) = body_y_span(bodies) else {
        return 0;
    };
    let keep_from = geometry.row_at(min_y).floor() as i32 - rows_behind;
    let kept = cells.split_off(&GridCoord::row_start(keep_from));
    let removed = cells.len();
    *cells = kept;
    removed
}

fn body_y_span(bodies: &[PhysicsBody]) -> Option<(f64, f64)> {
    bodies.iter().fold(None, |span, b| match span {
        None => Some((b.pos.y, b.pos.y)),
        Some((lo, hi)) => Some((lo.min(b.pos.y), hi.max(b.pos.y))),
    })
}
