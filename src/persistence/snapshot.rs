//! Current snapshot schema and the engine conversions

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::{
    BoosterTimers, CellKind, CellMap, Engine, EnginePhase, GridCoord, GridGeometry, HexCell,
    PhysicsBody, PointerState, ProgressionState, UpgradeLevels, Viewport, WorldGenerator,
};
use crate::stats::Stats;
use crate::tuning::Tuning;

/// Schema version written by this build
pub const SNAPSHOT_VERSION: u32 = 3;

/// Odd 64-bit constant (golden ratio) spreading the frontier over the seed
const RESEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Everything needed to rebuild an [`Engine`]
///
/// Any field may be missing from a stored snapshot. Defaults: zero currency,
/// camera and frontier; baseline levels; no bodies or cells; row height and
/// viewport taken from the viewport the snapshot is restored into. The
/// frontier is never left above a stored cell.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub seed: u64,
    /// Generator state at save time; absent in older saves
    #[serde(default)]
    pub rng: Option<Pcg32>,
    #[serde(default)]
    pub currency: u64,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub levels: UpgradeLevels,
    #[serde(default)]
    pub boosters: BoosterTimers,
    #[serde(default)]
    pub prestige_count: u32,
    #[serde(default)]
    pub camera_y: f64,
    #[serde(default)]
    pub frontier_row: u32,
    /// Non-positive means "derive from the viewport"
    #[serde(default)]
    pub row_height: f64,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    /// Wall-clock ms of the last activity
    #[serde(default)]
    pub last_active_ms: Option<f64>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub bodies: Vec<BodySnapshot>,
    #[serde(default)]
    pub cells: Vec<CellSnapshot>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BodySnapshot {
    pub pos: [f64; 2],
    pub vel: [f64; 2],
    pub radius: f64,
    pub damage: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CellSnapshot {
    pub pos: [f64; 2],
    pub row: i32,
    pub col: i32,
    pub health: u32,
    pub max_health: u32,
    pub value: u64,
    pub hue: f32,
    pub radius: f64,
    pub kind: CellKind,
}

impl From<&PhysicsBody> for BodySnapshot {
    fn from(body: &PhysicsBody) -> Self {
        Self {
            pos: body.pos.to_array(),
            vel: body.vel.to_array(),
            radius: body.radius,
            damage: body.damage,
        }
    }
}

impl From<&HexCell> for CellSnapshot {
    fn from(cell: &HexCell) -> Self {
        Self {
            pos: cell.center.to_array(),
            row: cell.coord.row,
            col: cell.coord.col,
            health: cell.health,
            max_health: cell.max_health,
            value: cell.value,
            hue: cell.hue,
            radius: cell.radius,
            kind: cell.kind,
        }
    }
}

impl CellSnapshot {
    fn into_cell(self) -> HexCell {
        HexCell {
            center: DVec2::from_array(self.pos),
            radius: self.radius,
            coord: GridCoord::new(self.row, self.col),
            health: self.health.min(self.max_health),
            max_health: self.max_health,
            value: self.value,
            hue: self.hue,
            kind: self.kind,
        }
    }
}

impl Snapshot {
    /// Geometry the snapshot was taken with; `fallback` stands in for a
    /// missing viewport
    pub fn saved_geometry(&self, fallback: Viewport) -> GridGeometry {
        let mut geometry = GridGeometry::from_viewport(self.viewport.unwrap_or(fallback));
        if self.row_height.is_finite() && self.row_height > 0.0 {
            geometry.row_height = self.row_height;
        }
        if let Some(cell) = self.cells.first() {
            geometry.cell_radius = cell.radius;
        }
        geometry
    }

    /// First row not yet generated, never above a stored cell
    pub fn frontier(&self) -> u32 {
        let below_cells = self
            .cells
            .iter()
            .map(|c| c.row.saturating_add(1).max(0) as u32)
            .max()
            .unwrap_or(0);
        self.frontier_row.max(below_cells)
    }

    /// Saved generator, or one derived from the seed and the progress made
    /// so a reload does not replay the opening rolls
    pub fn rng(&self) -> Pcg32 {
        self.rng.clone().unwrap_or_else(|| {
            let progress = u64::from(self.frontier()).wrapping_mul(RESEED_MIX);
            Pcg32::seed_from_u64(self.seed ^ progress)
        })
    }
}

impl Engine {
    /// Capture the persistent state, stamped with `now_ms` as last activity
    pub fn snapshot(&self, now_ms: f64) -> Snapshot {
        let last_active_ms = if now_ms.is_finite() {
            Some(now_ms)
        } else {
            self.last_active_ms
        };
        Snapshot {
            version: SNAPSHOT_VERSION,
            seed: self.seed,
            rng: Some(self.rng.clone()),
            currency: self.currency,
            settings: self.settings.clone(),
            levels: self.progression.levels.clone(),
            boosters: self.progression.boosters.clone(),
            prestige_count: self.progression.prestige_count,
            camera_y: self.camera_y,
            frontier_row: self.world.frontier_row,
            row_height: self.geometry.row_height,
            viewport: Some(self.geometry.viewport),
            last_active_ms,
            stats: self.stats.clone(),
            bodies: self.bodies.iter().map(BodySnapshot::from).collect(),
            cells: self.cells.values().map(CellSnapshot::from).collect(),
        }
    }

    /// Rebuild an engine in the menu, remapped onto `viewport` if the
    /// snapshot was taken at a different size
    pub fn restore(snapshot: Snapshot, viewport: Viewport) -> Self {
        Self::restore_with_tuning(snapshot, viewport, Tuning::default())
    }

    pub fn restore_with_tuning(snapshot: Snapshot, viewport: Viewport, tuning: Tuning) -> Self {
        let saved = snapshot.saved_geometry(viewport);
        let frontier_row = snapshot.frontier();
        let rng = snapshot.rng();
        let progression = ProgressionState {
            levels: snapshot.levels.clamped(tuning.max_chance_level),
            boosters: snapshot.boosters.sanitized(&tuning),
            prestige_count: snapshot.prestige_count,
        };

        let gravity = saved.base_gravity() * progression.gravity_multiplier();
        let bodies = snapshot
            .bodies
            .iter()
            .map(|b| {
                let mut body =
                    PhysicsBody::new(DVec2::from_array(b.pos), b.radius, gravity, b.damage);
                body.vel = DVec2::from_array(b.vel);
                body
            })
            .collect();
        let cells: CellMap = snapshot
            .cells
            .into_iter()
            .map(|c| {
                let cell = c.into_cell();
                (cell.coord, cell)
            })
            .collect();

        let mut engine = Self {
            phase: EnginePhase::Menu,
            settings: snapshot.settings.sanitized(),
            geometry: saved,
            bodies,
            cells,
            world: WorldGenerator::with_frontier(frontier_row),
            progression,
            currency: snapshot.currency,
            camera_y: snapshot.camera_y.max(0.0),
            stats: snapshot.stats,
            last_active_ms: snapshot.last_active_ms,
            seed: snapshot.seed,
            notice: None,
            pointer: PointerState::default(),
            suspended_at_ms: None,
            settle_ms: 0.0,
            autosave_ms: 0.0,
            events: Vec::new(),
            rng,
            tuning,
        };

        if engine.bodies.is_empty() {
            engine.spawn_bodies();
        }

        let current = GridGeometry::from_viewport(viewport);
        if current != saved {
            log::info!(
                "Restoring {}x{} snapshot into {}x{}",
                saved.viewport.width,
                saved.viewport.height,
                viewport.width,
                viewport.height
            );
            engine.remap_geometry(&saved, current);
        }
        engine.ensure_frontier();
        engine
    }
}
