//! Engine state and core simulation types
//!
//! Everything that must round-trip through a snapshot lives on [`Engine`].
//! The caller owns the engine and drives it with `advance`, input events and
//! lifecycle calls; there is no shared global instance.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::PhysicsBody;
use super::cell::{CellMap, CellType, GridCoord};
use super::geometry::{GridGeometry, Viewport};
use super::progression::{ProgressionState, UpgradeTrack};
use super::world::{GenContext, WorldGenerator};
use crate::consts::*;
use crate::error::PurchaseError;
use crate::settings::Settings;
use crate::stats::Stats;
use crate::tuning::Tuning;

/// Engine lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Pre-game menu; the world is shown but frozen
    Menu,
    /// The only phase in which physics, generation and autosave run
    Playing,
    Paused,
}

/// Side effects for the presentation layer (audio, particles, HUD)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WallImpact {
        body: usize,
        speed: f64,
    },
    CellHit {
        coord: GridCoord,
        remaining: u32,
    },
    CellDestroyed {
        coord: GridCoord,
        cell_type: Option<CellType>,
        reward: u64,
    },
    ChainReaction {
        origin: GridCoord,
        destroyed: usize,
    },
    /// A booster cell was destroyed; `cell_type` says which timer restarted
    BoosterTriggered {
        cell_type: CellType,
        duration_ms: f64,
    },
    UpgradePurchased {
        track: UpgradeTrack,
        level: u32,
        cost: u64,
    },
    PurchaseRejected(PurchaseError),
    Prestige {
        count: u32,
    },
    OfflineReward {
        elapsed_ms: f64,
        reward: u64,
    },
    Resized {
        viewport: Viewport,
    },
    /// Time to take a snapshot
    AutosaveDue,
    NewDepthRecord {
        row: u32,
    },
}

/// Short-lived message shown to the player
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub remaining_ms: f64,
}

/// Last known pointer state, in world coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerState {
    pub position: Option<DVec2>,
    pub pressed: bool,
    /// Live cell under the pointer
    pub hovered: Option<GridCoord>,
}

/// The simulation: bodies, cells, economy and lifecycle
#[derive(Debug, Clone)]
pub struct Engine {
    pub phase: EnginePhase,
    pub tuning: Tuning,
    pub settings: Settings,
    pub geometry: GridGeometry,
    pub bodies: Vec<PhysicsBody>,
    pub cells: CellMap,
    pub world: WorldGenerator,
    pub progression: ProgressionState,
    pub currency: u64,
    /// World y of the top of the screen
    pub camera_y: f64,
    pub stats: Stats,
    /// Wall-clock time (ms) the player was last seen
    pub last_active_ms: Option<f64>,
    pub seed: u64,
    pub notice: Option<Notice>,
    pub pointer: PointerState,
    pub(crate) suspended_at_ms: Option<f64>,
    /// Remaining resize settle window; physics is skipped while > 0
    pub(crate) settle_ms: f64,
    pub(crate) autosave_ms: f64,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
}

impl Engine {
    /// Fresh run in the menu, with terrain generated for the first screen
    pub fn new(viewport: Viewport, seed: u64) -> Self {
        Self::with_tuning(viewport, seed, Tuning::default())
    }

    pub fn with_tuning(viewport: Viewport, seed: u64, tuning: Tuning) -> Self {
        let mut engine = Self {
            phase: EnginePhase::Menu,
            tuning,
            settings: Settings::default(),
            geometry: GridGeometry::from_viewport(viewport),
            bodies: Vec::new(),
            cells: CellMap::new(),
            world: WorldGenerator::new(),
            progression: ProgressionState::default(),
            currency: 0,
            camera_y: 0.0,
            stats: Stats::default(),
            last_active_ms: None,
            seed,
            notice: None,
            pointer: PointerState::default(),
            suspended_at_ms: None,
            settle_ms: 0.0,
            autosave_ms: 0.0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        };
        engine.spawn_bodies();
        engine.camera_y = engine.camera_target();
        engine.ensure_frontier();
        engine
    }

    /// Replace all bodies with a fresh set for the current prestige count
    pub fn spawn_bodies(&mut self) {
        let count = self.progression.body_count();
        let g = &self.geometry;
        let y = g.row_y(-2);
        let gravity = g.base_gravity() * self.progression.gravity_multiplier();
        let damage = self.progression.base_damage();
        self.bodies = (0..count)
            .map(|i| {
                let x = g.shaft_left + g.shaft_width * (i + 1) as f64 / (count + 1) as f64;
                PhysicsBody::new(DVec2::new(x, y), g.body_radius(), gravity, damage)
            })
            .collect();
    }

    pub fn viewport(&self) -> Viewport {
        self.geometry.viewport
    }

    /// Vertical distance within which pending cells get their type
    #[inline]
    pub fn reveal_distance(&self) -> f64 {
        self.geometry.viewport.height
    }

    /// Deepest body position, if any body exists
    pub fn deepest_body_y(&self) -> Option<f64> {
        self.bodies.iter().map(|b| b.pos.y).reduce(f64::max)
    }

    /// Deepest row any body currently occupies
    pub fn depth_row(&self) -> u32 {
        self.deepest_body_y()
            .map(|y| self.geometry.row_at(y).floor().max(0.0) as u32)
            .unwrap_or(0)
    }

    /// Camera position that keeps the deepest body at the anchor line
    pub fn camera_target(&self) -> f64 {
        let anchor = self.geometry.viewport.height * CAMERA_ANCHOR;
        self.deepest_body_y()
            .map(|y| y - anchor)
            .unwrap_or(0.0)
            .max(0.0)
    }

    /// World y terrain must reach before bodies are allowed to move
    pub fn required_depth_y(&self) -> f64 {
        let height = self.geometry.viewport.height;
        let camera_bottom = self.camera_y + height;
        let deepest = self.deepest_body_y().unwrap_or(camera_bottom);
        camera_bottom.max(deepest) + height * LOOKAHEAD_SCREENS
    }

    /// Generate terrain up to the look-ahead line
    pub fn ensure_frontier(&mut self) -> u32 {
        let required = self.required_depth_y();
        let (world, mut ctx) = self.gen_parts();
        world.ensure_frontier(required, &mut ctx)
    }

    /// Split the engine into the generator and its borrowed context
    pub(crate) fn gen_parts(&mut self) -> (&mut WorldGenerator, GenContext<'_>) {
        let reveal_distance = self.reveal_distance();
        let Self {
            world,
            cells,
            bodies,
            geometry,
            progression,
            tuning,
            rng,
            ..
        } = self;
        let ctx = GenContext {
            cells,
            bodies: bodies.as_slice(),
            geometry,
            progression,
            tuning,
            rng,
            reveal_distance,
        };
        (world, ctx)
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at_ms.is_some()
    }

    /// Whether physics is currently held by a resize
    pub fn is_settling(&self) -> bool {
        self.settle_ms > 0.0
    }

    /// Show a transient message
    pub fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            message: message.into(),
            remaining_ms: NOTICE_DURATION_MS,
        });
    }

    pub(crate) fn decay_notice(&mut self, dt_ms: f64) {
        if let Some(notice) = &mut self.notice {
            notice.remaining_ms -= dt_ms;
            if notice.remaining_ms <= 0.0 {
                self.notice = None;
            }
        }
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
