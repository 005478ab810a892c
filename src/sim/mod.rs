//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Variable frame time, normalized and split into bounded substeps
//! - Seeded RNG only
//! - Stable iteration order (cells are keyed by grid coordinate)
//! - No rendering or platform dependencies

pub mod body;
pub mod cell;
pub mod chain;
pub mod collision;
pub mod economy;
pub mod geometry;
pub mod input;
pub mod offline;
pub mod progression;
pub mod remap;
pub mod state;
pub mod tick;
pub mod world;

pub use body::PhysicsBody;
pub use cell::{CellKind, CellMap, CellType, GridCoord, HexCell};
pub use chain::{ChainOutcome, resolve_chain};
pub use collision::{CollisionResult, circle_hex_collision, resolve_contact};
pub use geometry::{GridGeometry, Viewport};
pub use input::InputEvent;
pub use offline::{OfflineEstimate, OfflineModel};
pub use progression::{BoosterTimers, ProgressionState, UpgradeLevels, UpgradeTrack};
pub use state::{Engine, EnginePhase, GameEvent, Notice, PointerState};
pub use world::WorldGenerator;
