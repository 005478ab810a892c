//! Hexfall - idle drilling simulation core
//!
//! Core modules:
//! - `sim`: Simulation (physics, hex collisions, world generation, economy)
//! - `persistence`: Versioned snapshots with migration and validation
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences carried in the snapshot
//! - `stats`: Run and lifetime statistics

pub mod error;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod stats;
pub mod tuning;

pub use error::{PersistError, PurchaseError, TuningError};
pub use settings::Settings;
pub use sim::{Engine, EnginePhase, GameEvent, InputEvent, Viewport};
pub use stats::Stats;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    use glam::DVec2;

    /// Frame duration the time scale is normalized against (60 Hz)
    pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per advance to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest time scale integrated in a single substep
    pub const MAX_SUBSTEP_SCALE: f64 = 1.0;

    /// Shaft layout
    pub const GRID_COLUMNS: u32 = 9;
    pub const MAX_SHAFT_WIDTH: f64 = 720.0;
    pub const MIN_SHAFT_WIDTH: f64 = 90.0;
    /// Row 0 sits this far down the first screen
    pub const FIRST_ROW_FRACTION: f64 = 0.5;
    /// Hex circumradius relative to a touching hex (leaves a thin mortar gap)
    pub const CELL_FILL: f64 = 0.96;

    /// Body defaults, relative to the cell radius
    pub const BODY_RADIUS_FACTOR: f64 = 0.45;
    pub const BASE_GRAVITY_FACTOR: f64 = 0.012;
    /// Per-frame speed bound: keeps bodies from tunneling through a cell
    pub const MAX_STEP_SPEED_FACTOR: f64 = 0.8;
    pub const BODY_RESTITUTION: f64 = 0.55;
    /// Horizontal jitter added on a bounce, relative to the cell radius
    pub const CONTACT_JITTER_FACTOR: f64 = 0.02;
    /// Wall hits slower than this stay silent
    pub const WALL_IMPACT_EVENT_SPEED: f64 = 0.5;
    /// Normal used when a body center sits exactly on a cell boundary (y grows downward)
    pub const UPWARD_NORMAL: DVec2 = DVec2::new(0.0, -1.0);

    /// Camera keeps the deepest body this far down the screen
    pub const CAMERA_ANCHOR: f64 = 0.35;
    pub const CAMERA_FOLLOW_RATE: f64 = 0.1;
    /// Screens of terrain generated below the visible area
    pub const LOOKAHEAD_SCREENS: f64 = 1.0;
    /// Rows kept above the shallowest body before culling
    pub const CULL_ROWS_BEHIND: i32 = 24;

    /// Physics is suspended this long after a resize
    pub const RESIZE_SETTLE_MS: f64 = 150.0;
    pub const NOTICE_DURATION_MS: f64 = 2000.0;
    pub const AUTOSAVE_INTERVAL_MS: f64 = 5000.0;
    /// Velocity kept when the viewport changes on the menu screen
    pub const MENU_VELOCITY_DAMPING: f64 = 0.5;
}

/// Normalized time scale: elapsed milliseconds over the reference frame
#[inline]
pub fn time_scale(dt_ms: f64) -> f64 {
    dt_ms / consts::REFERENCE_FRAME_MS
}

/// Hit points of a freshly generated cell on `row`
#[inline]
pub fn row_health(row: u32) -> u32 {
    1 + (row as f64 * 0.2).floor() as u32
}

/// Reward value of a freshly generated cell on `row`
#[inline]
pub fn row_value(row: u32) -> u64 {
    10 + (row as f64 * 0.5).floor() as u64
}

/// Cosmetic hue in degrees; depends on depth only
#[inline]
pub fn row_hue(row: u32) -> f32 {
    ((row as f32) * 2.5 + 20.0) % 360.0
}
