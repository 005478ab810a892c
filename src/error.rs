//! Error types
//!
//! Nothing here is fatal: callers degrade to a safe default (fresh world,
//! rejected purchase with a notice, default tuning).

use thiserror::Error;

use crate::sim::UpgradeTrack;

/// Snapshot decode/validation failure
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot root must be a JSON object")]
    NotAnObject,
    #[error("unsupported snapshot version {found} (newest known is {newest})")]
    UnsupportedVersion { found: u64, newest: u32 },
    #[error("snapshot failed validation: {0}")]
    Invalid(String),
}

/// A purchase or prestige the player cannot make right now.
///
/// The `Display` text is what the transient notice shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Not enough currency: {track} costs {cost}, you have {available}")]
    InsufficientFunds {
        track: UpgradeTrack,
        cost: u64,
        available: u64,
    },
    #[error("{track} is already at max level")]
    MaxLevel { track: UpgradeTrack },
    #[error("Reach row {required} to prestige (deepest so far: {reached})")]
    PrestigeLocked { required: u32, reached: u32 },
}

/// Rejected balance configuration
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tuning value `{field}` = {value} is out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}
