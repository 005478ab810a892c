//! Offline progress estimate
//!
//! A coarse throughput model evaluated at the current frontier depth, not a
//! replay of the simulation.

use crate::tuning::Tuning;
use crate::{row_health, row_value};

/// Inputs of the throughput model
#[derive(Debug, Clone, Copy)]
pub struct OfflineModel {
    pub body_count: usize,
    /// Damage per hit, boosters excluded
    pub damage: u32,
    /// Reward-efficiency multiplier
    pub efficiency: f64,
    /// Depth the estimate is evaluated at
    pub frontier_row: u32,
}

/// What the estimator credited
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineEstimate {
    /// Elapsed time actually used, after the cap
    pub elapsed_ms: f64,
    pub reward: u64,
}

/// Clamp elapsed wall-clock time into `[0, cap]`
pub fn capped_elapsed_ms(elapsed_ms: f64, tuning: &Tuning) -> f64 {
    if elapsed_ms.is_finite() {
        elapsed_ms.clamp(0.0, tuning.offline_cap_ms)
    } else {
        0.0
    }
}

/// Estimated reward per second of absence
pub fn reward_per_second(model: &OfflineModel, tuning: &Tuning) -> f64 {
    let avg_health = row_health(model.frontier_row) as f64;
    let avg_value = row_value(model.frontier_row) as f64;
    let damage_per_second =
        model.body_count as f64 * model.damage as f64 * tuning.offline_hits_per_second;
    let cells_per_second = damage_per_second / avg_health;
    cells_per_second * avg_value * model.efficiency
}

/// Estimate the reward for `elapsed_ms` of absence
pub fn estimate(elapsed_ms: f64, model: &OfflineModel, tuning: &Tuning) -> OfflineEstimate {
    let elapsed_ms = capped_elapsed_ms(elapsed_ms, tuning);
    let reward = reward_per_second(model, tuning) * elapsed_ms / 1000.0;
    OfflineEstimate {
        elapsed_ms,
        reward: if reward.is_finite() && reward > 0.0 {
            reward.floor() as u64
        } else {
            0
        },
    }
}
