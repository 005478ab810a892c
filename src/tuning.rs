//! Data-driven game balance
//!
//! Every field defaults to the shipped balance, so a JSON override only needs
//! the values it changes.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Geometric price curve: `base_cost × growth_rate^exponent`, floored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostCurve {
    pub base_cost: u64,
    pub growth_rate: f64,
}

impl CostCurve {
    pub const fn new(base_cost: u64, growth_rate: f64) -> Self {
        Self {
            base_cost,
            growth_rate,
        }
    }

    /// Price at the given exponent, rounded down
    pub fn at(&self, exponent: u32) -> u64 {
        let raw = self.base_cost as f64 * self.growth_rate.powi(exponent as i32);
        if raw.is_finite() && raw < u64::MAX as f64 {
            raw.floor() as u64
        } else {
            u64::MAX
        }
    }
}

/// Cost curves for each upgrade track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub damage: CostCurve,
    pub gravity: CostCurve,
    pub reward_efficiency: CostCurve,
    pub damage_booster_chance: CostCurve,
    pub reward_booster_chance: CostCurve,
    pub explosive_chance: CostCurve,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            damage: CostCurve::new(50, 1.5),
            gravity: CostCurve::new(75, 1.6),
            reward_efficiency: CostCurve::new(100, 1.7),
            damage_booster_chance: CostCurve::new(200, 2.0),
            reward_booster_chance: CostCurve::new(200, 2.0),
            explosive_chance: CostCurve::new(300, 2.2),
        }
    }
}

/// Balance knobs read by the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Rows generated per world batch
    pub rows_per_batch: u32,
    /// Damage booster duration (ms)
    pub damage_booster_ms: f64,
    /// Reward booster duration (ms)
    pub reward_booster_ms: f64,
    /// Multiplier applied while a booster runs
    pub booster_multiplier: f64,
    /// Special-cell chance granted per level of a chance track
    pub chance_per_level: f64,
    /// Level cap of the chance tracks
    pub max_chance_level: u32,
    pub costs: CostTable,
    /// Offline model: assumed hits per second per body
    pub offline_hits_per_second: f64,
    /// Offline model: elapsed time ceiling (ms)
    pub offline_cap_ms: f64,
    /// Deepest row a run must reach per prestige already taken
    pub prestige_depth_rows: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            rows_per_batch: 10,
            damage_booster_ms: 10_000.0,
            reward_booster_ms: 10_000.0,
            booster_multiplier: 2.0,
            chance_per_level: 0.01,
            max_chance_level: 10,
            costs: CostTable::default(),
            offline_hits_per_second: 2.0,
            offline_cap_ms: 24.0 * 60.0 * 60.0 * 1000.0,
            prestige_depth_rows: 150,
        }
    }
}

impl Tuning {
    /// Parse a JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would stall generation or break the cost curves
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.rows_per_batch == 0 {
            return Err(TuningError::OutOfRange {
                field: "rows_per_batch",
                value: 0.0,
                expected: ">= 1",
            });
        }
        for (field, value) in [
            ("damage_booster_ms", self.damage_booster_ms),
            ("reward_booster_ms", self.reward_booster_ms),
            ("offline_hits_per_second", self.offline_hits_per_second),
            ("offline_cap_ms", self.offline_cap_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TuningError::OutOfRange {
                    field,
                    value,
                    expected: "finite, >= 0",
                });
            }
        }
        if !self.booster_multiplier.is_finite() || self.booster_multiplier < 1.0 {
            return Err(TuningError::OutOfRange {
                field: "booster_multiplier",
                value: self.booster_multiplier,
                expected: ">= 1",
            });
        }
        if !(0.0..=1.0).contains(&self.chance_per_level) {
            return Err(TuningError::OutOfRange {
                field: "chance_per_level",
                value: self.chance_per_level,
                expected: "0..=1",
            });
        }
        let costs = &self.costs;
        for (field, curve) in [
            ("costs.damage", costs.damage),
            ("costs.gravity", costs.gravity),
            ("costs.reward_efficiency", costs.reward_efficiency),
            ("costs.damage_booster_chance", costs.damage_booster_chance),
            ("costs.reward_booster_chance", costs.reward_booster_chance),
            ("costs.explosive_chance", costs.explosive_chance),
        ] {
            // Growth must be large enough that flooring still yields a strictly rising price
            if !curve.growth_rate.is_finite()
                || curve.growth_rate <= 1.0
                || (curve.base_cost as f64) * (curve.growth_rate - 1.0) < 1.0
            {
                return Err(TuningError::OutOfRange {
                    field,
                    value: curve.growth_rate,
                    expected: "> 1 with base_cost × (growth_rate − 1) >= 1",
                });
            }
        }
        Ok(())
    }
}
