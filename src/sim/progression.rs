//! Upgrade levels, cost curves, booster timers and prestige count

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tuning::{CostCurve, Tuning};

/// Purchasable upgrade tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeTrack {
    Damage,
    Gravity,
    RewardEfficiency,
    DamageBoosterChance,
    RewardBoosterChance,
    ExplosiveChance,
}

impl UpgradeTrack {
    pub const ALL: [UpgradeTrack; 6] = [
        UpgradeTrack::Damage,
        UpgradeTrack::Gravity,
        UpgradeTrack::RewardEfficiency,
        UpgradeTrack::DamageBoosterChance,
        UpgradeTrack::RewardBoosterChance,
        UpgradeTrack::ExplosiveChance,
    ];

    /// Chance tracks stop at a level cap
    pub fn is_capped(&self) -> bool {
        matches!(
            self,
            UpgradeTrack::DamageBoosterChance
                | UpgradeTrack::RewardBoosterChance
                | UpgradeTrack::ExplosiveChance
        )
    }

    /// Level a fresh run starts at
    pub fn baseline(&self) -> u32 {
        if self.is_capped() { 0 } else { 1 }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpgradeTrack::Damage => "Damage",
            UpgradeTrack::Gravity => "Gravity",
            UpgradeTrack::RewardEfficiency => "Reward efficiency",
            UpgradeTrack::DamageBoosterChance => "Damage booster chance",
            UpgradeTrack::RewardBoosterChance => "Reward booster chance",
            UpgradeTrack::ExplosiveChance => "Explosive chance",
        }
    }

    fn curve<'a>(&self, tuning: &'a Tuning) -> &'a CostCurve {
        let costs = &tuning.costs;
        match self {
            UpgradeTrack::Damage => &costs.damage,
            UpgradeTrack::Gravity => &costs.gravity,
            UpgradeTrack::RewardEfficiency => &costs.reward_efficiency,
            UpgradeTrack::DamageBoosterChance => &costs.damage_booster_chance,
            UpgradeTrack::RewardBoosterChance => &costs.reward_booster_chance,
            UpgradeTrack::ExplosiveChance => &costs.explosive_chance,
        }
    }
}

impl fmt::Display for UpgradeTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current level of every track; missing tracks load at their baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    pub damage: u32,
    pub gravity: u32,
    pub reward_efficiency: u32,
    pub damage_booster_chance: u32,
    pub reward_booster_chance: u32,
    pub explosive_chance: u32,
}

impl Default for UpgradeLevels {
    fn default() -> Self {
        Self {
            damage: UpgradeTrack::Damage.baseline(),
            gravity: UpgradeTrack::Gravity.baseline(),
            reward_efficiency: UpgradeTrack::RewardEfficiency.baseline(),
            damage_booster_chance: UpgradeTrack::DamageBoosterChance.baseline(),
            reward_booster_chance: UpgradeTrack::RewardBoosterChance.baseline(),
            explosive_chance: UpgradeTrack::ExplosiveChance.baseline(),
        }
    }
}

impl UpgradeLevels {
    pub fn get(&self, track: UpgradeTrack) -> u32 {
        match track {
            UpgradeTrack::Damage => self.damage,
            UpgradeTrack::Gravity => self.gravity,
            UpgradeTrack::RewardEfficiency => self.reward_efficiency,
            UpgradeTrack::DamageBoosterChance => self.damage_booster_chance,
            UpgradeTrack::RewardBoosterChance => self.reward_booster_chance,
            UpgradeTrack::ExplosiveChance => self.explosive_chance,
        }
    }

    fn get_mut(&mut self, track: UpgradeTrack) -> &mut u32 {
        match track {
            UpgradeTrack::Damage => &mut self.damage,
            UpgradeTrack::Gravity => &mut self.gravity,
            UpgradeTrack::RewardEfficiency => &mut self.reward_efficiency,
            UpgradeTrack::DamageBoosterChance => &mut self.damage_booster_chance,
            UpgradeTrack::RewardBoosterChance => &mut self.reward_booster_chance,
            UpgradeTrack::ExplosiveChance => &mut self.explosive_chance,
        }
    }

    /// Bring every level back inside its valid range
    pub fn clamped(mut self, max_chance_level: u32) -> Self {
        for track in UpgradeTrack::ALL {
            let level = self.get_mut(track);
            *level = (*level).max(track.baseline());
            if track.is_capped() {
                *level = (*level).min(max_chance_level);
            }
        }
        self
    }
}

/// Remaining time on the two boosters (ms)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoosterTimers {
    pub damage_ms: f64,
    pub reward_ms: f64,
}

impl BoosterTimers {
    /// Restart the damage booster; refreshes rather than stacks
    pub fn refresh_damage(&mut self, duration_ms: f64) {
        self.damage_ms = duration_ms;
    }

    /// Restart the reward booster; refreshes rather than stacks
    pub fn refresh_reward(&mut self, duration_ms: f64) {
        self.reward_ms = duration_ms;
    }

    /// Count both timers down
    pub fn tick(&mut self, elapsed_ms: f64) {
        self.damage_ms = (self.damage_ms - elapsed_ms).max(0.0);
        self.reward_ms = (self.reward_ms - elapsed_ms).max(0.0);
    }

    #[inline]
    pub fn damage_active(&self) -> bool {
        self.damage_ms > 0.0
    }

    #[inline]
    pub fn reward_active(&self) -> bool {
        self.reward_ms > 0.0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drop negative or non-finite values from an old save
    pub fn sanitized(self, tuning: &Tuning) -> Self {
        let clamp = |v: f64, max: f64| if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };
        Self {
            damage_ms: clamp(self.damage_ms, tuning.damage_booster_ms),
            reward_ms: clamp(self.reward_ms, tuning.reward_booster_ms),
        }
    }
}

/// Upgrade levels, booster timers and prestige count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressionState {
    pub levels: UpgradeLevels,
    pub boosters: BoosterTimers,
    pub prestige_count: u32,
}

impl ProgressionState {
    #[inline]
    pub fn level(&self, track: UpgradeTrack) -> u32 {
        self.levels.get(track)
    }

    pub fn is_maxed(&self, track: UpgradeTrack, tuning: &Tuning) -> bool {
        track.is_capped() && self.level(track) >= tuning.max_chance_level
    }

    /// Price of the next level; `None` once a capped track is maxed
    pub fn cost(&self, track: UpgradeTrack, tuning: &Tuning) -> Option<u64> {
        if self.is_maxed(track, tuning) {
            return None;
        }
        let level = self.level(track);
        let exponent = if track.is_capped() {
            level
        } else {
            level.saturating_sub(1)
        };
        Some(track.curve(tuning).at(exponent))
    }

    /// Raise a track by one level
    pub fn increment(&mut self, track: UpgradeTrack) {
        let level = self.levels.get_mut(track);
        *level = level.saturating_add(1);
    }

    /// Damage dealt per hit before boosters
    #[inline]
    pub fn base_damage(&self) -> u32 {
        self.levels.damage.max(1)
    }

    #[inline]
    pub fn gravity_multiplier(&self) -> f64 {
        1.0 + self.levels.gravity.saturating_sub(1) as f64 * 0.1
    }

    /// Reward-efficiency multiplier
    #[inline]
    pub fn reward_multiplier(&self) -> f64 {
        1.0 + self.levels.reward_efficiency.saturating_sub(1) as f64 * 0.2
    }

    pub fn damage_booster_multiplier(&self, tuning: &Tuning) -> f64 {
        if self.boosters.damage_active() {
            tuning.booster_multiplier
        } else {
            1.0
        }
    }

    pub fn reward_booster_multiplier(&self, tuning: &Tuning) -> f64 {
        if self.boosters.reward_active() {
            tuning.booster_multiplier
        } else {
            1.0
        }
    }

    /// Damage per hit including the damage booster
    pub fn effective_damage(&self, tuning: &Tuning) -> u32 {
        let boosted = self.base_damage() as f64 * self.damage_booster_multiplier(tuning);
        (boosted.ceil() as u32).max(1)
    }

    /// Currency credited for destroying a cell worth `value`
    pub fn reward_for(&self, value: u64, tuning: &Tuning) -> u64 {
        let raw = value as f64 * self.reward_multiplier() * self.reward_booster_multiplier(tuning);
        raw.ceil() as u64
    }

    /// Spawn probability contributed by a chance track
    pub fn chance(&self, track: UpgradeTrack, tuning: &Tuning) -> f64 {
        if !track.is_capped() {
            return 0.0;
        }
        (self.level(track) as f64 * tuning.chance_per_level).clamp(0.0, 1.0)
    }

    /// Forfeit upgrades and boosters, bump the prestige count
    pub fn prestige(&mut self) -> u32 {
        self.levels = UpgradeLevels::default();
        self.boosters.clear();
        self.prestige_count += 1;
        self.prestige_count
    }

    /// Bodies a run starts with
    #[inline]
    pub fn body_count(&self) -> usize {
        self.prestige_count as usize + 1
    }
}
