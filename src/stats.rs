//! Run and lifetime statistics
//!
//! Run stats reset on prestige; lifetime stats never do.

use serde::{Deserialize, Serialize};

/// Counters for the current run (since the last prestige)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStats {
    pub cells_destroyed: u64,
    pub chains_triggered: u64,
    pub currency_earned: u64,
    /// Deepest row any body has reached
    pub max_depth_row: u32,
}

/// Counters that survive prestige
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeStats {
    pub cells_destroyed: u64,
    pub currency_earned: u64,
    pub best_depth_row: u32,
    pub offline_earned: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub run: RunStats,
    pub lifetime: LifetimeStats,
}

impl Stats {
    pub fn record_destroyed(&mut self, reward: u64) {
        self.run.cells_destroyed += 1;
        self.lifetime.cells_destroyed += 1;
        self.record_earned(reward);
    }

    pub fn record_earned(&mut self, reward: u64) {
        self.run.currency_earned = self.run.currency_earned.saturating_add(reward);
        self.lifetime.currency_earned = self.lifetime.currency_earned.saturating_add(reward);
    }

    pub fn record_offline(&mut self, reward: u64) {
        self.record_earned(reward);
        self.lifetime.offline_earned = self.lifetime.offline_earned.saturating_add(reward);
    }

    pub fn record_chain(&mut self) {
        self.run.chains_triggered += 1;
    }

    /// Track the deepest row reached; returns true on a new run record
    pub fn record_depth(&mut self, row: u32) -> bool {
        self.lifetime.best_depth_row = self.lifetime.best_depth_row.max(row);
        if row > self.run.max_depth_row {
            self.run.max_depth_row = row;
            true
        } else {
            false
        }
    }

    pub fn reset_run(&mut self) {
        self.run = RunStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_record() {
        let mut stats = Stats::default();
        assert!(stats.record_depth(5));
        assert!(!stats.record_depth(3));
        assert_eq!(stats.run.max_depth_row, 5);
        stats.reset_run();
        assert_eq!(stats.run.max_depth_row, 0);
        assert_eq!(stats.lifetime.best_depth_row, 5);
    }

    #[test]
    fn test_offline_counts_as_earned() {
        let mut stats = Stats::default();
        stats.record_destroyed(10);
        stats.record_offline(90);
        assert_eq!(stats.run.currency_earned, 100);
        assert_eq!(stats.lifetime.offline_earned, 90);
        assert_eq!(stats.lifetime.cells_destroyed, 1);
    }
}
