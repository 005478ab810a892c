//! Player settings and preferences
//!
//! Carried inside the game snapshot; the simulation itself never reads them.

use serde::{Deserialize, Serialize};

/// How large currency amounts are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumberFormat {
    /// 1234567
    Full,
    /// 1.23M
    #[default]
    Compact,
    /// 1.23e6
    Scientific,
}

impl NumberFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" => Some(NumberFormat::Full),
            "compact" | "short" => Some(NumberFormat::Compact),
            "scientific" | "sci" => Some(NumberFormat::Scientific),
            _ => None,
        }
    }

    /// Render an amount in this format
    pub fn format(&self, amount: u64) -> String {
        match self {
            NumberFormat::Full => amount.to_string(),
            NumberFormat::Compact => {
                const SUFFIXES: [(f64, &str); 5] =
                    [(1e15, "Q"), (1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
                let value = amount as f64;
                SUFFIXES
                    .iter()
                    .find(|(scale, _)| value >= *scale)
                    .map(|(scale, suffix)| format!("{:.2}{}", value / scale, suffix))
                    .unwrap_or_else(|| amount.to_string())
            }
            NumberFormat::Scientific => {
                if amount < 1000 {
                    amount.to_string()
                } else {
                    format!("{:.2e}", amount as f64)
                }
            }
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Visual ===
    /// Impact flashes and particles
    pub impact_effects: bool,
    /// Minimize shake and flashes
    pub reduced_motion: bool,

    // === HUD ===
    pub show_fps: bool,
    pub number_format: NumberFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            impact_effects: true,
            reduced_motion: false,
            show_fps: false,
            number_format: NumberFormat::Compact,
        }
    }
}

impl Settings {
    /// Clamp values that may have been hand-edited in a save
    pub fn sanitized(mut self) -> Self {
        let unit = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 };
        self.master_volume = unit(self.master_volume);
        self.sfx_volume = unit(self.sfx_volume);
        self
    }
}
