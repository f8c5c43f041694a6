//! Themes and performance tiers

use serde::{Deserialize, Serialize};

/// Performance classification of a rendered metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Good,
    Medium,
    Low,
}

/// A named color scheme
///
/// Colors are kept as strings (named colors like `"dark_green"` or hex like
/// `"#00ff88"`); turning them into styled text is left to the host's render
/// function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub colors: ThemeColors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    pub text: String,
    pub text_secondary: String,
    pub low_performance: String,
    pub low_performance_secondary: String,
    pub medium_performance: String,
    pub medium_performance_secondary: String,
    pub good_performance: String,
    pub good_performance_secondary: String,
}

impl ThemeColors {
    /// Primary and secondary (gradient end) color for a tier
    pub fn for_tier(&self, tier: Tier) -> (&str, &str) {
        match tier {
            Tier::Good => (&self.good_performance, &self.good_performance_secondary),
            Tier::Medium => (&self.medium_performance, &self.medium_performance_secondary),
            Tier::Low => (&self.low_performance, &self.low_performance_secondary),
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            text: "gray".to_string(),
            text_secondary: "white".to_string(),
            low_performance: "red".to_string(),
            low_performance_secondary: "gold".to_string(),
            medium_performance: "gold".to_string(),
            medium_performance_secondary: "yellow".to_string(),
            good_performance: "green".to_string(),
            good_performance_secondary: "dark_green".to_string(),
        }
    }
}
