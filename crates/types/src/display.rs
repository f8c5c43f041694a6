//! Display configuration types
//!
//! A `DisplayConfig` describes what each surface shows for every user that
//! resolves to it. Configs are keyed by permission; the resolver picks one per
//! user according to the configured priority order.

use crate::surface::SurfaceKind;
use crate::theme::Tier;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Permission required by the config written on first start
pub const DEFAULT_PERMISSION: &str = "tickhud.defaultdisplay";

fn default_permission() -> String {
    DEFAULT_PERMISSION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_separator() -> String {
    " ".to_string()
}

fn default_update_interval_ms() -> u64 {
    250
}

/// One display configuration, selected per user by permission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Permission required to use this config. An empty string requires none.
    #[serde(default = "default_permission")]
    pub permission: String,
    #[serde(default)]
    pub tab: TabSettings,
    #[serde(default)]
    pub action_bar: ActionBarSettings,
    #[serde(default)]
    pub boss_bar: BossBarSettings,
}

impl DisplayConfig {
    /// Settings shared by every surface type
    pub fn surface(&self, kind: SurfaceKind) -> &SurfaceSettings {
        match kind {
            SurfaceKind::Tab => &self.tab.surface,
            SurfaceKind::ActionBar => &self.action_bar.surface,
            SurfaceKind::BossBar => &self.boss_bar.surface,
        }
    }

    /// Every module list in this config, for load-time validation
    pub fn module_lists(&self) -> Vec<(SurfaceKind, &str)> {
        vec![
            (SurfaceKind::Tab, self.tab.header_modules.as_str()),
            (SurfaceKind::Tab, self.tab.footer_modules.as_str()),
            (SurfaceKind::ActionBar, self.action_bar.modules.as_str()),
            (SurfaceKind::BossBar, self.boss_bar.modules.as_str()),
        ]
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            permission: default_permission(),
            tab: TabSettings::default(),
            action_bar: ActionBarSettings::default(),
            boss_bar: BossBarSettings::default(),
        }
    }
}

/// Settings common to all surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSettings {
    /// Whether users resolving to this config may enable the surface at all
    #[serde(default = "default_true")]
    pub allow: bool,
    /// Enable the surface automatically when the user joins
    #[serde(default)]
    pub enable_on_join: bool,
    /// Theme name, looked up in the theme table
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Text placed between rendered modules
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Milliseconds between refreshes of this surface
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

impl SurfaceSettings {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.max(1))
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            allow: true,
            enable_on_join: false,
            theme: default_theme(),
            separator: default_separator(),
            update_interval_ms: default_update_interval_ms(),
        }
    }
}

fn default_footer_modules() -> String {
    "tps,mspt".to_string()
}

fn default_overlay_modules() -> String {
    "tps,mspt,ping".to_string()
}

/// Player-list header/footer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabSettings {
    #[serde(flatten)]
    pub surface: SurfaceSettings,
    #[serde(default)]
    pub header_modules: String,
    #[serde(default = "default_footer_modules")]
    pub footer_modules: String,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            surface: SurfaceSettings::default(),
            header_modules: String::new(),
            footer_modules: default_footer_modules(),
        }
    }
}

/// Action bar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBarSettings {
    #[serde(flatten)]
    pub surface: SurfaceSettings,
    #[serde(default = "default_overlay_modules")]
    pub modules: String,
}

impl Default for ActionBarSettings {
    fn default() -> Self {
        Self {
            surface: SurfaceSettings::default(),
            modules: default_overlay_modules(),
        }
    }
}

/// Boss bar settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossBarSettings {
    #[serde(flatten)]
    pub surface: SurfaceSettings,
    #[serde(default = "default_overlay_modules")]
    pub modules: String,
    /// Which metric drives the bar fill
    #[serde(default)]
    pub fill_mode: FillMode,
    #[serde(default)]
    pub overlay: BarOverlay,
    #[serde(default)]
    pub colors: BarColors,
}

impl Default for BossBarSettings {
    fn default() -> Self {
        Self {
            surface: SurfaceSettings::default(),
            modules: default_overlay_modules(),
            fill_mode: FillMode::default(),
            overlay: BarOverlay::default(),
            colors: BarColors::default(),
        }
    }
}

/// Metric that drives the boss bar progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillMode {
    /// Fill grows with the 5 second TPS average
    Tps,
    /// Fill grows with MSPT
    #[default]
    Mspt,
    ReverseTps,
    ReverseMspt,
}

/// Boss bar colors supported by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarColor {
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    White,
}

/// Boss bar segmentation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarOverlay {
    #[serde(rename = "PROGRESS")]
    Progress,
    #[serde(rename = "NOTCHED_6")]
    Notched6,
    #[serde(rename = "NOTCHED_10")]
    Notched10,
    #[serde(rename = "NOTCHED_12")]
    Notched12,
    #[default]
    #[serde(rename = "NOTCHED_20")]
    Notched20,
}

/// Boss bar color per performance tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarColors {
    pub low_performance: BarColor,
    pub medium_performance: BarColor,
    pub good_performance: BarColor,
}

impl BarColors {
    pub fn for_tier(&self, tier: Tier) -> BarColor {
        match tier {
            Tier::Good => self.good_performance,
            Tier::Medium => self.medium_performance,
            Tier::Low => self.low_performance,
        }
    }
}

impl Default for BarColors {
    fn default() -> Self {
        Self {
            low_performance: BarColor::Red,
            medium_performance: BarColor::Yellow,
            good_performance: BarColor::Green,
        }
    }
}
