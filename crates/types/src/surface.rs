//! Display surfaces and the per-user persisted toggle record

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three independent rendering targets a user can enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Persistent player-list header/footer
    Tab,
    /// Transient overlay above the hotbar
    ActionBar,
    /// Bounded progress bar at the top of the screen
    BossBar,
}

impl SurfaceKind {
    /// All surfaces, in the order sessions own their slots
    pub const ALL: [SurfaceKind; 3] = [SurfaceKind::Tab, SurfaceKind::ActionBar, SurfaceKind::BossBar];

    /// Stable identifier used in logs and command arguments
    pub fn id(&self) -> &'static str {
        match self {
            SurfaceKind::Tab => "tab",
            SurfaceKind::ActionBar => "actionbar",
            SurfaceKind::BossBar => "bossbar",
        }
    }

    /// Parse a command argument back into a surface
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Persisted per-identity display preferences
///
/// Absent fields deserialize as `false`, so records written by older
/// versions (or by hand) load without error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayFlags {
    pub tab_enabled: bool,
    pub action_bar_enabled: bool,
    pub boss_bar_enabled: bool,
}

impl DisplayFlags {
    pub fn get(&self, kind: SurfaceKind) -> bool {
        match kind {
            SurfaceKind::Tab => self.tab_enabled,
            SurfaceKind::ActionBar => self.action_bar_enabled,
            SurfaceKind::BossBar => self.boss_bar_enabled,
        }
    }

    pub fn set(&mut self, kind: SurfaceKind, enabled: bool) {
        match kind {
            SurfaceKind::Tab => self.tab_enabled = enabled,
            SurfaceKind::ActionBar => self.action_bar_enabled = enabled,
            SurfaceKind::BossBar => self.boss_bar_enabled = enabled,
        }
    }

    pub fn any(&self) -> bool {
        SurfaceKind::ALL.into_iter().any(|kind| self.get(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_use_camel_case_field_names() {
        let mut flags = DisplayFlags::default();
        flags.set(SurfaceKind::ActionBar, true);
        let json = serde_json::to_string(&flags).unwrap();
        assert!(json.contains("\"actionBarEnabled\":true"));
        assert!(json.contains("\"tabEnabled\":false"));
        assert!(json.contains("\"bossBarEnabled\":false"));
    }

    #[test]
    fn test_missing_fields_default_to_false() {
        let flags: DisplayFlags = serde_json::from_str(r#"{"bossBarEnabled": true}"#).unwrap();
        assert!(flags.boss_bar_enabled);
        assert!(!flags.tab_enabled);
        assert!(!flags.action_bar_enabled);

        let empty: DisplayFlags = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, DisplayFlags::default());
        assert!(!empty.any());
    }

    #[test]
    fn test_surface_ids_round_trip() {
        for kind in SurfaceKind::ALL {
            assert_eq!(SurfaceKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(SurfaceKind::from_id("scoreboard"), None);
    }
}
