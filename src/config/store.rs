//! Per-user display toggles stored as JSON files

use anyhow::{Context, Result};
use log::trace;
use std::path::{Path, PathBuf};
use tickhud_core::PersistenceStore;
use tickhud_types::DisplayFlags;
use uuid::Uuid;

/// One pretty-printed `<uuid>.json` per identity under `<data_dir>/userdata`
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("userdata"),
        }
    }

    /// Store under the platform data directory
    pub fn in_project_dirs() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("dev", "tickhud", "tickhud")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn path_for(&self, user: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", user))
    }
}

impl PersistenceStore for JsonFileStore {
    fn load(&self, user: Uuid) -> Result<Option<DisplayFlags>> {
        let path = self.path_for(user);
        if !path.exists() {
            trace!("No saved display settings for {}", user);
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let flags = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(flags))
    }

    fn save(&self, user: Uuid, flags: &DisplayFlags) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path_for(user);
        let content = serde_json::to_string_pretty(flags)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let user = Uuid::new_v4();
        let flags = DisplayFlags {
            tab_enabled: true,
            action_bar_enabled: false,
            boss_bar_enabled: true,
        };

        store.save(user, &flags).unwrap();
        assert_eq!(store.load(user).unwrap(), Some(flags));

        let written = std::fs::read_to_string(dir.path().join("userdata").join(format!("{}.json", user))).unwrap();
        assert!(written.contains("\"bossBarEnabled\": true"));
    }

    #[test]
    fn test_partial_record_defaults_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let user = Uuid::new_v4();
        std::fs::create_dir_all(dir.path().join("userdata")).unwrap();
        std::fs::write(store.path_for(user), r#"{"actionBarEnabled": true}"#).unwrap();

        let flags = store.load(user).unwrap().unwrap();
        assert!(flags.action_bar_enabled);
        assert!(!flags.tab_enabled && !flags.boss_bar_enabled);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let user = Uuid::new_v4();
        std::fs::create_dir_all(dir.path().join("userdata")).unwrap();
        std::fs::write(store.path_for(user), "tabEnabled=true").unwrap();

        let err = store.load(user).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }
}
