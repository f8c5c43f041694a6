//! Permission-priority selection of display configs

use super::settings::{AppConfig, DEFAULT_THEME};
use arc_swap::ArcSwap;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tickhud_core::DisplayConfigResolver;
use tickhud_types::{DisplayConfig, Theme};
use uuid::Uuid;

/// Host permission lookup
pub trait PermissionChecker: Send + Sync {
    fn has_permission(&self, user: Uuid, permission: &str) -> bool;
}

/// Snapshot of the config tables the resolver reads from
struct ResolvedTables {
    priorities: Vec<String>,
    by_permission: HashMap<String, Arc<DisplayConfig>>,
    themes: HashMap<String, Arc<Theme>>,
    default_theme: Arc<Theme>,
}

impl ResolvedTables {
    fn from_config(config: &AppConfig) -> Self {
        let by_permission = config
            .display_configs
            .iter()
            .map(|display| (display.permission.clone(), Arc::new(display.clone())))
            .collect();
        let themes: HashMap<String, Arc<Theme>> = config
            .themes
            .iter()
            .map(|(name, theme)| (name.clone(), Arc::new(theme.clone())))
            .collect();
        let default_theme = themes
            .get(DEFAULT_THEME)
            .cloned()
            .unwrap_or_else(|| Arc::new(Theme::default()));

        Self {
            priorities: config.permission_priorities.clone(),
            by_permission,
            themes,
            default_theme,
        }
    }
}

/// Picks the first display config, in priority order, whose permission the
/// user holds. A config with an empty permission matches everyone.
pub struct PermissionResolver {
    tables: ArcSwap<ResolvedTables>,
    permissions: Arc<dyn PermissionChecker>,
}

impl PermissionResolver {
    pub fn new(config: &AppConfig, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            tables: ArcSwap::from_pointee(ResolvedTables::from_config(config)),
            permissions,
        }
    }

    /// Atomically switch to a new (already validated) configuration
    pub fn swap(&self, config: &AppConfig) {
        self.tables.store(Arc::new(ResolvedTables::from_config(config)));
        debug!(
            "Display config resolver now has {} configs",
            config.display_configs.len()
        );
    }
}

impl DisplayConfigResolver for PermissionResolver {
    fn config_for(&self, user: Uuid) -> Option<Arc<DisplayConfig>> {
        let tables = self.tables.load();
        tables
            .priorities
            .iter()
            .find(|permission| {
                permission.is_empty() || self.permissions.has_permission(user, permission)
            })
            .and_then(|permission| tables.by_permission.get(permission).cloned())
    }

    fn theme(&self, name: &str) -> Arc<Theme> {
        let tables = self.tables.load();
        tables
            .themes
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&tables.default_theme))
    }
}
