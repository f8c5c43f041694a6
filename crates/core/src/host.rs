//! Host-side collaborators: connected users, surface writers, persistence

use anyhow::Result;
use std::sync::Arc;
use tickhud_types::{DisplayConfig, DisplayFlags, SurfaceFrame, Theme};
use uuid::Uuid;

/// Live handle to a connected user's platform entity
///
/// A handle may go stale (the user disconnects, or the platform replaces the
/// entity on respawn). Jobs holding one must check `is_online` before writing.
pub trait UserHandle: Send + Sync {
    /// Stable identity, unchanged across entity replacement
    fn identity(&self) -> Uuid;

    fn is_online(&self) -> bool;

    /// Round-trip latency, `None` if the platform does not know it
    fn ping_ms(&self) -> Option<u32>;

    fn display_name(&self) -> String {
        self.identity().to_string()
    }
}

/// Selects the display configuration that applies to a user
pub trait DisplayConfigResolver: Send + Sync {
    /// `None` when no configuration applies; the user then gets no displays
    fn config_for(&self, user: Uuid) -> Option<Arc<DisplayConfig>>;

    /// Theme by name, falling back to the default theme
    fn theme(&self, name: &str) -> Arc<Theme>;
}

/// Pushes rendered frames to one user's client
///
/// Called from scheduler worker threads. Both methods must tolerate being
/// called once more after the slot was stopped.
pub trait SurfaceWriter: Send + Sync {
    fn write(&self, user: Uuid, frame: &SurfaceFrame);

    /// Reset the surface to its neutral state (empty text, hidden bar)
    fn clear(&self, user: Uuid);
}

/// Storage of per-identity display toggles
pub trait PersistenceStore: Send + Sync {
    /// `Ok(None)` when nothing was ever saved for this identity
    fn load(&self, user: Uuid) -> Result<Option<DisplayFlags>>;

    fn save(&self, user: Uuid, flags: &DisplayFlags) -> Result<()>;
}
