//! Per-identity owner of the three display slots

use super::display_slot::DisplaySlot;
use super::error::DisplayError;
use super::services::DisplayServices;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tickhud_core::UserHandle;
use tickhud_types::{DisplayConfig, DisplayFlags, SurfaceKind};
use uuid::Uuid;

/// Display state of one connected user
///
/// Owns a slot per surface and a dirty bit meaning "flags differ from what
/// was last saved". Sessions are created and replaced only by the registry.
pub struct UserSession {
    user: Arc<dyn UserHandle>,
    services: Arc<DisplayServices>,
    tab: DisplaySlot,
    action_bar: DisplaySlot,
    boss_bar: DisplaySlot,
    dirty: Arc<AtomicBool>,
}

impl UserSession {
    pub(crate) fn new(
        user: Arc<dyn UserHandle>,
        services: Arc<DisplayServices>,
        flags: DisplayFlags,
    ) -> Self {
        let dirty = Arc::new(AtomicBool::new(false));
        let slot = |kind: SurfaceKind| {
            DisplaySlot::new(
                kind,
                Arc::clone(&user),
                Arc::clone(&services),
                flags.get(kind),
                Arc::clone(&dirty),
            )
        };
        let (tab, action_bar, boss_bar) = (
            slot(SurfaceKind::Tab),
            slot(SurfaceKind::ActionBar),
            slot(SurfaceKind::BossBar),
        );

        Self {
            user,
            services,
            tab,
            action_bar,
            boss_bar,
            dirty,
        }
    }

    pub fn identity(&self) -> Uuid {
        self.user.identity()
    }

    pub fn user(&self) -> &Arc<dyn UserHandle> {
        &self.user
    }

    pub fn slot(&self, kind: SurfaceKind) -> &DisplaySlot {
        match kind {
            SurfaceKind::Tab => &self.tab,
            SurfaceKind::ActionBar => &self.action_bar,
            SurfaceKind::BossBar => &self.boss_bar,
        }
    }

    fn slots(&self) -> [&DisplaySlot; 3] {
        [&self.tab, &self.action_bar, &self.boss_bar]
    }

    /// Turn a surface on and start it
    ///
    /// Fails when no display config applies to this user or the config does
    /// not allow the surface.
    pub fn enable(&self, kind: SurfaceKind) -> Result<(), DisplayError> {
        let config = self
            .services
            .resolver
            .config_for(self.identity())
            .ok_or(DisplayError::NoDisplayConfig)?;
        if !config.surface(kind).allow {
            return Err(DisplayError::SurfaceNotAllowed(kind));
        }

        let slot = self.slot(kind);
        if slot.set_enabled(true) {
            self.mark_dirty();
        }
        slot.start();
        Ok(())
    }

    pub fn disable(&self, kind: SurfaceKind) {
        let slot = self.slot(kind);
        if slot.set_enabled(false) {
            self.mark_dirty();
        }
        slot.stop();
    }

    /// Flip a surface; returns whether it is now enabled
    pub fn toggle(&self, kind: SurfaceKind) -> Result<bool, DisplayError> {
        if self.is_enabled(kind) {
            self.disable(kind);
            Ok(false)
        } else {
            self.enable(kind)?;
            Ok(true)
        }
    }

    pub fn is_enabled(&self, kind: SurfaceKind) -> bool {
        self.slot(kind).is_enabled()
    }

    pub fn flags(&self) -> DisplayFlags {
        let mut flags = DisplayFlags::default();
        for slot in self.slots() {
            flags.set(slot.kind(), slot.is_enabled());
        }
        flags
    }

    /// Enable surfaces the config turns on at join
    pub(crate) fn apply_join_defaults(&self, config: &DisplayConfig) {
        for kind in SurfaceKind::ALL {
            let settings = config.surface(kind);
            if settings.allow && settings.enable_on_join && self.slot(kind).set_enabled(true) {
                self.mark_dirty();
            }
        }
    }

    /// Start every enabled slot that is not already running
    pub fn start_enabled(&self) {
        for slot in self.slots() {
            if slot.is_enabled() {
                slot.start_if_stopped();
            }
        }
    }

    pub fn stop_all(&self) {
        for slot in self.slots() {
            slot.stop();
        }
    }

    pub fn is_running(&self, kind: SurfaceKind) -> bool {
        self.slot(kind).is_running()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::SeqCst);
    }

    fn mark_dirty(&self) {
        self.set_dirty(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::Harness;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_enable_disable_marks_dirty() {
        let harness = Harness::new();
        let session = harness.session(DisplayFlags::default());
        assert!(!session.is_dirty());

        session.enable(SurfaceKind::ActionBar).unwrap();
        assert!(session.is_enabled(SurfaceKind::ActionBar));
        assert!(session.is_running(SurfaceKind::ActionBar));
        assert!(session.is_dirty());

        session.set_dirty(false);
        session.enable(SurfaceKind::ActionBar).unwrap();
        assert!(!session.is_dirty());

        session.disable(SurfaceKind::ActionBar);
        assert!(session.is_dirty());
        assert!(!session.is_running(SurfaceKind::ActionBar));
        assert_eq!(session.flags(), DisplayFlags::default());
    }

    #[test]
    fn test_enable_then_disable_before_first_tick() {
        let harness = Harness::new();
        let session = harness.session(DisplayFlags::default());

        session.enable(SurfaceKind::BossBar).unwrap();
        session.disable(SurfaceKind::BossBar);
        harness.scheduler.advance(Duration::from_secs(1));

        assert_eq!(harness.scheduler.active_jobs(), 0);
        assert_eq!(harness.scheduler.total_runs(), 0);
        assert_eq!(harness.writer.clears(harness.id()), 1);
    }

    #[test]
    fn test_enable_errors() {
        let harness = Harness::new();
        let session = harness.session(DisplayFlags::default());

        harness.resolver.update(|config| config.tab.surface.allow = false);
        assert_eq!(
            session.enable(SurfaceKind::Tab),
            Err(DisplayError::SurfaceNotAllowed(SurfaceKind::Tab))
        );

        harness.resolver.set_config(None);
        assert_eq!(session.toggle(SurfaceKind::ActionBar), Err(DisplayError::NoDisplayConfig));
        assert!(!session.is_dirty());
        assert_eq!(harness.scheduler.active_jobs(), 0);
    }

    #[test]
    fn test_toggle_round_trip() {
        let harness = Harness::new();
        let session = harness.session(DisplayFlags::default());
        assert_eq!(session.toggle(SurfaceKind::Tab), Ok(true));
        assert_eq!(session.toggle(SurfaceKind::Tab), Ok(false));
        assert!(!session.is_enabled(SurfaceKind::Tab));
    }

    #[test]
    fn test_join_defaults_and_start_enabled() {
        let harness = Harness::new();
        harness.resolver.update(|config| {
            config.tab.surface.enable_on_join = true;
            config.boss_bar.surface.enable_on_join = true;
            config.boss_bar.surface.allow = false;
        });
        let session = harness.session(DisplayFlags::default());
        let config = harness.resolver.current().unwrap();

        session.apply_join_defaults(&config);
        assert!(session.is_enabled(SurfaceKind::Tab));
        assert!(!session.is_enabled(SurfaceKind::BossBar));
        assert!(session.is_dirty());

        session.start_enabled();
        session.start_enabled();
        assert_eq!(harness.scheduler.active_jobs(), 1);

        session.stop_all();
        assert_eq!(harness.scheduler.active_jobs(), 0);
        assert!(session.is_enabled(SurfaceKind::Tab));
    }

    #[test]
    fn test_concurrent_start_enabled_starts_once() {
        let harness = Harness::new();
        let mut flags = DisplayFlags::default();
        flags.set(SurfaceKind::Tab, true);
        flags.set(SurfaceKind::BossBar, true);
        let session = harness.session(flags);

        for _ in 0..200 {
            let barrier = Barrier::new(4);
            thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        barrier.wait();
                        session.start_enabled();
                    });
                }
            });
            assert_eq!(harness.scheduler.active_jobs(), 2);
            session.stop_all();
            assert_eq!(harness.scheduler.active_jobs(), 0);
        }
    }
}
