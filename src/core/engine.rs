//! Startup, reload and shutdown wiring
//!
//! An [`Engine`] owns one of everything: the resolver built from the app
//! config, the display scheduler, the CPU load sampler, the telemetry facade
//! and the session registry. Hosts create it once and drive it from their
//! join/quit/reload events.

use super::pipeline::{standard_render, RenderFn};
use super::scheduler::{Scheduler, TokioScheduler};
use super::services::{DisplayServices, SurfaceWriters};
use super::session_registry::SessionRegistry;
use super::telemetry::Telemetry;
use crate::config::{AppConfig, ConfigError, PermissionChecker, PermissionResolver};
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use log::{info, warn};
use std::sync::Arc;
use tickhud_core::{
    LoadQuerySource, MemoryQuerySource, PersistenceStore, TickSampleSource, UserHandle,
};
use tickhud_sources::LoadSampler;

/// Everything the host platform provides
pub struct HostAdapters {
    pub ticks: Arc<dyn TickSampleSource>,
    pub load: Arc<dyn LoadQuerySource>,
    pub memory: Arc<dyn MemoryQuerySource>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub writers: SurfaceWriters,
    pub store: Arc<dyn PersistenceStore>,
    /// Defaults to plain `Label: value` text
    pub render_fn: Option<RenderFn>,
}

pub struct Engine {
    config: ArcSwap<AppConfig>,
    resolver: Arc<PermissionResolver>,
    scheduler: Arc<dyn Scheduler>,
    sampler: Arc<LoadSampler>,
    telemetry: Arc<Telemetry>,
    registry: SessionRegistry,
}

impl Engine {
    /// Validate `config` and start the sampler and a tokio-backed scheduler
    pub fn new(config: AppConfig, host: HostAdapters) -> Result<Self> {
        let scheduler = TokioScheduler::new(config.scheduler.worker_threads)
            .context("Failed to start display scheduler")?;
        Self::with_scheduler(config, host, Arc::new(scheduler))
    }

    /// Like [`Engine::new`] but with a caller-supplied scheduler
    pub fn with_scheduler(
        mut config: AppConfig,
        host: HostAdapters,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let resolver = Arc::new(PermissionResolver::new(&config, host.permissions));
        let sampler = Arc::new(LoadSampler::new(host.load, config.sampler.period()));
        sampler.start();
        let telemetry = Arc::new(Telemetry::new(host.ticks, Arc::clone(&sampler), host.memory));

        let services = Arc::new(DisplayServices {
            scheduler: Arc::clone(&scheduler),
            telemetry: Arc::clone(&telemetry),
            resolver: resolver.clone(),
            writers: host.writers,
            render_fn: host.render_fn.unwrap_or_else(standard_render),
        });
        let registry = SessionRegistry::new(services, host.store);

        info!(
            "tickhud engine started with {} display configs",
            config.display_configs.len()
        );

        Ok(Self {
            config: ArcSwap::from_pointee(config),
            resolver,
            scheduler,
            sampler,
            telemetry,
            registry,
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    pub fn resolver(&self) -> &Arc<PermissionResolver> {
        &self.resolver
    }

    pub fn config(&self) -> Arc<AppConfig> {
        self.config.load_full()
    }

    /// Swap in a new configuration and rebuild sessions for `users`
    ///
    /// On a validation error nothing changes.
    pub fn reload(
        &self,
        mut config: AppConfig,
        users: &[Arc<dyn UserHandle>],
    ) -> Result<(), ConfigError> {
        config.validate()?;
        if config.sampler.period_ms != self.config.load().sampler.period_ms {
            warn!("Sampler period changes take effect after a restart");
        }

        self.resolver.swap(&config);
        self.config.store(Arc::new(config));
        self.registry.reload(users);
        Ok(())
    }

    /// Stop sampling, persist every session and stop the scheduler
    ///
    /// Returns false if display jobs were still running at the timeout.
    pub fn shutdown(&self) -> bool {
        self.sampler.shutdown();
        self.registry.flush_all();
        let finished = self
            .scheduler
            .shutdown(self.config.load().scheduler.shutdown_timeout());
        info!("tickhud engine stopped");
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::ManualScheduler;
    use crate::core::testing::{
        FakeUser, FixedLoad, FixedMemory, FixedTicks, MemoryStore, RecordingWriter,
    };
    use std::time::Duration;
    use tickhud_types::{DisplayConfig, SurfaceKind};
    use uuid::Uuid;

    struct AllowAll;

    impl PermissionChecker for AllowAll {
        fn has_permission(&self, _user: Uuid, _permission: &str) -> bool {
            true
        }
    }

    struct Setup {
        engine: Engine,
        scheduler: Arc<ManualScheduler>,
        writer: Arc<RecordingWriter>,
        store: Arc<MemoryStore>,
    }

    fn setup(config: AppConfig) -> Setup {
        let scheduler = Arc::new(ManualScheduler::new());
        let writer = Arc::new(RecordingWriter::default());
        let store = Arc::new(MemoryStore::default());
        let host = HostAdapters {
            ticks: Arc::new(FixedTicks {
                tps: vec![19.0; 4],
                mspt: 30.0,
            }),
            load: Arc::new(FixedLoad),
            memory: Arc::new(FixedMemory),
            permissions: Arc::new(AllowAll),
            writers: SurfaceWriters::shared(writer.clone()),
            store: store.clone(),
            render_fn: None,
        };
        let engine = Engine::with_scheduler(config, host, scheduler.clone()).unwrap();
        Setup {
            engine,
            scheduler,
            writer,
            store,
        }
    }

    #[test]
    fn test_join_renders_with_join_defaults() {
        let mut config = AppConfig::default();
        config.display_configs[0].action_bar.surface.enable_on_join = true;
        let setup = setup(config);
        let user = FakeUser::new();

        let session = setup.engine.registry().handle_join(user.clone());
        assert!(session.is_running(SurfaceKind::ActionBar));
        setup.scheduler.run_pending();
        assert_eq!(
            setup.writer.last(user.identity()).unwrap().text(),
            "TPS: 19.00 MSPT: 30.00 Ping: 42"
        );
        assert_eq!(setup.engine.telemetry().online_users(), 1);
        assert!(setup.engine.shutdown());
    }

    #[test]
    fn test_reload_swaps_config() {
        let setup = setup(AppConfig::default());
        let user = FakeUser::new();
        let session = setup.engine.registry().handle_join(user.clone());
        session.enable(SurfaceKind::Tab).unwrap();

        let mut next = AppConfig::default();
        next.display_configs[0].tab.surface.allow = false;
        let users: Vec<Arc<dyn UserHandle>> = vec![user.clone()];
        setup.engine.reload(next, &users).unwrap();
        assert!(!setup.engine.config().display_configs[0].tab.surface.allow);

        // restored session is enabled but fails its first-run check
        let reloaded = setup.engine.registry().lookup(user.identity()).unwrap();
        setup.scheduler.advance(Duration::from_secs(1));
        assert!(!reloaded.is_enabled(SurfaceKind::Tab));
        assert!(reloaded.is_dirty());
        assert_eq!(setup.scheduler.active_jobs(), 0);
        assert!(setup.store.saved(user.identity()).unwrap().tab_enabled);
        setup.engine.shutdown();
    }

    #[test]
    fn test_invalid_reload_changes_nothing() {
        let setup = setup(AppConfig::default());
        let mut broken = AppConfig::default();
        broken.display_configs.push(DisplayConfig::default());

        assert!(matches!(
            setup.engine.reload(broken, &[]),
            Err(ConfigError::DuplicatePermission(_))
        ));
        assert_eq!(setup.engine.config().display_configs.len(), 1);
        setup.engine.shutdown();
    }

    #[test]
    fn test_shutdown_flushes_sessions() {
        let setup = setup(AppConfig::default());
        let user = FakeUser::new();
        let session = setup.engine.registry().handle_join(user.clone());
        session.enable(SurfaceKind::BossBar).unwrap();
        setup.scheduler.run_pending();

        assert!(setup.engine.shutdown());
        assert!(setup.engine.registry().is_empty());
        assert!(setup.store.saved(user.identity()).unwrap().boss_bar_enabled);
        assert_eq!(setup.scheduler.active_jobs(), 0);
        assert!(!setup.engine.telemetry().sampler().is_running());
    }
}
