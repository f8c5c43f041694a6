//! Fakes for unit tests

use super::pipeline::standard_render;
use super::scheduler::ManualScheduler;
use super::services::{DisplayServices, SurfaceWriters};
use super::session::UserSession;
use super::telemetry::Telemetry;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tickhud_core::{
    DisplayConfigResolver, LoadQuerySource, MemoryQuerySource, MemoryUsage, PersistenceStore,
    SurfaceWriter, TickReport, TickSampleSource, UserHandle,
};
use tickhud_sources::LoadSampler;
use tickhud_types::{DisplayConfig, DisplayFlags, SurfaceFrame, Theme};
use uuid::Uuid;

pub struct FakeUser {
    id: Uuid,
    online: AtomicBool,
    ping: Mutex<Option<u32>>,
}

impl FakeUser {
    pub fn new() -> Arc<Self> {
        Self::with_identity(Uuid::new_v4())
    }

    pub fn with_identity(id: Uuid) -> Arc<Self> {
        Arc::new(Self {
            id,
            online: AtomicBool::new(true),
            ping: Mutex::new(Some(42)),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_ping(&self, ping: Option<u32>) {
        *self.ping.lock().unwrap() = ping;
    }
}

impl UserHandle for FakeUser {
    fn identity(&self) -> Uuid {
        self.id
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn ping_ms(&self) -> Option<u32> {
        *self.ping.lock().unwrap()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriterEvent {
    Write(SurfaceFrame),
    Clear,
}

impl WriterEvent {
    pub fn text(&self) -> &str {
        match self {
            WriterEvent::Write(frame) => frame.text(),
            WriterEvent::Clear => "",
        }
    }
}

#[derive(Default)]
pub struct RecordingWriter {
    events: Mutex<Vec<(Uuid, WriterEvent)>>,
}

impl RecordingWriter {
    fn count(&self, user: Uuid, clear: bool) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, event)| *id == user && matches!(event, WriterEvent::Clear) == clear)
            .count()
    }

    pub fn writes(&self, user: Uuid) -> usize {
        self.count(user, false)
    }

    pub fn clears(&self, user: Uuid) -> usize {
        self.count(user, true)
    }

    pub fn last(&self, user: Uuid) -> Option<WriterEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| *id == user)
            .map(|(_, event)| event.clone())
    }
}

impl SurfaceWriter for RecordingWriter {
    fn write(&self, user: Uuid, frame: &SurfaceFrame) {
        self.events.lock().unwrap().push((user, WriterEvent::Write(frame.clone())));
    }

    fn clear(&self, user: Uuid) {
        self.events.lock().unwrap().push((user, WriterEvent::Clear));
    }
}

/// Hands the same config to every user
pub struct StaticResolver {
    config: Mutex<Option<Arc<DisplayConfig>>>,
}

impl StaticResolver {
    pub fn new(config: Option<DisplayConfig>) -> Self {
        Self {
            config: Mutex::new(config.map(Arc::new)),
        }
    }

    pub fn set_config(&self, config: Option<DisplayConfig>) {
        *self.config.lock().unwrap() = config.map(Arc::new);
    }

    pub fn update(&self, change: impl FnOnce(&mut DisplayConfig)) {
        let mut guard = self.config.lock().unwrap();
        let mut config = guard.as_deref().cloned().unwrap_or_default();
        change(&mut config);
        *guard = Some(Arc::new(config));
    }

    pub fn current(&self) -> Option<Arc<DisplayConfig>> {
        self.config.lock().unwrap().clone()
    }
}

impl DisplayConfigResolver for StaticResolver {
    fn config_for(&self, _user: Uuid) -> Option<Arc<DisplayConfig>> {
        self.current()
    }

    fn theme(&self, _name: &str) -> Arc<Theme> {
        Arc::new(Theme::default())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, DisplayFlags>>,
    fail_loads: AtomicBool,
}

impl MemoryStore {
    pub fn insert(&self, user: Uuid, flags: DisplayFlags) {
        self.records.lock().unwrap().insert(user, flags);
    }

    pub fn saved(&self, user: Uuid) -> Option<DisplayFlags> {
        self.records.lock().unwrap().get(&user).copied()
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self, user: Uuid) -> Result<Option<DisplayFlags>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            bail!("corrupt record for {}", user);
        }
        Ok(self.saved(user))
    }

    fn save(&self, user: Uuid, flags: &DisplayFlags) -> Result<()> {
        self.insert(user, *flags);
        Ok(())
    }
}

pub struct FixedTicks {
    pub tps: Vec<f64>,
    pub mspt: f64,
}

impl TickSampleSource for FixedTicks {
    fn current_tick_index(&self) -> u64 {
        0
    }

    fn report_ticks(&self, windows: &[usize]) -> Vec<TickReport> {
        windows
            .iter()
            .map(|&window| TickReport {
                window,
                summary: None,
            })
            .collect()
    }

    fn recent_tps(&self) -> Vec<f64> {
        self.tps.clone()
    }

    fn average_mspt(&self) -> f64 {
        self.mspt
    }
}

pub struct FixedLoad;

impl LoadQuerySource for FixedLoad {
    fn process_load_percent(&self) -> f64 {
        12.5
    }

    fn system_load_percent(&self) -> f64 {
        40.0
    }
}

pub struct FixedMemory;

impl MemoryQuerySource for FixedMemory {
    fn memory_usage(&self) -> Option<MemoryUsage> {
        Some(MemoryUsage {
            used_bytes: 512 * 1024 * 1024,
            total_bytes: 2048 * 1024 * 1024,
        })
    }
}

pub fn telemetry_with(tps: Vec<f64>, mspt: f64) -> Telemetry {
    let sampler = LoadSampler::new(Arc::new(FixedLoad), Duration::from_millis(500));
    Telemetry::new(
        Arc::new(FixedTicks { tps, mspt }),
        Arc::new(sampler),
        Arc::new(FixedMemory),
    )
}

/// A user plus every collaborator a session needs, driven by a manual clock
pub struct Harness {
    pub user: Arc<FakeUser>,
    pub scheduler: Arc<ManualScheduler>,
    pub writer: Arc<RecordingWriter>,
    pub resolver: Arc<StaticResolver>,
    pub store: Arc<MemoryStore>,
    pub services: Arc<DisplayServices>,
}

impl Harness {
    pub fn new() -> Self {
        let scheduler = Arc::new(ManualScheduler::new());
        let writer = Arc::new(RecordingWriter::default());
        let resolver = Arc::new(StaticResolver::new(Some(DisplayConfig::default())));
        let services = Arc::new(DisplayServices {
            scheduler: scheduler.clone(),
            telemetry: Arc::new(telemetry_with(vec![20.0; 4], 5.0)),
            resolver: resolver.clone(),
            writers: SurfaceWriters::shared(writer.clone()),
            render_fn: standard_render(),
        });

        Self {
            user: FakeUser::new(),
            scheduler,
            writer,
            resolver,
            store: Arc::new(MemoryStore::default()),
            services,
        }
    }

    pub fn id(&self) -> Uuid {
        self.user.identity()
    }

    pub fn session(&self, flags: DisplayFlags) -> UserSession {
        UserSession::new(self.user.clone(), Arc::clone(&self.services), flags)
    }
}
