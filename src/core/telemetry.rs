//! Read-side facade over every telemetry producer

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tickhud_core::{
    LoadSnapshot, MemoryQuerySource, MemoryUsage, TickReport, TickSampleSource, TICK_WINDOWS,
};
use tickhud_sources::LoadSampler;

/// Everything display modules read from
///
/// Cheap to share: all readers go through `&self` and none of the accessors
/// block on the sampler or the host tick loop for longer than a read lock.
pub struct Telemetry {
    ticks: Arc<dyn TickSampleSource>,
    load: Arc<LoadSampler>,
    memory: Arc<dyn MemoryQuerySource>,
    online_users: AtomicUsize,
    max_players: AtomicUsize,
}

impl Telemetry {
    pub fn new(
        ticks: Arc<dyn TickSampleSource>,
        load: Arc<LoadSampler>,
        memory: Arc<dyn MemoryQuerySource>,
    ) -> Self {
        Self {
            ticks,
            load,
            memory,
            online_users: AtomicUsize::new(0),
            max_players: AtomicUsize::new(0),
        }
    }

    /// TPS averages over 5s, 1m, 5m and 15m
    pub fn recent_tps(&self) -> Vec<f64> {
        self.ticks.recent_tps()
    }

    pub fn average_mspt(&self) -> f64 {
        self.ticks.average_mspt()
    }

    pub fn recent_cpu_load(&self) -> LoadSnapshot {
        self.load.snapshot()
    }

    pub fn memory(&self) -> Option<MemoryUsage> {
        self.memory.memory_usage()
    }

    /// Tick-time reports for the 5s, 10s and 60s windows
    pub fn tick_report(&self) -> Vec<TickReport> {
        self.ticks.report_ticks(&TICK_WINDOWS)
    }

    pub fn current_tick(&self) -> u64 {
        self.ticks.current_tick_index()
    }

    pub fn sampler(&self) -> &Arc<LoadSampler> {
        &self.load
    }

    pub fn online_users(&self) -> usize {
        self.online_users.load(Ordering::Relaxed)
    }

    pub(crate) fn set_online_users(&self, count: usize) {
        self.online_users.store(count, Ordering::Relaxed);
    }

    pub fn max_players(&self) -> usize {
        self.max_players.load(Ordering::Relaxed)
    }

    pub fn set_max_players(&self, max: usize) {
        self.max_players.store(max, Ordering::Relaxed);
    }
}
