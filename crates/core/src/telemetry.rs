//! Telemetry collaborator traits and the values they produce

use serde::Serialize;

use crate::constants::MS_IN_NANO;

/// Aggregate of the tick durations that fell inside one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl TickSummary {
    pub fn average_nanos(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }

    pub fn average_ms(&self) -> f64 {
        self.average_nanos() / MS_IN_NANO
    }

    pub fn min_ms(&self) -> f64 {
        self.min as f64 / MS_IN_NANO
    }

    pub fn max_ms(&self) -> f64 {
        self.max as f64 / MS_IN_NANO
    }
}

/// Tick-time report for one window, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    /// Window size the report was requested for, in ticks
    pub window: usize,
    /// `None` until the host has recorded a tick inside the window
    pub summary: Option<TickSummary>,
}

impl TickReport {
    pub fn average_ms(&self) -> Option<f64> {
        self.summary.map(|s| s.average_ms())
    }
}

/// Smoothed CPU load, in percent with two decimals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadSnapshot {
    pub process: f64,
    pub system: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryUsage {
    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 * 100.0 / self.total_bytes as f64
    }
}

/// Per-platform source of tick timings
///
/// Implemented once per host integration; the rest of the engine only reads
/// through this trait.
pub trait TickSampleSource: Send + Sync {
    /// Index of the most recently completed tick
    fn current_tick_index(&self) -> u64;

    /// One report per requested window, in the order given
    fn report_ticks(&self, windows: &[usize]) -> Vec<TickReport>;

    /// TPS averages, shortest window first
    fn recent_tps(&self) -> Vec<f64>;

    /// Average milliseconds per tick over the short window, 0.0 with no data
    fn average_mspt(&self) -> f64;
}

/// Raw CPU load readings
///
/// Either reading may be `f64::NAN` (or 0.0) when the platform cannot answer
/// right now. Callers drop such readings instead of averaging them in.
pub trait LoadQuerySource: Send + Sync {
    fn process_load_percent(&self) -> f64;

    fn system_load_percent(&self) -> f64;
}

pub trait MemoryQuerySource: Send + Sync {
    /// `None` when memory usage cannot be determined
    fn memory_usage(&self) -> Option<MemoryUsage>;
}
