//! Shared constants for tick and load telemetry

use std::time::Duration;

/// Nominal host tick rate
pub const TICKS_PER_SECOND: u32 = 20;

/// TPS of a perfectly healthy host
pub const MAX_TPS: f64 = 20.0;

/// Tick time budget in milliseconds at the nominal tick rate
pub const MSPT_BUDGET: f64 = 50.0;

pub const SEC_IN_NANO: u64 = 1_000_000_000;

pub const MS_IN_NANO: f64 = 1_000_000.0;

/// Ticks between two TPS samples
pub const SAMPLE_INTERVAL: u64 = 20;

/// Numerator used to turn the nanos spent on `SAMPLE_INTERVAL` ticks into TPS.
/// `TPS_BASE / elapsed_nanos` is the TPS over the interval.
pub const TPS_BASE: f64 = SEC_IN_NANO as f64 * SAMPLE_INTERVAL as f64;

/// TPS averaging windows, in samples (5s, 1m, 5m, 15m at one sample per second)
pub const TPS_WINDOWS: [usize; 4] = [5, 60, 300, 900];

/// Tick-time report windows, in ticks (5s, 10s, 60s)
pub const TICK_WINDOWS: [usize; 3] = [100, 200, 1200];

/// Window used by the MSPT module and the boss bar
pub const MSPT_WINDOW: usize = 100;

/// Slots in each CPU load window
pub const LOAD_WINDOW: usize = 20;

/// How often the load sampler queries the OS unless configured otherwise
pub const DEFAULT_SAMPLER_PERIOD: Duration = Duration::from_millis(500);

pub const BYTES_PER_MB: u64 = 1024 * 1024;
