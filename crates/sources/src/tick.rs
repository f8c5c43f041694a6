//! Host-fed tick aggregator
//!
//! The host calls [`TickTracker::record_tick`] at the end of every tick. The
//! tracker keeps raw tick durations for the tick-time report windows and a
//! TPS sample every `SAMPLE_INTERVAL` ticks for the TPS windows.

use crate::rolling::WindowedAverage;
use crate::tick_log::BoundedSampleLog;
use log::{trace, warn};
use rust_decimal::Decimal;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tickhud_core::{
    TickReport, TickSampleSource, MAX_TPS, MSPT_WINDOW, MS_IN_NANO, SAMPLE_INTERVAL, SEC_IN_NANO,
    TICK_WINDOWS, TPS_BASE, TPS_WINDOWS,
};

struct TickState {
    logs: Vec<BoundedSampleLog>,
    tps: Vec<WindowedAverage>,
    previous_sample_start: Option<u64>,
    current_tick: u64,
}

/// Aggregates tick timings reported by the host
///
/// Single writer (the host tick loop), many readers (display jobs).
pub struct TickTracker {
    state: RwLock<TickState>,
}

impl TickTracker {
    pub fn new() -> Self {
        let seed = Decimal::from(MAX_TPS as u64);
        Self {
            state: RwLock::new(TickState {
                logs: TICK_WINDOWS.iter().map(|&n| BoundedSampleLog::new(n)).collect(),
                tps: TPS_WINDOWS
                    .iter()
                    .map(|&n| WindowedAverage::new(n, seed, SEC_IN_NANO))
                    .collect(),
                previous_sample_start: None,
                current_tick: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TickState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Tick tracker lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, TickState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Tick tracker lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record one finished tick
    ///
    /// `start_nanos` is the host's monotonic clock reading when the tick began.
    pub fn record_tick(&self, tick_index: u64, start_nanos: u64, duration_nanos: u64) {
        let mut state = self.write();
        state.current_tick = tick_index;
        for log in state.logs.iter_mut() {
            log.record(tick_index, duration_nanos);
        }

        if tick_index % SAMPLE_INTERVAL != 0 {
            return;
        }

        // The first sample only establishes the baseline
        let Some(previous) = state.previous_sample_start.replace(start_nanos) else {
            return;
        };
        let diff = start_nanos.saturating_sub(previous);
        if diff == 0 {
            trace!("Skipping TPS sample at tick {}: no time elapsed", tick_index);
            return;
        }

        let Some(tps) = Decimal::from(TPS_BASE as u64).checked_div(Decimal::from(diff)) else {
            return;
        };
        for window in state.tps.iter_mut() {
            window.add(tps, diff);
        }
    }

    fn report(state: &TickState, window: usize) -> TickReport {
        let log = state
            .logs
            .iter()
            .find(|log| log.capacity() >= window)
            .or_else(|| state.logs.last());
        let summary = log.and_then(|log| {
            let n = window.min(log.capacity()) as u64;
            log.summary_over_last_ticks(n, state.current_tick)
        });
        TickReport { window, summary }
    }
}

impl Default for TickTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSampleSource for TickTracker {
    fn current_tick_index(&self) -> u64 {
        self.read().current_tick
    }

    fn report_ticks(&self, windows: &[usize]) -> Vec<TickReport> {
        let state = self.read();
        windows.iter().map(|&w| Self::report(&state, w)).collect()
    }

    fn recent_tps(&self) -> Vec<f64> {
        self.read().tps.iter().map(WindowedAverage::average).collect()
    }

    fn average_mspt(&self) -> f64 {
        let state = self.read();
        Self::report(&state, MSPT_WINDOW)
            .summary
            .map(|s| s.average_nanos() / MS_IN_NANO)
            .unwrap_or(0.0)
    }
}
