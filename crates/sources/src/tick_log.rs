//! Fixed-capacity log of raw tick durations

use tickhud_core::TickSummary;

/// Ring of `(tick_index, duration_nanos)` pairs indexed by `tick_index % capacity`
///
/// A slot with zero duration has never been written and is skipped by
/// summaries, so nothing is reported from capacity that was not filled yet.
#[derive(Debug, Clone)]
pub struct BoundedSampleLog {
    ticks: Vec<u64>,
    nanos: Vec<u64>,
}

impl BoundedSampleLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ticks: vec![0; capacity],
            nanos: vec![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.ticks.len()
    }

    pub fn record(&mut self, tick_index: u64, duration_nanos: u64) {
        let slot = (tick_index % self.ticks.len() as u64) as usize;
        self.ticks[slot] = tick_index;
        self.nanos[slot] = duration_nanos;
    }

    /// Summarise the samples whose tick index lies in `[current - n, current]`
    ///
    /// Returns `None` when no written slot falls inside the range, which is
    /// the normal state while the host is warming up.
    pub fn summary_over_last_ticks(&self, n: u64, current_tick_index: u64) -> Option<TickSummary> {
        let oldest = current_tick_index.saturating_sub(n);
        let mut summary: Option<TickSummary> = None;

        for (&tick, &nanos) in self.ticks.iter().zip(&self.nanos) {
            if nanos == 0 || tick < oldest || tick > current_tick_index {
                continue;
            }
            summary = Some(match summary {
                None => TickSummary {
                    count: 1,
                    sum: nanos,
                    min: nanos,
                    max: nanos,
                },
                Some(s) => TickSummary {
                    count: s.count + 1,
                    sum: s.sum.saturating_add(nanos),
                    min: s.min.min(nanos),
                    max: s.max.max(nanos),
                },
            });
        }

        summary
    }

    /// Summary over the whole capacity, ending at `current_tick_index`
    pub fn summary(&self, current_tick_index: u64) -> Option<TickSummary> {
        self.summary_over_last_ticks(self.capacity() as u64, current_tick_index)
    }
}
