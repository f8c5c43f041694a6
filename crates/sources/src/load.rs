//! Smoothed CPU load sampler
//!
//! A background thread queries a [`LoadQuerySource`] on a fixed period and
//! feeds process and system load into two rolling windows. Readers get the
//! last published [`LoadSnapshot`] without blocking.

use crate::rolling::WindowedAverage;
use arc_swap::ArcSwap;
use crossbeam::channel::{self, select, Sender};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tickhud_core::{LoadQuerySource, LoadSnapshot, LOAD_WINDOW};

/// One slot per sampling tick; unusable readings take an excluded slot
struct LoadWindows {
    process: WindowedAverage,
    system: WindowedAverage,
}

impl Default for LoadWindows {
    fn default() -> Self {
        Self {
            process: WindowedAverage::empty(LOAD_WINDOW),
            system: WindowedAverage::empty(LOAD_WINDOW),
        }
    }
}

struct SamplerShared {
    source: Arc<dyn LoadQuerySource>,
    windows: Mutex<LoadWindows>,
    snapshot: ArcSwap<LoadSnapshot>,
    samples: AtomicU64,
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct LoadSampler {
    shared: Arc<SamplerShared>,
    period: Duration,
    worker: Mutex<Option<Worker>>,
}

fn usable(reading: f64) -> bool {
    reading.is_finite() && reading != 0.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn feed(window: &mut WindowedAverage, reading: f64) {
    if usable(reading) && window.add_f64(reading, 1) {
        return;
    }
    trace!("Excluding unusable load reading {}", reading);
    window.push_excluded();
}

impl SamplerShared {
    fn sample(&self) {
        let process = self.source.process_load_percent();
        let system = self.source.system_load_percent();

        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| {
            warn!("Load window mutex was poisoned, recovering");
            poisoned.into_inner()
        });
        feed(&mut windows.process, process);
        feed(&mut windows.system, system);

        let snapshot = LoadSnapshot {
            process: round2(windows.process.average()),
            system: round2(windows.system.average()),
        };
        self.snapshot.store(Arc::new(snapshot));
        self.samples.fetch_add(1, Ordering::Release);
    }
}

impl LoadSampler {
    pub fn new(source: Arc<dyn LoadQuerySource>, period: Duration) -> Self {
        Self {
            shared: Arc::new(SamplerShared {
                source,
                windows: Mutex::new(LoadWindows::default()),
                snapshot: ArcSwap::from_pointee(LoadSnapshot::default()),
                samples: AtomicU64::new(0),
            }),
            period: period.max(Duration::from_millis(1)),
            worker: Mutex::new(None),
        }
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(|poisoned| {
            warn!("Load sampler worker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Start sampling, replacing any running sampler thread
    pub fn start(&self) {
        self.shutdown();

        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let shared = Arc::clone(&self.shared);
        let period = self.period;

        let spawned = thread::Builder::new()
            .name("tickhud-load-sampler".to_string())
            .spawn(move || {
                let ticker = channel::tick(period);
                shared.sample();
                loop {
                    select! {
                        recv(ticker) -> _ => shared.sample(),
                        recv(stop_rx) -> _ => break,
                    }
                }
                debug!("Load sampler thread exiting");
            });

        match spawned {
            Ok(handle) => {
                info!("Load sampler started with period {:?}", period);
                *self.worker() = Some(Worker {
                    stop: stop_tx,
                    handle,
                });
            }
            Err(e) => warn!("Failed to spawn load sampler thread: {}", e),
        }
    }

    /// Stop sampling and wait for the sampler thread to exit
    ///
    /// No sample is recorded after this returns.
    pub fn shutdown(&self) {
        let Some(worker) = self.worker().take() else {
            return;
        };
        drop(worker.stop);
        if worker.handle.join().is_err() {
            warn!("Load sampler thread panicked");
        }
        debug!("Load sampler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.worker().is_some()
    }

    /// Take one sample on the calling thread
    pub fn sample_now(&self) {
        self.shared.sample();
    }

    /// Last published snapshot
    pub fn snapshot(&self) -> LoadSnapshot {
        **self.shared.snapshot.load()
    }

    /// Number of samples taken since construction
    pub fn sample_count(&self) -> u64 {
        self.shared.samples.load(Ordering::Acquire)
    }
}

impl Drop for LoadSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Replays scripted readings, then repeats the last one
    struct ScriptedLoad {
        process: Vec<f64>,
        system: Vec<f64>,
        calls: AtomicUsize,
    }

    impl ScriptedLoad {
        fn new(process: Vec<f64>, system: Vec<f64>) -> Self {
            Self {
                process,
                system,
                calls: AtomicUsize::new(0),
            }
        }

        fn pick(values: &[f64], i: usize) -> f64 {
            values[i.min(values.len() - 1)]
        }
    }

    impl LoadQuerySource for ScriptedLoad {
        fn process_load_percent(&self) -> f64 {
            Self::pick(&self.process, self.calls.load(Ordering::SeqCst))
        }

        fn system_load_percent(&self) -> f64 {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Self::pick(&self.system, i)
        }
    }

    #[test]
    fn test_zero_and_nan_readings_are_excluded() {
        let source = Arc::new(ScriptedLoad::new(
            vec![0.0, f64::NAN, 10.0, 0.0, 20.0],
            vec![f64::NAN, 50.0, f64::INFINITY, 50.0, 50.0],
        ));
        let sampler = LoadSampler::new(source, Duration::from_millis(500));

        sampler.sample_now();
        assert_eq!(sampler.snapshot(), LoadSnapshot::default());

        sampler.sample_now();
        assert_eq!(sampler.snapshot().system, 50.0);
        assert_eq!(sampler.snapshot().process, 0.0);

        for _ in 0..3 {
            sampler.sample_now();
        }
        let snapshot = sampler.snapshot();
        assert_eq!(snapshot.system, 50.0);
        // only the 10 and the 20 count
        assert_eq!(snapshot.process, 15.0);
        assert_eq!(sampler.sample_count(), 5);
    }

    #[test]
    fn test_idle_readings_push_out_busy_ones() {
        let mut process = vec![50.0];
        process.extend(std::iter::repeat(0.0).take(59));
        let source = Arc::new(ScriptedLoad::new(process, vec![30.0]));
        let sampler = LoadSampler::new(source, Duration::from_millis(500));

        sampler.sample_now();
        assert_eq!(sampler.snapshot().process, 50.0);
        for _ in 0..(LOAD_WINDOW - 1) {
            sampler.sample_now();
        }
        assert_eq!(sampler.snapshot().process, 50.0);

        // the busy reading leaves the window one tick later
        sampler.sample_now();
        assert_eq!(sampler.snapshot().process, 0.0);
        for _ in 0..39 {
            sampler.sample_now();
        }
        assert_eq!(sampler.snapshot(), LoadSnapshot { process: 0.0, system: 30.0 });
    }

    #[test]
    fn test_snapshot_is_rounded_to_two_decimals() {
        let source = Arc::new(ScriptedLoad::new(vec![33.333333], vec![66.666666]));
        let sampler = LoadSampler::new(source, Duration::from_millis(500));
        sampler.sample_now();
        assert_eq!(sampler.snapshot(), LoadSnapshot { process: 33.33, system: 66.67 });
    }

    #[test]
    fn test_no_samples_after_shutdown() {
        let source = Arc::new(ScriptedLoad::new(vec![5.0], vec![5.0]));
        let sampler = LoadSampler::new(source, Duration::from_millis(5));

        sampler.start();
        sampler.start();
        assert!(sampler.is_running());
        thread::sleep(Duration::from_millis(40));
        sampler.shutdown();
        assert!(!sampler.is_running());

        let after = sampler.sample_count();
        assert!(after >= 2);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(sampler.sample_count(), after);
        assert_eq!(sampler.snapshot().process, 5.0);
    }
}
