//! sysinfo-backed CPU load and memory probe

use log::{debug, warn};
use std::sync::{Mutex, MutexGuard};
use sysinfo::{
    get_current_pid, CpuRefreshKind, MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate,
    RefreshKind, System,
};
use tickhud_core::{LoadQuerySource, MemoryQuerySource, MemoryUsage};

/// Queries this process's CPU usage, global CPU usage and memory
///
/// Unavailable readings are reported as `f64::NAN`. The first CPU reading
/// after construction is usually 0.0 since sysinfo needs two refreshes to
/// compute a delta; the load sampler filters those out.
pub struct SystemProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
    cpu_count: usize,
}

impl SystemProbe {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        let pid = match get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Process CPU load unavailable: {}", e);
                None
            }
        };
        let cpu_count = system.cpus().len().max(1);
        debug!("System probe initialized with {} CPUs", cpu_count);

        Self {
            system: Mutex::new(system),
            pid,
            cpu_count,
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(|poisoned| {
            warn!("System probe mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadQuerySource for SystemProbe {
    fn process_load_percent(&self) -> f64 {
        let Some(pid) = self.pid else {
            return f64::NAN;
        };
        let mut system = self.system();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            ProcessRefreshKind::new().with_cpu(),
        );
        match system.process(pid) {
            // sysinfo reports per-core percent; normalise to the whole machine
            Some(process) => process.cpu_usage() as f64 / self.cpu_count as f64,
            None => f64::NAN,
        }
    }

    fn system_load_percent(&self) -> f64 {
        let mut system = self.system();
        system.refresh_cpu_usage();
        system.global_cpu_usage() as f64
    }
}

impl MemoryQuerySource for SystemProbe {
    fn memory_usage(&self) -> Option<MemoryUsage> {
        let mut system = self.system();
        system.refresh_memory();
        let total_bytes = system.total_memory();
        if total_bytes == 0 {
            return None;
        }
        Some(MemoryUsage {
            used_bytes: system.used_memory(),
            total_bytes,
        })
    }
}
