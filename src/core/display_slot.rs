//! One periodic rendering job bound to a (user, surface) pair

use super::scheduler::{Job, JobControl, JobHandle};
use super::services::DisplayServices;
use super::surface::SurfaceRenderer;
use log::{debug, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tickhud_core::UserHandle;
use tickhud_types::SurfaceKind;

/// Lifecycle of a slot's job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Disabled,
    /// Scheduled, first execution (and its eligibility check) still pending
    Starting,
    Running,
}

struct RunningJob {
    handle: JobHandle,
    validated: Arc<AtomicBool>,
    /// Set under the slot lock once the slot lets go of this job
    retired: Arc<AtomicBool>,
}

type JobSlot = Arc<Mutex<Option<RunningJob>>>;

fn lock_job(job: &Mutex<Option<RunningJob>>) -> MutexGuard<'_, Option<RunningJob>> {
    job.lock().unwrap_or_else(|poisoned| {
        warn!("Display slot mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// A cancellable refresh job for one surface of one user
///
/// The slot only runs while its user is online and a display config applies.
/// Start and stop are serialized on the slot's job lock and every start
/// retires the previous job first, so a slot never owns more than one job.
pub struct DisplaySlot {
    kind: SurfaceKind,
    user: Arc<dyn UserHandle>,
    services: Arc<DisplayServices>,
    enabled: Arc<AtomicBool>,
    dirty: Arc<AtomicBool>,
    job: JobSlot,
}

impl DisplaySlot {
    pub(crate) fn new(
        kind: SurfaceKind,
        user: Arc<dyn UserHandle>,
        services: Arc<DisplayServices>,
        enabled: bool,
        dirty: Arc<AtomicBool>,
    ) -> Self {
        Self {
            kind,
            user,
            services,
            enabled: Arc::new(AtomicBool::new(enabled)),
            dirty,
            job: Arc::new(Mutex::new(None)),
        }
    }

    fn job(&self) -> MutexGuard<'_, Option<RunningJob>> {
        lock_job(&self.job)
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Returns true if the flag changed
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::SeqCst) != enabled
    }

    pub fn is_running(&self) -> bool {
        self.job().as_ref().is_some_and(|job| !job.handle.is_cancelled())
    }

    pub fn state(&self) -> SlotState {
        match self.job().as_ref() {
            Some(job) if !job.handle.is_cancelled() => {
                if job.validated.load(Ordering::SeqCst) {
                    SlotState::Running
                } else {
                    SlotState::Starting
                }
            }
            _ => SlotState::Disabled,
        }
    }

    /// Id of the current job, if any
    pub fn job_handle(&self) -> Option<JobHandle> {
        self.job().as_ref().map(|job| job.handle.clone())
    }

    /// (Re)start the refresh job
    ///
    /// Does nothing if the user is offline or no display config applies.
    pub fn start(&self) {
        let mut job = self.job();
        self.retire(&mut job);
        self.start_locked(&mut job);
    }

    /// Start unless a live job is already scheduled
    pub(crate) fn start_if_stopped(&self) {
        let mut job = self.job();
        if job.as_ref().is_some_and(|job| !job.handle.is_cancelled()) {
            return;
        }
        self.retire(&mut job);
        self.start_locked(&mut job);
    }

    fn start_locked(&self, job: &mut Option<RunningJob>) {
        let identity = self.user.identity();
        if !self.user.is_online() {
            trace!("Not starting {} for offline user {}", self.kind, identity);
            return;
        }
        let Some(config) = self.services.resolver.config_for(identity) else {
            debug!("No display config for {}, {} stays off", identity, self.kind);
            return;
        };

        let settings = config.surface(self.kind);
        let theme = self.services.resolver.theme(&settings.theme);
        let renderer = match SurfaceRenderer::build(
            self.kind,
            &config,
            &self.user,
            &theme,
            &self.services.render_fn,
        ) {
            Ok(renderer) => renderer,
            Err(e) => {
                warn!("Cannot start {} for {}: {}", self.kind, identity, e);
                return;
            }
        };

        let validated = Arc::new(AtomicBool::new(false));
        let retired = Arc::new(AtomicBool::new(false));
        let body = self.job_body(renderer, Arc::clone(&validated), Arc::clone(&retired));
        let handle = self
            .services
            .scheduler
            .schedule_at_fixed_rate(settings.update_interval(), body);
        debug!("Started {} for {} as {}", self.kind, identity, handle.id());

        *job = Some(RunningJob {
            handle,
            validated,
            retired,
        });
    }

    fn job_body(
        &self,
        renderer: SurfaceRenderer,
        validated: Arc<AtomicBool>,
        retired: Arc<AtomicBool>,
    ) -> Job {
        let kind = self.kind;
        let slot = Arc::clone(&self.job);
        let user = Arc::clone(&self.user);
        let enabled = Arc::clone(&self.enabled);
        let dirty = Arc::clone(&self.dirty);
        let telemetry = Arc::clone(&self.services.telemetry);
        let resolver = Arc::clone(&self.services.resolver);
        let writer = Arc::clone(self.services.writers.get(kind));

        Box::new(move || {
            if retired.load(Ordering::SeqCst) {
                return JobControl::Cancel;
            }
            let identity = user.identity();
            if !user.is_online() {
                debug!("{} for {} went offline, cancelling", kind, identity);
                return JobControl::Cancel;
            }

            // Eligibility may have changed since the toggle was persisted
            if !validated.swap(true, Ordering::SeqCst) {
                let allowed = resolver
                    .config_for(identity)
                    .is_some_and(|config| config.surface(kind).allow);
                if !allowed {
                    // A retired job must not touch flags a replacement already copied
                    let _slot = lock_job(&slot);
                    if retired.load(Ordering::SeqCst) {
                        return JobControl::Cancel;
                    }
                    debug!("{} no longer allowed for {}, disabling", kind, identity);
                    if enabled.swap(false, Ordering::SeqCst) {
                        dirty.store(true, Ordering::SeqCst);
                    }
                    return JobControl::Cancel;
                }
            }

            let frame = renderer.render(&telemetry);
            writer.write(identity, &frame);
            JobControl::Continue
        })
    }

    /// Cancel the job and reset the surface if the user is still online
    pub fn stop(&self) {
        let mut job = self.job();
        self.retire(&mut job);
    }

    fn retire(&self, job: &mut Option<RunningJob>) {
        let Some(job) = job.take() else {
            return;
        };
        job.retired.store(true, Ordering::SeqCst);
        job.handle.cancel();
        if self.user.is_online() {
            self.services.writers.get(self.kind).clear(self.user.identity());
        }
    }
}
