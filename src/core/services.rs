//! Shared dependencies handed to every session and slot

use super::pipeline::RenderFn;
use super::scheduler::Scheduler;
use super::telemetry::Telemetry;
use std::sync::Arc;
use tickhud_core::{DisplayConfigResolver, SurfaceWriter};
use tickhud_types::SurfaceKind;

/// One writer per surface type
#[derive(Clone)]
pub struct SurfaceWriters {
    pub tab: Arc<dyn SurfaceWriter>,
    pub action_bar: Arc<dyn SurfaceWriter>,
    pub boss_bar: Arc<dyn SurfaceWriter>,
}

impl SurfaceWriters {
    /// Use the same writer for all three surfaces
    pub fn shared(writer: Arc<dyn SurfaceWriter>) -> Self {
        Self {
            tab: Arc::clone(&writer),
            action_bar: Arc::clone(&writer),
            boss_bar: writer,
        }
    }

    pub fn get(&self, kind: SurfaceKind) -> &Arc<dyn SurfaceWriter> {
        match kind {
            SurfaceKind::Tab => &self.tab,
            SurfaceKind::ActionBar => &self.action_bar,
            SurfaceKind::BossBar => &self.boss_bar,
        }
    }
}

pub struct DisplayServices {
    pub scheduler: Arc<dyn Scheduler>,
    pub telemetry: Arc<Telemetry>,
    pub resolver: Arc<dyn DisplayConfigResolver>,
    pub writers: SurfaceWriters,
    pub render_fn: RenderFn,
}
