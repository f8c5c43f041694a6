//! Display engine: scheduling, module rendering and per-user sessions

mod display_slot;
mod engine;
mod error;
mod modules;
mod pipeline;
mod scheduler;
mod services;
mod session;
mod session_registry;
mod surface;
mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use display_slot::{DisplaySlot, SlotState};
pub use engine::{Engine, HostAdapters};
pub use error::{DisplayError, ModuleError, RegistryError};
pub use modules::{mspt_tier, parse_modules, ping_tier, tps_tier, ModuleKind, ModuleOutput};
pub use pipeline::{render_modules, standard_render, ModulePipeline, PipelineBuilder, RenderFn};
pub use scheduler::{
    Job, JobControl, JobHandle, JobId, ManualScheduler, Scheduler, TokioScheduler,
};
pub use services::{DisplayServices, SurfaceWriters};
pub use session::UserSession;
pub use session_registry::SessionRegistry;
pub use surface::{bar_progress, bar_tier, SurfaceRenderer};
pub use telemetry::Telemetry;
