//! tickhud-core: Collaborator traits and shared constants for tickhud.
//!
//! This crate contains the narrow interfaces the engine consumes from its
//! host (tick timings, CPU load, users, surface writers, persistence) and
//! the value types passed across them.

pub mod constants;
mod host;
mod telemetry;

pub use constants::{
    BYTES_PER_MB, DEFAULT_SAMPLER_PERIOD, LOAD_WINDOW, MAX_TPS, MSPT_BUDGET, MSPT_WINDOW,
    MS_IN_NANO, SAMPLE_INTERVAL, SEC_IN_NANO, TICKS_PER_SECOND, TICK_WINDOWS, TPS_BASE, TPS_WINDOWS,
};
pub use host::{DisplayConfigResolver, PersistenceStore, SurfaceWriter, UserHandle};
pub use telemetry::{
    LoadQuerySource, LoadSnapshot, MemoryQuerySource, MemoryUsage, TickReport, TickSampleSource,
    TickSummary,
};

// Re-export types used in trait signatures for convenience
pub use tickhud_types::{DisplayConfig, DisplayFlags, SurfaceFrame, SurfaceKind, Theme};
pub use uuid::Uuid;
