//! tickhud: live server performance overlays, scheduled per connected user
//!
//! This library provides:
//! - A telemetry facade over tick timings, smoothed CPU load and memory
//! - Module pipelines that render TPS, MSPT, CPU, ping and friends as text
//! - Per-user display sessions driving tab list, action bar and boss bar
//! - Configuration, permission-based config selection and JSON persistence

pub mod config;
pub mod core;

// Re-export commonly used types
pub use config::{AppConfig, JsonFileStore, PermissionChecker, PermissionResolver};
pub use core::{Engine, HostAdapters, SessionRegistry, SurfaceWriters, Telemetry, UserSession};
