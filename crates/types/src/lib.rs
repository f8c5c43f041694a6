//! tickhud-types: Shared data types for tickhud.
//!
//! This crate contains pure data types (display configs, themes, surface
//! frames, persisted toggle flags) that are shared across all tickhud crates.
//! They carry no I/O and no scheduling, making them suitable as a foundation
//! layer for hosts that only need to read or write configuration.

pub mod display;
pub mod frame;
pub mod surface;
pub mod theme;

// Re-export commonly used types at the crate root for convenience
pub use display::{
    ActionBarSettings, BarColor, BarColors, BarOverlay, BossBarSettings, DisplayConfig, FillMode,
    SurfaceSettings, TabSettings,
};
pub use frame::SurfaceFrame;
pub use surface::{DisplayFlags, SurfaceKind};
pub use theme::{Theme, ThemeColors, Tier};
