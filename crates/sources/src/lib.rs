//! tickhud-sources: Telemetry primitives and producers for tickhud.
//!
//! Rolling statistics (`WindowedAverage`, `BoundedSampleLog`), the host-fed
//! `TickTracker`, the background `LoadSampler`, and a sysinfo-backed
//! `SystemProbe` for CPU load and memory.

mod load;
mod rolling;
mod system;
mod tick;
mod tick_log;

pub use load::LoadSampler;
pub use rolling::{WindowedAverage, VALUE_SCALE};
pub use system::SystemProbe;
pub use tick::TickTracker;
pub use tick_log::BoundedSampleLog;

pub use rust_decimal::Decimal;
