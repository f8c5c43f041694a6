//! Configuration management

mod resolver;
mod settings;
mod store;

pub use resolver::{PermissionChecker, PermissionResolver};
pub use settings::{AppConfig, ConfigError, SamplerConfig, SchedulerConfig, DEFAULT_THEME};
pub use store::JsonFileStore;
