//! Error types surfaced by the display engine

use thiserror::Error;
use tickhud_types::SurfaceKind;
use uuid::Uuid;

/// A module list named something outside the module registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("unknown module '{name}' (known modules: {known})")]
    UnknownModule { name: String, known: String },
}

/// Command-level failures shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("no display configuration applies to you")]
    NoDisplayConfig,
    #[error("the {0} display is not allowed for you")]
    SurfaceNotAllowed(SurfaceKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no session registered for {0}")]
    NotRegistered(Uuid),
}
