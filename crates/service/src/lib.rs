//! Launcher service for slashlaunch.
//!
//! Ties the patcher and the instance supervisor to the configured game
//! installs. Front ends only talk to [`LauncherService`]; configuration
//! storage is supplied through the [`ConfigStore`] trait.
//!
//! # Operations
//!
//! - **Patch** - bring every install up to date, streaming progress
//! - **Validate** - check every install without touching it
//! - **Launch** - start the configured number of instances
//! - **DEP fix / gateway** - OS specific settings

pub mod config;
pub mod error;
pub mod service;

// Re-export primary types for convenience.
pub use config::ConfigStore;
pub use error::ServiceError;
pub use service::{LauncherService, PatchRun};
