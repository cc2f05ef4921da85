//! # sspcloud-registry
//!
//! Background side of the launch button.
//!
//! This crate provides:
//! - The storage area abstraction (in-memory, and JSON-file backed behind the
//!   default `fs` feature) with change notifications
//! - The settings store reading and writing forges and launcher config
//! - Dynamic content-script registration for user-configured GitLab forges,
//!   rebuilt whenever the forge list changes

#[cfg(feature = "fs")]
pub mod file;
pub mod registration;
mod service;
mod settings;
mod storage;

#[cfg(feature = "fs")]
pub use file::{FileStorage, StorageWatcher};
#[cfg(feature = "fs")]
pub use registration::ManifestRegistrar;
pub use registration::{
    ActiveRegistration, ContentScriptSpec, RebuildReport, RecordingRegistrar, RegistrarCall,
    RegistrationId, RegistrationSet, RunAt, ScriptRegistrar, GITLAB_SCRIPTS,
};
pub use service::run_registration_service;
pub use settings::SettingsStore;
pub use storage::{MemoryStorage, StorageArea, StorageChange};

pub use sspcloud_core::{LaunchError, Result};
