//! # sspcloud-core
//!
//! Core types for the SSPCloud launch button.
//!
//! The launch button sits on repository pages of code forges (GitHub, and any
//! GitLab instance the user registers) and opens the SSPCloud launcher with the
//! repository pre-filled.
//!
//! This crate holds everything that is shared between the page engine, the
//! background registration side and the CLI:
//!
//! - Forge records and the forge registry
//! - Project identities and repository references (clone URL normalization)
//! - Launcher configuration with its hardcoded defaults
//! - The launcher URL builder
//! - The unified error type and fail-open helper

mod config;
mod error;
pub mod fail_open;
mod forges;
pub mod launch_url;
mod types;

pub use config::{LauncherConfig, Settings, KUBERNETES_ROLE, LAUNCHER_KEYS};
pub use error::{LaunchError, Result};
pub use forges::{ForgeRegistry, FORGES_KEY};
pub use launch_url::{build_launch_url, guillemets, normalize_clone_url};
pub use types::*;
