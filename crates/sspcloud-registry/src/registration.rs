//! Dynamic content-script registration
//!
//! github.com is covered by the static content script. Every other forge is
//! user-configured, so its GitLab script has to be registered at runtime and
//! re-registered whenever the forge list changes.
//!
//! On `wasm32` the registrar futures are not `Send`: browser promises live on
//! the single page thread.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sspcloud_core::{Forge, ForgeKind, ForgeRegistry, LaunchError, Result};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(feature = "fs")]
use crate::file::write_json_atomic;
#[cfg(feature = "fs")]
use std::path::PathBuf;
#[cfg(feature = "fs")]
use tracing::instrument;

/// Scripts injected on GitLab pages, relative to the extension root
///
/// The wasm-bindgen glue first, then the bootstrap calling `start_gitlab`.
pub const GITLAB_SCRIPTS: [&str; 2] = ["pkg/sspcloud_extension.js", "content/gitlab.js"];

/// When the browser runs a registered script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAt {
    DocumentStart,
    DocumentEnd,
    #[default]
    DocumentIdle,
}

/// A content script to register for one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentScriptSpec {
    pub matches: Vec<String>,
    pub js: Vec<String>,
    pub run_at: RunAt,
}

impl ContentScriptSpec {
    /// Script for a forge, `None` for GitHub forges and empty domains
    pub fn for_forge(forge: &Forge) -> Option<Self> {
        if forge.kind != ForgeKind::Gitlab || forge.domain.trim().is_empty() {
            return None;
        }
        Some(Self {
            matches: vec![format!("*://{}/*", forge.domain)],
            js: GITLAB_SCRIPTS.iter().map(|s| s.to_string()).collect(),
            run_at: RunAt::DocumentIdle,
        })
    }
}

/// Opaque handle returned by a registrar
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub String);

impl RegistrationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for the browser's script registration API (allows mocking in tests)
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait ScriptRegistrar: Send + Sync {
    async fn register(&self, spec: &ContentScriptSpec) -> Result<RegistrationId>;
    async fn unregister(&self, id: &RegistrationId) -> Result<()>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<R: ScriptRegistrar + ?Sized> ScriptRegistrar for std::sync::Arc<R> {
    async fn register(&self, spec: &ContentScriptSpec) -> Result<RegistrationId> {
        (**self).register(spec).await
    }

    async fn unregister(&self, id: &RegistrationId) -> Result<()> {
        (**self).unregister(id).await
    }
}

/// A registrar call, as recorded by `RecordingRegistrar`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarCall {
    Register(Vec<String>),
    Unregister(RegistrationId),
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<RegistrarCall>,
    active: Vec<(RegistrationId, ContentScriptSpec)>,
    reject_register: Vec<String>,
    reject_unregister: bool,
}

/// In-memory registrar that records every call
#[derive(Default)]
pub struct RecordingRegistrar {
    state: Mutex<RecordingState>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail registrations whose match pattern contains `domain`
    pub fn reject_domain(self, domain: &str) -> Self {
        self.with_state(|s| s.reject_register.push(domain.to_string()));
        self
    }

    /// Fail every unregistration
    pub fn reject_unregister(self) -> Self {
        self.with_state(|s| s.reject_unregister = true);
        self
    }

    pub fn calls(&self) -> Vec<RegistrarCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Match patterns of the currently registered scripts
    pub fn active(&self) -> Vec<String> {
        self.with_state(|s| {
            s.active
                .iter()
                .flat_map(|(_, spec)| spec.matches.iter().cloned())
                .collect()
        })
    }

    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RecordingState) -> T) -> T {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ScriptRegistrar for RecordingRegistrar {
    async fn register(&self, spec: &ContentScriptSpec) -> Result<RegistrationId> {
        self.with_state(|s| {
            s.calls.push(RegistrarCall::Register(spec.matches.clone()));
            let rejected = s
                .reject_register
                .iter()
                .any(|d| spec.matches.iter().any(|m| m.contains(d.as_str())));
            if rejected {
                return Err(LaunchError::Registration(format!(
                    "rejected {:?}",
                    spec.matches
                )));
            }
            let id = RegistrationId::generate();
            s.active.push((id.clone(), spec.clone()));
            Ok(id)
        })
    }

    async fn unregister(&self, id: &RegistrationId) -> Result<()> {
        self.with_state(|s| {
            s.calls.push(RegistrarCall::Unregister(id.clone()));
            // The browser forgets the script even when the call errors
            s.active.retain(|(active, _)| active != id);
            if s.reject_unregister {
                return Err(LaunchError::Registration(format!("cannot unregister {}", id)));
            }
            Ok(())
        })
    }
}

#[cfg(feature = "fs")]
#[derive(Serialize)]
struct ManifestEntry<'a> {
    id: &'a RegistrationId,
    #[serde(flatten)]
    spec: &'a ContentScriptSpec,
}

/// Registrar that keeps the active scripts in a JSON manifest file
///
/// Used by the CLI watcher so another process can pick up the set.
#[cfg(feature = "fs")]
pub struct ManifestRegistrar {
    path: PathBuf,
    active: tokio::sync::Mutex<Vec<(RegistrationId, ContentScriptSpec)>>,
}

#[cfg(feature = "fs")]
impl ManifestRegistrar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn flush(&self, active: &[(RegistrationId, ContentScriptSpec)]) -> Result<()> {
        let entries: Vec<ManifestEntry<'_>> = active
            .iter()
            .map(|(id, spec)| ManifestEntry { id, spec })
            .collect();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_json_atomic(&self.path, &serde_json::to_value(&entries)?).await
    }
}

#[cfg(feature = "fs")]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ScriptRegistrar for ManifestRegistrar {
    #[instrument(skip(self, spec), fields(matches = ?spec.matches))]
    async fn register(&self, spec: &ContentScriptSpec) -> Result<RegistrationId> {
        let mut active = self.active.lock().await;
        let id = RegistrationId::generate();
        active.push((id.clone(), spec.clone()));
        if let Err(e) = self.flush(&active).await {
            active.pop();
            return Err(LaunchError::Registration(format!(
                "failed to write {}: {}",
                self.path.display(),
                e
            )));
        }
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn unregister(&self, id: &RegistrationId) -> Result<()> {
        let mut active = self.active.lock().await;
        let before = active.len();
        active.retain(|(active_id, _)| active_id != id);
        if active.len() == before {
            return Err(LaunchError::Registration(format!("unknown registration {}", id)));
        }
        self.flush(&active).await
    }
}

/// A script registered for a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRegistration {
    pub domain: String,
    pub id: RegistrationId,
}

/// Outcome of one rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub unregistered: Vec<String>,
    pub registered: Vec<String>,
    pub failed: Vec<String>,
    /// GitHub forges, served by the static script
    pub skipped: Vec<String>,
}

/// The set of scripts this process registered
#[derive(Debug, Default)]
pub struct RegistrationSet {
    active: Vec<ActiveRegistration>,
}

impl RegistrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[ActiveRegistration] {
        &self.active
    }

    pub fn domains(&self) -> Vec<&str> {
        self.active.iter().map(|r| r.domain.as_str()).collect()
    }

    /// Replace every registration with one per GitLab forge
    ///
    /// Unregistration failures are logged and the handle is dropped anyway;
    /// failed registrations are logged and reported.
    pub async fn rebuild<R: ScriptRegistrar + ?Sized>(
        &mut self,
        registrar: &R,
        forges: &ForgeRegistry,
    ) -> RebuildReport {
        let mut report = RebuildReport::default();

        for stale in self.active.drain(..) {
            match registrar.unregister(&stale.id).await {
                Ok(()) => debug!("Unregistered script for {}", stale.domain),
                Err(e) => warn!("Failed to unregister script for {}: {}", stale.domain, e),
            }
            report.unregistered.push(stale.domain);
        }

        for forge in forges.iter() {
            let Some(spec) = ContentScriptSpec::for_forge(forge) else {
                report.skipped.push(forge.domain.clone());
                continue;
            };
            match registrar.register(&spec).await {
                Ok(id) => {
                    info!("Registered content script for {}", forge.domain);
                    self.active.push(ActiveRegistration {
                        domain: forge.domain.clone(),
                        id,
                    });
                    report.registered.push(forge.domain.clone());
                }
                Err(e) => {
                    warn!("Failed to register content script for {}: {}", forge.domain, e);
                    report.failed.push(forge.domain.clone());
                }
            }
        }

        report
    }
}
