//! Launcher configuration
//!
//! The six launcher fields are stored flat in the extension storage area
//! (camelCase keys, next to the `forges` list). Every field has a hardcoded
//! default; a blank value always means "use the default".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{Forge, ForgeRegistry, Result};

/// Role requested from the launcher, not user configurable
pub const KUBERNETES_ROLE: &str = "admin";

/// Storage keys holding the launcher configuration
pub const LAUNCHER_KEYS: [&str; 6] = [
    "baseUrl",
    "version",
    "s3",
    "personalInit",
    "vaultSecret",
    "persistenceSize",
];

/// Launcher service parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    /// Launcher endpoint, without query string
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chart version of the IDE service
    #[serde(default = "default_version")]
    pub version: String,

    /// S3 region identifier
    #[serde(default = "default_s3")]
    pub s3: String,

    /// URL of the personal init script run at service start
    #[serde(default = "default_personal_init")]
    pub personal_init: String,

    /// Vault secret mounted in the service
    #[serde(default = "default_vault_secret")]
    pub vault_secret: String,

    /// Size of the persistent volume
    #[serde(default = "default_persistence_size")]
    pub persistence_size: String,
}

// Default value providers
fn default_base_url() -> String {
    "https://datalab.sspcloud.fr/launcher/ide/vscode-python".to_string()
}

fn default_version() -> String {
    "2.5.0".to_string()
}

fn default_s3() -> String {
    "region-79669f20".to_string()
}

fn default_personal_init() -> String {
    "https://raw.githubusercontent.com/micedre/sspcloud-init-scripts/refs/heads/main/vscode/init.sh"
        .to_string()
}

fn default_vault_secret() -> String {
    "OPENAI-LLM".to_string()
}

fn default_persistence_size() -> String {
    "20Gi".to_string()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
            s3: default_s3(),
            personal_init: default_personal_init(),
            vault_secret: default_vault_secret(),
            persistence_size: default_persistence_size(),
        }
    }
}

impl LauncherConfig {
    /// Trim every field and replace blank ones by their default
    pub fn with_defaults(&self) -> Self {
        fn pick(value: &str, default: fn() -> String) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default()
            } else {
                trimmed.to_string()
            }
        }

        Self {
            base_url: pick(&self.base_url, default_base_url),
            version: pick(&self.version, default_version),
            s3: pick(&self.s3, default_s3),
            personal_init: pick(&self.personal_init, default_personal_init),
            vault_secret: pick(&self.vault_secret, default_vault_secret),
            persistence_size: pick(&self.persistence_size, default_persistence_size),
        }
    }

    /// Read the launcher keys out of a storage snapshot
    ///
    /// Missing keys and non-string values fall back to the defaults.
    pub fn from_snapshot(snapshot: &Map<String, Value>) -> Self {
        let mut fields = Map::new();
        for key in LAUNCHER_KEYS {
            match snapshot.get(key) {
                Some(Value::String(s)) => {
                    fields.insert(key.to_string(), Value::String(s.clone()));
                }
                Some(Value::Null) | None => {}
                Some(other) => warn!("Ignoring non-string launcher setting {}={}", key, other),
            }
        }
        serde_json::from_value::<Self>(Value::Object(fields))
            .unwrap_or_default()
            .with_defaults()
    }

    /// Flatten into storage entries
    pub fn to_snapshot(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Get a field by its storage key
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "baseUrl" => Some(&self.base_url),
            "version" => Some(&self.version),
            "s3" => Some(&self.s3),
            "personalInit" => Some(&self.personal_init),
            "vaultSecret" => Some(&self.vault_secret),
            "persistenceSize" => Some(&self.persistence_size),
            _ => None,
        }
    }

    /// Set a field by its storage key
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let slot = match key {
            "baseUrl" => &mut self.base_url,
            "version" => &mut self.version,
            "s3" => &mut self.s3,
            "personalInit" => &mut self.personal_init,
            "vaultSecret" => &mut self.vault_secret,
            "persistenceSize" => &mut self.persistence_size,
            _ => return Err(crate::LaunchError::UnknownSetting(key.to_string())),
        };
        *slot = value.into();
        Ok(())
    }
}

/// Everything the click handler needs from storage
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub forges: ForgeRegistry,
    pub launcher: LauncherConfig,
}

impl Settings {
    /// Decode settings from a storage snapshot
    pub fn from_snapshot(snapshot: &Map<String, Value>) -> Self {
        Self {
            forges: ForgeRegistry::from_snapshot(snapshot),
            launcher: LauncherConfig::from_snapshot(snapshot),
        }
    }

    /// Forge configured for a host
    pub fn forge_for(&self, host: &str) -> Option<&Forge> {
        self.forges.find(host)
    }

    /// Usable URL template for a host
    pub fn template_for(&self, host: &str) -> Option<&str> {
        self.forge_for(host).and_then(Forge::template)
    }
}
