//! Typed access to the settings kept in a storage area

use serde_json::{Map, Value};
use sspcloud_core::fail_open::fail_open_or_default;
use sspcloud_core::{
    Forge, ForgeRegistry, LauncherConfig, Result, Settings, FORGES_KEY, LAUNCHER_KEYS,
};
use tracing::{info, instrument};

use crate::storage::StorageArea;

/// Settings store over any storage area
pub struct SettingsStore<S> {
    storage: S,
}

impl<S: StorageArea> SettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read forges and launcher configuration in one go
    pub async fn load(&self) -> Result<Settings> {
        let mut keys = vec![FORGES_KEY];
        keys.extend(LAUNCHER_KEYS);
        let snapshot = self.storage.get(&keys).await?;
        Ok(Settings::from_snapshot(&snapshot))
    }

    /// Like `load`, but an unreadable store yields the defaults
    pub async fn load_or_default(&self) -> Settings {
        fail_open_or_default("load_settings", || self.load()).await
    }

    pub async fn forges(&self) -> Result<ForgeRegistry> {
        let snapshot = self.storage.get(&[FORGES_KEY]).await?;
        Ok(ForgeRegistry::from_snapshot(&snapshot))
    }

    pub async fn save_forges(&self, registry: &ForgeRegistry) -> Result<()> {
        let mut items = Map::new();
        items.insert(FORGES_KEY.to_string(), registry.to_value()?);
        self.storage.set(items).await
    }

    /// Add a forge, replacing any forge with the same domain
    #[instrument(skip(self), fields(domain = %forge.domain))]
    pub async fn upsert_forge(&self, forge: Forge) -> Result<ForgeRegistry> {
        let mut registry = self.forges().await?;
        registry.upsert(forge);
        self.save_forges(&registry).await?;
        info!("Saved forge list ({} forges)", registry.len());
        Ok(registry)
    }

    /// Remove the forge for a domain
    #[instrument(skip(self))]
    pub async fn remove_forge(&self, domain: &str) -> Result<Forge> {
        let mut registry = self.forges().await?;
        let removed = registry.remove(domain)?;
        self.save_forges(&registry).await?;
        info!("Removed forge {}", removed.domain);
        Ok(removed)
    }

    pub async fn launcher_config(&self) -> Result<LauncherConfig> {
        let snapshot = self.storage.get(&LAUNCHER_KEYS).await?;
        Ok(LauncherConfig::from_snapshot(&snapshot))
    }

    /// Persist a launcher configuration, blank fields stored as defaults
    pub async fn save_launcher_config(&self, config: &LauncherConfig) -> Result<()> {
        let items = config.with_defaults().to_snapshot()?;
        self.storage.set(items).await
    }

    /// Drop the stored launcher fields so the defaults apply again
    pub async fn reset_launcher_config(&self) -> Result<()> {
        self.storage.remove(&LAUNCHER_KEYS).await
    }

    /// Raw value of one stored key
    pub async fn raw(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.storage.get(&[key]).await?.remove(key))
    }
}
