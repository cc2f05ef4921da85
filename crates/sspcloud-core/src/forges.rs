//! Forge registry
//!
//! The ordered list of forges the user configured. Domains are unique: adding
//! a forge for a domain that is already present replaces the old record.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{normalize_domain, Forge, ForgeKind, LaunchError, Result, GITHUB_DOMAIN};

/// Storage key holding the forge list
pub const FORGES_KEY: &str = "forges";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForgeRegistry {
    forges: Vec<Forge>,
}

impl ForgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from records, last record wins on duplicate domains
    pub fn from_forges(forges: impl IntoIterator<Item = Forge>) -> Self {
        let mut registry = Self::new();
        for forge in forges {
            registry.upsert(forge);
        }
        registry
    }

    /// Decode the `forges` entry of a storage snapshot
    ///
    /// Entries that do not decode, or whose domain is invalid, are skipped.
    pub fn from_snapshot(snapshot: &Map<String, Value>) -> Self {
        let entries = match snapshot.get(FORGES_KEY) {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => return Self::new(),
            Some(other) => {
                warn!("Ignoring malformed forges setting: {}", other);
                return Self::new();
            }
        };

        let forges = entries.iter().filter_map(|entry| {
            let forge = match serde_json::from_value::<Forge>(entry.clone()) {
                Ok(forge) => forge,
                Err(e) => {
                    warn!("Skipping malformed forge record {}: {}", entry, e);
                    return None;
                }
            };
            match normalize_domain(&forge.domain) {
                Ok(domain) => Some(Forge { domain, ..forge }),
                Err(e) => {
                    warn!("Skipping forge record: {}", e);
                    None
                }
            }
        });

        Self::from_forges(forges)
    }

    /// Encode as the `forges` storage value
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.forges)?)
    }

    /// Insert or replace the forge for its domain
    pub fn upsert(&mut self, forge: Forge) {
        if let Some(existing) = self.forges.iter_mut().find(|f| f.domain == forge.domain) {
            debug!("Replacing forge {}", forge.domain);
            *existing = forge;
        } else {
            self.forges.push(forge);
        }
    }

    /// Remove the forge for a domain
    pub fn remove(&mut self, domain: &str) -> Result<Forge> {
        let domain = normalize_domain(domain)?;
        let index = self
            .forges
            .iter()
            .position(|f| f.domain == domain)
            .ok_or_else(|| LaunchError::ForgeNotFound(domain.clone()))?;
        Ok(self.forges.remove(index))
    }

    pub fn find(&self, domain: &str) -> Option<&Forge> {
        let domain = domain.trim().to_lowercase();
        self.forges.iter().find(|f| f.domain == domain)
    }

    /// Forge kind that handles a host
    ///
    /// github.com is always GitHub, other hosts only when registered.
    pub fn kind_for(&self, host: &str) -> Option<ForgeKind> {
        match self.find(host) {
            Some(forge) => Some(forge.kind),
            None if host.eq_ignore_ascii_case(GITHUB_DOMAIN) => Some(ForgeKind::Github),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Forge> {
        self.forges.iter()
    }

    pub fn len(&self) -> usize {
        self.forges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forges.is_empty()
    }
}
