//! Decoding of `storage.local` reads and change events

use serde_json::{Map, Value};
use sspcloud_core::{ForgeRegistry, LaunchError, Result, Settings, FORGES_KEY, LAUNCHER_KEYS};
use sspcloud_registry::StorageChange;

/// Storage keys the click handler reads
pub fn settings_keys() -> Vec<&'static str> {
    std::iter::once(FORGES_KEY).chain(LAUNCHER_KEYS).collect()
}

/// Items of a `storage.local.get` result, from its JSON text
///
/// `null` (nothing stored yet) reads as empty.
fn snapshot_from_json(json: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(snapshot) => Ok(snapshot),
        Value::Null => Ok(Map::new()),
        other => Err(LaunchError::Storage(format!(
            "storage returned {} instead of an object",
            other
        ))),
    }
}

/// Settings from the JSON text of a `storage.local.get` result
pub fn settings_from_json(json: &str) -> Result<Settings> {
    Ok(Settings::from_snapshot(&snapshot_from_json(json)?))
}

/// Forge list from the JSON text of a `storage.local.get` result
pub fn forges_from_json(json: &str) -> Result<ForgeRegistry> {
    Ok(ForgeRegistry::from_snapshot(&snapshot_from_json(json)?))
}

/// Whether a `storage.onChanged` event calls for a registration rebuild
pub fn forges_changed(area: &str, keys: Vec<String>) -> bool {
    area == "local" && StorageChange { keys }.touches(FORGES_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_cover_forges_and_launcher() {
        let keys = settings_keys();
        assert_eq!(keys[0], "forges");
        assert!(keys.contains(&"baseUrl"));
        assert!(keys.contains(&"persistenceSize"));
        assert_eq!(keys.len(), 7);
    }

    #[test]
    fn test_partial_snapshot() {
        let settings = settings_from_json(
            r#"{"version": "3.0.0", "forges": [{"domain": "git.example.org", "type": "gitlab", "urlTemplate": ""}]}"#,
        )
        .unwrap();
        assert_eq!(settings.launcher.version, "3.0.0");
        assert_eq!(
            settings.launcher.base_url,
            "https://datalab.sspcloud.fr/launcher/ide/vscode-python"
        );
        assert!(settings.forge_for("git.example.org").is_some());
        assert_eq!(settings.template_for("git.example.org"), None);
    }

    #[test]
    fn test_forges_only() {
        let forges = forges_from_json(
            r#"{"forges": [{"domain": "git.example.org", "type": "gitlab"}, {"domain": "github.com", "type": "github"}]}"#,
        )
        .unwrap();
        assert_eq!(forges.len(), 2);
        assert!(forges_from_json("null").unwrap().is_empty());
    }

    #[test]
    fn test_only_local_forge_changes_rebuild() {
        let keys = |names: &[&str]| names.iter().map(|k| k.to_string()).collect::<Vec<_>>();
        assert!(forges_changed("local", keys(&["version", "forges"])));
        assert!(!forges_changed("local", keys(&["version"])));
        assert!(!forges_changed("sync", keys(&["forges"])));
    }

    #[test]
    fn test_null_and_garbage() {
        assert_eq!(settings_from_json("null").unwrap().launcher.s3, "region-79669f20");
        assert!(matches!(
            settings_from_json("[1, 2]"),
            Err(LaunchError::Storage(_))
        ));
        assert!(matches!(
            settings_from_json("{not json"),
            Err(LaunchError::Serialization(_))
        ));
    }
}
