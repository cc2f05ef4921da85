//! `storage.local` through the extension API

use js_sys::{Array, JSON};
use sspcloud_core::{ForgeRegistry, LaunchError, Result, Settings, FORGES_KEY};
use wasm_bindgen::JsValue;

use crate::js_api::{call, extension_api, property, settle};
use crate::snapshot::{forges_from_json, settings_from_json, settings_keys};

fn storage() -> Result<JsValue> {
    property(LaunchError::Storage, &extension_api(LaunchError::Storage)?, "storage")
}

/// `storage.local.get(keys)`, as JSON text
async fn get_json(keys: &[&str]) -> Result<String> {
    let local = property(LaunchError::Storage, &storage()?, "local")?;
    let keys: Array = keys.iter().copied().map(JsValue::from).collect();
    let pending = call(
        LaunchError::Storage,
        &local,
        "get",
        &Array::of1(&keys),
    )?;
    let items = settle(LaunchError::Storage, "storage.local.get", pending).await?;

    JSON::stringify(&items)
        .map(String::from)
        .map_err(|e| LaunchError::Storage(format!("JSON.stringify: {:?}", e)))
}

/// Read the settings keys from extension storage
pub async fn load_settings() -> Result<Settings> {
    settings_from_json(&get_json(&settings_keys()).await?)
}

/// Read the forge list from extension storage
pub async fn load_forges() -> Result<ForgeRegistry> {
    forges_from_json(&get_json(&[FORGES_KEY]).await?)
}

/// `storage.onChanged`
pub fn on_changed() -> Result<JsValue> {
    property(LaunchError::Storage, &storage()?, "onChanged")
}
