//! Background script: GitLab content scripts follow the stored forge list
//!
//! Rebuilds run on startup and on every `storage.onChanged` touching
//! `forges`. They are serialized, and each one reads the forge list after
//! taking its turn, so the last rebuild always sees the latest list.

use std::rc::Rc;

use js_sys::{Array, Object};
use sspcloud_core::LaunchError;
use sspcloud_registry::RegistrationSet;
use tokio::sync::Mutex;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use crate::browser_registrar::BrowserRegistrar;
use crate::browser_storage;
use crate::js_api::call;
use crate::snapshot::forges_changed;

type SharedSet = Rc<Mutex<RegistrationSet>>;

async fn rebuild(set: SharedSet) {
    let mut set = set.lock().await;
    let forges = match browser_storage::load_forges().await {
        Ok(forges) => forges,
        Err(e) => {
            warn!("Forge list unreadable, keeping current registrations: {}", e);
            return;
        }
    };

    let report = set.rebuild(&BrowserRegistrar, &forges).await;
    info!(
        "Registration rebuild: {} registered, {} failed, {} unregistered",
        report.registered.len(),
        report.failed.len(),
        report.unregistered.len()
    );
}

fn changed_keys(changes: &JsValue) -> Vec<String> {
    match changes.dyn_ref::<Object>() {
        Some(changes) => Object::keys(changes)
            .iter()
            .filter_map(|key| key.as_string())
            .collect(),
        None => Vec::new(),
    }
}

/// Register scripts for the stored forges and keep them in sync
pub fn start() -> Result<(), JsValue> {
    let set: SharedSet = Rc::new(Mutex::new(RegistrationSet::new()));

    let listener_set = set.clone();
    let listener = Closure::wrap(Box::new(move |changes: JsValue, area: JsValue| {
        let area = area.as_string().unwrap_or_default();
        if forges_changed(&area, changed_keys(&changes)) {
            spawn_local(rebuild(listener_set.clone()));
        }
    }) as Box<dyn FnMut(JsValue, JsValue)>);

    let on_changed = browser_storage::on_changed().map_err(to_js)?;
    call(
        LaunchError::Storage,
        &on_changed,
        "addListener",
        &Array::of1(listener.as_ref()),
    )
    .map_err(to_js)?;
    // Listens for the background page lifetime
    listener.forget();

    spawn_local(rebuild(set));
    info!("Background registration started");
    Ok(())
}

fn to_js(e: LaunchError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
