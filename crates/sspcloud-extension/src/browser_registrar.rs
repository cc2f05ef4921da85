//! `ScriptRegistrar` over `browser.contentScripts`

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use js_sys::{Array, JSON};
use sspcloud_core::{LaunchError, Result};
use sspcloud_registry::{ContentScriptSpec, RegistrationId, ScriptRegistrar};
use tracing::debug;
use wasm_bindgen::JsValue;

use crate::content_scripts::register_options;
use crate::js_api::{call, extension_api, property, settle};

thread_local! {
    /// `RegisteredContentScript` objects by our id
    static HANDLES: RefCell<HashMap<RegistrationId, JsValue>> = RefCell::new(HashMap::new());
}

/// Registers content scripts with the browser
///
/// Handles stay on the page thread, so the registrar itself is a plain
/// value.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserRegistrar;

#[async_trait(?Send)]
impl ScriptRegistrar for BrowserRegistrar {
    async fn register(&self, spec: &ContentScriptSpec) -> Result<RegistrationId> {
        let api = property(
            LaunchError::Registration,
            &extension_api(LaunchError::Registration)?,
            "contentScripts",
        )?;
        let options = JSON::parse(&register_options(spec).to_string())
            .map_err(|e| LaunchError::Registration(format!("register options: {:?}", e)))?;

        let pending = call(LaunchError::Registration, &api, "register", &Array::of1(&options))?;
        let handle = settle(LaunchError::Registration, "contentScripts.register", pending).await?;

        let id = RegistrationId::generate();
        debug!("Registered {:?} as {}", spec.matches, id);
        HANDLES.with(|handles| handles.borrow_mut().insert(id.clone(), handle));
        Ok(id)
    }

    async fn unregister(&self, id: &RegistrationId) -> Result<()> {
        let handle = HANDLES
            .with(|handles| handles.borrow_mut().remove(id))
            .ok_or_else(|| LaunchError::Registration(format!("unknown registration {}", id)))?;

        let pending = call(LaunchError::Registration, &handle, "unregister", &Array::new())?;
        settle(LaunchError::Registration, "unregister", pending).await?;
        Ok(())
    }
}
