//! Untyped access to the WebExtension API
//!
//! `browser.*` (and Chrome's `chrome.*`) has no web-sys bindings, so calls go
//! through `Reflect`. Every helper takes the `LaunchError` variant to report
//! failures with.

use js_sys::{Array, Function, Promise, Reflect};
use sspcloud_core::{LaunchError, Result};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

pub type ErrorKind = fn(String) -> LaunchError;

fn js_error(kind: ErrorKind, context: &str, e: JsValue) -> LaunchError {
    kind(format!("{}: {:?}", context, e))
}

/// A property that must be present
pub fn property(kind: ErrorKind, target: &JsValue, key: &str) -> Result<JsValue> {
    let value = Reflect::get(target, &key.into()).map_err(|e| js_error(kind, key, e))?;
    if value.is_undefined() || value.is_null() {
        return Err(kind(format!("{} is not available", key)));
    }
    Ok(value)
}

/// `browser`, falling back to `chrome`
pub fn extension_api(kind: ErrorKind) -> Result<JsValue> {
    let global = js_sys::global();
    property(kind, &global, "browser").or_else(|_| property(kind, &global, "chrome"))
}

/// Call `target[method](...args)`
pub fn call(kind: ErrorKind, target: &JsValue, method: &str, args: &Array) -> Result<JsValue> {
    let function: Function = property(kind, target, method)?
        .dyn_into()
        .map_err(|e| js_error(kind, method, e))?;
    function
        .apply(target, args)
        .map_err(|e| js_error(kind, method, e))
}

/// Await `value` when it is a promise, pass it through otherwise
pub async fn settle(kind: ErrorKind, context: &str, value: JsValue) -> Result<JsValue> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise)
            .await
            .map_err(|e| js_error(kind, context, e)),
        Err(value) => Ok(value),
    }
}
