//! Options for `browser.contentScripts.register`

use serde_json::{json, Value};
use sspcloud_registry::ContentScriptSpec;

/// The registration options object for one script spec
///
/// The browser takes script files as `{ file }` records.
pub fn register_options(spec: &ContentScriptSpec) -> Value {
    let js: Vec<Value> = spec.js.iter().map(|file| json!({ "file": file })).collect();
    json!({
        "matches": spec.matches,
        "js": js,
        "runAt": spec.run_at,
    })
}
