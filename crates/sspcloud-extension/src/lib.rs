//! # sspcloud-extension
//!
//! Browser binding of the SSPCloud launch button.
//!
//! On `wasm32` this crate exports one entry point per content script:
//! `start_github` for the static github.com script and `start_gitlab` for the
//! scripts registered on user-configured GitLab instances. Each one wires
//! the page engine from `sspcloud-page` to the real document (`WebDom`), the
//! browser event loop (`WebHost`) and `storage.local`.
//!
//! `start_background` runs in the background page and registers the GitLab
//! scripts for every configured GitLab forge, through `BrowserRegistrar`.
//!
//! The bootstrap scripts and manifest loading these entry points live in
//! `addon/`, next to the `pkg/` output of
//! `wasm-pack build --target no-modules --out-dir addon/pkg`.
//!
//! Storage decoding, registration options and timer bookkeeping are target
//! independent.

mod content_scripts;
mod snapshot;
mod timers;

pub use content_scripts::register_options;
pub use snapshot::{forges_changed, forges_from_json, settings_from_json, settings_keys};
pub use timers::{timer_arg, timer_from_arg, TimerTable};

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod background;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod browser_registrar;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod browser_storage;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod js_api;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod runtime;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod web_dom;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod web_host;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod entry {
    use sspcloud_page::PageForge;
    use wasm_bindgen::prelude::*;

    /// Content script for github.com
    #[wasm_bindgen]
    pub fn start_github() -> Result<(), JsValue> {
        crate::runtime::start(PageForge::Github)
    }

    /// Content script for registered GitLab instances
    #[wasm_bindgen]
    pub fn start_gitlab() -> Result<(), JsValue> {
        crate::runtime::start(PageForge::Gitlab)
    }

    /// Background page: dynamic registration for GitLab forges
    #[wasm_bindgen]
    pub fn start_background() -> Result<(), JsValue> {
        crate::background::start()
    }
}
