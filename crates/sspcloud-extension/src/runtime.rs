//! The page's single content-script instance
//!
//! JS callbacks (timers, observer, navigation events, clicks) only carry a
//! `PageEvent`; they reach the script through the thread-local below.

use std::cell::RefCell;

use sspcloud_core::fail_open::fail_open_or_default;
use sspcloud_page::{ContentScript, PageEvent, PageForge, TimerId};
use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use crate::browser_storage;
use crate::web_dom::WebDom;
use crate::web_host::WebHost;

type WebScript = ContentScript<WebDom, WebHost>;

thread_local! {
    static SCRIPT: RefCell<Option<WebScript>> = const { RefCell::new(None) };
}

fn with_script<T>(f: impl FnOnce(&mut WebScript) -> T) -> Option<T> {
    SCRIPT.with(|cell| match cell.try_borrow_mut() {
        Ok(mut script) => script.as_mut().map(f),
        Err(_) => {
            debug!("Content script busy, callback dropped");
            None
        }
    })
}

pub fn dispatch(event: PageEvent) {
    with_script(|script| script.handle(event));
}

pub fn fire_timer(id: TimerId) {
    with_script(|script| {
        script.host_mut().timer_fired(id);
        script.handle(PageEvent::TimerFired(id));
    });
}

fn on_click(event: web_sys::Event) {
    event.prevent_default();
    event.stop_propagation();

    let Some(Some(request)) = with_script(|script| script.begin_click()) else {
        return;
    };
    spawn_local(async move {
        let settings = fail_open_or_default("load_settings", browser_storage::load_settings).await;
        let url = request.resolve_url(&settings);
        with_script(|script| script.complete_click(url));
    });
}

fn listen_for_navigation(document: &web_sys::Document, forge: PageForge) -> Result<(), JsValue> {
    for name in forge.navigation_events() {
        let callback = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            dispatch(PageEvent::Navigation(name.to_string()));
        }) as Box<dyn FnMut(web_sys::Event)>);
        document.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
        callback.forget();
    }
    Ok(())
}

/// Install the content script for `forge` on this page
///
/// A second call on the same page is a no-op.
pub fn start(forge: PageForge) -> Result<(), JsValue> {
    if SCRIPT.with(|cell| cell.borrow().is_some()) {
        debug!("Content script already running");
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let click = Closure::wrap(Box::new(on_click) as Box<dyn FnMut(web_sys::Event)>);
    let dom = WebDom::new(
        window.clone(),
        document.clone(),
        click.as_ref().unchecked_ref::<js_sys::Function>().clone(),
    );
    click.forget();

    let host = WebHost::new(window, document.clone())?;
    listen_for_navigation(&document, forge)?;

    SCRIPT.with(|cell| *cell.borrow_mut() = Some(ContentScript::new(dom, host, forge)));
    info!("{:?} content script installed", forge);
    with_script(WebScript::start);
    Ok(())
}
