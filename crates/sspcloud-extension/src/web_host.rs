//! `Host` over the browser event loop
//!
//! Timer, mutation and DOMContentLoaded callbacks are routed back into the
//! running content script through `runtime::dispatch`.

use std::time::Duration;

use js_sys::{Array, Function};
use sspcloud_page::{Host, PageEvent, TimerId};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, MutationObserver, MutationObserverInit, Node, Window};

use crate::runtime;
use crate::timers::{timer_arg, timer_from_arg, TimerTable};

pub struct WebHost {
    window: Window,
    document: Document,
    observer: MutationObserver,
    /// Shared `setTimeout` callback, called with the timer id
    on_timer: Function,
    timers: TimerTable<i32>,
}

impl WebHost {
    pub fn new(window: Window, document: Document) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(|_records: Array, _observer: MutationObserver| {
            runtime::dispatch(PageEvent::Mutations);
        }) as Box<dyn FnMut(Array, MutationObserver)>);
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        // One observer for the page lifetime
        callback.forget();

        let on_timer = Closure::wrap(Box::new(|arg: JsValue| {
            match arg.as_f64().and_then(timer_from_arg) {
                Some(id) => runtime::fire_timer(id),
                None => debug!("Timer callback without an id: {:?}", arg),
            }
        }) as Box<dyn FnMut(JsValue)>)
        .into_js_value()
        .unchecked_into::<Function>();

        Ok(Self {
            window,
            document,
            observer,
            on_timer,
            timers: TimerTable::new(),
        })
    }

    /// Drop the handle of a timer that already fired
    pub fn timer_fired(&mut self, id: TimerId) {
        self.timers.remove(id);
    }

    fn observe_target(&self) -> Node {
        match self.document.document_element() {
            Some(root) => root.into(),
            None => self.document.clone().into(),
        }
    }
}

impl Host for WebHost {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        let id = self.timers.next_id();
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);

        match self.window.set_timeout_with_callback_and_timeout_and_arguments_1(
            &self.on_timer,
            millis,
            &JsValue::from_f64(timer_arg(id)),
        ) {
            Ok(handle) => self.timers.insert(id, handle),
            Err(e) => warn!("setTimeout failed: {:?}", e),
        }
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        if let Some(handle) = self.timers.remove(id) {
            self.window.clear_timeout_with_handle(handle);
        }
    }

    fn observe_mutations(&mut self) {
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(e) = self
            .observer
            .observe_with_options(&self.observe_target(), &init)
        {
            warn!("Could not observe the document: {:?}", e);
        }
    }

    fn disconnect_mutations(&mut self) {
        self.observer.disconnect();
    }

    fn listen_for_dom_ready(&mut self) {
        let callback = Closure::once_into_js(|| runtime::dispatch(PageEvent::DomReady));
        if let Err(e) = self
            .document
            .add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
        {
            warn!("Could not listen for DOMContentLoaded: {:?}", e);
        }
    }

    fn open_tab(&mut self, url: &str) -> bool {
        match self.window.open_with_url_and_target(url, "_blank") {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                debug!("window.open threw: {:?}", e);
                false
            }
        }
    }
}
