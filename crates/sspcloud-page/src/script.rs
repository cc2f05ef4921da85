//! Content-script runtime
//!
//! Glues the lifecycle state machine to a `Dom` and a `Host`: page events
//! go in, lifecycle actions are carried out, and injection outcomes are fed
//! back into the state machine.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use sspcloud_core::fail_open::fail_open_or_default;
use sspcloud_core::{RepositoryRef, Result, Settings};
use tracing::{debug, info, warn};

use crate::click::{ClickOutcome, LaunchRequest};
use crate::controller;
use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use crate::dom::Dom;
use crate::forge::PageForge;
use crate::host::{Host, PageEvent};
use crate::lifecycle::{transition, Action, Event, Lifecycle, ObserverState};
use crate::toast::{ToastTray, NO_IDENTITY_MESSAGE, POPUP_BLOCKED_MESSAGE, TOAST_FADE, TOAST_VISIBLE};

/// Timing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Quiet window after DOM mutations
    pub debounce: Duration,
    /// How long a toast stays fully visible
    pub toast_visible: Duration,
    /// Fade-out time before a toast is removed
    pub toast_fade: Duration,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            toast_visible: TOAST_VISIBLE,
            toast_fade: TOAST_FADE,
        }
    }
}

/// One content script instance for one page context
pub struct ContentScript<D: Dom, H: Host> {
    dom: D,
    host: H,
    forge: PageForge,
    lifecycle: Lifecycle,
    debouncer: Debouncer,
    toasts: ToastTray<D::Node>,
    attempts: usize,
}

impl<D: Dom, H: Host> ContentScript<D, H> {
    pub fn new(dom: D, host: H, forge: PageForge) -> Self {
        Self::with_config(dom, host, forge, ScriptConfig::default())
    }

    pub fn with_config(dom: D, host: H, forge: PageForge, config: ScriptConfig) -> Self {
        Self {
            dom,
            host,
            forge,
            lifecycle: Lifecycle::default(),
            debouncer: Debouncer::new(config.debounce),
            toasts: ToastTray::new(config.toast_visible, config.toast_fade),
            attempts: 0,
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn forge(&self) -> PageForge {
        self.forge
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Injection attempts made so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn live_toasts(&self) -> usize {
        self.toasts.len()
    }

    /// Run the initial load logic
    pub fn start(&mut self) {
        let ready = self.dom.ready_state().is_ready();
        debug!("Starting {:?} script (ready: {})", self.forge, ready);
        self.dispatch(Event::Started { ready });
    }

    /// Feed a host event
    pub fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::DomReady => self.dispatch(Event::DomReady),
            PageEvent::Navigation(name) => {
                if self.forge.is_navigation_event(&name) {
                    debug!("{} to {}", name, self.dom.location().path);
                    self.dispatch(Event::Navigated);
                }
            }
            PageEvent::Mutations => {
                if self.lifecycle.observer == ObserverState::Armed {
                    self.debouncer.poke(&mut self.host);
                }
            }
            PageEvent::TimerFired(id) => {
                if self.debouncer.fire(id) {
                    self.dispatch(Event::MutationsSettled);
                } else if !self.toasts.on_timer(&mut self.dom, &mut self.host, id) {
                    debug!("Ignoring unknown timer {:?}", id);
                }
            }
        }
    }

    fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let (next, actions) = transition(self.lifecycle, event);
            if next != self.lifecycle {
                debug!("Lifecycle {:?} -> {:?} on {:?}", self.lifecycle, next, event);
            }
            self.lifecycle = next;
            for action in actions {
                if let Some(follow_up) = self.perform(action) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn perform(&mut self, action: Action) -> Option<Event> {
        match action {
            Action::ListenForDomReady => self.host.listen_for_dom_ready(),
            Action::ArmObserver => self.host.observe_mutations(),
            Action::DisarmObserver => {
                self.host.disconnect_mutations();
                self.debouncer.cancel(&mut self.host);
            }
            Action::RemoveStaleButton => {
                controller::remove_stale_button(&mut self.dom);
            }
            Action::TryInject => {
                self.attempts += 1;
                return Some(Event::Attempted(controller::try_inject(
                    &mut self.dom,
                    self.forge,
                )));
            }
        }
        None
    }

    /// First half of a click: capture the repository
    ///
    /// Shows the "could not detect" toast and returns `None` when the page
    /// has no project identity.
    pub fn begin_click(&mut self) -> Option<LaunchRequest> {
        let location = self.dom.location();
        match self.forge.identity(&self.dom) {
            Some(identity) => Some(LaunchRequest::new(RepositoryRef::new(
                location.host,
                identity,
            ))),
            None => {
                warn!("Could not determine project on {}", location.path);
                self.toasts
                    .show(&mut self.dom, &mut self.host, NO_IDENTITY_MESSAGE);
                None
            }
        }
    }

    /// Second half of a click: open the resolved URL
    pub fn complete_click(&mut self, url: String) -> ClickOutcome {
        if self.host.open_tab(&url) {
            info!("Opened launcher: {}", url);
            ClickOutcome::Opened(url)
        } else {
            warn!("Launcher tab was blocked");
            self.toasts
                .show(&mut self.dom, &mut self.host, POPUP_BLOCKED_MESSAGE);
            ClickOutcome::Blocked(url)
        }
    }

    /// Whole click flow with an asynchronous settings read
    ///
    /// An unreadable settings store falls back to the defaults.
    pub async fn click<F, Fut>(&mut self, load_settings: F) -> ClickOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Settings>>,
    {
        let Some(request) = self.begin_click() else {
            return ClickOutcome::NoIdentity;
        };
        let settings = fail_open_or_default("load_settings", load_settings).await;
        let url = request.resolve_url(&settings);
        self.complete_click(url)
    }
}
