//! Host environment services: timers, mutation subscription, tabs

use std::time::Duration;

/// Handle of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Event-loop services the content script needs from its host
///
/// Callbacks come back as `PageEvent`s: a fired timer as
/// `PageEvent::TimerFired`, observed mutations as `PageEvent::Mutations`,
/// DOMContentLoaded as `PageEvent::DomReady`.
pub trait Host {
    fn set_timeout(&mut self, delay: Duration) -> TimerId;
    fn clear_timeout(&mut self, id: TimerId);

    /// Start the page's single mutation observer (child list, subtree)
    fn observe_mutations(&mut self);
    fn disconnect_mutations(&mut self);

    fn listen_for_dom_ready(&mut self);

    /// Open `url` in a new tab; `false` when a popup blocker refused
    fn open_tab(&mut self, url: &str) -> bool;
}

/// Something that happened on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    DomReady,
    /// A document event fired, by name (`turbo:load`, ...)
    Navigation(String),
    /// The mutation observer saw changes
    Mutations,
    TimerFired(TimerId),
}
