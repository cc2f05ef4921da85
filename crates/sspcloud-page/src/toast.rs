//! Transient notifications
//!
//! A toast is shown, then faded, then removed, each step on a host timer.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::assets::{TOAST_CLASS, TOAST_FADE_CLASS};
use crate::dom::{Dom, ElementSpec};
use crate::host::{Host, TimerId};

pub const NO_IDENTITY_MESSAGE: &str = "Could not detect repository";
pub const POPUP_BLOCKED_MESSAGE: &str = "Popup was blocked. Please allow popups for this site.";

pub const TOAST_VISIBLE: Duration = Duration::from_millis(3000);
pub const TOAST_FADE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Visible,
    Fading,
}

/// Live toasts and their pending timers
#[derive(Debug)]
pub struct ToastTray<N> {
    visible: Duration,
    fade: Duration,
    pending: HashMap<TimerId, (N, Stage)>,
}

impl<N> Default for ToastTray<N> {
    fn default() -> Self {
        Self::new(TOAST_VISIBLE, TOAST_FADE)
    }
}

impl<N> ToastTray<N> {
    pub fn new(visible: Duration, fade: Duration) -> Self {
        Self {
            visible,
            fade,
            pending: HashMap::new(),
        }
    }

    /// Number of toasts not yet removed
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Append a toast to the body
    pub fn show<D, H>(&mut self, dom: &mut D, host: &mut H, message: &str)
    where
        D: Dom<Node = N>,
        H: Host + ?Sized,
    {
        let Some(body) = dom.body() else {
            debug!("No body for toast: {}", message);
            return;
        };
        let Some(toast) =
            dom.create_element(&ElementSpec::new("div").class(TOAST_CLASS).text(message))
        else {
            return;
        };
        dom.append_child(&body, &toast);
        let timer = host.set_timeout(self.visible);
        self.pending.insert(timer, (toast, Stage::Visible));
    }

    /// Advance the toast owning `id`; `false` when the timer is not ours
    pub fn on_timer<D, H>(&mut self, dom: &mut D, host: &mut H, id: TimerId) -> bool
    where
        D: Dom<Node = N>,
        H: Host + ?Sized,
    {
        let Some((toast, stage)) = self.pending.remove(&id) else {
            return false;
        };
        match stage {
            Stage::Visible => {
                dom.add_class(&toast, TOAST_FADE_CLASS);
                let timer = host.set_timeout(self.fade);
                self.pending.insert(timer, (toast, Stage::Fading));
            }
            Stage::Fading => dom.remove(&toast),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Selector;
    use crate::memory::{MemoryDom, RecordingHost};

    #[test]
    fn test_toast_fades_then_goes_away() {
        let mut dom = MemoryDom::new("https://github.com/org/repo");
        let mut host = RecordingHost::new();
        let mut tray = ToastTray::default();

        tray.show(&mut dom, &mut host, "hello");
        let toast = dom.query(&Selector::class(TOAST_CLASS)).unwrap();
        assert_eq!(dom.text(toast), "hello");
        assert_eq!(tray.len(), 1);

        let (visible, delay) = host.pending_timers()[0];
        assert_eq!(delay, TOAST_VISIBLE);
        assert!(tray.on_timer(&mut dom, &mut host, visible));
        assert!(dom.has_class(&toast, TOAST_FADE_CLASS));
        assert!(dom.is_connected(toast));

        let (fading, delay) = host.pending_timers()[1];
        assert_eq!(delay, TOAST_FADE);
        assert!(tray.on_timer(&mut dom, &mut host, fading));
        assert!(!dom.is_connected(toast));
        assert!(tray.is_empty());
    }

    #[test]
    fn test_foreign_timer_is_not_claimed() {
        let mut dom = MemoryDom::new("https://github.com/org/repo");
        let mut host = RecordingHost::new();
        let mut tray: ToastTray<crate::memory::NodeId> = ToastTray::default();
        let other = host.set_timeout(Duration::from_millis(5));
        assert!(!tray.on_timer(&mut dom, &mut host, other));
    }
}
