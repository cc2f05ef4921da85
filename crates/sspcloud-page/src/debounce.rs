//! Debounce stage of the mutation subscription

use std::time::Duration;

use crate::host::{Host, TimerId};

/// Quiet window before a burst of mutations triggers a check
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Collapses bursts of notifications into one, after a quiet window
///
/// Every `poke` restarts the window.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TimerId>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn poke<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(previous) = self.pending.take() {
            host.clear_timeout(previous);
        }
        self.pending = Some(host.set_timeout(self.delay));
    }

    /// Claim a fired timer; `true` when it was this debouncer's
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(pending) = self.pending.take() {
            host.clear_timeout(pending);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{HostCall, RecordingHost};

    #[test]
    fn test_poke_restarts_window() {
        let mut host = RecordingHost::new();
        let mut debouncer = Debouncer::default();

        debouncer.poke(&mut host);
        debouncer.poke(&mut host);
        debouncer.poke(&mut host);

        assert_eq!(host.pending_timers().len(), 1);
        let cleared = host
            .calls()
            .iter()
            .filter(|c| matches!(c, HostCall::ClearTimeout(_)))
            .count();
        assert_eq!(cleared, 2);
    }

    #[test]
    fn test_fire_claims_only_own_timer() {
        let mut host = RecordingHost::new();
        let mut debouncer = Debouncer::default();
        debouncer.poke(&mut host);
        let (id, delay) = host.pending_timers()[0];
        assert_eq!(delay, Duration::from_millis(200));

        assert!(!debouncer.fire(TimerId(id.0 + 1000)));
        assert!(debouncer.fire(id));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire(id));
    }

    #[test]
    fn test_cancel() {
        let mut host = RecordingHost::new();
        let mut debouncer = Debouncer::default();
        debouncer.poke(&mut host);
        debouncer.cancel(&mut host);
        assert!(host.pending_timers().is_empty());
        assert!(!debouncer.is_pending());
    }
}
