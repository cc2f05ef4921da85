//! Timer bookkeeping for the browser host
//!
//! All timers share one JS callback that receives the timer id as its
//! argument. A timer owns nothing but its `setTimeout` handle, so clearing
//! one before it fires leaves nothing allocated.

use std::collections::HashMap;

use sspcloud_page::TimerId;

/// Pending timers and their host handles
#[derive(Debug)]
pub struct TimerTable<H> {
    last: u64,
    pending: HashMap<TimerId, H>,
}

impl<H> Default for TimerTable<H> {
    fn default() -> Self {
        Self {
            last: 0,
            pending: HashMap::new(),
        }
    }
}

impl<H> TimerTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the id of a new timer
    pub fn next_id(&mut self) -> TimerId {
        self.last += 1;
        TimerId(self.last)
    }

    pub fn insert(&mut self, id: TimerId, handle: H) {
        self.pending.insert(id, handle);
    }

    /// Forget a timer, returning its handle if it was still pending
    pub fn remove(&mut self, id: TimerId) -> Option<H> {
        self.pending.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Argument handed to the shared timer callback
pub fn timer_arg(id: TimerId) -> f64 {
    id.0 as f64
}

/// Timer id carried by a callback argument
pub fn timer_from_arg(arg: f64) -> Option<TimerId> {
    if arg.is_finite() && arg >= 1.0 && arg.fract() == 0.0 {
        Some(TimerId(arg as u64))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sspcloud_page::{Debouncer, Host};
    use std::time::Duration;

    /// Host whose timers live in a `TimerTable`, handles are fake numbers
    #[derive(Default)]
    struct TableHost {
        timers: TimerTable<u32>,
        cleared: usize,
    }

    impl Host for TableHost {
        fn set_timeout(&mut self, _delay: Duration) -> TimerId {
            let id = self.timers.next_id();
            self.timers.insert(id, id.0 as u32);
            id
        }

        fn clear_timeout(&mut self, id: TimerId) {
            if self.timers.remove(id).is_some() {
                self.cleared += 1;
            }
        }

        fn observe_mutations(&mut self) {}
        fn disconnect_mutations(&mut self) {}
        fn listen_for_dom_ready(&mut self) {}

        fn open_tab(&mut self, _url: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_mutation_bursts_keep_one_pending_timer() {
        let mut host = TableHost::default();
        let mut debouncer = Debouncer::default();

        for _ in 0..1000 {
            debouncer.poke(&mut host);
        }
        assert_eq!(host.timers.len(), 1);
        assert_eq!(host.cleared, 999);

        // The surviving timer fires and is forgotten
        let fired = timer_from_arg(timer_arg(TimerId(1000))).unwrap();
        assert!(host.timers.remove(fired).is_some());
        assert!(debouncer.fire(fired));
        assert!(host.timers.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut table: TimerTable<()> = TimerTable::new();
        let first = table.next_id();
        let second = table.next_id();
        assert_ne!(first, second);
        assert_eq!(timer_from_arg(timer_arg(second)), Some(second));
    }

    #[test]
    fn test_rejects_foreign_arguments() {
        assert_eq!(timer_from_arg(0.0), None);
        assert_eq!(timer_from_arg(-3.0), None);
        assert_eq!(timer_from_arg(1.5), None);
        assert_eq!(timer_from_arg(f64::NAN), None);
    }
}
