//! Pure state machine for the page lifecycle
//!
//! Tracks whether a button is mounted and whether the mutation observer is
//! armed, and decides what the content script does next. No DOM access, no
//! timers: `transition(state, event) -> (state, actions)`.
//!
//! Invariants kept here:
//! - the observer is armed at most once at a time (arming an armed observer
//!   emits nothing);
//! - a successful mount disarms the observer;
//! - every navigation removes the stale button, re-arms and retries.

/// Whether the button is on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started
    Idle,
    /// Waiting for the DOM to be ready
    Loading,
    /// No button on the current view
    Absent,
    /// Button mounted for the current view
    Mounted,
}

/// Mutation subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Armed,
    Disarmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub phase: Phase,
    pub observer: ObserverState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            observer: ObserverState::Disarmed,
        }
    }
}

/// Result of one injection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Button created and mounted
    Mounted,
    /// A button with the fixed id is already on the page
    AlreadyPresent,
    /// Not a repository page
    NotEligible,
    /// Eligible, but no container found yet
    NoMountPoint,
}

impl AttemptOutcome {
    /// Whether a button is on the page after the attempt
    pub fn is_mounted(self) -> bool {
        matches!(self, Self::Mounted | Self::AlreadyPresent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Script injected; `ready` is false while the document is loading
    Started { ready: bool },
    /// DOMContentLoaded fired
    DomReady,
    /// The forge's SPA navigation event fired
    Navigated,
    /// A burst of DOM mutations went quiet
    MutationsSettled,
    /// An injection attempt finished
    Attempted(AttemptOutcome),
}

/// Side effects for the content script to perform, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListenForDomReady,
    ArmObserver,
    DisarmObserver,
    RemoveStaleButton,
    TryInject,
}

/// Pure state transition function
///
/// Events that make no sense in the current state are ignored: the state is
/// returned unchanged with no actions. Never panics.
pub fn transition(state: Lifecycle, event: Event) -> (Lifecycle, Vec<Action>) {
    let armed = state.observer == ObserverState::Armed;

    match (state.phase, event) {
        (Phase::Idle, Event::Started { ready: false }) => (
            Lifecycle {
                phase: Phase::Loading,
                observer: ObserverState::Armed,
            },
            vec![Action::ListenForDomReady, Action::ArmObserver],
        ),
        (Phase::Idle, Event::Started { ready: true }) => (
            Lifecycle {
                phase: Phase::Absent,
                observer: ObserverState::Armed,
            },
            vec![Action::ArmObserver, Action::TryInject],
        ),
        (Phase::Idle, _) | (_, Event::Started { .. }) => (state, Vec::new()),

        (Phase::Loading, Event::DomReady) => (
            Lifecycle {
                phase: Phase::Absent,
                ..state
            },
            vec![Action::TryInject],
        ),
        (_, Event::DomReady) => (state, Vec::new()),

        (_, Event::Navigated) => {
            let mut actions = vec![Action::RemoveStaleButton];
            if !armed {
                actions.push(Action::ArmObserver);
            }
            actions.push(Action::TryInject);
            (
                Lifecycle {
                    phase: Phase::Absent,
                    observer: ObserverState::Armed,
                },
                actions,
            )
        }

        (Phase::Mounted, Event::MutationsSettled) => (state, Vec::new()),
        (_, Event::MutationsSettled) if armed => (state, vec![Action::TryInject]),
        (_, Event::MutationsSettled) => (state, Vec::new()),

        (_, Event::Attempted(outcome)) if outcome.is_mounted() => {
            let actions = if armed {
                vec![Action::DisarmObserver]
            } else {
                Vec::new()
            };
            (
                Lifecycle {
                    phase: Phase::Mounted,
                    observer: ObserverState::Disarmed,
                },
                actions,
            )
        }
        (_, Event::Attempted(_)) => (state, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[Event]) -> (Lifecycle, Vec<Action>) {
        let mut state = Lifecycle::default();
        let mut all = Vec::new();
        for event in events {
            let (next, actions) = transition(state, *event);
            state = next;
            all.extend(actions);
        }
        (state, all)
    }

    #[test]
    fn test_start_while_loading_defers() {
        let (state, actions) = run(&[Event::Started { ready: false }]);
        assert_eq!(state.phase, Phase::Loading);
        assert_eq!(actions, vec![Action::ListenForDomReady, Action::ArmObserver]);

        let (state, actions) = transition(state, Event::DomReady);
        assert_eq!(state.phase, Phase::Absent);
        assert_eq!(actions, vec![Action::TryInject]);
    }

    #[test]
    fn test_start_when_ready_injects_immediately() {
        let (state, actions) = run(&[Event::Started { ready: true }]);
        assert_eq!(state.observer, ObserverState::Armed);
        assert_eq!(actions, vec![Action::ArmObserver, Action::TryInject]);
    }

    #[test]
    fn test_mount_disarms_once() {
        let (state, actions) = run(&[
            Event::Started { ready: true },
            Event::Attempted(AttemptOutcome::Mounted),
        ]);
        assert_eq!(state.phase, Phase::Mounted);
        assert_eq!(state.observer, ObserverState::Disarmed);
        assert_eq!(actions.iter().filter(|a| **a == Action::DisarmObserver).count(), 1);

        // Late mutations after mounting do nothing
        let (_, actions) = transition(state, Event::MutationsSettled);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_failed_attempt_keeps_observer() {
        let (state, _) = run(&[
            Event::Started { ready: true },
            Event::Attempted(AttemptOutcome::NoMountPoint),
        ]);
        assert_eq!(state.phase, Phase::Absent);
        assert_eq!(state.observer, ObserverState::Armed);

        let (_, actions) = transition(state, Event::MutationsSettled);
        assert_eq!(actions, vec![Action::TryInject]);
    }

    #[test]
    fn test_navigation_rearms_after_mount() {
        let (state, _) = run(&[
            Event::Started { ready: true },
            Event::Attempted(AttemptOutcome::Mounted),
        ]);
        let (state, actions) = transition(state, Event::Navigated);
        assert_eq!(
            actions,
            vec![
                Action::RemoveStaleButton,
                Action::ArmObserver,
                Action::TryInject
            ]
        );
        assert_eq!(state.phase, Phase::Absent);
        assert_eq!(state.observer, ObserverState::Armed);
    }

    #[test]
    fn test_navigation_while_armed_does_not_duplicate_observer() {
        let (_, actions) = run(&[Event::Started { ready: true }, Event::Navigated]);
        let arms = actions.iter().filter(|a| **a == Action::ArmObserver).count();
        assert_eq!(arms, 1);
    }

    #[test]
    fn test_events_before_start_are_ignored() {
        let (state, actions) = run(&[Event::DomReady, Event::MutationsSettled, Event::Navigated]);
        assert_eq!(state, Lifecycle::default());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_second_start_is_ignored() {
        let (_, actions) = run(&[Event::Started { ready: true }, Event::Started { ready: true }]);
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_already_present_counts_as_mounted() {
        let (state, actions) = run(&[
            Event::Started { ready: true },
            Event::Attempted(AttemptOutcome::AlreadyPresent),
        ]);
        assert_eq!(state.phase, Phase::Mounted);
        assert!(actions.contains(&Action::DisarmObserver));
    }
}
