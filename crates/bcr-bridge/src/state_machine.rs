//! Scan session state machine.
//!
//! This module owns the single piece of mutable state shared by the three
//! actors of a scan session: the control path (`init`/`destroy`/`getState`),
//! the scan listener, and the read-delivery loop.
//!
//! # States
//!
//! - `None`: No session initialized yet
//! - `Ready`: Scanner open, listener registered
//! - `Reading`: A read loop is waiting for a scan
//! - `Read`: A scan result is waiting to be delivered
//! - `Error`: Initialization, parsing or the read loop failed
//! - `Destroyed`: The session was torn down
//!
//! # Transitions
//!
//! - None → Ready (init success), None/Ready → Error (init failure)
//! - Ready → Reading (read request)
//! - Reading → Read (scan parsed), Read → Reading (result delivered)
//! - Reading/Read → Error (malformed scan)
//! - any → Destroyed
//!
//! # Synchronization
//!
//! The session lives in a [`tokio::sync::watch`] channel. Every transition is
//! a single read-modify-write under the channel's lock, so a check and the
//! assignment that depends on it can never interleave with another actor.
//! Watchers are woken on every transition, which lets the read loop react to
//! a published scan without waiting for its next poll.
//!
//! `init` and `destroy` each start a new [`SessionId`]. A read loop carries
//! the id it was started under, so it stops even when `destroy` and a
//! following `init` both land between two of its cycles.
//!
//! Only vetted transitions are public. Raw assignment stays private.
//!
//! # Examples
//!
//! ```
//! use bcr_bridge::state_machine::{Delivery, ScanStateMachine};
//! use bcr_core::{ScanResult, ScanState};
//!
//! let machine = ScanStateMachine::new(16);
//! machine.mark_ready();
//! let session = machine.begin_read().unwrap();
//!
//! assert!(machine.publish(ScanResult::new("A12345", 1)));
//! assert_eq!(machine.state(), ScanState::Read);
//!
//! let Delivery::Result(result) = machine.take_delivery(session) else { panic!() };
//! assert_eq!(result.text, "A12345");
//! assert_eq!(machine.state(), ScanState::Reading);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bcr_core::{ScanResult, ScanState};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Represents a single state transition with timestamp.
///
/// Kept for diagnostics; see [`ScanStateMachine::history`].
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: ScanState,

    /// The state transitioned to.
    pub to: ScanState,

    /// When the transition occurred.
    pub timestamp: Instant,
}

impl StateTransition {
    fn new(from: ScanState, to: ScanState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Get the duration since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Identifies one scan session.
///
/// A new id is issued whenever the session is torn down or initialized, so a
/// read loop can tell that the session it was started for is gone even if it
/// never observed the intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// What the read loop should do on its current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A result was taken; the state is back to `Reading`.
    Result(ScanResult),

    /// The session ended, or was replaced, while in the given state;
    /// report failure and stop.
    Stop(ScanState),

    /// Nothing to deliver yet.
    Pending,
}

/// Shared session contents.
#[derive(Debug)]
pub(crate) struct Session {
    id: SessionId,
    state: ScanState,
    last_result: Option<ScanResult>,
    history: VecDeque<StateTransition>,
    history_size: usize,
}

impl Session {
    fn renew(&mut self) {
        self.id = SessionId(self.id.0.wrapping_add(1));
    }

    /// Assign `new_state` and record the transition.
    fn set_state(&mut self, new_state: ScanState) {
        let transition = StateTransition::new(self.state, new_state);
        debug!(from = %self.state, to = %new_state, "Scan state transition");
        self.state = new_state;

        self.history.push_back(transition);
        if self.history.len() > self.history_size {
            self.history.pop_front();
        }
    }
}

/// State machine for a scan session.
///
/// Shared between actors behind an `Arc`.
#[derive(Debug)]
pub struct ScanStateMachine {
    session: watch::Sender<Session>,
}

impl ScanStateMachine {
    /// Create a state machine in the `None` state, keeping up to
    /// `history_size` transitions.
    pub fn new(history_size: usize) -> Self {
        let (session, _) = watch::channel(Session {
            id: SessionId(0),
            state: ScanState::None,
            last_result: None,
            history: VecDeque::with_capacity(history_size),
            history_size,
        });
        Self { session }
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.session.borrow().state
    }

    /// Most recently published result, even if already delivered.
    pub fn last_result(&self) -> Option<ScanResult> {
        self.session.borrow().last_result.clone()
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> Vec<StateTransition> {
        self.session.borrow().history.iter().cloned().collect()
    }

    /// Watch for transitions.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Identifier of the current session.
    pub fn session_id(&self) -> SessionId {
        self.session.borrow().id
    }

    /// Initialization succeeded; starts a new session.
    pub fn mark_ready(&self) {
        self.session.send_modify(|s| {
            s.renew();
            s.set_state(ScanState::Ready);
        });
    }

    /// Initialization failed.
    pub fn mark_init_failed(&self) {
        self.session.send_modify(|s| s.set_state(ScanState::Error));
    }

    /// Enter `Reading` for a new read request.
    ///
    /// Returns the session the read belongs to; pass it to
    /// [`take_delivery`](Self::take_delivery).
    ///
    /// # Errors
    ///
    /// Returns the current state if a read loop is already active
    /// (`Reading`) or the session is `Destroyed`.
    pub fn begin_read(&self) -> Result<SessionId, ScanState> {
        let mut outcome = Err(ScanState::None);
        self.session.send_if_modified(|s| match s.state {
            ScanState::Reading | ScanState::Destroyed => {
                outcome = Err(s.state);
                false
            }
            _ => {
                s.set_state(ScanState::Reading);
                outcome = Ok(s.id);
                true
            }
        });
        outcome
    }

    /// Publish a parsed scan and enter `Read`.
    ///
    /// Returns `false` without touching the session if it is `Destroyed`.
    pub fn publish(&self, result: ScanResult) -> bool {
        self.session.send_if_modified(|s| {
            if s.state == ScanState::Destroyed {
                return false;
            }
            s.last_result = Some(result);
            s.set_state(ScanState::Read);
            true
        })
    }

    /// A scan notification could not be parsed.
    ///
    /// Returns `false` without touching the session if it is `Destroyed`.
    pub fn mark_parse_failed(&self) -> bool {
        self.session.send_if_modified(|s| {
            if s.state == ScanState::Destroyed {
                return false;
            }
            s.set_state(ScanState::Error);
            true
        })
    }

    /// A read loop pause was interrupted, or a response could not be encoded.
    pub fn mark_error(&self) {
        self.session.send_modify(|s| s.set_state(ScanState::Error));
    }

    /// The session was torn down.
    pub fn mark_destroyed(&self) {
        self.session.send_modify(|s| {
            s.renew();
            s.set_state(ScanState::Destroyed);
        });
    }

    /// Decide the read loop's next step.
    ///
    /// A pending result is handed out exactly once: taking it moves the
    /// session back to `Reading` in the same critical section. A loop
    /// started for an earlier session is always told to stop.
    pub fn take_delivery(&self, session: SessionId) -> Delivery {
        let mut delivery = Delivery::Pending;
        self.session.send_if_modified(|s| match s.state {
            state if s.id != session => {
                delivery = Delivery::Stop(state);
                false
            }
            ScanState::Read => match s.last_result.clone() {
                Some(result) => {
                    s.set_state(ScanState::Reading);
                    delivery = Delivery::Result(result);
                    true
                }
                None => {
                    warn!("Read state without a result");
                    false
                }
            },
            state if state.ends_delivery() => {
                delivery = Delivery::Stop(state);
                false
            }
            _ => false,
        });
        delivery
    }
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new(bcr_core::constants::DEFAULT_HISTORY_SIZE)
    }
}
