//! Sensor session state machine.
//!
//! The session owns exactly one of three states for the lifetime of the
//! process (`Idle`, `Identifying`, or `Enrolling`), and every mode change
//! must pass through here. The two active modes are mutually exclusive by
//! construction: neither can be entered except from `Idle`, so a direct
//! `Identifying → Enrolling` hop is an [`InvalidStateTransition`] error, not
//! a race to lose.
//!
//! # Valid Transitions
//!
//! - Idle → Identifying → Idle
//! - Idle → Enrolling → Idle
//!
//! # Examples
//!
//! ```
//! use ridgeline_session::{SessionMachine, SessionState};
//!
//! let mut machine = SessionMachine::new();
//! assert_eq!(machine.current(), SessionState::Idle);
//!
//! machine.transition_to(SessionState::Identifying).unwrap();
//! assert!(machine.transition_to(SessionState::Enrolling).is_err());
//! ```
//!
//! [`InvalidStateTransition`]: ridgeline_core::Error::InvalidStateTransition

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use ridgeline_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of state transitions to keep in history.
///
/// A full identify re-arm is two transitions and a full enrollment is four,
/// so 64 entries cover the last dozen-plus operations, enough to reconstruct
/// how the session got wedged without unbounded growth.
const MAX_HISTORY_SIZE: usize = 64;

/// Operating mode of the sensor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No sensor operation outstanding.
    Idle,

    /// Continuous identification running against a gallery snapshot.
    Identifying,

    /// One-shot enroll transaction in progress.
    Enrolling,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Idle => "Idle",
            SessionState::Identifying => "Identifying",
            SessionState::Enrolling => "Enrolling",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check if transition to the target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use ridgeline_session::SessionState;
    ///
    /// assert!(SessionState::Idle.can_transition_to(SessionState::Identifying));
    /// assert!(!SessionState::Identifying.can_transition_to(SessionState::Enrolling));
    /// ```
    pub fn can_transition_to(self, target: SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle, SessionState::Identifying)
                | (SessionState::Idle, SessionState::Enrolling)
                | (SessionState::Identifying, SessionState::Idle)
                | (SessionState::Enrolling, SessionState::Idle)
        )
    }

    /// Whether a sensor operation is outstanding in this state.
    pub fn is_active(self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: SessionState,

    /// The state transitioned to.
    pub to: SessionState,

    /// When the transition occurred.
    pub timestamp: Instant,
}

impl StateTransition {
    fn new(from: SessionState, to: SessionState) -> Self {
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

/// Validated tri-state machine for the sensor session.
///
/// Not thread-safe by design: the controller actor is its only owner, and the
/// single-writer discipline of the actor's mailbox is what makes the state
/// authoritative.
#[derive(Debug)]
pub struct SessionMachine {
    current: SessionState,
    entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl SessionMachine {
    /// Create a new machine in the `Idle` state.
    pub fn new() -> Self {
        Self {
            current: SessionState::Idle,
            entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Get the current state.
    pub fn current(&self) -> SessionState {
        self.current
    }

    /// Time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the requested transition is not
    /// legal from the current state; the machine is left unchanged.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<StateTransition> {
        if !self.current.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current, new_state);
        self.current = new_state;
        self.entered_at = Instant::now();

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}
