//! Phase state machine.
//!
//! ```text
//! Disclaimer -> Auth -> (Dashboard) -> Breathing -> Retention -> Meditation
//!                            ^             ^                         |
//!                            |             +------- index < 6 -------+
//!                            |                                       |
//!                            +------------- Summary <-- index == 6 --+
//! ```
//!
//! `SessionState::apply` is a total function of state + event: every pair
//! either yields a `Transition` or a `TransitionError`. Side effects (audio,
//! timer, history) belong to the controller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::user::UserType;
use crate::round::LAST_STAGE_INDEX;

/// Minimum spacing between two dispatched transitions, in milliseconds.
pub const TRANSITION_COOLDOWN_MS: i64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Disclaimer,
    Auth,
    Dashboard,
    Breathing,
    Retention,
    Meditation,
    Summary,
}

impl Phase {
    /// Breathing, retention and meditation: the guided part of a round.
    pub fn is_session_active(self) -> bool {
        matches!(self, Phase::Breathing | Phase::Retention | Phase::Meditation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Disclaimer => "DISCLAIMER",
            Phase::Auth => "AUTH",
            Phase::Dashboard => "DASHBOARD",
            Phase::Breathing => "BREATHING",
            Phase::Retention => "RETENTION",
            Phase::Meditation => "MEDITATION",
            Phase::Summary => "SUMMARY",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    Acknowledge,
    LoginSucceeded,
    GuestStart,
    StartRound,
    AudioSequenceComplete,
    RetentionTap,
    /// Leave the summary. The destination depends on the user type.
    Continue(UserType),
    Logout,
    Reset,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("event {event:?} is not valid in phase {phase}")]
    NotAllowed { phase: Phase, event: PhaseEvent },

    #[error("transition rejected: cooldown active for another {remaining_ms}ms")]
    Cooldown { remaining_ms: i64 },
}

/// Result of a successful `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub event: PhaseEvent,
    /// Chakra index after the transition.
    pub chakra_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub current_chakra_index: usize,
    pub session_start: Option<DateTime<Utc>>,
    pub total_duration_secs: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Disclaimer,
            current_chakra_index: 0,
            session_start: None,
            total_duration_secs: 0,
        }
    }

    fn fresh(phase: Phase) -> Self {
        Self {
            phase,
            ..Self::new()
        }
    }

    fn begin_round(&mut self, now: DateTime<Utc>) {
        self.phase = Phase::Breathing;
        self.current_chakra_index = 0;
        self.session_start = Some(now);
        self.total_duration_secs = 0;
    }

    /// Whole seconds since the round started, never negative.
    fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        self.session_start
            .map(|start| (now - start).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }

    /// Apply `event` at `now`.
    ///
    /// On error the state is left untouched.
    pub fn apply(
        &mut self,
        event: PhaseEvent,
        now: DateTime<Utc>,
    ) -> Result<Transition, TransitionError> {
        let from = self.phase;
        match (from, event) {
            (_, PhaseEvent::Reset) => *self = Self::new(),
            (Phase::Disclaimer, PhaseEvent::Acknowledge) => *self = Self::fresh(Phase::Auth),
            (Phase::Auth, PhaseEvent::LoginSucceeded) => *self = Self::fresh(Phase::Dashboard),
            (Phase::Auth, PhaseEvent::GuestStart) | (Phase::Dashboard, PhaseEvent::StartRound) => {
                self.begin_round(now)
            }
            (Phase::Dashboard, PhaseEvent::Logout) => *self = Self::fresh(Phase::Auth),
            (Phase::Breathing, PhaseEvent::AudioSequenceComplete) => self.phase = Phase::Retention,
            (Phase::Retention, PhaseEvent::RetentionTap) => self.phase = Phase::Meditation,
            (Phase::Meditation, PhaseEvent::AudioSequenceComplete) => {
                if self.current_chakra_index < LAST_STAGE_INDEX {
                    self.current_chakra_index += 1;
                    self.phase = Phase::Breathing;
                } else {
                    self.total_duration_secs = self.elapsed_secs(now);
                    self.phase = Phase::Summary;
                }
            }
            (Phase::Summary, PhaseEvent::Continue(UserType::User)) => {
                *self = Self::fresh(Phase::Dashboard)
            }
            (Phase::Summary, PhaseEvent::Continue(UserType::Guest)) => {
                *self = Self::fresh(Phase::Auth)
            }
            (phase, event) => return Err(TransitionError::NotAllowed { phase, event }),
        }
        Ok(Transition {
            from,
            to: self.phase,
            event,
            chakra_index: self.current_chakra_index,
        })
    }
}

/// Explicit re-entrancy guard.
///
/// Engaging the lock holds it for `TRANSITION_COOLDOWN_MS`; any request in
/// that window is rejected with the remaining time.
#[derive(Debug, Clone, Default)]
pub struct TransitionLock {
    held_until: Option<DateTime<Utc>>,
}

impl TransitionLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.held_until.is_some_and(|until| now < until)
    }

    /// Check that no cooldown is active.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        match self.held_until {
            Some(until) if now < until => Err(TransitionError::Cooldown {
                remaining_ms: (until - now).num_milliseconds(),
            }),
            _ => Ok(()),
        }
    }

    /// Start a cooldown window at `now`.
    pub fn engage(&mut self, now: DateTime<Utc>) {
        self.held_until = Some(now + Duration::milliseconds(TRANSITION_COOLDOWN_MS));
    }
}
