use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::Phase;
use crate::wake_lock::WakeLockChange;

/// Every state change in the controller produces an Event.
/// Front ends drain and render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseChanged {
        from: Phase,
        to: Phase,
        chakra_index: usize,
        at: DateTime<Utc>,
    },
    /// A transition request was dropped (cooldown or invalid in phase).
    TransitionRejected {
        phase: Phase,
        reason: String,
        at: DateTime<Utc>,
    },
    ClipStarted {
        source: &'static str,
        position: usize,
        at: DateTime<Utc>,
    },
    /// The platform refused to autoplay; the sequence waits for a retry.
    AudioStalled {
        source: &'static str,
        at: DateTime<Utc>,
    },
    SequenceCompleted {
        phase: Phase,
        chakra_index: usize,
        at: DateTime<Utc>,
    },
    InstructionsToggled {
        playing: bool,
        error: Option<String>,
        at: DateTime<Utc>,
    },
    RetentionTick {
        seconds: u64,
        at: DateTime<Utc>,
    },
    RetentionRecorded {
        chakra: String,
        seconds: u64,
        at: DateTime<Utc>,
    },
    WakeLock {
        change: WakeLockChange,
        at: DateTime<Utc>,
    },
    SaveStarted {
        records: usize,
        total_duration: u64,
        at: DateTime<Utc>,
    },
    SaveSucceeded {
        at: DateTime<Utc>,
    },
    SaveFailed {
        message: String,
        at: DateTime<Utc>,
    },
    StatsLoaded {
        session_count: u64,
        at: DateTime<Utc>,
    },
    StatsFailed {
        message: String,
        at: DateTime<Utc>,
    },
}
