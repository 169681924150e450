//! Capability interfaces the session controller is built against.
//!
//! The controller never touches a real clock, audio device or screen
//! directly. Front ends inject implementations of these traits; tests
//! inject deterministic fakes.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[cfg(test)]
pub(crate) mod fake;

// ── Clock ────────────────────────────────────────────────────────────

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ── Media ────────────────────────────────────────────────────────────

/// Opaque handle to a preloaded clip, unique per backend.
pub type ClipId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    Once,
    Looped,
}

/// Asynchronous notification from the media backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Clip played to the end.
    Ended(ClipId),
    /// Clip could not be decoded or fetched.
    Failed(ClipId),
}

impl MediaEvent {
    pub fn clip(&self) -> ClipId {
        match self {
            MediaEvent::Ended(id) | MediaEvent::Failed(id) => *id,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The platform refused to start playback without a user gesture.
    /// No completion event will follow.
    #[error("playback blocked by autoplay policy")]
    AutoplayBlocked,

    #[error("playback failed: {0}")]
    Failed(String),
}

/// Single playback channel.
///
/// `stop` must pause, rewind and detach the clip so that no `MediaEvent`
/// for it is delivered afterwards. Stopping an unknown or already stopped
/// clip is a no-op.
pub trait MediaBackend {
    fn preload(&mut self, source: &str, mode: PlayMode) -> ClipId;
    fn play(&mut self, clip: ClipId) -> Result<(), PlaybackError>;
    fn stop(&mut self, clip: ClipId);
}

// ── Wake lock ────────────────────────────────────────────────────────

/// Result of probing the platform for wake-lock support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported,
    /// Probe was inconclusive; an acquisition attempt decides.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Handle to a held screen wake lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeLockHandle(pub u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WakeLockError {
    #[error("wake lock not supported on this platform")]
    Unsupported,

    #[error("wake lock request denied: {0}")]
    Denied(String),

    #[error("wake lock release failed: {0}")]
    ReleaseFailed(String),
}

pub trait WakeLockPlatform {
    fn probe(&self) -> Capability;
    fn visibility(&self) -> Visibility;
    fn request(&mut self) -> Result<WakeLockHandle, WakeLockError>;
    fn release(&mut self, handle: WakeLockHandle) -> Result<(), WakeLockError>;
}
