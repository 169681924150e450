//! Screen wake-lock coordination.
//!
//! The controller computes a single predicate, "should hold", after every
//! state change and hands it to `WakeLockManager::sync`. A lock is requested
//! when the predicate becomes true and released when it becomes false.
//! Returning to a visible page while the predicate holds re-requests a lock
//! the OS may have dropped while the page was hidden.
//!
//! Nothing here can block phase progress: failures are recorded as a
//! warning for the user and the round continues.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::platform::{Capability, Visibility, WakeLockError, WakeLockHandle, WakeLockPlatform};

pub const WAKE_LOCK_FAILED: &str =
    "Kon scherm niet wakker houden. Zet Auto-Lock tijdelijk uit als fallback.";
pub const WAKE_LOCK_UNSUPPORTED: &str =
    "Wake Lock niet ondersteund in deze browser. Gebruik Safari of zet Auto-Lock tijdelijk uit.";
pub const WAKE_LOCK_ACTIVE: &str = "Scherm wakker houden actief tijdens sessie.";

/// What a manager call did to the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WakeLockChange {
    Unchanged,
    Acquired,
    Released,
    /// Platform has no wake lock; recorded once, never retried.
    Unsupported,
    Failed { message: String },
}

#[derive(Debug, Default)]
pub struct WakeLockManager {
    held: Option<WakeLockHandle>,
    /// `None` until the platform has been asked.
    supported: Option<bool>,
    error: Option<String>,
    should_hold: bool,
}

impl WakeLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    pub fn supported(&self) -> Option<bool> {
        self.supported
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Line shown to the user during retention.
    pub fn status_message(&self) -> &str {
        if self.supported == Some(false) {
            WAKE_LOCK_UNSUPPORTED
        } else if let Some(error) = &self.error {
            error
        } else {
            WAKE_LOCK_ACTIVE
        }
    }

    /// Apply the current value of the "should hold" predicate.
    ///
    /// Safe to call redundantly.
    pub fn sync(&mut self, platform: &mut dyn WakeLockPlatform, should_hold: bool) -> WakeLockChange {
        let became_true = should_hold && !self.should_hold;
        self.should_hold = should_hold;

        if !should_hold {
            self.error = None;
            return self.release(platform);
        }
        if became_true {
            return self.acquire(platform);
        }
        WakeLockChange::Unchanged
    }

    pub fn on_visibility_change(
        &mut self,
        platform: &mut dyn WakeLockPlatform,
        visibility: Visibility,
    ) -> WakeLockChange {
        if visibility == Visibility::Visible && self.should_hold && self.held.is_none() {
            debug!("page visible again, re-requesting wake lock");
            return self.acquire(platform);
        }
        WakeLockChange::Unchanged
    }

    /// The platform released `handle` on its own (e.g. the page was hidden).
    pub fn on_released(&mut self, handle: WakeLockHandle) {
        if self.held == Some(handle) {
            debug!(handle = handle.0, "wake lock released by platform");
            self.held = None;
        }
    }

    fn acquire(&mut self, platform: &mut dyn WakeLockPlatform) -> WakeLockChange {
        if self.supported == Some(false) || self.held.is_some() {
            return WakeLockChange::Unchanged;
        }
        if platform.probe() == Capability::Unsupported {
            return self.mark_unsupported();
        }
        if platform.visibility() != Visibility::Visible {
            return WakeLockChange::Unchanged;
        }

        match platform.request() {
            Ok(handle) => {
                info!(handle = handle.0, "wake lock acquired");
                self.held = Some(handle);
                self.supported = Some(true);
                self.error = None;
                WakeLockChange::Acquired
            }
            Err(WakeLockError::Unsupported) => self.mark_unsupported(),
            Err(err) => {
                warn!(error = %err, "wake lock request failed");
                self.supported = Some(true);
                self.error = Some(WAKE_LOCK_FAILED.to_string());
                WakeLockChange::Failed {
                    message: WAKE_LOCK_FAILED.to_string(),
                }
            }
        }
    }

    fn mark_unsupported(&mut self) -> WakeLockChange {
        info!("wake lock not supported, not retrying");
        self.supported = Some(false);
        WakeLockChange::Unsupported
    }

    fn release(&mut self, platform: &mut dyn WakeLockPlatform) -> WakeLockChange {
        let Some(handle) = self.held.take() else {
            return WakeLockChange::Unchanged;
        };
        if let Err(err) = platform.release(handle) {
            debug!(error = %err, "wake lock release failed, dropping handle");
        }
        info!(handle = handle.0, "wake lock released");
        WakeLockChange::Released
    }
}
