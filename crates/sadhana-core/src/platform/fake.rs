//! Deterministic platform doubles for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{
    Capability, Clock, ClipId, MediaBackend, MediaEvent, PlayMode, PlaybackError, Visibility,
    WakeLockError, WakeLockHandle, WakeLockPlatform,
};

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<DateTime<Utc>>>);

impl ManualClock {
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap();
        Self(Rc::new(Cell::new(start)))
    }

    pub fn advance_ms(&self, ms: i64) {
        self.0.set(self.0.get() + Duration::milliseconds(ms));
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

#[derive(Debug, Default)]
pub struct MediaLog {
    next_id: ClipId,
    pub sources: HashMap<ClipId, String>,
    pub modes: HashMap<ClipId, PlayMode>,
    pub played: Vec<ClipId>,
    pub stopped: Vec<ClipId>,
    pub playing: HashSet<ClipId>,
    pub autoplay_blocked: bool,
    pub failing_sources: HashSet<String>,
}

/// Records every media call; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct FakeMedia(pub Rc<RefCell<MediaLog>>);

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_autoplay(&self, blocked: bool) {
        self.0.borrow_mut().autoplay_blocked = blocked;
    }

    pub fn fail_source(&self, source: &str) {
        self.0.borrow_mut().failing_sources.insert(source.to_string());
    }

    pub fn source_of(&self, clip: ClipId) -> String {
        self.0.borrow().sources.get(&clip).cloned().unwrap_or_default()
    }

    pub fn played_sources(&self) -> Vec<String> {
        let log = self.0.borrow();
        log.played
            .iter()
            .filter_map(|id| log.sources.get(id).cloned())
            .collect()
    }

    /// Most recent clip that was started and is still playing.
    pub fn current(&self) -> Option<ClipId> {
        let log = self.0.borrow();
        log.played
            .iter()
            .rev()
            .find(|id| log.playing.contains(id))
            .copied()
    }

    /// Clips currently playing in `PlayMode::Once`.
    pub fn playing_once(&self) -> Vec<ClipId> {
        let log = self.0.borrow();
        log.playing
            .iter()
            .filter(|id| log.modes.get(id) == Some(&PlayMode::Once))
            .copied()
            .collect()
    }

    pub fn is_playing(&self, clip: ClipId) -> bool {
        self.0.borrow().playing.contains(&clip)
    }

    pub fn was_stopped(&self, clip: ClipId) -> bool {
        self.0.borrow().stopped.contains(&clip)
    }

    /// Let `clip` play to the end. Returns the event the backend emits.
    pub fn finish(&self, clip: ClipId) -> MediaEvent {
        self.0.borrow_mut().playing.remove(&clip);
        MediaEvent::Ended(clip)
    }
}

impl MediaBackend for FakeMedia {
    fn preload(&mut self, source: &str, mode: PlayMode) -> ClipId {
        let mut log = self.0.borrow_mut();
        log.next_id += 1;
        let id = log.next_id;
        log.sources.insert(id, source.to_string());
        log.modes.insert(id, mode);
        id
    }

    fn play(&mut self, clip: ClipId) -> Result<(), PlaybackError> {
        let mut log = self.0.borrow_mut();
        log.played.push(clip);
        if log.autoplay_blocked {
            return Err(PlaybackError::AutoplayBlocked);
        }
        let source = log.sources.get(&clip).cloned().unwrap_or_default();
        if log.failing_sources.contains(&source) {
            return Err(PlaybackError::Failed(format!("cannot decode {source}")));
        }
        log.playing.insert(clip);
        Ok(())
    }

    fn stop(&mut self, clip: ClipId) {
        let mut log = self.0.borrow_mut();
        log.playing.remove(&clip);
        log.stopped.push(clip);
    }
}

#[derive(Debug)]
pub struct WakeLockLog {
    pub capability: Capability,
    pub visibility: Visibility,
    pub deny: bool,
    pub held: Option<WakeLockHandle>,
    pub probes: u32,
    pub requests: u32,
    pub releases: u32,
    next: u64,
}

#[derive(Debug, Clone)]
pub struct FakeWakeLock(pub Rc<RefCell<WakeLockLog>>);

impl FakeWakeLock {
    pub fn new(capability: Capability) -> Self {
        Self(Rc::new(RefCell::new(WakeLockLog {
            capability,
            visibility: Visibility::Visible,
            deny: false,
            held: None,
            probes: 0,
            requests: 0,
            releases: 0,
            next: 0,
        })))
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        self.0.borrow_mut().visibility = visibility;
    }

    pub fn deny(&self, deny: bool) {
        self.0.borrow_mut().deny = deny;
    }

    /// Simulates the OS dropping the lock while the page is hidden.
    pub fn revoke(&self) -> Option<WakeLockHandle> {
        self.0.borrow_mut().held.take()
    }

    pub fn held(&self) -> Option<WakeLockHandle> {
        self.0.borrow().held
    }

    pub fn requests(&self) -> u32 {
        self.0.borrow().requests
    }

    pub fn releases(&self) -> u32 {
        self.0.borrow().releases
    }

    pub fn probes(&self) -> u32 {
        self.0.borrow().probes
    }
}

impl WakeLockPlatform for FakeWakeLock {
    fn probe(&self) -> Capability {
        let mut log = self.0.borrow_mut();
        log.probes += 1;
        log.capability
    }

    fn visibility(&self) -> Visibility {
        self.0.borrow().visibility
    }

    fn request(&mut self) -> Result<WakeLockHandle, WakeLockError> {
        let mut log = self.0.borrow_mut();
        log.requests += 1;
        if log.capability == Capability::Unsupported {
            return Err(WakeLockError::Unsupported);
        }
        if log.deny {
            return Err(WakeLockError::Denied("NotAllowedError".into()));
        }
        log.next += 1;
        let handle = WakeLockHandle(log.next);
        log.held = Some(handle);
        Ok(handle)
    }

    fn release(&mut self, handle: WakeLockHandle) -> Result<(), WakeLockError> {
        let mut log = self.0.borrow_mut();
        log.releases += 1;
        if log.held == Some(handle) {
            log.held = None;
        }
        Ok(())
    }
}
