//! Terminal stand-ins for the audio channel and the screen wake lock.
//!
//! Clips "play" for a configured number of seconds; the session loop polls
//! `due_events` and feeds the endings into the controller.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use sadhana_core::platform::{
    Capability, ClipId, MediaBackend, MediaEvent, PlayMode, PlaybackError, Visibility,
    WakeLockError, WakeLockHandle, WakeLockPlatform,
};
use sadhana_core::storage::{SimulationConfig, WakeLockMode, MAX_CLIP_SECS};
use sadhana_core::ConfigError;
use tracing::debug;

#[derive(Debug, Default)]
struct MediaState {
    next_id: ClipId,
    clips: HashMap<ClipId, (String, PlayMode)>,
    /// Playing clips with their end time; looped clips never end.
    playing: HashMap<ClipId, Option<DateTime<Utc>>>,
}

/// Shared handle: one clone goes into the controller, the session loop
/// keeps the other to poll for endings.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    state: Rc<RefCell<MediaState>>,
    clip_length: Duration,
    missing: Rc<HashSet<String>>,
}

impl SimulatedMedia {
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let clip_length = Some(config.clip_secs)
            .filter(|secs| *secs <= MAX_CLIP_SECS)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "simulation.clip_secs".into(),
                message: format!("must be at most {MAX_CLIP_SECS} seconds"),
            })?;
        Ok(Self {
            state: Rc::default(),
            clip_length,
            missing: Rc::new(config.missing_assets.iter().cloned().collect()),
        })
    }

    /// Endings that are due at `now`, oldest clip first.
    pub fn due_events(&self, now: DateTime<Utc>) -> Vec<MediaEvent> {
        let mut state = self.state.borrow_mut();
        let mut due: Vec<ClipId> = state
            .playing
            .iter()
            .filter(|(_, ends_at)| ends_at.is_some_and(|end| end <= now))
            .map(|(id, _)| *id)
            .collect();
        due.sort_unstable();
        for id in &due {
            state.playing.remove(id);
        }
        due.into_iter().map(MediaEvent::Ended).collect()
    }
}

impl MediaBackend for SimulatedMedia {
    fn preload(&mut self, source: &str, mode: PlayMode) -> ClipId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state.clips.insert(id, (source.to_string(), mode));
        id
    }

    fn play(&mut self, clip: ClipId) -> Result<(), PlaybackError> {
        let mut state = self.state.borrow_mut();
        let (source, mode) = state
            .clips
            .get(&clip)
            .cloned()
            .ok_or_else(|| PlaybackError::Failed(format!("unknown clip {clip}")))?;
        if self.missing.contains(&source) {
            return Err(PlaybackError::Failed(format!("{source} not found")));
        }
        let ends_at = match mode {
            PlayMode::Once => Some(Utc::now() + self.clip_length),
            PlayMode::Looped => None,
        };
        debug!(%source, "simulated playback started");
        state.playing.insert(clip, ends_at);
        Ok(())
    }

    fn stop(&mut self, clip: ClipId) {
        let mut state = self.state.borrow_mut();
        state.playing.remove(&clip);
        state.clips.remove(&clip);
    }
}

/// Wake lock whose support is chosen in the config.
#[derive(Debug)]
pub struct SimulatedWakeLock {
    mode: WakeLockMode,
    held: Option<WakeLockHandle>,
    next: u64,
}

impl SimulatedWakeLock {
    pub fn new(mode: WakeLockMode) -> Self {
        Self {
            mode,
            held: None,
            next: 0,
        }
    }
}

impl WakeLockPlatform for SimulatedWakeLock {
    fn probe(&self) -> Capability {
        match self.mode {
            WakeLockMode::Unsupported => Capability::Unsupported,
            WakeLockMode::Supported | WakeLockMode::Denied => Capability::Supported,
        }
    }

    fn visibility(&self) -> Visibility {
        Visibility::Visible
    }

    fn request(&mut self) -> Result<WakeLockHandle, WakeLockError> {
        match self.mode {
            WakeLockMode::Unsupported => Err(WakeLockError::Unsupported),
            WakeLockMode::Denied => Err(WakeLockError::Denied("NotAllowedError".into())),
            WakeLockMode::Supported => {
                self.next += 1;
                let handle = WakeLockHandle(self.next);
                self.held = Some(handle);
                Ok(handle)
            }
        }
    }

    fn release(&mut self, handle: WakeLockHandle) -> Result<(), WakeLockError> {
        if self.held != Some(handle) {
            return Err(WakeLockError::ReleaseFailed(format!(
                "handle {} is not held",
                handle.0
            )));
        }
        self.held = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(clip_secs: u64, missing: &[&str]) -> SimulationConfig {
        SimulationConfig {
            clip_secs,
            missing_assets: missing.iter().map(|s| s.to_string()).collect(),
            wake_lock: WakeLockMode::Supported,
        }
    }

    #[test]
    fn once_clips_end_after_clip_length() {
        let mut media = SimulatedMedia::new(&config(0, &[])).unwrap();
        let id = media.preload("/audio/focus-chakra-1.mp3", PlayMode::Once);
        media.play(id).unwrap();
        assert_eq!(media.due_events(Utc::now()), vec![MediaEvent::Ended(id)]);
        assert!(media.due_events(Utc::now()).is_empty());
    }

    #[test]
    fn looped_and_stopped_clips_never_end() {
        let mut media = SimulatedMedia::new(&config(0, &[])).unwrap();
        let looped = media.preload("/audio/retention-focus.mp3", PlayMode::Looped);
        let stopped = media.preload("/audio/focus-chakra-1.mp3", PlayMode::Once);
        media.play(looped).unwrap();
        media.play(stopped).unwrap();
        media.stop(stopped);
        assert!(media.due_events(Utc::now() + Duration::hours(1)).is_empty());
    }

    #[test]
    fn clip_length_out_of_range_is_rejected() {
        for secs in [MAX_CLIP_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            assert!(matches!(
                SimulatedMedia::new(&config(secs, &[])),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
        let mut media = SimulatedMedia::new(&config(MAX_CLIP_SECS, &[])).unwrap();
        let id = media.preload("/audio/focus-chakra-1.mp3", PlayMode::Once);
        media.play(id).unwrap();
        assert!(media.due_events(Utc::now()).is_empty());
    }

    #[test]
    fn stopped_clips_are_forgotten() {
        let mut media = SimulatedMedia::new(&config(3, &[])).unwrap();
        for _ in 0..5 {
            let id = media.preload("/audio/Breathing-chakra-1.mp3", PlayMode::Once);
            media.play(id).unwrap();
            media.stop(id);
        }
        let state = media.state.borrow();
        assert!(state.clips.is_empty());
        assert!(state.playing.is_empty());
    }

    #[test]
    fn missing_assets_fail_to_play() {
        let mut media = SimulatedMedia::new(&config(3, &["/audio/Instructions.mp3"])).unwrap();
        let id = media.preload("/audio/Instructions.mp3", PlayMode::Once);
        assert!(matches!(media.play(id), Err(PlaybackError::Failed(_))));
    }

    #[test]
    fn wake_lock_modes() {
        let mut supported = SimulatedWakeLock::new(WakeLockMode::Supported);
        let handle = supported.request().unwrap();
        assert!(supported.release(handle).is_ok());
        assert!(supported.release(handle).is_err());

        let mut denied = SimulatedWakeLock::new(WakeLockMode::Denied);
        assert_eq!(denied.probe(), Capability::Supported);
        assert!(matches!(denied.request(), Err(WakeLockError::Denied(_))));

        let unsupported = SimulatedWakeLock::new(WakeLockMode::Unsupported);
        assert_eq!(unsupported.probe(), Capability::Unsupported);
    }
}
