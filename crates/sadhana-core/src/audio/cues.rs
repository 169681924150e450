//! Single-clip cues outside the guided sequences.

use tracing::debug;

use crate::platform::{ClipId, MediaBackend, MediaEvent, PlayMode};
use crate::round::{INSTRUCTIONS_AUDIO, RETENTION_FOCUS_AUDIO};

pub const INSTRUCTIONS_FAILED: &str = "Kon Instructions.mp3 niet afspelen.";
pub const INSTRUCTIONS_BLOCKED: &str = "Autoplay geblokkeerd of audio niet gevonden.";

/// Spoken instructions, toggled from the disclaimer screen.
#[derive(Debug, Default)]
pub struct InstructionCue {
    clip: Option<ClipId>,
    error: Option<String>,
    info_visible: bool,
}

impl InstructionCue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.clip.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the written instructions are shown next to the audio.
    pub fn info_visible(&self) -> bool {
        self.info_visible
    }

    /// Start the instructions, or stop them if they are playing.
    /// Returns whether they are playing afterwards.
    pub fn toggle(&mut self, media: &mut dyn MediaBackend) -> bool {
        if self.is_playing() {
            self.stop(media);
            return false;
        }

        self.error = None;
        self.info_visible = true;
        let id = media.preload(INSTRUCTIONS_AUDIO, PlayMode::Once);
        match media.play(id) {
            Ok(()) => {
                self.clip = Some(id);
                true
            }
            Err(err) => {
                debug!(error = %err, "instructions did not start");
                media.stop(id);
                self.error = Some(INSTRUCTIONS_BLOCKED.to_string());
                false
            }
        }
    }

    /// Returns true when the event belonged to the instructions clip.
    pub fn handle(&mut self, event: MediaEvent) -> bool {
        if self.clip != Some(event.clip()) {
            return false;
        }
        self.clip = None;
        if let MediaEvent::Failed(_) = event {
            self.error = Some(INSTRUCTIONS_FAILED.to_string());
        }
        true
    }

    pub fn stop(&mut self, media: &mut dyn MediaBackend) {
        if let Some(id) = self.clip.take() {
            media.stop(id);
        }
        self.info_visible = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Looped focus clip underneath the retention phase.
///
/// Playback failures are ignored; the retention works without it.
#[derive(Debug, Default)]
pub struct RetentionFocusCue {
    clip: Option<ClipId>,
}

impl RetentionFocusCue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.clip.is_some()
    }

    pub fn start(&mut self, media: &mut dyn MediaBackend) {
        if self.clip.is_some() {
            return;
        }
        let id = media.preload(RETENTION_FOCUS_AUDIO, PlayMode::Looped);
        if let Err(err) = media.play(id) {
            debug!(error = %err, "retention focus clip did not start");
        }
        self.clip = Some(id);
    }

    pub fn stop(&mut self, media: &mut dyn MediaBackend) {
        if let Some(id) = self.clip.take() {
            media.stop(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakeMedia;

    #[test]
    fn toggle_starts_and_stops_instructions() {
        let mut media = FakeMedia::new();
        let mut cue = InstructionCue::new();
        assert!(cue.toggle(&mut media));
        assert!(cue.is_playing());
        assert!(cue.info_visible());
        let clip = media.current().unwrap();
        assert_eq!(media.source_of(clip), INSTRUCTIONS_AUDIO);

        assert!(!cue.toggle(&mut media));
        assert!(!media.is_playing(clip));
        assert!(!cue.info_visible());
    }

    #[test]
    fn blocked_instructions_record_error() {
        let mut media = FakeMedia::new();
        media.block_autoplay(true);
        let mut cue = InstructionCue::new();
        assert!(!cue.toggle(&mut media));
        assert_eq!(cue.error(), Some(INSTRUCTIONS_BLOCKED));
    }

    #[test]
    fn failed_instructions_record_error() {
        let mut media = FakeMedia::new();
        let mut cue = InstructionCue::new();
        cue.toggle(&mut media);
        let clip = media.current().unwrap();
        assert!(cue.handle(MediaEvent::Failed(clip)));
        assert!(!cue.is_playing());
        assert_eq!(cue.error(), Some(INSTRUCTIONS_FAILED));
        assert!(!cue.handle(MediaEvent::Ended(clip)));
    }

    #[test]
    fn retention_focus_is_looped_and_idempotent() {
        let mut media = FakeMedia::new();
        let mut cue = RetentionFocusCue::new();
        cue.start(&mut media);
        cue.start(&mut media);
        assert_eq!(media.played_sources(), vec![RETENTION_FOCUS_AUDIO.to_string()]);
        assert!(media.playing_once().is_empty());
        cue.stop(&mut media);
        assert!(!cue.is_active());
        assert!(media.current().is_none());
    }
}
