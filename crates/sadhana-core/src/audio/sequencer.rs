//! Audio sequencer for the guided phases.
//!
//! Each BREATHING or MEDITATION phase plays an ordered list of clips for the
//! active chakra. All clips are preloaded up front; playback walks the list
//! linearly and a clip that ends or fails both move on to the next one. When
//! the list is exhausted the run is `Complete` and the controller requests
//! the "audio sequence complete" transition.
//!
//! A run is identified by a `SequenceEpoch`. Media events are matched
//! against the clip the active run is waiting on; anything else is stale
//! and ignored.

use serde::Serialize;
use tracing::{debug, warn};

use crate::platform::{ClipId, MediaBackend, MediaEvent, PlayMode, PlaybackError};
use crate::round::{self, ChakraStage};
use crate::session::Phase;

/// Identity of one sequencer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceEpoch {
    pub phase: Phase,
    pub chakra_index: usize,
    pub generation: u64,
}

/// Outcome of driving the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceProgress {
    /// The event did not belong to the active clip.
    Stale,
    /// Clip at `position` is now playing.
    Playing {
        position: usize,
        source: &'static str,
    },
    /// The platform refused to start the clip. Nothing will advance the
    /// run until `retry` is called.
    Stalled {
        position: usize,
        source: &'static str,
    },
    Complete(SequenceEpoch),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStatus {
    Playing,
    Stalled,
    Complete,
}

#[derive(Debug)]
struct PreloadedClip {
    source: &'static str,
    id: ClipId,
}

#[derive(Debug)]
struct SequenceRun {
    epoch: SequenceEpoch,
    clips: Vec<PreloadedClip>,
    position: usize,
    status: RunStatus,
}

impl SequenceRun {
    /// Play from `position` onwards, skipping clips that fail to start.
    fn play_from(&mut self, media: &mut dyn MediaBackend, mut position: usize) -> SequenceProgress {
        while let Some(clip) = self.clips.get(position) {
            self.position = position;
            match media.play(clip.id) {
                Ok(()) => {
                    debug!(source = clip.source, position, "clip playing");
                    self.status = RunStatus::Playing;
                    return SequenceProgress::Playing {
                        position,
                        source: clip.source,
                    };
                }
                Err(PlaybackError::AutoplayBlocked) => {
                    debug!(source = clip.source, "autoplay rejected, sequence stalled");
                    self.status = RunStatus::Stalled;
                    return SequenceProgress::Stalled {
                        position,
                        source: clip.source,
                    };
                }
                Err(err) => {
                    warn!(source = clip.source, error = %err, "clip failed to start, skipping");
                    position += 1;
                }
            }
        }
        self.position = self.clips.len();
        self.status = RunStatus::Complete;
        SequenceProgress::Complete(self.epoch)
    }
}

/// Clips played for `phase` at `stage`. Empty for phases without guidance.
pub fn clips_for(phase: Phase, stage: &ChakraStage) -> Vec<&'static str> {
    match phase {
        Phase::Breathing => vec![stage.focus_audio, stage.breathing_audio],
        Phase::Meditation => vec![stage.focus_audio, stage.meditation_audio],
        _ => Vec::new(),
    }
}

#[derive(Debug, Default)]
pub struct AudioSequencer {
    run: Option<SequenceRun>,
    generation: u64,
}

impl AudioSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch of the active run, if any.
    pub fn epoch(&self) -> Option<SequenceEpoch> {
        self.run.as_ref().map(|run| run.epoch)
    }

    /// Epoch of the active run once every clip has been consumed.
    pub fn completed(&self) -> Option<SequenceEpoch> {
        self.run
            .as_ref()
            .filter(|run| run.status == RunStatus::Complete)
            .map(|run| run.epoch)
    }

    pub fn is_stalled(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| run.status == RunStatus::Stalled)
    }

    /// Source of the clip the run is currently on.
    pub fn current_source(&self) -> Option<&'static str> {
        let run = self.run.as_ref()?;
        run.clips.get(run.position).map(|clip| clip.source)
    }

    /// Tear down any previous run, preload the clips for `phase` and start
    /// the first one. Returns `None` when the phase has no clips.
    pub fn start(
        &mut self,
        media: &mut dyn MediaBackend,
        phase: Phase,
        chakra_index: usize,
    ) -> Option<SequenceProgress> {
        self.teardown(media);

        let sources = round::stage(chakra_index)
            .map(|stage| clips_for(phase, stage))
            .unwrap_or_default();
        if sources.is_empty() {
            return None;
        }

        self.generation += 1;
        let clips = sources
            .into_iter()
            .map(|source| PreloadedClip {
                source,
                id: media.preload(source, PlayMode::Once),
            })
            .collect();
        let mut run = SequenceRun {
            epoch: SequenceEpoch {
                phase,
                chakra_index,
                generation: self.generation,
            },
            clips,
            position: 0,
            status: RunStatus::Playing,
        };
        let progress = run.play_from(media, 0);
        self.run = Some(run);
        Some(progress)
    }

    /// Feed a media notification into the active run.
    pub fn handle(&mut self, media: &mut dyn MediaBackend, event: MediaEvent) -> SequenceProgress {
        let Some(run) = self.run.as_mut() else {
            return SequenceProgress::Stale;
        };
        let waiting_on = run.clips.get(run.position).map(|clip| clip.id);
        if run.status != RunStatus::Playing || waiting_on != Some(event.clip()) {
            debug!(clip = event.clip(), "ignoring stale media event");
            return SequenceProgress::Stale;
        }
        if let MediaEvent::Failed(_) = event {
            warn!(
                source = run.clips[run.position].source,
                "clip failed during playback, advancing"
            );
        }
        let next = run.position + 1;
        run.play_from(media, next)
    }

    /// Retry a clip that was rejected by the autoplay policy.
    pub fn retry(&mut self, media: &mut dyn MediaBackend) -> Option<SequenceProgress> {
        let run = self.run.as_mut()?;
        if run.status != RunStatus::Stalled {
            return None;
        }
        let position = run.position;
        Some(run.play_from(media, position))
    }

    /// Stop every preloaded clip of the active run and forget it.
    ///
    /// The in-flight clip is stopped first, then the rest, including clips
    /// that ended or were skipped after failing to start.
    pub fn teardown(&mut self, media: &mut dyn MediaBackend) {
        let Some(run) = self.run.take() else {
            return;
        };
        let current = run.clips.get(run.position).map(|clip| clip.id);
        if let Some(id) = current {
            media.stop(id);
        }
        for clip in &run.clips {
            if Some(clip.id) != current {
                media.stop(clip.id);
            }
        }
        debug!(generation = run.epoch.generation, "sequence torn down");
    }
}
