mod cues;
mod sequencer;

pub use cues::{InstructionCue, RetentionFocusCue, INSTRUCTIONS_BLOCKED, INSTRUCTIONS_FAILED};
pub use sequencer::{clips_for, AudioSequencer, SequenceEpoch, SequenceProgress};
