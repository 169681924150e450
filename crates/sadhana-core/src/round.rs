//! The fixed seven-stage chakra round.
//!
//! Every round walks the same catalogue in order. Asset paths are
//! compile-time constants and are resolved by the media backend.

use serde::Serialize;

/// Number of chakra stages in a round.
pub const STAGE_COUNT: usize = 7;

/// Index of the final stage; completing its meditation ends the round.
pub const LAST_STAGE_INDEX: usize = STAGE_COUNT - 1;

/// Spoken instructions offered on the disclaimer screen.
pub const INSTRUCTIONS_AUDIO: &str = "/audio/Instructions.mp3";

/// Looped focus clip played underneath every retention.
pub const RETENTION_FOCUS_AUDIO: &str = "/audio/retention-focus.mp3";

/// One position in the round with its audio/visual assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChakraStage {
    pub id: u8,
    pub name: &'static str,
    /// Accent color token used by the front end.
    pub color: &'static str,
    pub focus_audio: &'static str,
    pub breathing_audio: &'static str,
    pub meditation_audio: &'static str,
    pub background: &'static str,
}

pub const ROUND: [ChakraStage; STAGE_COUNT] = [
    ChakraStage {
        id: 1,
        name: "Wortel (Muladhara)",
        color: "bg-red-500",
        focus_audio: "/audio/focus-chakra-1.mp3",
        breathing_audio: "/audio/Breathing-chakra-1.mp3",
        meditation_audio: "/audio/meditation-chakra-1.mp3",
        background: "/images/chakras/chakra-1.png",
    },
    ChakraStage {
        id: 2,
        name: "Sacraal (Svadhisthana)",
        color: "bg-orange-500",
        focus_audio: "/audio/focus-chakra-2.mp3",
        breathing_audio: "/audio/breathing-chakra-2.mp3",
        meditation_audio: "/audio/meditation-chakra-2.mp3",
        background: "/images/chakras/chakra-2.png",
    },
    ChakraStage {
        id: 3,
        name: "Zonnevlecht (Manipura)",
        color: "bg-yellow-500",
        focus_audio: "/audio/focus-chakra-3.mp3",
        breathing_audio: "/audio/breathing-chakra-3.mp3",
        meditation_audio: "/audio/meditation-chakra-3.mp3",
        background: "/images/chakras/chakra-3.png",
    },
    ChakraStage {
        id: 4,
        name: "Hart (Anahata)",
        color: "bg-green-500",
        focus_audio: "/audio/focus-chakra-4.mp3",
        breathing_audio: "/audio/breathing-chakra-4.mp3",
        // Asset ships under this spelling.
        meditation_audio: "/audio/meditiaton-chakra-4.mp3",
        background: "/images/chakras/chakra-4.png",
    },
    ChakraStage {
        id: 5,
        name: "Keel (Vishuddha)",
        color: "bg-blue-500",
        focus_audio: "/audio/focus-chakra-5.mp3",
        breathing_audio: "/audio/breathing-chakra-5.mp3",
        meditation_audio: "/audio/meditation-chakra-5.mp3",
        background: "/images/chakras/chakra-5.png",
    },
    ChakraStage {
        id: 6,
        name: "Derde Oog (Ajna)",
        color: "bg-indigo-500",
        focus_audio: "/audio/focus-chakra-6.mp3",
        breathing_audio: "/audio/breathing-chakra-6.mp3",
        meditation_audio: "/audio/meditation-chakra-6.mp3",
        background: "/images/chakras/chakra-6.png",
    },
    ChakraStage {
        id: 7,
        name: "Kroon (Sahasrara)",
        color: "bg-purple-500",
        focus_audio: "/audio/focus-chakra-7.mp3",
        breathing_audio: "/audio/breathing-chakra-7.mp3",
        meditation_audio: "/audio/meditation-chakra-7.mp3",
        background: "/images/chakras/chakra-7.png",
    },
];

/// Stage at `index`, if it is inside the round.
pub fn stage(index: usize) -> Option<&'static ChakraStage> {
    ROUND.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_ids_are_sequential() {
        for (i, stage) in ROUND.iter().enumerate() {
            assert_eq!(stage.id as usize, i + 1);
        }
    }

    #[test]
    fn stage_lookup_is_bounded() {
        assert_eq!(stage(0).map(|s| s.name), Some("Wortel (Muladhara)"));
        assert_eq!(stage(LAST_STAGE_INDEX).map(|s| s.name), Some("Kroon (Sahasrara)"));
        assert!(stage(STAGE_COUNT).is_none());
    }
}
