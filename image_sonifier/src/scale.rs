// Musical scales that pixel luminosity is quantized onto.
//
// A scale is an ascending list of semitone offsets within one octave,
// rooted at pitch class 0 (C). The quantizer in `mapping.rs` walks these
// offsets octave by octave, so the order of the list matters: slot `n` of
// the quantizer lands on `intervals()[n % len]`.
//
// Besides the two built-in seven-note scales, configs may supply a custom
// offset list. Custom lists are checked by `validate` before any mapping
// runs.

use crate::error::{Result, SonifyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MIXOLYDIAN: [u8; 7] = [0, 2, 4, 5, 7, 9, 10];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// C D E F G A B
    #[default]
    Major,
    /// C D E F G A Bb (major with lowered 7th)
    Mixolydian,
    /// Arbitrary ascending offsets, each below 12.
    Custom(Vec<u8>),
}

impl Scale {
    /// Semitone offsets from the root, ascending.
    pub fn intervals(&self) -> &[u8] {
        match self {
            Scale::Major => &MAJOR,
            Scale::Mixolydian => &MIXOLYDIAN,
            Scale::Custom(offsets) => offsets,
        }
    }

    pub fn len(&self) -> usize {
        self.intervals().len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals().is_empty()
    }

    /// The 12 pitch classes in the scale, indexed by pitch class.
    pub fn pitch_classes(&self) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &interval in self.intervals() {
            pcs[(interval % 12) as usize] = true;
        }
        pcs
    }

    /// Check if a MIDI pitch belongs to the scale in any octave.
    pub fn contains_pitch(&self, pitch: u8) -> bool {
        self.pitch_classes()[(pitch % 12) as usize]
    }

    /// Reject custom offset lists the quantizer cannot walk.
    pub fn validate(&self) -> Result<()> {
        let offsets = self.intervals();
        if offsets.is_empty() {
            return Err(SonifyError::range("scale", "no scale degrees"));
        }
        if let Some(&bad) = offsets.iter().find(|&&o| o >= 12) {
            return Err(SonifyError::range(
                "scale",
                format!("offset {bad} is outside one octave"),
            ));
        }
        if offsets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SonifyError::range(
                "scale",
                "offsets must be strictly ascending",
            ));
        }
        Ok(())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" | "ionian" => Ok(Scale::Major),
            "mixolydian" => Ok(Scale::Mixolydian),
            other => Err(format!(
                "unknown scale '{other}' (expected major or mixolydian)"
            )),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Major => write!(f, "major"),
            Scale::Mixolydian => write!(f, "mixolydian"),
            Scale::Custom(offsets) => write!(f, "custom{offsets:?}"),
        }
    }
}
