// Mapping parameters: every tunable number the sonifier reads.
//
// `MappingParameters::default()` carries the stock values (C major, pitches
// 30..90, durations 0.8..6 quarter notes, velocities 20..127, 116 BPM, rows
// at 25/50/75% of the image height). Configs are JSON; missing fields fall
// back to the defaults, so a file containing only `{"tempo": 90}` is valid.
//
// Nothing reads a parameter set that has not been through `validate`. The
// orchestration in `sonify.rs` validates on entry, and `load` validates
// before returning.

use crate::error::{Result, SonifyError};
use crate::midi::MIN_TEMPO_BPM;
use crate::scale::Scale;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingParameters {
    pub scale: Scale,
    /// Lowest MIDI pitch emitted.
    pub min_pitch: u8,
    /// Highest MIDI pitch emitted. Must exceed `min_pitch`.
    pub max_pitch: u8,
    /// Note length for a red value of 0, in quarter-note beats.
    pub min_duration: f64,
    /// Note length for a red value of 255, in quarter-note beats.
    pub max_duration: f64,
    /// Velocity for a blue value of 0.
    pub min_velocity: u8,
    /// Velocity for a blue value of 255.
    pub max_velocity: u8,
    /// Quarter notes per minute.
    pub tempo: u16,
    /// Fractions of the image height at which rows are sampled.
    pub slice_positions: [f64; 3],
}

impl Default for MappingParameters {
    fn default() -> Self {
        MappingParameters {
            scale: Scale::Major,
            min_pitch: 30,
            max_pitch: 90,
            min_duration: 0.8,
            max_duration: 6.0,
            min_velocity: 20,
            max_velocity: 127,
            tempo: 116,
            slice_positions: [0.25, 0.50, 0.75],
        }
    }
}

impl MappingParameters {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse from a JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: MappingParameters = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject inverted or out-of-range settings before any pixel is read.
    pub fn validate(&self) -> Result<()> {
        self.scale.validate()?;

        if self.max_pitch > 127 {
            return Err(SonifyError::range(
                "max_pitch",
                format!("{} is not a MIDI pitch", self.max_pitch),
            ));
        }
        if self.min_pitch >= self.max_pitch {
            return Err(SonifyError::range(
                "min_pitch",
                format!(
                    "min_pitch {} must be below max_pitch {}",
                    self.min_pitch, self.max_pitch
                ),
            ));
        }

        for (name, value) in [
            ("min_duration", self.min_duration),
            ("max_duration", self.max_duration),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SonifyError::range(
                    name,
                    format!("{value} is not a positive beat count"),
                ));
            }
        }
        if self.min_duration > self.max_duration {
            return Err(SonifyError::range(
                "min_duration",
                format!(
                    "min_duration {} exceeds max_duration {}",
                    self.min_duration, self.max_duration
                ),
            ));
        }

        if self.max_velocity > 127 {
            return Err(SonifyError::range(
                "max_velocity",
                format!("{} is not a MIDI velocity", self.max_velocity),
            ));
        }
        if self.min_velocity > self.max_velocity {
            return Err(SonifyError::range(
                "min_velocity",
                format!(
                    "min_velocity {} exceeds max_velocity {}",
                    self.min_velocity, self.max_velocity
                ),
            ));
        }

        if self.tempo < MIN_TEMPO_BPM {
            return Err(SonifyError::range(
                "tempo",
                format!(
                    "{} BPM is below the slowest MIDI tempo ({MIN_TEMPO_BPM} BPM)",
                    self.tempo
                ),
            ));
        }

        if let Some(bad) = self
            .slice_positions
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(SonifyError::range(
                "slice_positions",
                format!("{bad} is outside [0, 1]"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_field(params: &MappingParameters) -> &'static str {
        match params.validate() {
            Err(SonifyError::ParameterRange { name, .. }) => name,
            other => panic!("expected ParameterRange, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        MappingParameters::default().validate().unwrap();
    }

    #[test]
    fn test_inverted_pitch_range() {
        let params = MappingParameters {
            min_pitch: 90,
            max_pitch: 30,
            ..Default::default()
        };
        assert_eq!(rejected_field(&params), "min_pitch");

        let equal = MappingParameters {
            min_pitch: 60,
            max_pitch: 60,
            ..Default::default()
        };
        assert_eq!(rejected_field(&equal), "min_pitch");
    }

    #[test]
    fn test_pitch_above_midi_range() {
        let params = MappingParameters {
            max_pitch: 128,
            ..Default::default()
        };
        assert_eq!(rejected_field(&params), "max_pitch");
    }

    #[test]
    fn test_duration_checks() {
        let inverted = MappingParameters {
            min_duration: 4.0,
            max_duration: 1.0,
            ..Default::default()
        };
        assert_eq!(rejected_field(&inverted), "min_duration");

        let zero = MappingParameters {
            min_duration: 0.0,
            ..Default::default()
        };
        assert_eq!(rejected_field(&zero), "min_duration");

        let nan = MappingParameters {
            max_duration: f64::NAN,
            ..Default::default()
        };
        assert_eq!(rejected_field(&nan), "max_duration");
    }

    #[test]
    fn test_velocity_checks() {
        let inverted = MappingParameters {
            min_velocity: 100,
            max_velocity: 50,
            ..Default::default()
        };
        assert_eq!(rejected_field(&inverted), "min_velocity");

        // Equal bounds are a fixed velocity, not an inversion.
        let fixed = MappingParameters {
            min_velocity: 64,
            max_velocity: 64,
            ..Default::default()
        };
        fixed.validate().unwrap();
    }

    #[test]
    fn test_zero_tempo() {
        let params = MappingParameters {
            tempo: 0,
            ..Default::default()
        };
        assert_eq!(rejected_field(&params), "tempo");
    }

    #[test]
    fn test_tempo_below_midi_limit() {
        for tempo in [1, 3] {
            let params = MappingParameters {
                tempo,
                ..Default::default()
            };
            assert_eq!(rejected_field(&params), "tempo");
        }
        let slowest = MappingParameters {
            tempo: 4,
            ..Default::default()
        };
        slowest.validate().unwrap();
    }

    #[test]
    fn test_slice_positions_outside_unit_range() {
        let params = MappingParameters {
            slice_positions: [0.25, 1.5, 0.75],
            ..Default::default()
        };
        assert_eq!(rejected_field(&params), "slice_positions");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params = MappingParameters::from_json(r#"{"tempo": 90, "scale": "mixolydian"}"#).unwrap();
        assert_eq!(params.tempo, 90);
        assert_eq!(params.scale, Scale::Mixolydian);
        assert_eq!(params.min_pitch, 30);
        assert_eq!(params.slice_positions, [0.25, 0.50, 0.75]);
    }

    #[test]
    fn test_json_is_validated() {
        let err = MappingParameters::from_json(r#"{"min_pitch": 100}"#).unwrap_err();
        assert!(matches!(err, SonifyError::ParameterRange { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = MappingParameters::from_json("{ tempo: ").unwrap_err();
        assert!(matches!(err, SonifyError::Config(_)));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let params = MappingParameters {
            scale: Scale::Custom(vec![0, 3, 7, 10]),
            tempo: 72,
            ..Default::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        let restored: MappingParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(params, restored);
    }
}
