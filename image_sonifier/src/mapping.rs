// Numeric mappings from pixel channel values to musical parameters.
//
// `map_linear` is a plain affine rescale used for note duration (red
// channel) and velocity (blue channel). `quantize_to_scale` turns luminosity
// into a pitch: the input range is cut into equal-width buckets, one per
// scale degree per octave between the pitch bounds, and each bucket maps to
// the next scale degree in ascending order. The result is clamped to the
// pitch bounds.
//
// The normalized position `t` is deliberately NOT clamped to [0, 1]. Input
// outside `[min_in, max_in]` yields slots below zero or past the last
// octave; euclidean division keeps the scale index valid and the final clamp
// restores the pitch bounds. Tests below pin that behavior.

use crate::error::{InvalidInput, Result, SonifyError};
use crate::scale::Scale;

/// Affine map of `value` from `[min_in, max_in]` onto `[min_out, max_out]`.
/// No clamping.
pub fn map_linear(
    value: f64,
    min_in: f64,
    max_in: f64,
    min_out: f64,
    max_out: f64,
) -> Result<f64> {
    if min_in == max_in {
        return Err(InvalidInput::DivisionUndefined { bound: min_in }.into());
    }
    Ok(min_out + (value - min_in) * (max_out - min_out) / (max_in - min_in))
}

/// Map `value` in `[min_in, max_in]` to a MIDI pitch on `scale`, within
/// `[min_pitch, max_pitch]`.
///
/// Rejects an inverted pitch range and an unusable scale before mapping.
pub fn quantize_to_scale(
    value: f64,
    min_in: f64,
    max_in: f64,
    min_pitch: u8,
    max_pitch: u8,
    scale: &Scale,
) -> Result<u8> {
    if min_pitch >= max_pitch {
        return Err(SonifyError::range(
            "min_pitch",
            format!("min_pitch {min_pitch} must be below max_pitch {max_pitch}"),
        ));
    }
    scale.validate()?;
    if min_in == max_in {
        return Err(InvalidInput::DivisionUndefined { bound: min_in }.into());
    }
    let degrees = scale.intervals();
    let scale_len = degrees.len() as i64;

    let t = (value - min_in) / (max_in - min_in);

    let min_oct = i64::from(min_pitch / 12);
    let max_oct = i64::from(max_pitch / 12);
    let total_slots = (max_oct - min_oct + 1) * scale_len;

    // `as` saturates, so huge or non-finite positions land on the clamp.
    let slot = (t * total_slots as f64).floor() as i64;
    let octave_offset = slot.div_euclid(scale_len);
    let scale_index = slot.rem_euclid(scale_len) as usize;

    let raw = min_oct
        .saturating_add(octave_offset)
        .saturating_mul(12)
        .saturating_add(i64::from(degrees[scale_index]));

    Ok(raw.clamp(i64::from(min_pitch), i64::from(max_pitch)) as u8)
}
