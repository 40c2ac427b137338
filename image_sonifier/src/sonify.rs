// Pixel rows to note events.
//
// Each sampled row becomes one melodic line: one note per column, left to
// right. Luminosity picks the pitch (via the scale quantizer), the red
// channel picks the duration and the blue channel the velocity. After each
// note the clock advances by the note's duration plus a rhythmic gap drawn
// from `DISPLACEMENTS`, so notes within a row never overlap and start times
// strictly increase.
//
// `sonify` runs three such passes (one per slice position), each starting
// at beat 0 on the same track and channel, and concatenates them in slice
// order. The passes are not time-merged; overlapping them is the MIDI
// writer's job.
//
// The only randomness is the gap draw, taken from a caller-supplied
// `RandomSource`. With a seeded `SonifierRng` the whole run is reproducible.

use crate::error::Result;
use crate::mapping::{map_linear, quantize_to_scale};
use crate::params::MappingParameters;
use crate::pixels::{PixelGrid, RowSampler};
use image_sonifier_prng::SonifierRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gaps between consecutive notes of a row, in beats (thirty-second,
/// sixteenth, eighth and dotted-eighth note lengths).
pub const DISPLACEMENTS: [f64; 4] = [0.125, 0.25, 0.5, 0.75];

/// A timed note. Times and durations are in quarter-note beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub track: u8,
    pub channel: u8,
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Source of uniform index draws for the displacement choice.
pub trait RandomSource {
    /// Uniform index in `[0, len)`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl RandomSource for SonifierRng {
    fn pick(&mut self, len: usize) -> usize {
        self.index(len)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

/// Lazy note stream for one sampled row. Yields exactly `width` events and
/// cannot be restarted.
pub struct RowNotes<'a, R> {
    row: RowSampler<'a>,
    params: &'a MappingParameters,
    rng: R,
    column: u32,
    current_time: f64,
}

impl<'a, R: RandomSource> RowNotes<'a, R> {
    pub fn new(row: RowSampler<'a>, params: &'a MappingParameters, rng: R) -> Self {
        debug!(row = row.row(), width = row.width(), "sonifying row");
        RowNotes {
            row,
            params,
            rng,
            column: 0,
            current_time: 0.0,
        }
    }

    fn note_at(&self, column: u32) -> Result<NoteEvent> {
        let p = self.params;
        let [r, g, b] = self.row.pixel(column);
        let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));

        let luminosity = (r + g + b) / 3.0;
        let pitch = quantize_to_scale(luminosity, 0.0, 255.0, p.min_pitch, p.max_pitch, &p.scale)?;
        let duration = map_linear(r, 0.0, 255.0, p.min_duration, p.max_duration)?;
        let velocity = map_linear(
            b,
            0.0,
            255.0,
            f64::from(p.min_velocity),
            f64::from(p.max_velocity),
        )?
        .round()
        .clamp(0.0, 127.0) as u8;

        Ok(NoteEvent {
            track: 0,
            channel: 0,
            pitch,
            start_time: self.current_time,
            duration,
            velocity,
        })
    }
}

impl<R: RandomSource> Iterator for RowNotes<'_, R> {
    type Item = Result<NoteEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.column >= self.row.width() {
            return None;
        }
        let note = match self.note_at(self.column) {
            Ok(note) => note,
            Err(e) => {
                // A failed column ends the stream.
                self.column = self.row.width();
                return Some(Err(e));
            }
        };
        self.column += 1;

        let gap = DISPLACEMENTS[self.rng.pick(DISPLACEMENTS.len())];
        self.current_time += note.duration + gap;
        Some(Ok(note))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.row.width() - self.column) as usize;
        (left, Some(left))
    }
}

/// Notes for the row at `fraction` of the grid height.
///
/// Parameters are validated before the row is sampled.
pub fn sonify_row<R: RandomSource>(
    grid: &PixelGrid,
    fraction: f64,
    params: &MappingParameters,
    rng: &mut R,
) -> Result<Vec<NoteEvent>> {
    params.validate()?;
    let row = grid.sample_row(fraction)?;
    RowNotes::new(row, params, rng).collect()
}

/// Notes for all three slice positions, concatenated in slice order.
///
/// Parameters are validated and every slice row resolved before the first
/// note is produced.
pub fn sonify<R: RandomSource>(
    grid: &PixelGrid,
    params: &MappingParameters,
    rng: &mut R,
) -> Result<Vec<NoteEvent>> {
    params.validate()?;
    let rows = params
        .slice_positions
        .iter()
        .map(|&fraction| grid.sample_row(fraction))
        .collect::<Result<Vec<_>>>()?;

    let mut notes = Vec::with_capacity(rows.len() * grid.width() as usize);
    for row in rows {
        for note in RowNotes::new(row, params, &mut *rng) {
            notes.push(note?);
        }
    }
    Ok(notes)
}
