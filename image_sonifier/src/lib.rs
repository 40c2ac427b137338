// Image Sonifier
//
// Turns an image into a MIDI file by reading three horizontal lines of
// pixels (at 25%, 50% and 75% of the height by default) as three melodic
// lines. Per pixel, luminosity selects a pitch on a musical scale, the red
// channel sets the note length and the blue channel the velocity; a random
// rhythmic gap separates consecutive notes.
//
// Architecture:
// - error.rs: `SonifyError` and the `Result` alias
// - scale.rs: Scale definitions (major, mixolydian, custom offset lists)
// - mapping.rs: Scale quantizer and linear range mapping
// - pixels.rs: Pixel grid (decoder boundary) and row sampling
// - params.rs: Mapping parameters, defaults, JSON loading and validation
// - sonify.rs: Row note streams and the three-pass orchestration
// - midi.rs: MIDI file output from note sequences
// - render.rs: Single-file, in-memory and batch directory entry points
//
// Output is deterministic given a seeded random source.

pub mod error;
pub mod mapping;
pub mod midi;
pub mod params;
pub mod pixels;
pub mod render;
pub mod scale;
pub mod sonify;

pub use error::{InvalidInput, Result, SonifyError};
pub use params::MappingParameters;
pub use pixels::PixelGrid;
pub use scale::Scale;
pub use sonify::{NoteEvent, RandomSource, sonify};
