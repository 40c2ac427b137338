// File-level entry points: decode, sonify, encode.
//
// These wire the decoder (`PixelGrid`), the sonifier and the MIDI writer
// together for single images, in-memory buffers and whole directories.
// Errors from any stage propagate unchanged; nothing is retried.
//
// Batch mode looks only at regular files directly inside the input
// directory (no recursion) and visits them in file-name order, so a seeded
// run over the same directory always produces the same MIDI files.

use crate::error::Result;
use crate::midi::{write_midi, write_midi_file};
use crate::params::MappingParameters;
use crate::pixels::PixelGrid;
use crate::sonify::{RandomSource, sonify};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions batch mode treats as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Output name for an image: `photo.png` -> `sonified_photo.png.mid`.
pub fn midi_file_name(image_file_name: &str) -> String {
    format!("sonified_{image_file_name}.mid")
}

/// True if the path carries one of `IMAGE_EXTENSIONS`.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Sonify an encoded image held in memory; returns SMF bytes.
pub fn sonify_image_bytes<R: RandomSource>(
    bytes: &[u8],
    params: &MappingParameters,
    rng: &mut R,
) -> Result<Vec<u8>> {
    let grid = PixelGrid::decode(bytes)?;
    let notes = sonify(&grid, params, rng)?;
    write_midi(&notes, params.tempo)
}

/// Sonify the image at `input` and write a MIDI file to `output`.
pub fn sonify_image_file<R: RandomSource>(
    input: &Path,
    output: &Path,
    params: &MappingParameters,
    rng: &mut R,
) -> Result<()> {
    let grid = PixelGrid::open(input)?;
    debug!(
        path = %input.display(),
        width = grid.width(),
        height = grid.height(),
        "decoded image"
    );
    let notes = sonify(&grid, params, rng)?;
    write_midi_file(&notes, params.tempo, output)
}

/// Outcome of a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// `(image, midi)` pairs, in processing order.
    pub written: Vec<(PathBuf, PathBuf)>,
    /// Files present in the input directory that were not images.
    pub skipped: Vec<PathBuf>,
}

/// Sonify every image directly inside `input_dir` into `output_dir`,
/// creating `output_dir` if needed.
pub fn batch_process_images<R: RandomSource>(
    input_dir: &Path,
    output_dir: &Path,
    params: &MappingParameters,
    rng: &mut R,
) -> Result<BatchReport> {
    params.validate()?;
    std::fs::create_dir_all(output_dir)?;

    let mut report = BatchReport::default();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_supported_image(path) {
            debug!(path = %path.display(), "skipping non-image file");
            report.skipped.push(path.to_path_buf());
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let output = output_dir.join(midi_file_name(&name));
        sonify_image_file(path, &output, params, rng)?;
        report.written.push((path.to_path_buf(), output));
    }

    if report.written.is_empty() {
        warn!(dir = %input_dir.display(), "no supported images found");
    } else {
        info!(
            count = report.written.len(),
            dir = %output_dir.display(),
            "batch complete"
        );
    }
    Ok(report)
}
