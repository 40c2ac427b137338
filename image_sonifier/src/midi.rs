// MIDI output from note events.
//
// Converts a note sequence into a Standard MIDI File (SMF) for playback.
// Output is SMF Format 1: track 0 carries the tempo, track 1 carries every
// note. Beats map to ticks at `TICKS_PER_QUARTER`.
//
// The sonifier hands over three row passes that each start at beat 0, so
// notes overlap heavily and may repeat a pitch that is still sounding.
// Events are laid out on an absolute tick line, sorted (note-offs before
// note-ons at the same tick), and then de-interleaved per channel/pitch: a
// note-on for a pitch that is already sounding first closes it, and the
// earlier note's own note-off, now stale, is dropped.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::{Result, SonifyError};
use crate::sonify::NoteEvent;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;
use tracing::info;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 960;

/// Slowest tempo whose microseconds-per-quarter fits the 24-bit tempo
/// field (60_000_000 / 4 = 15_000_000).
pub const MIN_TEMPO_BPM: u16 = 4;

/// Largest delta-time a MIDI variable-length quantity can hold.
const MAX_DELTA: u32 = (1 << 28) - 1;

const TRACK_NAME: &[u8] = b"Sonified Image";

/// Encode notes as SMF bytes.
pub fn write_midi(notes: &[NoteEvent], tempo_bpm: u16) -> Result<Vec<u8>> {
    let smf = notes_to_smf(notes, tempo_bpm)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|e| SonifyError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Encode notes and write them to `path`.
pub fn write_midi_file(notes: &[NoteEvent], tempo_bpm: u16, path: &Path) -> Result<()> {
    let buf = write_midi(notes, tempo_bpm)?;
    std::fs::write(path, &buf)?;
    info!(path = %path.display(), notes = notes.len(), bytes = buf.len(), "wrote MIDI");
    Ok(())
}

/// Convert beats to ticks, rounding to the nearest tick.
fn beats_to_ticks(beats: f64) -> u64 {
    (beats * f64::from(TICKS_PER_QUARTER)).round().max(0.0) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeKind {
    // Declared first so offs sort ahead of ons at the same tick.
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Edge {
    tick: u64,
    kind: EdgeKind,
    channel: u8,
    pitch: u8,
    velocity: u8,
}

/// Flatten notes into sorted, de-interleaved on/off edges.
fn note_edges(notes: &[NoteEvent]) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let start = beats_to_ticks(note.start_time);
        // A note always lasts at least one tick.
        let end = beats_to_ticks(note.end_time()).max(start + 1);
        let channel = note.channel & 0x0F;
        let pitch = note.pitch & 0x7F;
        edges.push(Edge {
            tick: start,
            kind: EdgeKind::On,
            channel,
            pitch,
            velocity: note.velocity & 0x7F,
        });
        edges.push(Edge {
            tick: end,
            kind: EdgeKind::Off,
            channel,
            pitch,
            velocity: 0,
        });
    }
    edges.sort();

    let mut sounding = vec![0u32; 16 * 128];
    let mut out = Vec::with_capacity(edges.len());
    for edge in edges {
        let slot = &mut sounding[edge.channel as usize * 128 + edge.pitch as usize];
        match edge.kind {
            EdgeKind::On => {
                if *slot > 0 {
                    out.push(Edge {
                        kind: EdgeKind::Off,
                        velocity: 0,
                        ..edge
                    });
                }
                *slot += 1;
                out.push(edge);
            }
            EdgeKind::Off => {
                *slot = slot.saturating_sub(1);
                if *slot == 0 {
                    out.push(edge);
                }
            }
        }
    }
    out
}

/// Convert notes to an in-memory SMF.
fn notes_to_smf(notes: &[NoteEvent], tempo_bpm: u16) -> Result<Smf<'static>> {
    if tempo_bpm < MIN_TEMPO_BPM {
        return Err(SonifyError::range(
            "tempo",
            format!("{tempo_bpm} BPM is below the slowest MIDI tempo ({MIN_TEMPO_BPM} BPM)"),
        ));
    }
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Track<'static> = Vec::new();
    let tempo_microseconds = 60_000_000 / u32::from(tempo_bpm);
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    // Track 1: every note
    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(TRACK_NAME)),
    });

    let mut last_tick: u64 = 0;
    for edge in note_edges(notes) {
        let delta = u32::try_from(edge.tick - last_tick)
            .ok()
            .filter(|&d| d <= MAX_DELTA)
            .ok_or_else(|| {
                SonifyError::Encode(format!(
                    "gap of {} ticks before tick {} exceeds the MIDI delta limit",
                    edge.tick - last_tick,
                    edge.tick
                ))
            })?;
        let key = u7::new(edge.pitch);
        let vel = u7::new(edge.velocity);
        let message = match edge.kind {
            EdgeKind::On => MidiMessage::NoteOn { key, vel },
            EdgeKind::Off => MidiMessage::NoteOff { key, vel },
        };
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(edge.channel),
                message,
            },
        });
        last_tick = edge.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    Ok(smf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start: f64, duration: f64) -> NoteEvent {
        NoteEvent {
            track: 0,
            channel: 0,
            pitch,
            start_time: start,
            duration,
            velocity: 100,
        }
    }

    /// (absolute tick, is_on, pitch) for every note event in track 1.
    fn note_timeline(smf: &Smf) -> Vec<(u32, bool, u8)> {
        let mut tick = 0;
        let mut out = Vec::new();
        for event in &smf.tracks[1] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = event.kind {
                match message {
                    MidiMessage::NoteOn { key, .. } => out.push((tick, true, key.as_int())),
                    MidiMessage::NoteOff { key, .. } => out.push((tick, false, key.as_int())),
                    _ => {}
                }
            }
        }
        out
    }

    #[test]
    fn test_tempo_and_track_layout() {
        let bytes = write_midi(&[note(60, 0.0, 1.0)], 116).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
        // 60_000_000 / 116
        let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        assert_eq!(tempo, Some(517_241));
    }

    #[test]
    fn test_beats_become_ticks() {
        let smf = notes_to_smf(&[note(60, 0.0, 0.8), note(62, 0.925, 1.5)], 120).unwrap();
        assert_eq!(
            note_timeline(&smf),
            vec![(0, true, 60), (768, false, 60), (888, true, 62), (2328, false, 62)]
        );
    }

    #[test]
    fn test_overlapping_rows_sorted_by_time() {
        // Two passes starting at beat 0 with different pitches.
        let notes = [note(60, 0.0, 2.0), note(60, 2.5, 1.0), note(67, 0.0, 1.0), note(67, 1.5, 1.0)];
        let smf = notes_to_smf(&notes, 120).unwrap();
        let timeline = note_timeline(&smf);
        assert!(timeline.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(timeline.iter().filter(|e| e.1).count(), 4);
        assert_eq!(timeline.iter().filter(|e| !e.1).count(), 4);
    }

    #[test]
    fn test_same_pitch_overlap_deinterleaved() {
        // Second note starts while the first still sounds.
        let smf = notes_to_smf(&[note(64, 0.0, 2.0), note(64, 1.0, 2.0)], 120).unwrap();
        assert_eq!(
            note_timeline(&smf),
            vec![(0, true, 64), (960, false, 64), (960, true, 64), (2880, false, 64)]
        );
    }

    #[test]
    fn test_off_precedes_on_at_same_tick() {
        let smf = notes_to_smf(&[note(64, 1.0, 1.0), note(64, 0.0, 1.0)], 120).unwrap();
        assert_eq!(
            note_timeline(&smf),
            vec![(0, true, 64), (960, false, 64), (960, true, 64), (1920, false, 64)]
        );
    }

    #[test]
    fn test_empty_sequence_is_still_a_file() {
        let bytes = write_midi(&[], 116).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);
        assert!(note_timeline(&smf).is_empty());
    }

    fn tempo_of(bytes: &[u8]) -> Option<u32> {
        let smf = Smf::parse(bytes).unwrap();
        smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        })
    }

    #[test]
    fn test_zero_tempo_rejected() {
        assert!(matches!(
            write_midi(&[note(60, 0.0, 1.0)], 0),
            Err(SonifyError::ParameterRange { .. })
        ));
    }

    #[test]
    fn test_tempo_too_slow_for_tempo_field_rejected() {
        // 60_000_000 / 3 needs 25 bits.
        for bpm in 1..MIN_TEMPO_BPM {
            assert!(matches!(
                write_midi(&[note(60, 0.0, 1.0)], bpm),
                Err(SonifyError::ParameterRange { name: "tempo", .. })
            ));
        }
    }

    #[test]
    fn test_slowest_and_fastest_tempo_written_exactly() {
        let slow = write_midi(&[note(60, 0.0, 1.0)], MIN_TEMPO_BPM).unwrap();
        assert_eq!(tempo_of(&slow), Some(15_000_000));
        let fast = write_midi(&[note(60, 0.0, 1.0)], u16::MAX).unwrap();
        assert_eq!(tempo_of(&fast), Some(60_000_000 / 65_535));
    }
}
