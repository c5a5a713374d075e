//! Semitone offsets to playback-rate multipliers.

pub const SEMITONES_PER_OCTAVE: f64 = 12.0;

/// Playback speed multiplier for a pitch offset in semitones, `2^(semitones / 12)`.
///
/// This only parameterizes playback speed; sample data is never pitch-shifted.
pub fn to_playback_rate(semitones: f64) -> f64 {
    2f64.powf(semitones / SEMITONES_PER_OCTAVE)
}
