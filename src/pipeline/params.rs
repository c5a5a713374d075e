//! Validated processing parameters.

use thiserror::Error;

use super::pitch::to_playback_rate;

/// CD quality.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_BIT_DEPTH: u32 = 16;
pub const DEFAULT_PITCH_SEMITONES: f64 = 0.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("target sample rate must be positive")]
    ZeroSampleRate,
    #[error("bit depth must be positive")]
    ZeroBitDepth,
    #[error("pitch offset must be a finite number of semitones, got {0}")]
    NonFinitePitch(f64),
}

/// An immutable snapshot of everything a reprocessing pass depends on.
///
/// Construction validates every field, so code holding a
/// `ProcessingParameters` never sees a zero rate or bit depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingParameters {
    target_sample_rate: u32,
    bit_depth: u32,
    pitch_semitones: f64,
}

impl ProcessingParameters {
    pub fn new(
        target_sample_rate: u32,
        bit_depth: u32,
        pitch_semitones: f64,
    ) -> Result<Self, ParameterError> {
        Self::default()
            .with_sample_rate(target_sample_rate)?
            .with_bit_depth(bit_depth)?
            .with_pitch(pitch_semitones)
    }

    pub fn with_sample_rate(self, target_sample_rate: u32) -> Result<Self, ParameterError> {
        if target_sample_rate == 0 {
            return Err(ParameterError::ZeroSampleRate);
        }
        Ok(Self {
            target_sample_rate,
            ..self
        })
    }

    pub fn with_bit_depth(self, bit_depth: u32) -> Result<Self, ParameterError> {
        if bit_depth == 0 {
            return Err(ParameterError::ZeroBitDepth);
        }
        Ok(Self { bit_depth, ..self })
    }

    pub fn with_pitch(self, pitch_semitones: f64) -> Result<Self, ParameterError> {
        if !pitch_semitones.is_finite() {
            return Err(ParameterError::NonFinitePitch(pitch_semitones));
        }
        Ok(Self {
            pitch_semitones,
            ..self
        })
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth
    }

    pub fn pitch_semitones(&self) -> f64 {
        self.pitch_semitones
    }

    /// Playback speed multiplier for the current pitch offset.
    pub fn playback_rate(&self) -> f64 {
        to_playback_rate(self.pitch_semitones)
    }
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
            pitch_semitones: DEFAULT_PITCH_SEMITONES,
        }
    }
}
