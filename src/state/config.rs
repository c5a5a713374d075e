//! Sampler configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::pipeline::params::{
    DEFAULT_BIT_DEPTH, DEFAULT_PITCH_SEMITONES, DEFAULT_SAMPLE_RATE, ParameterError,
    ProcessingParameters,
};

/// Startup defaults, optionally read from a JSON file.
///
/// Missing fields fall back to CD quality, no pitch offset and full volume.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    pub target_sample_rate: u32,
    pub bit_depth: u32,
    pub pitch_semitones: f64,
    pub volume: f32,
    /// Substring of the output device name; the default device when unset.
    pub output_device: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
            pitch_semitones: DEFAULT_PITCH_SEMITONES,
            volume: 1.0,
            output_device: None,
            output_dir: None,
        }
    }
}

impl SamplerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.parameters()?;
        if !(0.0..=1.0).contains(&config.volume) {
            anyhow::bail!("Volume must be between 0.0 and 1.0, got {}", config.volume);
        }
        Ok(config)
    }

    pub fn parameters(&self) -> Result<ProcessingParameters, ParameterError> {
        ProcessingParameters::new(self.target_sample_rate, self.bit_depth, self.pitch_semitones)
    }
}
