//! Sampler state.
//!
//! - [`Sampler`] - Owns the loaded file, its immutable original buffer, the
//!   current parameters and the derived modified buffer
//! - [`BufferInfo`] - Metadata handed to whatever presents the loaded file
//! - [`SamplerConfig`] - Defaults loaded from a JSON config file

pub mod config;

pub use config::SamplerConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::audio::wav::{self, WavError};
use crate::audio::{DecodeError, DecodeResult, SampleBuffer};
use crate::pipeline::{ParameterError, ProcessingParameters, process};

/// Display metadata for a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferInfo {
    pub file_name: String,
    pub channels: usize,
    pub len: usize,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

impl BufferInfo {
    fn new(file_name: &str, buffer: &SampleBuffer) -> Self {
        Self {
            file_name: file_name.to_string(),
            channels: buffer.num_channels(),
            len: buffer.len(),
            sample_rate: buffer.sample_rate(),
            duration_secs: buffer.duration_secs(),
        }
    }
}

/// A successfully loaded file.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    file_name: String,
    original: Arc<SampleBuffer>,
    modified: Arc<SampleBuffer>,
}

#[derive(Debug, Clone, Default)]
pub enum SamplerState {
    #[default]
    Empty,
    Loaded(LoadedFile),
}

/// The editing session.
///
/// Every parameter change recomputes the modified buffer from the original;
/// results are never layered on a previous pass. Operations that need a
/// loaded file return `None` while the sampler is empty.
#[derive(Debug, Default)]
pub struct Sampler {
    state: SamplerState,
    params: ProcessingParameters,
    defaults: ProcessingParameters,
}

impl Sampler {
    pub fn new(defaults: ProcessingParameters) -> Self {
        Self {
            state: SamplerState::Empty,
            params: defaults,
            defaults,
        }
    }

    /// Take the outcome of a decode request.
    ///
    /// On success the parameters reset to the defaults and the modified buffer
    /// is computed from them. On failure everything is dropped and the sampler
    /// is empty again.
    pub fn load(&mut self, result: DecodeResult) -> Result<BufferInfo, DecodeError> {
        match result {
            Ok(decoded) => {
                info!(
                    "Loaded {}: {} channels, {} samples at {} Hz",
                    decoded.file_name,
                    decoded.buffer.num_channels(),
                    decoded.buffer.len(),
                    decoded.buffer.sample_rate()
                );
                let original = Arc::new(decoded.buffer);
                self.params = self.defaults;
                let modified = Arc::new(process(&original, &self.params));
                let info = BufferInfo::new(&decoded.file_name, &modified);
                self.state = SamplerState::Loaded(LoadedFile {
                    file_name: decoded.file_name,
                    original,
                    modified,
                });
                Ok(info)
            }
            Err(e) => {
                warn!("Error decoding file: {}", e);
                self.state = SamplerState::Empty;
                self.params = self.defaults;
                Err(e)
            }
        }
    }

    pub fn parameters(&self) -> ProcessingParameters {
        self.params
    }

    /// Playback speed multiplier for the current pitch.
    pub fn playback_rate(&self) -> f64 {
        self.params.playback_rate()
    }

    /// Replace the parameters and recompute the modified buffer.
    ///
    /// Returns the new modified buffer, or `None` if nothing is loaded.
    pub fn set_parameters(&mut self, params: ProcessingParameters) -> Option<Arc<SampleBuffer>> {
        let SamplerState::Loaded(file) = &mut self.state else {
            debug!("No file loaded, ignoring parameter change");
            return None;
        };
        self.params = params;
        let modified = Arc::new(process(&file.original, &params));
        debug!(
            "Reprocessed {} at {} Hz / {} bit: {} samples",
            file.file_name,
            params.target_sample_rate(),
            params.bit_depth(),
            modified.len()
        );
        file.modified = modified.clone();
        Some(modified)
    }

    pub fn set_sample_rate(
        &mut self,
        target_sample_rate: u32,
    ) -> Result<Option<Arc<SampleBuffer>>, ParameterError> {
        let params = self.params.with_sample_rate(target_sample_rate)?;
        Ok(self.set_parameters(params))
    }

    pub fn set_bit_depth(
        &mut self,
        bit_depth: u32,
    ) -> Result<Option<Arc<SampleBuffer>>, ParameterError> {
        let params = self.params.with_bit_depth(bit_depth)?;
        Ok(self.set_parameters(params))
    }

    pub fn set_pitch(
        &mut self,
        pitch_semitones: f64,
    ) -> Result<Option<Arc<SampleBuffer>>, ParameterError> {
        let params = self.params.with_pitch(pitch_semitones)?;
        Ok(self.set_parameters(params))
    }

    /// The current modified buffer. Later parameter changes replace it rather
    /// than mutate it, so a held snapshot stays consistent.
    pub fn snapshot(&self) -> Option<Arc<SampleBuffer>> {
        match &self.state {
            SamplerState::Loaded(file) => Some(file.modified.clone()),
            SamplerState::Empty => None,
        }
    }

    pub fn original(&self) -> Option<Arc<SampleBuffer>> {
        match &self.state {
            SamplerState::Loaded(file) => Some(file.original.clone()),
            SamplerState::Empty => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.state {
            SamplerState::Loaded(file) => Some(&file.file_name),
            SamplerState::Empty => None,
        }
    }

    /// Metadata of the modified buffer.
    pub fn info(&self) -> Option<BufferInfo> {
        match &self.state {
            SamplerState::Loaded(file) => Some(BufferInfo::new(&file.file_name, &file.modified)),
            SamplerState::Empty => None,
        }
    }

    /// `{name}[{rate}Hz, {bits}bit, {factor}ST].wav`
    pub fn export_file_name(&self) -> Option<String> {
        self.file_name()
            .map(|name| export_file_name(name, &self.params))
    }

    /// Encode the modified buffer as WAV bytes.
    pub fn export(&self) -> Result<Option<Vec<u8>>, WavError> {
        self.snapshot()
            .map(|buffer| wav::encode(&buffer))
            .transpose()
    }

    /// Write the modified buffer to disk.
    ///
    /// If `target` is an existing directory, or ends with a path separator, the
    /// default export name is used inside it. A missing directory is created.
    /// Returns the written path, or `None` if nothing is loaded.
    pub fn export_to(&self, target: &Path) -> Result<Option<PathBuf>> {
        let (Some(bytes), Some(name)) = (self.export()?, self.export_file_name()) else {
            debug!("No file loaded, nothing to export");
            return Ok(None);
        };
        let path = if target.is_dir() {
            target.join(name)
        } else if names_directory(target) {
            fs::create_dir_all(target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            target.join(name)
        } else {
            target.to_path_buf()
        };
        fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Exported {} bytes to {}", bytes.len(), path.display());
        Ok(Some(path))
    }
}

fn names_directory(target: &Path) -> bool {
    target
        .as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator)
}

/// Name an export after its source file and the parameters it was made with.
///
/// The pitch field holds the playback-rate multiplier, not the semitone offset.
pub fn export_file_name(file_name: &str, params: &ProcessingParameters) -> String {
    format!(
        "{}[{}Hz, {}bit, {}ST].wav",
        file_name,
        params.target_sample_rate(),
        params.bit_depth(),
        params.playback_rate()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::file::DecodedFile;
    use approx::assert_relative_eq;

    fn decoded(samples: Vec<f32>, rate: u32) -> DecodeResult {
        Ok(DecodedFile {
            file_name: "clip.mp3".to_string(),
            buffer: SampleBuffer::new(vec![samples], rate).unwrap(),
        })
    }

    fn loaded() -> Sampler {
        let mut sampler = Sampler::default();
        let samples = (0..1000).map(|i| ((i as f32) * 0.01).sin()).collect();
        sampler.load(decoded(samples, 48000)).unwrap();
        sampler
    }

    #[test]
    fn test_load_applies_defaults() {
        let sampler = loaded();
        let info = sampler.info().unwrap();

        assert_eq!(info.file_name, "clip.mp3");
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.len, (1000.0f64 * 44100.0 / 48000.0).round() as usize);
        assert_eq!(sampler.original().unwrap().sample_rate(), 48000);
    }

    #[test]
    fn test_set_parameters_is_idempotent() {
        let mut sampler = loaded();
        let params = ProcessingParameters::new(22050, 5, 3.0).unwrap();

        let first = sampler.set_parameters(params).unwrap();
        let second = sampler.set_parameters(params).unwrap();

        assert_eq!(*first, *second);
    }

    #[test]
    fn test_result_does_not_depend_on_history() {
        let mut sampler = loaded();
        let target = ProcessingParameters::new(16000, 6, 0.0).unwrap();
        let direct = sampler.set_parameters(target).unwrap();

        sampler.set_sample_rate(8000).unwrap();
        sampler.set_bit_depth(2).unwrap();
        sampler.set_sample_rate(96000).unwrap();
        let after_edits = sampler.set_parameters(target).unwrap();

        assert_eq!(*direct, *after_edits);
    }

    #[test]
    fn test_snapshot_survives_replacement() {
        let mut sampler = loaded();
        let before = sampler.snapshot().unwrap();
        let before_copy = (*before).clone();

        sampler.set_sample_rate(8000).unwrap();

        assert_eq!(*before, before_copy);
        assert_eq!(sampler.snapshot().unwrap().sample_rate(), 8000);
    }

    #[test]
    fn test_original_is_never_modified() {
        let mut sampler = loaded();
        let original = sampler.original().unwrap();
        let copy = (*original).clone();

        sampler.set_bit_depth(1).unwrap();
        sampler.set_sample_rate(4000).unwrap();

        assert_eq!(*sampler.original().unwrap(), copy);
        assert!(Arc::ptr_eq(&original, &sampler.original().unwrap()));
    }

    #[test]
    fn test_empty_state_is_a_no_op() {
        let mut sampler = Sampler::default();

        assert!(sampler.set_parameters(ProcessingParameters::default()).is_none());
        assert!(sampler.set_sample_rate(8000).unwrap().is_none());
        assert!(sampler.snapshot().is_none());
        assert!(sampler.export().unwrap().is_none());
        assert!(sampler.export_file_name().is_none());
        assert!(sampler.file_name().is_none());
        assert_eq!(sampler.parameters(), ProcessingParameters::default());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let mut sampler = loaded();
        let before = sampler.snapshot().unwrap();

        assert_eq!(sampler.set_sample_rate(0), Err(ParameterError::ZeroSampleRate));
        assert_eq!(sampler.set_bit_depth(0), Err(ParameterError::ZeroBitDepth));
        assert!(Arc::ptr_eq(&before, &sampler.snapshot().unwrap()));
    }

    #[test]
    fn test_decode_failure_resets_to_empty() {
        let mut sampler = loaded();
        sampler.set_bit_depth(4).unwrap();

        let result = sampler.load(Err(DecodeError::NoTrack));

        assert!(result.is_err());
        assert!(sampler.file_name().is_none());
        assert!(sampler.snapshot().is_none());
        assert!(sampler.original().is_none());
        assert_eq!(sampler.parameters(), ProcessingParameters::default());
    }

    #[test]
    fn test_new_file_resets_parameters() {
        let mut sampler = loaded();
        sampler.set_bit_depth(3).unwrap();
        sampler.set_pitch(-12.0).unwrap();

        sampler.load(decoded(vec![0.0; 10], 8000)).unwrap();

        assert_eq!(sampler.parameters(), ProcessingParameters::default());
        assert_eq!(sampler.playback_rate(), 1.0);
    }

    #[test]
    fn test_pitch_changes_playback_rate_only() {
        let mut sampler = loaded();
        let before = sampler.snapshot().unwrap();

        let after = sampler.set_pitch(12.0).unwrap().unwrap();

        assert_relative_eq!(sampler.playback_rate(), 2.0);
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_export_file_name() {
        let mut sampler = loaded();
        assert_eq!(
            sampler.export_file_name().unwrap(),
            "clip.mp3[44100Hz, 16bit, 1ST].wav"
        );

        sampler
            .set_parameters(ProcessingParameters::new(8000, 4, -12.0).unwrap())
            .unwrap();
        assert_eq!(
            sampler.export_file_name().unwrap(),
            "clip.mp3[8000Hz, 4bit, 0.5ST].wav"
        );
    }

    #[test]
    fn test_end_to_end_mono_upsample() {
        let mut sampler = Sampler::default();
        sampler.load(decoded(vec![0.0, 0.5, -0.5, 1.0], 8000)).unwrap();

        let modified = sampler
            .set_parameters(ProcessingParameters::new(16000, 8, 0.0).unwrap())
            .unwrap();

        assert_eq!(modified.len(), 8);
        assert_eq!(modified.channel(0)[0], 0.0);
        // 1.0 * 127.5 rounds up to 128
        assert_relative_eq!(modified.channel(0)[7], (128.0 / 127.5) as f32);
        assert_relative_eq!(modified.channel(0)[6], modified.channel(0)[7]);

        let bytes = sampler.export().unwrap().unwrap();
        assert_eq!(bytes.len(), 44 + 2 * 16);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 16000);
        // the last frame clamps to full scale in both channels
        assert_eq!(&bytes[bytes.len() - 4..], &[0xff, 0x7f, 0xff, 0x7f]);
    }

    #[test]
    fn test_export_to_directory() {
        let sampler = loaded();
        let dir = tempfile::tempdir().unwrap();

        let path = sampler.export_to(dir.path()).unwrap().unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "clip.mp3[44100Hz, 16bit, 1ST].wav"
        );
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.len() as usize, 2 * sampler.info().unwrap().len);
    }

    #[test]
    fn test_export_to_new_directory() {
        let sampler = loaded();
        let dir = tempfile::tempdir().unwrap();
        let target = format!("{}/renders/", dir.path().display());

        let path = sampler.export_to(Path::new(&target)).unwrap().unwrap();

        assert!(dir.path().join("renders").is_dir());
        assert_eq!(path.parent().unwrap(), dir.path().join("renders"));
        assert!(hound::WavReader::open(&path).is_ok());
    }

    #[test]
    fn test_export_to_file_path() {
        let sampler = loaded();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("take1.wav");

        let path = sampler.export_to(&target).unwrap().unwrap();

        assert_eq!(path, target);
        assert!(target.is_file());
    }

    #[test]
    fn test_export_to_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Sampler::default().export_to(dir.path()).unwrap().is_none());
    }
}
