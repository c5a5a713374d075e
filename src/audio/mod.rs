//! Audio data types, file decoding and WAV encoding.
//!
//! # Data Types
//! - [`AudioSample`] - Trait for sample formats normalized audio is rendered into (f32, i16, u16)
//! - [`SampleBuffer`] - Planar multi-channel `f32` audio with a sample rate
//!
//! # Sources
//! - [`file`] - Audio file decoding with symphonia
//!
//! # Sinks
//! - [`wav`] - Canonical 16-bit stereo PCM WAV encoding
//! - [`waveform`] - Min/max peaks for waveform display

pub mod buffer;
pub mod file;
pub mod sample;
pub mod symphonia_compat;
pub mod waveform;
pub mod wav;

pub use buffer::SampleBuffer;
pub use file::{DecodeError, DecodeResult};
pub use sample::AudioSample;
pub use waveform::waveform_peaks;
