//! The offline signal-processing pipeline.
//!
//! - [`resampler`] - Linear-interpolation sample rate conversion
//! - [`quantizer`] - Uniform bit-depth reduction
//! - [`pitch`] - Semitone to playback-rate mapping
//! - [`params`] - Validated [`ProcessingParameters`]
//! - [`pipeline`] - Resampler followed by quantizer

pub mod params;
pub mod pitch;
pub mod pipeline;
pub mod quantizer;
pub mod resampler;
pub mod traits;

pub use params::{ParameterError, ProcessingParameters};
pub use pipeline::process;
pub use traits::Node;
