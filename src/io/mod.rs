//! Hardware and thread I/O.
//!
//! - [`AudioOutput`] - Speaker playback via cpal
//! - [`DecodeRequest`] - File decoding on a worker thread

pub mod audio;
pub mod decode;

pub use audio::{AudioOutput, output_device_names};
pub use decode::DecodeRequest;
