use std::fmt::Debug;

use num_traits::{Bounded, Num};

/// A sample type that normalized `f32` audio can be rendered into.
///
/// Implemented for the formats the WAV encoder and the output devices use.
pub trait AudioSample: Num + Copy + Send + Sync + PartialOrd + Bounded + Debug + 'static {
    fn silence() -> Self;

    /// Converts a normalized value, clamping it to `[-1.0, 1.0]` first.
    fn from_f32_normalized(value: f32) -> Self;
}

impl AudioSample for f32 {
    fn silence() -> Self {
        0.0
    }

    fn from_f32_normalized(value: f32) -> Self {
        value.clamp(-1.0, 1.0)
    }
}

/// Signed 16-bit PCM.
///
/// Negative values scale by 32768 and positive values by 32767, so both ends of
/// the signed range are reachable without overflow.
impl AudioSample for i16 {
    fn silence() -> Self {
        0
    }

    fn from_f32_normalized(value: f32) -> Self {
        let s = value.clamp(-1.0, 1.0);
        let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
        scaled.round() as i16
    }
}

impl AudioSample for u16 {
    fn silence() -> Self {
        32768
    }

    fn from_f32_normalized(value: f32) -> Self {
        (i16::from_f32_normalized(value) as i32 + 32768) as u16
    }
}
