//! Uniform bit-depth reduction.

use crate::audio::SampleBuffer;
use crate::pipeline::Node;

/// Beyond this depth `2^bits` no longer fits the `f64` mantissa and the
/// quantizer step is finer than any `f32` sample can resolve.
const MAX_EXACT_BITS: u32 = f64::MANTISSA_DIGITS;

/// Half the number of steps of a `bit_depth`-bit quantizer, `(2^bits - 1) / 2`.
pub fn quantizer_scale(bit_depth: u32) -> f64 {
    ((1u64 << bit_depth.min(MAX_EXACT_BITS)) as f64 - 1.0) / 2.0
}

/// Round `x` to the nearest integer, ties toward positive infinity.
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn quantize_scaled(sample: f32, scale: f64) -> f32 {
    (round_half_up(sample as f64 * scale) / scale) as f32
}

/// Snap `sample` to the nearest level of a uniform `bit_depth`-bit quantizer.
///
/// Levels are spaced `1 / scale` apart with `scale = (2^bits - 1) / 2`. No
/// clamping is done; out-of-range input maps to out-of-range levels. `bit_depth`
/// must be positive.
pub fn quantize(sample: f32, bit_depth: u32) -> f32 {
    debug_assert!(bit_depth > 0);
    if bit_depth >= MAX_EXACT_BITS {
        return sample;
    }
    quantize_scaled(sample, quantizer_scale(bit_depth))
}

/// Pipeline node applying [`quantize`] to every sample in place.
pub struct Quantizer {
    bit_depth: u32,
}

impl Quantizer {
    pub fn new(bit_depth: u32) -> Self {
        Self { bit_depth }
    }
}

impl Node for Quantizer {
    type Input = SampleBuffer;
    type Output = SampleBuffer;

    fn process(&self, mut input: Self::Input) -> Self::Output {
        if self.bit_depth >= MAX_EXACT_BITS {
            return input;
        }
        let scale = quantizer_scale(self.bit_depth);
        for channel in input.channels_mut() {
            for sample in channel.iter_mut() {
                *sample = quantize_scaled(*sample, scale);
            }
        }
        input
    }
}
