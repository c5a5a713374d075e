//! Linear-interpolation sample rate conversion.

use std::sync::Arc;

use crate::audio::SampleBuffer;
use crate::pipeline::Node;

/// Resample every channel of `buffer` to `target_rate`.
///
/// Output index `i` reads source position `i / ratio` and interpolates between
/// the two neighbouring source samples. The right neighbour is clamped to the
/// last sample, so the tail flattens instead of reading past the end. Up- and
/// down-sampling use the same formula.
///
/// `target_rate` must be positive. A result length that rounds to zero gives an
/// empty buffer with the original channel count.
pub fn resample(buffer: &SampleBuffer, target_rate: u32) -> SampleBuffer {
    debug_assert!(target_rate > 0);

    let len = buffer.len();
    let ratio = target_rate as f64 / buffer.sample_rate() as f64;
    let new_len = (len as f64 * ratio).round() as usize;

    if len == 0 || new_len == 0 {
        return SampleBuffer::from_parts(vec![Vec::new(); buffer.num_channels()], target_rate);
    }

    let last = len - 1;
    let channels = buffer
        .channels()
        .iter()
        .map(|src| {
            (0..new_len)
                .map(|i| {
                    let pos = i as f64 / ratio;
                    let idx0 = (pos.floor() as usize).min(last);
                    let idx1 = (idx0 + 1).min(last);
                    let s0 = src[idx0] as f64;
                    let s1 = src[idx1] as f64;
                    (s0 + (s1 - s0) * (pos - idx0 as f64)) as f32
                })
                .collect()
        })
        .collect();

    SampleBuffer::from_parts(channels, target_rate)
}

/// Pipeline node wrapping [`resample`].
///
/// Takes the shared original buffer and returns a new one, so the original is
/// never touched.
pub struct Resampler {
    target_rate: u32,
}

impl Resampler {
    pub fn new(target_rate: u32) -> Self {
        Self { target_rate }
    }
}

impl Node for Resampler {
    type Input = Arc<SampleBuffer>;
    type Output = SampleBuffer;

    fn process(&self, input: Self::Input) -> Self::Output {
        resample(&input, self.target_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mono(samples: Vec<f32>, rate: u32) -> SampleBuffer {
        SampleBuffer::new(vec![samples], rate).unwrap()
    }

    #[test]
    fn test_same_rate_is_identity() {
        let buffer = SampleBuffer::new(
            vec![vec![0.0, 0.3, -0.7, 1.0, 0.25], vec![0.1, 0.2, 0.3, 0.4, 0.5]],
            44100,
        )
        .unwrap();

        let out = resample(&buffer, 44100);

        assert_eq!(out, buffer);
    }

    #[test]
    fn test_upsample_length_and_values() {
        let out = resample(&mono(vec![0.0, 0.5, -0.5, 1.0], 8000), 16000);

        assert_eq!(out.sample_rate(), 16000);
        assert_eq!(out.len(), 8);
        let expected = [0.0, 0.25, 0.5, 0.0, -0.5, 0.25, 1.0, 1.0];
        for (got, exp) in out.channel(0).iter().zip(expected) {
            assert_relative_eq!(*got, exp, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_double_rate_doubles_length() {
        for len in [1usize, 7, 100, 441] {
            let out = resample(&mono(vec![0.1; len], 22050), 44100);
            assert_eq!(out.len(), ((2 * len) as f64).round() as usize);
        }
    }

    #[test]
    fn test_downsample_picks_every_other_sample() {
        let out = resample(&mono(vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5], 48000), 24000);

        assert_eq!(out.len(), 3);
        assert_relative_eq!(out.channel(0)[0], 0.0);
        assert_relative_eq!(out.channel(0)[1], 0.2);
        assert_relative_eq!(out.channel(0)[2], 0.4);
    }

    #[test]
    fn test_non_integer_ratio() {
        let out = resample(&mono(vec![0.0, 1.0, 0.0], 3), 4);

        // round(3 * 4/3) = 4; positions 0, 0.75, 1.5, 2.25
        assert_eq!(out.len(), 4);
        let expected = [0.0, 0.75, 0.5, 0.0];
        for (got, exp) in out.channel(0).iter().zip(expected) {
            assert_relative_eq!(*got, exp, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let buffer = SampleBuffer::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]], 100).unwrap();
        let out = resample(&buffer, 200);

        assert_eq!(out.num_channels(), 2);
        assert_relative_eq!(out.channel(0)[1], 0.5);
        assert_relative_eq!(out.channel(1)[1], 0.5);
        assert_relative_eq!(out.channel(0)[2], 1.0);
        assert_relative_eq!(out.channel(1)[2], 0.0);
    }

    #[test]
    fn test_zero_length_result_is_empty_buffer() {
        let out = resample(&mono(vec![0.5], 48000), 8000);

        // round(1 / 6) = 0
        assert!(out.is_empty());
        assert_eq!(out.num_channels(), 1);
        assert_eq!(out.sample_rate(), 8000);
    }

    #[test]
    fn test_single_sample_upsample_is_flat() {
        let out = resample(&mono(vec![0.75], 1000), 4000);
        assert_eq!(out.channel(0), &[0.75; 4]);
    }

    #[test]
    fn test_node_leaves_original_untouched() {
        let original = Arc::new(mono(vec![0.0, 0.5, 1.0], 10));
        let out = Resampler::new(20).process(original.clone());

        assert_eq!(out.len(), 6);
        assert_eq!(original.channel(0), &[0.0, 0.5, 1.0]);
        assert_eq!(original.sample_rate(), 10);
    }
}
