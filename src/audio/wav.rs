//! Canonical 16-bit stereo PCM WAV encoding.
//!
//! The output is always a 44-byte RIFF header followed by interleaved
//! little-endian `i16` samples, with no extension chunks.

use std::io::Write;

use thiserror::Error;

use super::buffer::SampleBuffer;
use super::sample::AudioSample;

pub const HEADER_LEN: usize = 44;
pub const CHANNELS: u16 = 2;
pub const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const BLOCK_ALIGN: u16 = CHANNELS * BYTES_PER_SAMPLE;
const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("{samples} samples do not fit in a RIFF data chunk")]
    TooLarge { samples: usize },
    #[error("{0} Hz overflows the header's byte rate field")]
    SampleRateTooHigh(u32),
    #[error("failed to write WAV data")]
    Io(#[from] std::io::Error),
}

/// Interleave a buffer into exactly two output channels.
///
/// Sample `i` of channel `c` lands at `i * 2 + c`. A mono buffer is duplicated
/// into both channels, channels beyond the second are dropped, and a buffer
/// without channels interleaves to nothing.
pub fn interleave_stereo(buffer: &SampleBuffer) -> Vec<f32> {
    let (left, right) = match buffer.channels() {
        [] => return Vec::new(),
        [mono] => (mono, mono),
        [left, right, ..] => (left, right),
    };

    let mut out = Vec::with_capacity(left.len() * CHANNELS as usize);
    for (&l, &r) in left.iter().zip(right) {
        out.push(l);
        out.push(r);
    }
    out
}

/// Build the 44-byte header for `sample_count` interleaved samples.
pub fn header(sample_rate: u32, sample_count: usize) -> Result<[u8; HEADER_LEN], WavError> {
    let data_len = sample_count
        .checked_mul(BYTES_PER_SAMPLE as usize)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .ok_or(WavError::TooLarge {
            samples: sample_count,
        })?;
    let byte_rate = sample_rate
        .checked_mul(BLOCK_ALIGN as u32)
        .ok_or(WavError::SampleRateTooHigh(sample_rate))?;

    let mut h = [0u8; HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    h[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    h[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    h[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    h[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    h[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_len.to_le_bytes());
    Ok(h)
}

/// Stream a buffer as a WAV file into `writer`.
pub fn write_wav<W: Write>(buffer: &SampleBuffer, writer: &mut W) -> Result<(), WavError> {
    let samples = interleave_stereo(buffer);
    writer.write_all(&header(buffer.sample_rate(), samples.len())?)?;

    let mut pcm = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE as usize);
    for &s in &samples {
        pcm.extend_from_slice(&i16::from_f32_normalized(s).to_le_bytes());
    }
    writer.write_all(&pcm)?;
    Ok(())
}

/// Encode a buffer into the bytes of a complete WAV file.
///
/// The result is exactly `44 + 2 * n` bytes for `n` interleaved samples.
pub fn encode(buffer: &SampleBuffer) -> Result<Vec<u8>, WavError> {
    let frames = buffer.len();
    let mut out = Vec::with_capacity(HEADER_LEN + frames * BLOCK_ALIGN as usize);
    write_wav(buffer, &mut out)?;
    Ok(out)
}
