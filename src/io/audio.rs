//! Audio device output using cpal.
//!
//! Provides:
//! - [`PlaybackCursor`] for rendering a buffer at a playback rate into device frames
//! - [`AudioOutput`] for speaker playback

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::{debug, error, info};

use crate::audio::{AudioSample, SampleBuffer};

fn device_name(device: &Device) -> Option<String> {
    device.description().ok().map(|desc| desc.name().to_string())
}

fn get_output_device(name_filter: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    match name_filter {
        Some(filter) => {
            let mut devices = host
                .output_devices()
                .context("Failed to enumerate output devices")?;
            devices
                .find(|d| device_name(d).is_some_and(|name| name.contains(filter)))
                .with_context(|| format!("No output device matching '{filter}'"))
        }
        None => host
            .default_output_device()
            .context("No default output device available"),
    }
}

/// Names of all output devices on the default host.
pub fn output_device_names() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .context("Failed to enumerate output devices")?;
    Ok(devices.filter_map(|d| device_name(&d)).collect())
}

/// Reads a buffer at a fractional position, advancing by
/// `playback_rate * buffer_rate / device_rate` source samples per output frame.
///
/// Speeding up playback raises the pitch. The buffer itself is only read.
pub struct PlaybackCursor {
    buffer: Arc<SampleBuffer>,
    position: f64,
    step: f64,
}

impl PlaybackCursor {
    pub fn new(buffer: Arc<SampleBuffer>, playback_rate: f64, device_rate: u32) -> Self {
        let step = playback_rate * buffer.sample_rate() as f64 / device_rate as f64;
        Self {
            buffer,
            position: 0.0,
            step,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.position.floor() as usize >= self.buffer.len()
    }

    fn sample_at(&self, channel: usize) -> f32 {
        let src = self.buffer.channel(channel % self.buffer.num_channels());
        let last = src.len() - 1;
        let idx0 = (self.position.floor() as usize).min(last);
        let idx1 = (idx0 + 1).min(last);
        let frac = (self.position - idx0 as f64) as f32;
        src[idx0] + (src[idx1] - src[idx0]) * frac
    }

    /// Fill interleaved device frames with `out_channels` channels each.
    ///
    /// Output channels beyond the buffer's wrap around to its first channels, so
    /// mono plays on both speakers. Frames after the end are silence. Returns
    /// `false` once the whole buffer has been played.
    pub fn fill<T: AudioSample>(&mut self, data: &mut [T], out_channels: usize, volume: f32) -> bool {
        for frame in data.chunks_mut(out_channels.max(1)) {
            if self.is_finished() {
                frame.fill(T::silence());
                continue;
            }
            for (ch, slot) in frame.iter_mut().enumerate() {
                *slot = T::from_f32_normalized(self.sample_at(ch) * volume);
            }
            self.position += self.step;
        }
        !self.is_finished()
    }
}

/// One device callback: render at the current shared gain and flag the end.
fn render<T: AudioSample>(
    cursor: &mut PlaybackCursor,
    data: &mut [T],
    channels: usize,
    volume: &AtomicU32,
    finished: &AtomicBool,
) {
    let gain = f32::from_bits(volume.load(Ordering::Relaxed));
    if !cursor.fill(data, channels, gain) {
        finished.store(true, Ordering::Relaxed);
    }
}

/// Plays buffers to an output device (speakers).
///
/// Starting a new buffer replaces whatever was playing.
pub struct AudioOutput {
    device_filter: Option<String>,
    volume: Arc<AtomicU32>,
    finished: Arc<AtomicBool>,
    stream: Option<Stream>,
}

impl AudioOutput {
    pub fn new(device_filter: Option<String>, volume: f32) -> Self {
        Self {
            device_filter,
            volume: Arc::new(AtomicU32::new(volume.clamp(0.0, 1.0).to_bits())),
            finished: Arc::new(AtomicBool::new(true)),
            stream: None,
        }
    }

    /// Takes effect on the running stream.
    pub fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn start(&mut self, buffer: Arc<SampleBuffer>, playback_rate: f64) -> Result<()> {
        self.stop();

        let device = get_output_device(self.device_filter.as_deref())?;
        info!(
            "Using output device: {}",
            device_name(&device).unwrap_or_else(|| "Unknown".to_string())
        );
        let output_config = device
            .default_output_config()
            .context("Failed to get default output config")?;
        debug!("Output config: {output_config:#?}");

        let config: StreamConfig = output_config.config();
        let cursor = PlaybackCursor::new(buffer, playback_rate, config.sample_rate);
        self.finished.store(cursor.is_finished(), Ordering::Relaxed);

        let stream = match output_config.sample_format() {
            SampleFormat::I16 => self.build_output_stream::<i16>(&device, &config, cursor)?,
            SampleFormat::U16 => self.build_output_stream::<u16>(&device, &config, cursor)?,
            SampleFormat::F32 => self.build_output_stream::<f32>(&device, &config, cursor)?,
            format => anyhow::bail!("Unsupported sample format: {format:?}"),
        };

        stream.play().context("Failed to play stream")?;
        info!("Playback started at {:.3}x", playback_rate);
        self.stream = Some(stream);
        Ok(())
    }

    fn build_output_stream<T>(
        &self,
        device: &Device,
        config: &StreamConfig,
        mut cursor: PlaybackCursor,
    ) -> Result<Stream>
    where
        T: AudioSample + cpal::SizedSample,
    {
        let channels = config.channels as usize;
        let volume = self.volume.clone();
        let finished = self.finished.clone();

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    render(&mut cursor, data, channels, &volume, &finished)
                },
                |err| error!("An error occurred on the output audio stream: {}", err),
                None,
            )
            .context("Failed to build output stream")?;

        Ok(stream)
    }

    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            self.finished.store(true, Ordering::Relaxed);
            info!("Playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.stream.is_some() && !self.is_finished()
    }

    /// True once the whole buffer has been rendered, or after [`stop`](Self::stop).
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cursor(channels: Vec<Vec<f32>>, rate: u32, playback_rate: f64, device_rate: u32) -> PlaybackCursor {
        let buffer = Arc::new(SampleBuffer::new(channels, rate).unwrap());
        PlaybackCursor::new(buffer, playback_rate, device_rate)
    }

    #[test]
    fn test_unity_rate_copies_samples() {
        let mut c = cursor(vec![vec![0.1, 0.2, 0.3]], 48000, 1.0, 48000);
        let mut out = [9.0f32; 5];

        assert!(!c.fill(&mut out, 1, 1.0));
        assert_eq!(out, [0.1, 0.2, 0.3, 0.0, 0.0]);
        assert!(c.is_finished());
    }

    #[test]
    fn test_partial_fill_reports_remaining() {
        let mut c = cursor(vec![vec![0.5; 10]], 8000, 1.0, 8000);
        let mut out = [0.0f32; 4];

        assert!(c.fill(&mut out, 1, 1.0));
        assert!(!c.is_finished());
    }

    #[test]
    fn test_octave_up_skips_samples() {
        let mut c = cursor(vec![vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]], 8000, 2.0, 8000);
        let mut out = [0.0f32; 4];

        c.fill(&mut out, 1, 1.0);
        assert_eq!(out, [0.0, 0.2, 0.4, 0.0]);
    }

    #[test]
    fn test_device_rate_conversion_interpolates() {
        let mut c = cursor(vec![vec![0.0, 1.0]], 8000, 1.0, 16000);
        let mut out = [0.0f32; 4];

        c.fill(&mut out, 1, 1.0);
        assert_relative_eq!(out[1], 0.5);
        assert_relative_eq!(out[2], 1.0);
        assert_relative_eq!(out[3], 1.0);
    }

    #[test]
    fn test_mono_plays_on_all_channels() {
        let mut c = cursor(vec![vec![0.25, -0.25]], 44100, 1.0, 44100);
        let mut out = [0.0f32; 4];

        c.fill(&mut out, 2, 1.0);
        assert_eq!(out, [0.25, 0.25, -0.25, -0.25]);
    }

    #[test]
    fn test_volume_and_integer_output() {
        let mut c = cursor(vec![vec![1.0, -1.0], vec![0.5, 0.5]], 44100, 1.0, 44100);
        let mut out = [0i16; 4];

        c.fill(&mut out, 2, 0.5);
        assert_eq!(out, [16384, 8192, -16384, 8192]);
    }

    #[test]
    fn test_volume_change_reaches_running_render() {
        let output = AudioOutput::new(None, 1.0);
        output.finished.store(false, Ordering::Relaxed);
        let mut c = cursor(vec![vec![0.8; 4]], 8000, 1.0, 8000);
        let mut first = [0.0f32; 2];
        let mut second = [0.0f32; 2];

        render(&mut c, &mut first, 1, &output.volume, &output.finished);
        assert!(!output.is_finished());

        output.set_volume(0.25);
        render(&mut c, &mut second, 1, &output.volume, &output.finished);

        assert_eq!(first, [0.8, 0.8]);
        assert_relative_eq!(second[0], 0.2);
        assert_relative_eq!(second[1], 0.2);
        assert!(output.is_finished());
    }

    #[test]
    fn test_volume_is_clamped() {
        let output = AudioOutput::new(None, 2.0);
        assert_eq!(output.volume(), 1.0);

        output.set_volume(-0.5);
        assert_eq!(output.volume(), 0.0);
        assert!(!output.is_playing());
    }

    #[test]
    fn test_empty_buffer_is_finished() {
        let mut c = cursor(vec![Vec::new()], 8000, 1.0, 8000);
        let mut out = [1u16; 2];

        assert!(!c.fill(&mut out, 2, 1.0));
        assert_eq!(out, [32768, 32768]);
    }
}
