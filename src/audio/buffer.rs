use anyhow::Result;

/// A multi-channel buffer of normalized `f32` samples at a given sample rate.
///
/// Channels are stored planar, one `Vec` per channel, and all channels have the
/// same length. Values are nominally in `[-1.0, 1.0]` but are not clamped here;
/// clamping happens when the buffer is rendered to an integer format.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a new buffer from planar channel data.
    ///
    /// Returns an error if the sample rate is zero or the channels differ in length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            anyhow::bail!("Sample rate must be positive");
        }
        if let Some(first) = channels.first() {
            let len = first.len();
            if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
                anyhow::bail!(
                    "Channel {} has {} samples, expected {}",
                    idx,
                    ch.len(),
                    len
                );
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Builds a buffer from channels the caller already knows to be consistent.
    pub(crate) fn from_parts(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0);
        debug_assert!(channels.windows(2).all(|w| w[0].len() == w[1].len()));
        Self {
            channels,
            sample_rate,
        }
    }

    /// Returns the number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Returns the samples of one channel.
    ///
    /// Panics if `idx` is out of bounds.
    pub fn channel(&self, idx: usize) -> &[f32] {
        &self.channels[idx]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Mutable access to the samples. Lengths cannot change through this view.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }
}
