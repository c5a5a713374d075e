//! Audio file decoding using symphonia.
//!
//! Provides [`AudioFileReader`] for decoding common audio formats (mp3, flac, wav, ogg, aac)
//! into a planar [`SampleBuffer`] at the file's own sample rate.

use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

use super::buffer::SampleBuffer;
use super::symphonia_compat::{decoded_channels, extract_samples};

/// Upper bound on what a container's declared length may preallocate.
const MAX_PREALLOC_FRAMES: u64 = 1 << 24;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to probe audio format")]
    Probe(#[source] SymphoniaError),
    #[error("no supported audio track found")]
    NoTrack,
    #[error("unknown sample rate")]
    UnknownSampleRate,
    #[error("failed to create decoder")]
    Codec(#[source] SymphoniaError),
    #[error("failed to read audio stream")]
    Read(#[source] SymphoniaError),
    #[error("audio stream contains no samples")]
    NoSamples,
}

/// Outcome of one decode request.
pub type DecodeResult = Result<DecodedFile, DecodeError>;

/// A fully decoded file together with the name it was loaded from.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub file_name: String,
    pub buffer: SampleBuffer,
}

#[derive(Debug, Clone)]
pub struct AudioFileInfo {
    pub sample_rate: u32,
    pub channels: Option<usize>,
    /// Frames per channel, when the container declares it.
    pub frames: Option<u64>,
    pub file_name: String,
}

pub struct AudioFileReader {
    format: Box<dyn symphonia::core::formats::FormatReader>,
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
    pub info: AudioFileInfo,
}

impl AudioFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path.extension().and_then(|e| e.to_str());
        Self::from_source(Box::new(file), file_name_of(path), extension)
    }

    /// Decode from in-memory file contents, e.g. bytes handed over by a file picker.
    pub fn from_bytes(file_name: &str, data: Vec<u8>) -> Result<Self, DecodeError> {
        let extension = Path::new(file_name).extension().and_then(|e| e.to_str());
        Self::from_source(Box::new(Cursor::new(data)), file_name.to_string(), extension)
    }

    fn from_source(
        source: Box<dyn MediaSource>,
        file_name: String,
        extension: Option<&str>,
    ) -> Result<Self, DecodeError> {
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(DecodeError::Probe)?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;

        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(DecodeError::UnknownSampleRate)?;

        let channels = track.codec_params.channels.map(|c| c.count());

        let frames = track.codec_params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(DecodeError::Codec)?;

        let info = AudioFileInfo {
            sample_rate,
            channels,
            frames,
            file_name,
        };
        debug!("Opened audio file: {info:?}");

        Ok(Self {
            format,
            decoder,
            track_id,
            info,
        })
    }

    /// Decode every packet of the selected track into one buffer.
    ///
    /// Corrupt packets are skipped; a stream that yields no samples at all is an error.
    pub fn decode_all(mut self) -> DecodeResult {
        let mut channels: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(DecodeError::Read(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(DecodeError::Read(e)),
            };

            if channels.is_empty() {
                let count = self.info.channels.unwrap_or_else(|| decoded_channels(&decoded));
                let capacity = self
                    .info
                    .frames
                    .map_or(0, |f| f.min(MAX_PREALLOC_FRAMES) as usize);
                channels = (0..count.max(1))
                    .map(|_| Vec::with_capacity(capacity))
                    .collect();
            }

            extract_samples(&decoded, &mut channels);
        }

        if channels.first().is_none_or(Vec::is_empty) {
            return Err(DecodeError::NoSamples);
        }

        Ok(DecodedFile {
            file_name: self.info.file_name,
            buffer: SampleBuffer::from_parts(channels, self.info.sample_rate),
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Open and fully decode a file.
pub fn decode_file<P: AsRef<Path>>(path: P) -> DecodeResult {
    AudioFileReader::open(path)?.decode_all()
}

/// Fully decode in-memory file contents.
pub fn decode_bytes(file_name: &str, data: Vec<u8>) -> DecodeResult {
    AudioFileReader::from_bytes(file_name, data)?.decode_all()
}
