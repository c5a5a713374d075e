mod audio;
mod io;
mod pipeline;
mod state;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossbeam::channel::{self, Receiver};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use audio::waveform_peaks;
use io::{AudioOutput, DecodeRequest, output_device_names};
use pipeline::ProcessingParameters;
use state::{Sampler, SamplerConfig};

/// Lo-fi sample editor: resample, bit-crush and pitch-shift audio files.
#[derive(Parser, Debug)]
#[command(name = "lofi-sampler", version)]
struct Cli {
    /// JSON file with default parameters, volume and output device
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a file and print its metadata
    Info {
        /// Audio file, or `-` to read it from stdin
        file: PathBuf,
        /// Also print this many min/max waveform columns of the first channel
        #[arg(long)]
        peaks: Option<usize>,
    },
    /// Process a file and write it as 16-bit stereo WAV
    Export {
        /// Audio file, or `-` to read it from stdin
        file: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
        /// Output file, or directory for the default export name (existing,
        /// or ending in a path separator)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Process a file and play it on the output device
    ///
    /// While playing, each number typed on stdin sets a new volume.
    Play {
        /// Audio file, or `-` to read it from stdin
        file: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
        /// Playback volume between 0.0 and 1.0
        #[arg(long)]
        volume: Option<f32>,
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// List output devices
    Devices,
}

/// Processing overrides. Unset flags keep the configured value.
#[derive(Args, Debug, Default)]
struct ParamArgs {
    /// Target sample rate in Hz
    #[arg(long)]
    rate: Option<u32>,
    /// Bit depth
    #[arg(long)]
    bits: Option<u32>,
    /// Pitch offset in semitones
    #[arg(long, allow_negative_numbers = true)]
    pitch: Option<f64>,
}

impl ParamArgs {
    fn apply(&self, sampler: &mut Sampler) -> Result<()> {
        if let Some(rate) = self.rate {
            sampler.set_sample_rate(rate)?;
        }
        if let Some(bits) = self.bits {
            sampler.set_bit_depth(bits)?;
        }
        if let Some(pitch) = self.pitch {
            sampler.set_pitch(pitch)?;
        }
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SamplerConfig::load(path)?,
        None => SamplerConfig::default(),
    };

    match cli.command {
        Command::Info { file, peaks } => {
            let sampler = load(&file, config.parameters()?)?;
            print_info(&sampler, peaks);
        }
        Command::Export { file, params, out } => {
            let mut sampler = load(&file, config.parameters()?)?;
            params.apply(&mut sampler)?;
            let target = out
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from("."));
            if let Some(path) = sampler.export_to(&target)? {
                println!("{}", path.display());
            }
        }
        Command::Play {
            file,
            params,
            volume,
            seconds,
        } => {
            let mut sampler = load(&file, config.parameters()?)?;
            params.apply(&mut sampler)?;
            let volume = volume.unwrap_or(config.volume);
            if !(0.0..=1.0).contains(&volume) {
                anyhow::bail!("Volume must be between 0.0 and 1.0, got {volume}");
            }
            play(&sampler, config.output_device, volume, seconds)?;
        }
        Command::Devices => {
            for name in output_device_names()? {
                println!("{name}");
            }
        }
    }

    Ok(())
}

/// Decode on a worker thread and hand the outcome to a fresh sampler.
fn load(file: &Path, defaults: ProcessingParameters) -> Result<Sampler> {
    let mut sampler = Sampler::new(defaults);
    let request = if file == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        DecodeRequest::from_bytes("stdin".to_string(), data)
    } else {
        DecodeRequest::from_path(file.to_path_buf())
    };
    let result = request
        .wait()
        .context("Decoder thread exited without a result")?;
    sampler
        .load(result)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    Ok(sampler)
}

fn print_info(sampler: &Sampler, peaks: Option<usize>) {
    let (Some(original), Some(modified)) = (sampler.original(), sampler.info()) else {
        return;
    };
    let params = sampler.parameters();

    println!("file:        {}", modified.file_name);
    println!("channels:    {}", original.num_channels());
    println!("sample rate: {} Hz", original.sample_rate());
    println!("samples:     {}", original.len());
    println!("duration:    {:.3} s", original.duration_secs());
    println!(
        "processed:   {} x {} samples at {} Hz ({:.3} s), {} bit, {:.3}x playback",
        modified.channels,
        modified.len,
        modified.sample_rate,
        modified.duration_secs,
        params.bit_depth(),
        params.playback_rate()
    );

    if let (Some(columns), Some(buffer)) = (peaks, sampler.snapshot()) {
        if buffer.is_empty() {
            return;
        }
        for (col, peak) in waveform_peaks(buffer.channel(0), columns)
            .iter()
            .enumerate()
        {
            println!("{col:>5} {:>9.5} {:>9.5}", peak.min, peak.max);
        }
    }
}

fn play(
    sampler: &Sampler,
    device_filter: Option<String>,
    volume: f32,
    seconds: Option<f64>,
) -> Result<()> {
    let Some(buffer) = sampler.snapshot() else {
        return Ok(());
    };
    let limit = seconds
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("Invalid playback time limit")?;

    let mut output = AudioOutput::new(device_filter, volume);
    output.start(buffer, sampler.playback_rate())?;
    let volume_input = spawn_volume_input();

    let started = Instant::now();
    while output.is_playing() {
        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            info!("Time limit reached");
            break;
        }
        for volume in volume_input.try_iter() {
            output.set_volume(volume);
            info!("Volume set to {:.2}", output.volume());
        }
        thread::sleep(Duration::from_millis(50));
    }
    output.stop();

    Ok(())
}

/// Read volume values from stdin, one per line.
fn spawn_volume_input() -> Receiver<f32> {
    let (sender, receiver) = channel::unbounded();
    thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<f32>() {
                Ok(volume) if (0.0..=1.0).contains(&volume) => {
                    if sender.send(volume).is_err() {
                        break;
                    }
                }
                _ => warn!("Expected a volume between 0.0 and 1.0, got '{}'", line),
            }
        }
    });
    receiver
}
