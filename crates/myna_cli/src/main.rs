//! Myna CLI - Real-time Microphone Equalizer
//!
//! Subcommands:
//! - `tune <preset>` - interactively record sounds and build a preset
//! - `stream` - run the equalizer between an input and an output device
//! - `devices` - list audio devices

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use myna_core::{
    design_chain, load_preset, resolve_input, resolve_output, save_preset, AudioDevice,
    AudioStream, DeviceType, Equalizer, MicSource, ObservationBuffer, StreamConfig, TunerSession,
    DEFAULT_BUFFER_SECONDS, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE,
};

/// Interval between level-meter refreshes
const METER_INTERVAL: Duration = Duration::from_millis(50);

/// Real-time microphone equalizer
#[derive(Parser, Debug)]
#[command(name = "myna")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactively create a preset JSON file
    Tune {
        /// Output JSON path for the new preset
        preset: PathBuf,

        /// Sample rate during recording
        #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLE_RATE)]
        samplerate: u32,
    },

    /// Stream with optional preset
    Stream {
        /// Path to preset JSON
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Input device name (system default when omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Output device name (system default when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Sample rate (Hz)
        #[arg(short = 'r', long, default_value_t = DEFAULT_SAMPLE_RATE)]
        samplerate: u32,

        /// Block size in frames
        #[arg(short, long, default_value_t = DEFAULT_FRAME_SIZE)]
        frames: u32,

        /// Show a live pre/post level monitor
        #[arg(long)]
        gui: bool,
    },

    /// List audio devices
    Devices,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "myna=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Tune { preset, samplerate } => run_tune(&preset, samplerate),
        Commands::Stream {
            preset,
            input,
            output,
            samplerate,
            frames,
            gui,
        } => run_stream(preset.as_deref(), input, output, samplerate, frames, gui),
        Commands::Devices => run_devices(),
    }
}

fn run_tune(preset: &Path, samplerate: u32) -> anyhow::Result<()> {
    // Resolve the recording device once, up front.
    let device = resolve_input(None)?;
    let source = MicSource::new(device, samplerate);

    let stdin = io::stdin();
    let mut session = TunerSession::new(stdin.lock(), io::stdout(), source, samplerate);
    let bands = session.run()?;

    save_preset(preset, &bands)?;
    info!(
        "preset saved to {} containing {} band(s)",
        preset.display(),
        bands.len()
    );
    Ok(())
}

fn run_stream(
    preset: Option<&Path>,
    input: Option<String>,
    output: Option<String>,
    samplerate: u32,
    frames: u32,
    gui: bool,
) -> anyhow::Result<()> {
    let bands = match preset {
        Some(path) => load_preset(path)?,
        None => Vec::new(),
    };

    // Chain design fails fast here, before any device is opened.
    let chain = design_chain(f64::from(samplerate), &bands)?;
    let equalizer = Equalizer::new(chain);

    let config = StreamConfig {
        sample_rate: samplerate,
        frame_size: frames,
    };

    let input_device = resolve_input(input.as_deref())?;
    let output_device = resolve_output(output.as_deref())?;

    let monitor = gui.then(|| Arc::new(ObservationBuffer::new(samplerate, DEFAULT_BUFFER_SECONDS)));
    if let Some(buffer) = &monitor {
        spawn_level_meter(Arc::clone(buffer), samplerate);
    }

    let stream = AudioStream::open(config, &input_device, &output_device, equalizer, monitor)?;
    info!(
        "running with {} band(s), {:.1} ms block latency - press Ctrl-C to stop",
        bands.len(),
        stream.config.latency_ms()
    );
    stream.run()?;
    Ok(())
}

/// Poll the observation buffer and redraw a one-line pre/post level meter.
///
/// This is the minimal consumer of `snapshot()`; anything fancier (waveforms,
/// spectrograms) plugs into the same interface.
fn spawn_level_meter(buffer: Arc<ObservationBuffer>, sample_rate: u32) {
    // Meter over the most recent 100 ms of each channel.
    let window = (sample_rate / 10) as usize;

    thread::spawn(move || loop {
        thread::sleep(METER_INTERVAL);

        let (pre, post) = buffer.snapshot();
        if pre.is_empty() {
            continue;
        }

        let pre_level = dbfs(&pre[pre.len().saturating_sub(window)..]);
        let post_level = dbfs(&post[post.len().saturating_sub(window)..]);
        print!("\rpre {:>7.1} dBFS | post {:>7.1} dBFS ", pre_level, post_level);
        let _ = io::stdout().flush();
    });
}

/// RMS level of `samples` in dBFS, floored for silence.
fn dbfs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return -100.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| {
            let x = f64::from(*s);
            x * x
        })
        .sum();
    let rms = (sum / samples.len() as f64).sqrt();
    (20.0 * rms.max(1e-10).log10()) as f32
}

fn run_devices() -> anyhow::Result<()> {
    let devices = AudioDevice::enumerate_all()?;

    for kind in [DeviceType::Input, DeviceType::Output] {
        let label = match kind {
            DeviceType::Input => "Input devices:",
            DeviceType::Output => "Output devices:",
        };
        println!("{}", label);
        for device in devices.iter().filter(|d| d.device_type == kind) {
            let default_marker = if device.is_default { " (default)" } else { "" };
            let rates: Vec<String> = device.sample_rates.iter().map(u32::to_string).collect();
            println!(
                "  {}{} - {} ch, [{}] Hz",
                device.name,
                default_marker,
                device.max_channels,
                rates.join(", ")
            );
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_stream_defaults() {
        let cli = Cli::parse_from(["myna", "stream"]);
        match cli.command {
            Commands::Stream {
                samplerate, frames, gui, ..
            } => {
                assert_eq!(samplerate, 44100);
                assert_eq!(frames, 1024);
                assert!(!gui);
            }
            _ => panic!("expected stream subcommand"),
        }
    }

    #[test]
    fn test_tune_requires_preset_path() {
        assert!(Cli::try_parse_from(["myna", "tune"]).is_err());

        let cli = Cli::parse_from(["myna", "tune", "voice.json", "-r", "48000"]);
        match cli.command {
            Commands::Tune { preset, samplerate } => {
                assert_eq!(preset, PathBuf::from("voice.json"));
                assert_eq!(samplerate, 48000);
            }
            _ => panic!("expected tune subcommand"),
        }
    }

    #[test]
    fn test_dbfs_of_silence_is_floor() {
        assert_eq!(dbfs(&[]), -100.0);
        assert!(dbfs(&[0.0; 64]) < -100.0);
    }

    #[test]
    fn test_dbfs_of_full_scale() {
        // A full-scale square wave has RMS 1.0 -> 0 dBFS.
        let samples = [1.0_f32; 64];
        assert!(dbfs(&samples).abs() < 0.01);
    }
}
