//! Interactive Preset Tuner
//!
//! Guides the user through recording isolated sounds, detects each sound's
//! dominant frequency and accumulates boost/attenuation bands into a preset.
//! The session is strictly single-threaded and synchronous: recording blocks
//! the calling thread for the exact duration requested.
//!
//! The session talks to the terminal through generic `BufRead`/`Write`
//! handles and records through the [`SampleSource`] seam, so tests can drive
//! it with scripted input and synthetic audio.

use std::io::{BufRead, Write};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{unbounded, RecvTimeoutError};
use tracing::debug;

use myna_dsp::{dominant_frequency, BandSpec, DEFAULT_BAND_GAIN_DB, DEFAULT_BAND_Q};

use crate::error::{EngineError, EngineResult};

/// Seconds recorded per sound
pub const TUNE_RECORD_SECONDS: f64 = 2.0;

/// Source of recorded audio for the tuner.
pub trait SampleSource {
    /// Record mono audio for `seconds` and return it as f32 samples.
    ///
    /// Blocks the calling thread until the recording is complete.
    fn record(&mut self, seconds: f64) -> EngineResult<Vec<f32>>;
}

/// Microphone-backed sample source over a cpal input stream.
pub struct MicSource {
    device: cpal::Device,
    sample_rate: u32,
}

impl MicSource {
    /// The device must have been resolved by the caller (see
    /// [`crate::device::resolve_input`]).
    pub fn new(device: cpal::Device, sample_rate: u32) -> Self {
        Self {
            device,
            sample_rate,
        }
    }
}

impl SampleSource for MicSource {
    fn record(&mut self, seconds: f64) -> EngineResult<Vec<f32>> {
        let needed = (seconds * f64::from(self.sample_rate)) as usize;

        let (sender, receiver) = unbounded::<Vec<f32>>();
        let (err_sender, err_receiver) = unbounded::<String>();

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        // The stream is scoped to this call: dropped (and the device
        // released) on every exit path, including errors below.
        let stream = self
            .device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = sender.try_send(data.to_vec());
                },
                move |err| {
                    let _ = err_sender.try_send(err.to_string());
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;
        stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        let mut samples = Vec::with_capacity(needed);
        while samples.len() < needed {
            if let Ok(message) = err_receiver.try_recv() {
                return Err(EngineError::RecordingFailed(message));
            }
            match receiver.recv_timeout(Duration::from_secs(5)) {
                Ok(chunk) => samples.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(EngineError::RecordingFailed(
                        "device produced no samples".to_string(),
                    ));
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        samples.truncate(needed);
        debug!("recorded {} samples at {} Hz", samples.len(), self.sample_rate);
        Ok(samples)
    }
}

/// Parse a user-entered number, falling back to `default` on empty or
/// invalid input.
///
/// This is the only treatment malformed entries get - nothing propagates out
/// of the session loop for them.
pub fn parse_or_default(entry: &str, default: f64) -> f64 {
    let trimmed = entry.trim();
    if trimmed.is_empty() {
        return default;
    }
    trimmed.parse().unwrap_or(default)
}

/// The interactive tuning session.
///
/// Loop: prompt for a name (empty finishes) -> record -> detect the dominant
/// frequency (too quiet skips the band) -> ask for gain and Q -> accumulate.
pub struct TunerSession<R, W, S> {
    input: R,
    output: W,
    source: S,
    sample_rate: u32,
}

impl<R: BufRead, W: Write, S: SampleSource> TunerSession<R, W, S> {
    pub fn new(input: R, output: W, source: S, sample_rate: u32) -> Self {
        Self {
            input,
            output,
            source,
            sample_rate,
        }
    }

    /// Run the session to completion and return the accepted bands in order.
    ///
    /// Finishing with zero accepted bands is an error
    /// ([`EngineError::EmptyTuning`]); the caller writes no preset then.
    pub fn run(&mut self) -> EngineResult<Vec<BandSpec>> {
        writeln!(self.output, "=== Myna Tuner ===")?;
        writeln!(
            self.output,
            "You will be prompted to record isolated sounds you want to shape."
        )?;
        writeln!(self.output, "Leave the name empty when you are finished.")?;
        writeln!(self.output)?;

        let mut bands: Vec<BandSpec> = Vec::new();
        loop {
            let name = self.prompt("Sound name (empty to finish): ")?;
            if name.is_empty() {
                break;
            }

            self.prompt("Press ENTER, then immediately make the sound ... ")?;
            writeln!(self.output, "Recording {} s ...", TUNE_RECORD_SECONDS)?;
            let sample = self.source.record(TUNE_RECORD_SECONDS)?;

            let frequency = match dominant_frequency(&sample, f64::from(self.sample_rate)) {
                Some(frequency) => frequency,
                None => {
                    writeln!(
                        self.output,
                        "  could not detect a dominant frequency - skipping"
                    )?;
                    continue;
                }
            };
            writeln!(self.output, "  detected {:.1} Hz for '{}'", frequency, name)?;

            let gain_entry = self.prompt("  Gain in dB (default 6): ")?;
            let gain_db = parse_or_default(&gain_entry, DEFAULT_BAND_GAIN_DB);

            let q_entry = self.prompt("  Bandwidth Q (default 4): ")?;
            let q = parse_or_default(&q_entry, DEFAULT_BAND_Q);

            bands.push(BandSpec {
                name,
                frequency,
                gain_db: Some(gain_db),
                q: Some(q),
            });
        }

        if bands.is_empty() {
            return Err(EngineError::EmptyTuning);
        }
        Ok(bands)
    }

    fn prompt(&mut self, message: &str) -> EngineResult<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE_RATE: u32 = 44100;

    /// Synthetic source producing a pure tone.
    struct ToneSource {
        frequency: f64,
        amplitude: f32,
    }

    impl SampleSource for ToneSource {
        fn record(&mut self, seconds: f64) -> EngineResult<Vec<f32>> {
            let n = (seconds * f64::from(SAMPLE_RATE)) as usize;
            Ok((0..n)
                .map(|i| {
                    self.amplitude
                        * (2.0 * std::f64::consts::PI * self.frequency * i as f64
                            / f64::from(SAMPLE_RATE))
                        .sin() as f32
                })
                .collect())
        }
    }

    /// Synthetic source producing silence.
    struct SilentSource;

    impl SampleSource for SilentSource {
        fn record(&mut self, seconds: f64) -> EngineResult<Vec<f32>> {
            let n = (seconds * f64::from(SAMPLE_RATE)) as usize;
            Ok(vec![0.0; n])
        }
    }

    fn run_session<S: SampleSource>(script: &str, source: S) -> EngineResult<Vec<BandSpec>> {
        let input = Cursor::new(script.to_string());
        let mut output = Vec::new();
        TunerSession::new(input, &mut output, source, SAMPLE_RATE).run()
    }

    #[test]
    fn test_accepts_band_with_defaults() {
        // name, ENTER, empty gain, empty Q, empty name to finish
        let script = "hiss\n\n\n\n\n";
        let source = ToneSource {
            frequency: 2000.0,
            amplitude: 0.5,
        };

        let bands = run_session(script, source).unwrap();
        assert_eq!(bands.len(), 1);

        let band = &bands[0];
        assert_eq!(band.name, "hiss");
        // 2 s at 44100 Hz gives a 0.5 Hz bin width
        assert!((band.frequency - 2000.0).abs() <= 1.0);
        assert_eq!(band.gain_db, Some(6.0));
        assert_eq!(band.q, Some(4.0));
    }

    #[test]
    fn test_accepts_explicit_gain_and_q() {
        let script = "whistle\n\n-3.5\n8\n\n";
        let source = ToneSource {
            frequency: 1000.0,
            amplitude: 0.5,
        };

        let bands = run_session(script, source).unwrap();
        assert_eq!(bands[0].gain_db, Some(-3.5));
        assert_eq!(bands[0].q, Some(8.0));
    }

    #[test]
    fn test_invalid_entries_fall_back_to_defaults() {
        let script = "buzz\n\nloud\nnarrow\n\n";
        let source = ToneSource {
            frequency: 500.0,
            amplitude: 0.5,
        };

        let bands = run_session(script, source).unwrap();
        assert_eq!(bands[0].gain_db, Some(6.0));
        assert_eq!(bands[0].q, Some(4.0));
    }

    #[test]
    fn test_quiet_recording_is_skipped() {
        // One quiet attempt, then finish: no bands were accepted.
        let script = "hum\n\n\n";
        let err = run_session(script, SilentSource);
        assert!(matches!(err, Err(EngineError::EmptyTuning)));
    }

    #[test]
    fn test_immediate_finish_is_empty_tuning() {
        let err = run_session("\n", SilentSource);
        assert!(matches!(err, Err(EngineError::EmptyTuning)));
    }

    #[test]
    fn test_eof_finishes_session() {
        // EOF behaves like an empty name.
        let script = "tone\n\n\n\n";
        let source = ToneSource {
            frequency: 800.0,
            amplitude: 0.5,
        };
        let bands = run_session(script, source).unwrap();
        assert_eq!(bands.len(), 1);
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default("", 6.0), 6.0);
        assert_eq!(parse_or_default("   ", 6.0), 6.0);
        assert_eq!(parse_or_default("7.5", 6.0), 7.5);
        assert_eq!(parse_or_default(" 3 ", 6.0), 3.0);
        assert_eq!(parse_or_default("abc", 6.0), 6.0);
        assert_eq!(parse_or_default("1e2", 6.0), 100.0);
    }
}
