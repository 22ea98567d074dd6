//! Dominant-Frequency Detection
//!
//! Used by the tuner to characterize a recorded sound: Hann window to reduce
//! spectral leakage, forward FFT, then the frequency of the strongest bin.
//! A recording whose peak magnitude sits under a fixed absolute floor is
//! reported as too quiet to analyze.

use rustfft::{num_complex::Complex, FftPlanner};

/// Absolute magnitude floor on the windowed FFT scale.
///
/// A hard threshold, deliberately not adaptive to input loudness: a quiet
/// room must come back as "nothing detected", not as its loudest hum bin.
pub const MAGNITUDE_FLOOR: f32 = 1e-4;

/// Hann window coefficient for position `n` of `size`
fn hann_window(n: usize, size: usize) -> f32 {
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / (size - 1) as f32).cos())
}

/// Return the dominant frequency of `samples` in Hz, or `None` when the
/// signal is too quiet to analyze.
///
/// The scan covers the non-negative-frequency bins `0..=N/2`; the returned
/// value is the bin center `bin * sample_rate / N`, so resolution is one bin
/// width (`sample_rate / N`).
pub fn dominant_frequency(samples: &[f32], sample_rate: f64) -> Option<f64> {
    let n = samples.len();
    if n < 2 {
        return None;
    }

    let mut buffer: Vec<Complex<f32>> = samples
        .iter()
        .enumerate()
        .map(|(i, s)| Complex::new(s * hann_window(i, n), 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let mut peak_bin = 0;
    let mut peak_magnitude = 0.0_f32;
    for (bin, value) in buffer.iter().take(n / 2 + 1).enumerate() {
        let magnitude = value.norm();
        if magnitude > peak_magnitude {
            peak_magnitude = magnitude;
            peak_bin = bin;
        }
    }

    if peak_magnitude < MAGNITUDE_FLOOR {
        return None;
    }

    Some(peak_bin as f64 * sample_rate / n as f64)
}
