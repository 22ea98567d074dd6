//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while designing the filter chain
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f64),

    #[error("Band frequency {frequency}Hz is outside (0, Nyquist) at sample rate {sample_rate}Hz")]
    InvalidFrequency { frequency: f64, sample_rate: f64 },

    #[error("Q factor must be positive, got {0}")]
    InvalidQ(f64),
}
