//! Engine Error Types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the audio engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio devices found")]
    NoDevicesFound,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),

    #[error("Audio stream failed: {0}")]
    StreamFailed(String),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("Failed to read preset {path}: {source}")]
    PresetIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed preset {path}: {source}")]
    PresetFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No bands were accepted - nothing to save")]
    EmptyTuning,

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("DSP error: {0}")]
    Dsp(#[from] myna_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::NoDevicesFound;
        assert!(err.to_string().contains("No audio devices"));

        let err = EngineError::DeviceNotFound("USB Microphone".into());
        assert!(err.to_string().contains("USB Microphone"));
    }

    #[test]
    fn test_error_from_dsp() {
        let dsp_err = myna_dsp::DspError::InvalidSampleRate(0.0);
        let engine_err: EngineError = dsp_err.into();
        assert!(matches!(engine_err, EngineError::Dsp(_)));
    }
}
