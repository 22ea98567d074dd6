//! Stream Configuration

use std::time::Duration;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default block size in frames
pub const DEFAULT_FRAME_SIZE: u32 = 1024;

/// Audio stream configuration.
///
/// Myna is single-channel, 32-bit float by design, so only the sample rate
/// and block size are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// Block size in frames (lower = less latency, higher = more stability)
    pub frame_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }
}

impl StreamConfig {
    /// Latency contributed by one block, in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.frame_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Duration of one block - the deadline for processing it
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.frame_size) / f64::from(self.sample_rate))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate < 8000 || self.sample_rate > 192_000 {
            return Err(format!("Invalid sample rate: {}", self.sample_rate));
        }
        if self.frame_size < 32 || self.frame_size > 8192 {
            return Err(format!("Invalid block size: {}", self.frame_size));
        }
        Ok(())
    }
}
