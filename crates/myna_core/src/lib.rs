//! Myna Core - Audio Engine
//!
//! This crate provides the engine shell around the Myna DSP core:
//! - Audio device enumeration/resolution and duplex stream management (cpal)
//! - The real-time capture -> equalize -> playback path
//! - The observation buffer mirroring pre/post audio for monitoring consumers
//! - Preset file I/O and the interactive tuner session
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      Control Thread                        │
//! │   CLI ──open──▶ AudioStream ◀──events── (crossbeam)        │
//! └────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Audio Thread                         │
//! │   Capture ──rtrb──▶ Equalizer ──▶ Output                   │
//! │                        │                                   │
//! │                        └──copies──▶ ObservationBuffer      │
//! │              (one mutex, bounded hold time)                │
//! └────────────────────────────────────────────────────────────┘
//!                              ▲
//!              snapshot() ─────┘  (any consumer, any pace)
//! ```

mod config;
mod device;
mod error;
mod message;
mod monitor;
mod preset;
mod stream;
mod tuner;

pub use config::{StreamConfig, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE};
pub use device::{resolve_input, resolve_output, AudioDevice, DeviceType};
pub use error::{EngineError, EngineResult};
pub use message::Event;
pub use monitor::{ObservationBuffer, DEFAULT_BUFFER_SECONDS};
pub use preset::{load_preset, save_preset, PRESET_VERSION};
pub use stream::AudioStream;
pub use tuner::{parse_or_default, MicSource, SampleSource, TunerSession, TUNE_RECORD_SECONDS};

// Re-export DSP types for convenience
pub use myna_dsp::{design_chain, dominant_frequency, BandSpec, DspError, Equalizer, FilterChain};
