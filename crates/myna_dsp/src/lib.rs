//! Myna DSP - Digital Signal Processing Module
//!
//! This crate provides the signal path for Myna, including:
//! - Voice-enhancement filter chain design (high-pass, mains notch,
//!   bass-boost branch, presence peak, de-hiss low-pass, user peaking bands)
//! - Stateful block-streaming equalizer with a hard noise gate
//! - Dominant-frequency detection for the interactive tuner
//!
//! # Architecture
//!
//! The chain is designed once per session from a sample rate and an optional
//! band list, then owned by an [`Equalizer`] that mutates only per-section
//! delay state as blocks stream through. No allocation happens on the block
//! path after the first block.

mod chain;
mod detect;
mod equalizer;
mod error;
mod section;

pub use chain::{
    design_chain, BandSpec, FilterChain, BASS_BOOST_STAGE, DEFAULT_BAND_GAIN_DB, DEFAULT_BAND_Q,
    FIXED_STAGES,
};
pub use detect::{dominant_frequency, MAGNITUDE_FLOOR};
pub use equalizer::{Equalizer, BASS_BOOST_GAIN, NOISE_GATE_FLOOR_DB};
pub use error::DspError;
pub use section::{Section, Stage};
