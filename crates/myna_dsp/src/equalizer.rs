//! Block-Streaming Equalizer
//!
//! Owns one designed [`FilterChain`] and pushes one audio block at a time
//! through it, carrying filter state across blocks. Blocks must arrive in
//! capture order; there is no internal buffering beyond each section's
//! 2-sample state.
//!
//! # Real-time Safety
//!
//! `process_block` performs no allocation once the low-branch scratch buffer
//! has grown to the stream's block size (one growth on the first block, since
//! the device delivers fixed-size blocks).

use crate::chain::{FilterChain, BASS_BOOST_STAGE};

/// Linear mix-back factor for the bass-boost branch (~ +6 dB)
pub const BASS_BOOST_GAIN: f32 = 2.0;

/// Hard noise-gate floor in dBFS; blocks whose RMS falls below it are zeroed
pub const NOISE_GATE_FLOOR_DB: f64 = -45.0;

/// Stateful block executor for a [`FilterChain`].
pub struct Equalizer {
    chain: FilterChain,
    low_scratch: Vec<f32>,
    gate_threshold: f64,
}

impl Equalizer {
    pub fn new(chain: FilterChain) -> Self {
        Self {
            chain,
            low_scratch: Vec::new(),
            gate_threshold: 10.0_f64.powf(NOISE_GATE_FLOOR_DB / 20.0),
        }
    }

    /// Process one block in place.
    ///
    /// Stages run in chain order. At the bass-boost stage the block is
    /// filtered twice against the same stage state: first into the low
    /// scratch (the parallel tap), then in series, and the tap is mixed back
    /// as `x += 2.0 * low`. The stage state therefore advances twice per
    /// block. That double advance is a compatibility artifact of reusing one
    /// section for both the tap and the series path - it is preserved
    /// deliberately so output matches the reference recordings, not because
    /// the topology calls for it.
    ///
    /// After the chain, any block whose RMS is below the -45 dBFS floor is
    /// zeroed outright (hard gate, no ramping).
    pub fn process_block(&mut self, block: &mut [f32]) {
        if block.is_empty() {
            return;
        }

        for (i, stage) in self.chain.stages.iter_mut().enumerate() {
            if i == BASS_BOOST_STAGE {
                self.low_scratch.clear();
                self.low_scratch.extend_from_slice(block);
                stage.process(&mut self.low_scratch);
                stage.process(block);
                for (sample, low) in block.iter_mut().zip(&self.low_scratch) {
                    *sample += BASS_BOOST_GAIN * *low;
                }
            } else {
                stage.process(block);
            }
        }

        if rms(block) < self.gate_threshold {
            block.fill(0.0);
        }
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }
}

/// Root-mean-square amplitude, accumulated in f64.
fn rms(block: &[f32]) -> f64 {
    let sum: f64 = block
        .iter()
        .map(|s| {
            let x = f64::from(*s);
            x * x
        })
        .sum();
    (sum / block.len() as f64).sqrt()
}
