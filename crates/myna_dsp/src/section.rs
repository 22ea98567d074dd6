//! Biquad Filter Sections
//!
//! A [`Section`] is one second-order IIR filter in direct-form-II-transposed
//! realization. Coefficients come from the `biquad` crate's designer (RBJ
//! Audio EQ Cookbook); the stateful runner lives here because the stream must
//! start transient-free, which requires a non-zero initial delay state the
//! `biquad` crate cannot express.
//!
//! Samples cross the section boundary as `f32` (the device format) and are
//! filtered in `f64` so that narrow filters (the Q=30 mains notch sits at
//! 60 Hz, a tiny fraction of the sample rate) keep their shape.

use biquad::Coefficients;

/// One second-order section with its persistent delay state.
///
/// Coefficients are normalized so `a0 == 1`. The two state values carry the
/// filter across consecutive blocks; they are mutated only by [`process`]
/// (via the owning chain) and never shared between chains.
///
/// [`process`]: Section::process
#[derive(Debug, Clone)]
pub struct Section {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Section {
    /// Build a section whose state starts at the constant-input steady state.
    ///
    /// `input_level` is the DC level the section should assume has been
    /// flowing in forever: 1.0 for a stand-alone section, or the accumulated
    /// DC gain of the preceding sections inside a cascaded stage.
    ///
    /// Solving `(I - Aᵀ)·z = B` for the transposed direct-form-II state gives
    /// a state vector such that a unit constant input produces the DC-gain
    /// output from the very first sample - no start-of-stream transient.
    pub fn new(coefficients: Coefficients<f64>, input_level: f64) -> Self {
        let (b0, b1, b2) = (coefficients.b0, coefficients.b1, coefficients.b2);
        let (a1, a2) = (coefficients.a1, coefficients.a2);

        let r0 = b1 - a1 * b0;
        let r1 = b2 - a2 * b0;
        let denom = 1.0 + a1 + a2;
        let z1 = (r0 + r1) / denom;
        let z2 = r1 - a2 * z1;

        Self {
            b0,
            b1,
            b2,
            a1,
            a2,
            z1: z1 * input_level,
            z2: z2 * input_level,
        }
    }

    /// DC gain of this section (response at 0 Hz).
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Run one sample through the section, advancing the delay state.
    #[inline]
    pub fn run(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    /// Filter a block in place, advancing the delay state across it.
    #[inline]
    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.run(f64::from(*sample)) as f32;
        }
    }
}

/// One chain stage: one or two cascaded sections.
///
/// Most stages are a single biquad; the 4th-order low-pass is one stage of
/// two. Keeping the pair inside one stage preserves the chain's advertised
/// length and gives the second section the correct cascade steady state.
#[derive(Debug, Clone)]
pub struct Stage {
    sections: Vec<Section>,
}

impl Stage {
    /// Stage holding a single section.
    pub fn single(coefficients: Coefficients<f64>) -> Self {
        Self::cascade(vec![coefficients])
    }

    /// Stage cascading the given sections in order.
    ///
    /// Each section's initial state is scaled by the DC gain of the sections
    /// before it, so the whole cascade starts in its constant-input steady
    /// state.
    pub fn cascade(coefficients: Vec<Coefficients<f64>>) -> Self {
        let mut level = 1.0;
        let sections = coefficients
            .into_iter()
            .map(|c| {
                let section = Section::new(c, level);
                level *= section.dc_gain();
                section
            })
            .collect();
        Self { sections }
    }

    /// Number of biquad sections inside this stage.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Filter a block through every section in order, in place.
    #[inline]
    pub fn process(&mut self, block: &mut [f32]) {
        for section in &mut self.sections {
            section.process(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biquad::{Coefficients, ToHertz, Type, Q_BUTTERWORTH_F64};

    fn peaking_3k() -> Coefficients<f64> {
        Coefficients::<f64>::from_params(Type::PeakingEQ(3.0), 44100.0.hz(), 3000.0.hz(), 1.0)
            .unwrap()
    }

    #[test]
    fn test_state_length_is_two() {
        // The realization carries exactly two delay values per section.
        let section = Section::new(peaking_3k(), 1.0);
        let _ = (section.z1, section.z2);
    }

    #[test]
    fn test_constant_input_passes_unchanged() {
        // A peaking filter has unit DC gain, so with steady-state
        // initialization a constant 1.0 input must come out as 1.0 from the
        // very first sample.
        let mut section = Section::new(peaking_3k(), 1.0);
        let mut block = vec![1.0_f32; 256];
        section.process(&mut block);
        for (i, sample) in block.iter().enumerate() {
            assert!(
                (sample - 1.0).abs() < 1e-6,
                "sample {} deviated from steady state: {}",
                i,
                sample
            );
        }
    }

    #[test]
    fn test_dc_gain_peaking_is_unity() {
        let section = Section::new(peaking_3k(), 1.0);
        assert!((section.dc_gain() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let coeffs = Coefficients::<f64>::from_params(
            Type::HighPass,
            44100.0.hz(),
            80.0.hz(),
            Q_BUTTERWORTH_F64,
        )
        .unwrap();
        let mut section = Section::new(coeffs, 1.0);
        assert!(section.dc_gain().abs() < 1e-9);

        // Steady-state start: constant input is rejected immediately.
        let mut block = vec![1.0_f32; 256];
        section.process(&mut block);
        for sample in &block {
            assert!(sample.abs() < 1e-6);
        }
    }

    #[test]
    fn test_cascade_steady_state() {
        // Two cascaded low-pass sections (the 9 kHz stage shape): constant
        // input must pass the whole stage unchanged from sample zero.
        let q1 = 0.5 / (std::f64::consts::PI / 8.0).cos();
        let q2 = 0.5 / (3.0 * std::f64::consts::PI / 8.0).cos();
        let mut stage = Stage::cascade(vec![
            Coefficients::<f64>::from_params(Type::LowPass, 44100.0.hz(), 9000.0.hz(), q1)
                .unwrap(),
            Coefficients::<f64>::from_params(Type::LowPass, 44100.0.hz(), 9000.0.hz(), q2)
                .unwrap(),
        ]);
        let mut block = vec![1.0_f32; 256];
        stage.process(&mut block);
        for sample in &block {
            assert!((sample - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_block_split_equals_whole_block() {
        // Filtering is per-sample; splitting a block must not change the
        // output of a plain series section.
        let mut whole = Section::new(peaking_3k(), 1.0);
        let mut split = Section::new(peaking_3k(), 1.0);

        let signal: Vec<f32> = (0..512)
            .map(|i| (2.0 * std::f32::consts::PI * 3000.0 * i as f32 / 44100.0).sin())
            .collect();

        let mut one = signal.clone();
        whole.process(&mut one);

        let mut two = signal;
        let (head, tail) = two.split_at_mut(200);
        split.process(head);
        split.process(tail);

        for (a, b) in one.iter().zip(two.iter()) {
            assert_eq!(a, b);
        }
    }
}
