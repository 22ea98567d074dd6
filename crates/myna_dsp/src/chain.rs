//! Voice Enhancement Filter Chain Designer
//!
//! Builds the fixed cascade of enhancement stages plus one peaking stage per
//! user-tuned band. Coefficient design is delegated to the `biquad` crate
//! (RBJ Audio EQ Cookbook formulas); this module owns ordering, validation
//! and defaulting.
//!
//! Fixed stages, in processing order:
//!
//! 1. 2nd-order high-pass @ 80 Hz (sub-bass rumble and plosives)
//! 2. Notch @ 60 Hz, Q=30 (electrical mains hum)
//! 3. 2nd-order low-pass @ 120 Hz - the bass-boost branch: its output is
//!    mixed back additively at execution time instead of replacing the signal
//! 4. Peaking @ 3 kHz, +3 dB, Q=1 (presence)
//! 5. 4th-order low-pass @ 9 kHz as two cascaded biquads (de-hiss)

use std::f64::consts::PI;

use biquad::{Coefficients, ToHertz, Type, Q_BUTTERWORTH_F64};

use crate::error::DspError;
use crate::section::Stage;

/// High-pass corner for rumble/plosive removal (Hz)
const HIGHPASS_HZ: f64 = 80.0;

/// Electrical mains hum fundamental (Hz)
const MAINS_HUM_HZ: f64 = 60.0;

/// Mains notch quality factor - very narrow so speech is untouched
const MAINS_HUM_Q: f64 = 30.0;

/// Bass-boost branch low-pass corner (Hz)
const BASS_BOOST_HZ: f64 = 120.0;

/// Presence peaking filter center (Hz), gain (dB) and Q
const PRESENCE_HZ: f64 = 3000.0;
const PRESENCE_GAIN_DB: f64 = 3.0;
const PRESENCE_Q: f64 = 1.0;

/// De-hiss low-pass corner (Hz)
const TREBLE_CUT_HZ: f64 = 9000.0;

/// Number of fixed voice-enhancement stages
pub const FIXED_STAGES: usize = 5;

/// Index of the bass-boost branch stage (0-indexed, fixed by construction)
pub const BASS_BOOST_STAGE: usize = 2;

/// Gain applied to a user band when the preset omits it (dB)
pub const DEFAULT_BAND_GAIN_DB: f64 = 6.0;

/// Q applied to a user band when the preset omits it
pub const DEFAULT_BAND_Q: f64 = 4.0;

/// One user-tuned boost/attenuation band.
///
/// Produced by the tuner or read from a preset file; consumed only by
/// [`design_chain`]. Missing gain/Q stay `None` until chain design applies
/// the defaults - no other code path fills them in. Duplicate frequencies
/// are legal; their peaking stages simply cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSpec {
    pub name: String,
    pub frequency: f64,
    pub gain_db: Option<f64>,
    pub q: Option<f64>,
}

/// The designed filter cascade.
///
/// Structure is immutable after design; only per-section delay state mutates
/// during streaming. Stage order is processing order, and the bass-boost
/// branch always sits at [`BASS_BOOST_STAGE`].
#[derive(Debug, Clone)]
pub struct FilterChain {
    pub(crate) stages: Vec<Stage>,
}

impl FilterChain {
    /// Number of stages (fixed stages + one per user band).
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Design the enhancement chain for `sample_rate`, appending one peaking
/// stage per entry of `extra_bands`.
///
/// Fails fast with [`DspError`] before any streaming starts: non-positive
/// sample rate, any center frequency outside (0, Nyquist), or a non-positive
/// user Q.
pub fn design_chain(sample_rate: f64, extra_bands: &[BandSpec]) -> Result<FilterChain, DspError> {
    if !(sample_rate > 0.0) {
        return Err(DspError::InvalidSampleRate(sample_rate));
    }

    let mut stages = Vec::with_capacity(FIXED_STAGES + extra_bands.len());

    stages.push(Stage::single(design(
        Type::HighPass,
        sample_rate,
        HIGHPASS_HZ,
        Q_BUTTERWORTH_F64,
    )?));

    stages.push(Stage::single(design(
        Type::Notch,
        sample_rate,
        MAINS_HUM_HZ,
        MAINS_HUM_Q,
    )?));

    // Bass-boost branch: designed as a plain low-pass here; the equalizer
    // mixes its output back additively at BASS_BOOST_STAGE.
    stages.push(Stage::single(design(
        Type::LowPass,
        sample_rate,
        BASS_BOOST_HZ,
        Q_BUTTERWORTH_F64,
    )?));

    stages.push(Stage::single(design(
        Type::PeakingEQ(PRESENCE_GAIN_DB),
        sample_rate,
        PRESENCE_HZ,
        PRESENCE_Q,
    )?));

    // 4th-order Butterworth low-pass: two biquads with the standard pole
    // pairing Q values 1/(2cos(pi/8)) and 1/(2cos(3pi/8)).
    let q1 = 0.5 / (PI / 8.0).cos();
    let q2 = 0.5 / (3.0 * PI / 8.0).cos();
    stages.push(Stage::cascade(vec![
        design(Type::LowPass, sample_rate, TREBLE_CUT_HZ, q1)?,
        design(Type::LowPass, sample_rate, TREBLE_CUT_HZ, q2)?,
    ]));

    for band in extra_bands {
        let gain_db = band.gain_db.unwrap_or(DEFAULT_BAND_GAIN_DB);
        let q = band.q.unwrap_or(DEFAULT_BAND_Q);
        if !(q > 0.0) {
            return Err(DspError::InvalidQ(q));
        }
        stages.push(Stage::single(design(
            Type::PeakingEQ(gain_db),
            sample_rate,
            band.frequency,
            q,
        )?));
    }

    Ok(FilterChain { stages })
}

/// Design one biquad, validating the center frequency against Nyquist first.
///
/// `ToHertz::hz()` panics on a negative value, so the range check must come
/// before the conversion.
fn design(
    kind: Type<f64>,
    sample_rate: f64,
    frequency: f64,
    q: f64,
) -> Result<Coefficients<f64>, DspError> {
    if !(frequency > 0.0) || frequency >= sample_rate / 2.0 {
        return Err(DspError::InvalidFrequency {
            frequency,
            sample_rate,
        });
    }
    Coefficients::<f64>::from_params(kind, sample_rate.hz(), frequency.hz(), q).map_err(|_| {
        DspError::InvalidFrequency {
            frequency,
            sample_rate,
        }
    })
}
