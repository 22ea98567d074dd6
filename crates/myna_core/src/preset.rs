//! Preset File I/O
//!
//! A preset is a flat, versioned list of peaking-filter bands:
//!
//! ```json
//! {
//!   "version": 1,
//!   "bands": [
//!     { "name": "hiss", "freq": 2000.0, "gain_db": 6.0, "Q": 4.0 }
//!   ]
//! }
//! ```
//!
//! Reads are forward-compatible: unknown top-level and per-band fields are
//! ignored, and missing `gain_db`/`Q` stay unset through load - the chain
//! designer applies the defaults at consumption time, not here.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use myna_dsp::BandSpec;

use crate::error::{EngineError, EngineResult};

/// Format version written by [`save_preset`]
pub const PRESET_VERSION: u32 = 1;

fn default_version() -> u32 {
    PRESET_VERSION
}

#[derive(Debug, Serialize, Deserialize)]
struct PresetFile {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default)]
    bands: Vec<PresetBand>,
}

/// Wire shape of one band. Field names match the on-disk format, not the
/// domain type.
#[derive(Debug, Serialize, Deserialize)]
struct PresetBand {
    #[serde(default)]
    name: String,

    freq: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    gain_db: Option<f64>,

    #[serde(rename = "Q", default, skip_serializing_if = "Option::is_none")]
    q: Option<f64>,
}

impl From<&BandSpec> for PresetBand {
    fn from(band: &BandSpec) -> Self {
        Self {
            name: band.name.clone(),
            freq: band.frequency,
            gain_db: band.gain_db,
            q: band.q,
        }
    }
}

impl From<PresetBand> for BandSpec {
    fn from(band: PresetBand) -> Self {
        Self {
            name: band.name,
            frequency: band.freq,
            gain_db: band.gain_db,
            q: band.q,
        }
    }
}

/// Write `bands` to `path` as a version-1 preset file.
pub fn save_preset(path: &Path, bands: &[BandSpec]) -> EngineResult<()> {
    let preset = PresetFile {
        version: PRESET_VERSION,
        bands: bands.iter().map(PresetBand::from).collect(),
    };

    let file = File::create(path).map_err(|e| EngineError::PresetIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::to_writer_pretty(file, &preset).map_err(|e| EngineError::PresetFormat {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Load the band list from a preset file at `path`.
pub fn load_preset(path: &Path) -> EngineResult<Vec<BandSpec>> {
    let file = File::open(path).map_err(|e| EngineError::PresetIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    let preset: PresetFile =
        serde_json::from_reader(file).map_err(|e| EngineError::PresetFormat {
            path: path.to_path_buf(),
            source: e,
        })?;

    if preset.version != PRESET_VERSION {
        warn!(
            "preset {} has version {}, expected {}; loading anyway",
            path.display(),
            preset.version,
            PRESET_VERSION
        );
    }

    Ok(preset.bands.into_iter().map(BandSpec::from).collect())
}
