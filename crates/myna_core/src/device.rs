//! Audio Device Enumeration and Resolution
//!
//! Devices are resolved once at startup and handed into the stream - core
//! logic never reads host defaults implicitly.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::{EngineError, EngineResult};

/// Type of audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Input,
    Output,
}

/// Summary of an audio device for listings
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name (also the selection key)
    pub name: String,

    /// Whether this is an input or output device
    pub device_type: DeviceType,

    /// Whether this is the system default device
    pub is_default: bool,

    /// Supported sample rates (may be empty if querying failed)
    pub sample_rates: Vec<u32>,

    /// Maximum supported channels
    pub max_channels: u16,
}

impl AudioDevice {
    /// Enumerate all available audio devices
    pub fn enumerate_all() -> EngineResult<Vec<AudioDevice>> {
        let host = cpal::default_host();

        let mut devices = Vec::new();

        let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
        let default_output_name = host.default_output_device().and_then(|d| d.name().ok());

        if let Ok(input_devices) = host.input_devices() {
            for device in input_devices {
                if let Ok(audio_device) = Self::from_cpal_device(
                    &device,
                    DeviceType::Input,
                    default_input_name.as_deref(),
                ) {
                    devices.push(audio_device);
                }
            }
        }

        if let Ok(output_devices) = host.output_devices() {
            for device in output_devices {
                if let Ok(audio_device) = Self::from_cpal_device(
                    &device,
                    DeviceType::Output,
                    default_output_name.as_deref(),
                ) {
                    devices.push(audio_device);
                }
            }
        }

        if devices.is_empty() {
            return Err(EngineError::NoDevicesFound);
        }

        Ok(devices)
    }

    fn from_cpal_device(
        device: &cpal::Device,
        device_type: DeviceType,
        default_name: Option<&str>,
    ) -> EngineResult<Self> {
        let name = device
            .name()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?;

        let is_default = default_name.map(|d| d == name).unwrap_or(false);

        let (sample_rates, max_channels) = match device_type {
            DeviceType::Input => Self::query_input_config(device),
            DeviceType::Output => Self::query_output_config(device),
        };

        Ok(AudioDevice {
            name,
            device_type,
            is_default,
            sample_rates,
            max_channels,
        })
    }

    fn query_input_config(device: &cpal::Device) -> (Vec<u32>, u16) {
        if let Ok(configs) = device.supported_input_configs() {
            Self::extract_config_info(configs)
        } else {
            (vec![], 2)
        }
    }

    fn query_output_config(device: &cpal::Device) -> (Vec<u32>, u16) {
        if let Ok(configs) = device.supported_output_configs() {
            Self::extract_config_info(configs)
        } else {
            (vec![], 2)
        }
    }

    fn extract_config_info(
        configs: impl Iterator<Item = cpal::SupportedStreamConfigRange>,
    ) -> (Vec<u32>, u16) {
        let mut sample_rates = Vec::new();
        let mut max_channels = 0u16;

        // Common sample rates to check
        const COMMON_RATES: [u32; 6] = [44100, 48000, 88200, 96000, 176400, 192000];

        for config in configs {
            max_channels = max_channels.max(config.channels());

            let min = config.min_sample_rate().0;
            let max = config.max_sample_rate().0;

            for &rate in &COMMON_RATES {
                if rate >= min && rate <= max && !sample_rates.contains(&rate) {
                    sample_rates.push(rate);
                }
            }
        }

        sample_rates.sort_unstable();
        (sample_rates, max_channels)
    }
}

/// Resolve an input device: by exact name, or the host default when `None`.
pub fn resolve_input(name: Option<&str>) -> EngineResult<cpal::Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or(EngineError::NoDevicesFound),
        Some(wanted) => host
            .input_devices()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string())),
    }
}

/// Resolve an output device: by exact name, or the host default when `None`.
pub fn resolve_output(name: Option<&str>) -> EngineResult<cpal::Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or(EngineError::NoDevicesFound),
        Some(wanted) => host
            .output_devices()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: Hardware-dependent tests are marked with #[ignore]
    // Run them with: cargo test -- --ignored

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_enumerate_all_devices() {
        let devices = AudioDevice::enumerate_all();
        assert!(devices.is_ok());
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_resolve_default_input() {
        if let Ok(device) = resolve_input(None) {
            assert!(device.name().is_ok());
        }
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_resolve_unknown_device_fails() {
        let err = resolve_input(Some("definitely-not-a-device"));
        assert!(matches!(err, Err(EngineError::DeviceNotFound(_))));
    }
}
