//! Input device enumeration through the default cpal host.

use cpal::traits::{DeviceTrait, HostTrait};

use wav_recorder_core::{AudioSource, RecorderError};

use crate::permissions::map_devices_error;

/// List input devices on the default host.
pub fn list_input_devices() -> Result<Vec<AudioSource>, RecorderError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host.input_devices().map_err(map_devices_error)?;
    let mut sources = Vec::new();
    for device in devices {
        let name = match device.name() {
            Ok(name) => name,
            Err(e) => {
                log::warn!("skipping input device without a name: {}", e);
                continue;
            }
        };
        sources.push(AudioSource {
            id: name.clone(),
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
            transport_type: None,
        });
    }
    Ok(sources)
}

/// Resolve an input device by name, or the host default when `name` is `None`.
pub fn find_input_device(name: Option<&str>) -> Result<cpal::Device, RecorderError> {
    let host = cpal::default_host();
    let Some(name) = name else {
        return host.default_input_device().ok_or(RecorderError::DeviceUnavailable);
    };

    let mut devices = host.input_devices().map_err(map_devices_error)?;
    devices
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or(RecorderError::DeviceUnavailable)
}
