//! Mapping of host audio errors onto the recorder's error taxonomy.
//!
//! cpal has no dedicated "permission denied" error. Hosts report a denied
//! microphone (macOS privacy settings, Windows privacy toggle, a sandboxed
//! PulseAudio/PipeWire client) as a backend-specific message, so those
//! messages are classified by content.

use wav_recorder_core::RecorderError;

const PERMISSION_MARKERS: &[&str] = &["permission", "denied", "not authorized", "unauthorized", "0x80070005"];

const UNAVAILABLE_MARKERS: &[&str] = &["not available", "no such device", "disconnected", "not found", "busy", "in use"];

/// Classify a backend-specific error message.
pub fn classify_backend_error(message: &str) -> RecorderError {
    let lower = message.to_ascii_lowercase();
    if PERMISSION_MARKERS.iter().any(|m| lower.contains(m)) {
        RecorderError::PermissionDenied
    } else if UNAVAILABLE_MARKERS.iter().any(|m| lower.contains(m)) {
        RecorderError::DeviceUnavailable
    } else {
        RecorderError::Unknown(message.to_string())
    }
}

#[cfg(feature = "cpal")]
mod host {
    use cpal::traits::{DeviceTrait, HostTrait};
    use cpal::{BuildStreamError, DefaultStreamConfigError, DevicesError, PlayStreamError, StreamError};

    use super::classify_backend_error;
    use wav_recorder_core::RecorderError;

    pub fn map_devices_error(error: DevicesError) -> RecorderError {
        match error {
            DevicesError::BackendSpecific { err } => classify_backend_error(&err.description),
        }
    }

    pub fn map_default_config_error(error: DefaultStreamConfigError) -> RecorderError {
        match error {
            DefaultStreamConfigError::DeviceNotAvailable => RecorderError::DeviceUnavailable,
            DefaultStreamConfigError::StreamTypeNotSupported => RecorderError::DeviceUnavailable,
            DefaultStreamConfigError::BackendSpecific { err } => classify_backend_error(&err.description),
        }
    }

    pub fn map_build_error(error: BuildStreamError) -> RecorderError {
        match error {
            BuildStreamError::DeviceNotAvailable => RecorderError::DeviceUnavailable,
            BuildStreamError::StreamConfigNotSupported | BuildStreamError::InvalidArgument => {
                RecorderError::ConfigurationFailed(error.to_string())
            }
            BuildStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
            other => RecorderError::Unknown(other.to_string()),
        }
    }

    pub fn map_play_error(error: PlayStreamError) -> RecorderError {
        match error {
            PlayStreamError::DeviceNotAvailable => RecorderError::DeviceUnavailable,
            PlayStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
        }
    }

    /// Errors raised by a running stream always end the recording.
    pub fn map_stream_error(error: StreamError) -> RecorderError {
        match error {
            StreamError::DeviceNotAvailable => RecorderError::DeviceLost("device not available".into()),
            StreamError::BackendSpecific { err } => RecorderError::DeviceLost(err.description),
        }
    }

    /// Check whether the default microphone can be opened.
    ///
    /// Returns `Ok(false)` when the host reports the device as denied.
    pub fn check_microphone_permission() -> Result<bool, RecorderError> {
        let host = cpal::default_host();
        let Some(device) = host.default_input_device() else {
            return Err(RecorderError::DeviceUnavailable);
        };
        match device.default_input_config() {
            Ok(_) => Ok(true),
            Err(e) => match map_default_config_error(e) {
                RecorderError::PermissionDenied => Ok(false),
                other => {
                    log::warn!("unexpected error checking mic permission: {}", other);
                    Err(other)
                }
            },
        }
    }
}

#[cfg(feature = "cpal")]
pub use host::*;
