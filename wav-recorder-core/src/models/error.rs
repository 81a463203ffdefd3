use thiserror::Error;

use super::state::SessionState;

/// Errors surfaced by the recorder.
///
/// Device acquisition failures are returned synchronously from `start`
/// and are never retried. Encoding has no failure mode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceUnavailable,

    #[error("device lost during capture: {0}")]
    DeviceLost(String),

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("command channel closed")]
    ChannelClosed,

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl RecorderError {
    /// True for errors raised while acquiring the input device.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::DeviceUnavailable | Self::DeviceLost(_)
        )
    }
}
