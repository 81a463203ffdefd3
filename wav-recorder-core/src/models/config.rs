use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::RecorderError;

/// Default frame size in sample frames.
pub const DEFAULT_BUFFER_LEN: usize = 4096;

/// Default media type attached to exported blobs.
pub const DEFAULT_MIME_TYPE: &str = "audio/wav";

/// Largest accepted frame size in sample frames.
pub const MAX_BUFFER_LEN: usize = 1 << 16;

/// Highest accepted device sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Highest channel count a session can carry.
pub const MAX_CHANNELS: u16 = 2;

/// User-facing recorder options.
///
/// The sample rate is deliberately absent: it is always taken from the
/// input device when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Frame size in sample frames (default: 4096). Powers of two are recommended.
    pub buffer_len: usize,

    /// Number of output channels (default: 1).
    pub num_channels: u16,

    /// Media type of exported blobs (default: "audio/wav").
    pub mime_type: String,
}

impl RecorderSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_len == 0 {
            return Err("buffer length must be positive".into());
        }
        if self.buffer_len > MAX_BUFFER_LEN {
            return Err(format!(
                "buffer length {} exceeds the maximum of {}",
                self.buffer_len, MAX_BUFFER_LEN
            ));
        }
        if !(1..=MAX_CHANNELS).contains(&self.num_channels) {
            return Err(format!("unsupported channel count: {}", self.num_channels));
        }
        if self.mime_type.trim().is_empty() {
            return Err("mime type must not be empty".into());
        }
        if !self.buffer_len.is_power_of_two() {
            log::warn!(
                "buffer length {} is not a power of two; some devices may reject it",
                self.buffer_len
            );
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, RecorderError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| RecorderError::ConfigurationFailed(format!("invalid settings: {}", e)))?;
        settings.validate().map_err(RecorderError::ConfigurationFailed)?;
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RecorderError> {
        let json = fs::read_to_string(path).map_err(|e| {
            RecorderError::ConfigurationFailed(format!(
                "failed to read settings {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Combine with the device sample rate into a per-session config.
    pub fn with_sample_rate(&self, sample_rate: u32) -> RecordingConfig {
        RecordingConfig {
            sample_rate,
            num_channels: self.num_channels,
            buffer_len: self.buffer_len,
            mime_type: self.mime_type.clone(),
        }
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            buffer_len: DEFAULT_BUFFER_LEN,
            num_channels: 1,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

/// Format parameters fixed for the lifetime of one recording session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingConfig {
    pub sample_rate: u32,
    pub num_channels: u16,
    pub buffer_len: usize,
    pub mime_type: String,
}

impl RecordingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(format!("unsupported sample rate: {} Hz", self.sample_rate));
        }
        if !(1..=MAX_CHANNELS).contains(&self.num_channels) {
            return Err(format!("unsupported channel count: {}", self.num_channels));
        }
        if self.buffer_len == 0 || self.buffer_len > MAX_BUFFER_LEN {
            return Err(format!("unsupported buffer length: {}", self.buffer_len));
        }
        Ok(())
    }
}
