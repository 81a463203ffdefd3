use std::fmt;

use uuid::Uuid;

use crate::models::audio_models::AudioFrame;
use crate::models::config::RecordingConfig;

/// Identity of one export request, used to route its result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Messages from the capture side to the consumer thread.
///
/// Delivered strictly in send order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set the format used by subsequent exports.
    Init { config: RecordingConfig },
    /// Append one captured frame.
    Record { frame: AudioFrame },
    /// Encode everything accumulated so far and reply to `request_id`.
    ExportWav { request_id: RequestId, mime_type: String },
    /// Drop all accumulated frames.
    Clear,
    /// Stop the consumer loop.
    Shutdown,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Record { .. } => "record",
            Self::ExportWav { .. } => "exportWAV",
            Self::Clear => "clear",
            Self::Shutdown => "shutdown",
        }
    }
}
