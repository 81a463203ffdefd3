use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::processing::wav_format::{WavHeader, WAV_HEADER_SIZE};

/// An exported recording: WAV bytes tagged with a media type.
///
/// Immutable once produced. Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct WavBlob {
    id: Uuid,
    bytes: Arc<[u8]>,
    mime_type: String,
    sample_rate: u32,
    num_channels: u16,
    total_sample_count: usize,
    created_at: DateTime<Utc>,
}

impl WavBlob {
    pub fn new(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        sample_rate: u32,
        num_channels: u16,
        total_sample_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            sample_rate,
            num_channels,
            total_sample_count,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    pub fn total_sample_count(&self) -> usize {
        self.total_sample_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// PCM payload following the 44-byte header.
    pub fn pcm_data(&self) -> &[u8] {
        self.bytes.get(WAV_HEADER_SIZE..).unwrap_or(&[])
    }

    pub fn header(&self) -> Option<WavHeader> {
        WavHeader::parse(&self.bytes)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_sample_count as f64 / self.sample_rate as f64
    }

    /// SHA-256 hex digest of the blob bytes.
    pub fn checksum(&self) -> String {
        let digest = Sha256::digest(&self.bytes[..]);
        hex_encode(&digest)
    }

    pub fn metadata(&self) -> BlobMetadata {
        BlobMetadata {
            id: self.id.to_string(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.bytes.len(),
            sample_rate: self.sample_rate,
            num_channels: self.num_channels,
            duration_secs: self.duration_secs(),
            checksum: self.checksum(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// Serializable summary of a blob, for handing to callers that only need
/// to describe the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub id: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub sample_rate: u32,
    pub num_channels: u16,
    pub duration_secs: f64,
    pub checksum: String,
    pub created_at: String,
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
