//! # wav-recorder-core
//!
//! Platform-agnostic microphone recording core.
//!
//! Captured frames cross from the device's audio thread to a single
//! encoder thread over an ordered command channel. On `stop`, everything
//! accumulated is encoded into an in-memory RIFF/WAVE (PCM16) blob.
//! Platform backends implement the `CaptureProvider` trait and plug into
//! the generic `RecordingOrchestrator`.
//!
//! ## Architecture
//!
//! ```text
//! wav-recorder-core (this crate)
//! ├── traits/       ← CaptureProvider, RecorderDelegate
//! ├── models/       ← RecorderError, SessionState, RecorderSettings, AudioFrame, WavBlob
//! ├── processing/   ← WAV encoding, SampleAccumulator, FrameChunker
//! ├── channel/      ← Command, CommandChannel, export request correlation
//! └── session/      ← AudioCaptureSession, RecordingOrchestrator
//! ```

pub mod channel;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use channel::{Command, CommandChannel, CommandSender, ExportTicket, RequestId};
pub use models::audio_models::{AudioFrame, AudioSource, AudioTransportType, CaptureDiagnostics};
pub use models::blob::{BlobMetadata, WavBlob};
pub use models::config::{RecorderSettings, RecordingConfig};
pub use models::error::RecorderError;
pub use models::state::SessionState;
pub use processing::accumulator::SampleAccumulator;
pub use processing::frame_chunker::FrameChunker;
pub use processing::wav_format::{encode as encode_wav, WavHeader};
pub use session::capture::AudioCaptureSession;
pub use session::orchestrator::RecordingOrchestrator;
pub use traits::capture_delegate::RecorderDelegate;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider, DeviceErrorCallback};
