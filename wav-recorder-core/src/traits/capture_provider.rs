use std::sync::Arc;

use crate::models::audio_models::AudioSource;
use crate::models::config::RecordingConfig;
use crate::models::error::RecorderError;

/// Callback invoked when the device delivers a buffer.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples as delivered by the device.
/// - `channels`: Number of interleaved channels in `samples`.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], u16) + Send + Sync + 'static>;

/// Callback invoked when the device fails after capture has started.
pub type DeviceErrorCallback = Arc<dyn Fn(RecorderError) + Send + Sync + 'static>;

/// Interface for platform-specific microphone backends.
///
/// Implemented by:
/// - `CpalMicCapture` (`wav-recorder-cpal`)
pub trait CaptureProvider: Send + Sync {
    /// Whether an input device is currently available.
    fn is_available(&self) -> bool;

    /// Sample rate the device will deliver at. Fails with
    /// `DeviceUnavailable` when there is no device to ask.
    fn native_sample_rate(&self) -> Result<u32, RecorderError>;

    /// Acquire the device and start delivering buffers via `on_buffer`.
    ///
    /// Both callbacks fire on the device's audio thread; keep them short
    /// and never block in them.
    fn start(
        &mut self,
        config: &RecordingConfig,
        on_buffer: AudioBufferCallback,
        on_error: DeviceErrorCallback,
    ) -> Result<(), RecorderError>;

    /// Stop delivery and release the device.
    fn stop(&mut self) -> Result<(), RecorderError>;

    /// Whether the device is still held.
    fn is_active(&self) -> bool;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}
