use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::AudioSource;
use crate::models::config::RecordingConfig;
use crate::models::error::RecorderError;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider, DeviceErrorCallback};

#[derive(Default)]
struct MockState {
    on_buffer: Option<AudioBufferCallback>,
    on_error: Option<DeviceErrorCallback>,
    active: bool,
    start_calls: usize,
    stop_calls: usize,
    fail_start: Option<RecorderError>,
    unavailable: bool,
    retain_callbacks: bool,
}

/// Test-side handle to a fake input device. Buffers are delivered
/// synchronously on the calling thread.
#[derive(Clone, Default)]
pub(crate) struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn provider(&self) -> MockProvider {
        MockProvider {
            device: self.clone(),
            sample_rate: 8000,
        }
    }

    pub(crate) fn deliver(&self, samples: &[f32], channels: u16) {
        let callback = self.state.lock().on_buffer.clone();
        if let Some(callback) = callback {
            callback(samples, channels);
        }
    }

    pub(crate) fn lose_device(&self, reason: &str) {
        let callback = {
            let mut s = self.state.lock();
            s.active = false;
            s.on_error.clone()
        };
        if let Some(callback) = callback {
            callback(RecorderError::DeviceLost(reason.into()));
        }
    }

    pub(crate) fn fail_next_start(&self, error: RecorderError) {
        self.state.lock().fail_start = Some(error);
    }

    /// Keep delivering through the old callbacks after `stop`, like a
    /// driver that fires one more buffer during teardown.
    pub(crate) fn retain_callbacks_on_stop(&self) {
        self.state.lock().retain_callbacks = true;
    }

    pub(crate) fn unplug(&self) {
        self.state.lock().unavailable = true;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub(crate) fn start_calls(&self) -> usize {
        self.state.lock().start_calls
    }

    pub(crate) fn stop_calls(&self) -> usize {
        self.state.lock().stop_calls
    }
}

pub(crate) struct MockProvider {
    device: MockDevice,
    sample_rate: u32,
}

impl CaptureProvider for MockProvider {
    fn is_available(&self) -> bool {
        !self.device.state.lock().unavailable
    }

    fn native_sample_rate(&self) -> Result<u32, RecorderError> {
        if !self.is_available() {
            return Err(RecorderError::DeviceUnavailable);
        }
        Ok(self.sample_rate)
    }

    fn start(
        &mut self,
        _config: &RecordingConfig,
        on_buffer: AudioBufferCallback,
        on_error: DeviceErrorCallback,
    ) -> Result<(), RecorderError> {
        let mut s = self.device.state.lock();
        s.start_calls += 1;
        if let Some(err) = s.fail_start.take() {
            return Err(err);
        }
        s.on_buffer = Some(on_buffer);
        s.on_error = Some(on_error);
        s.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        let mut s = self.device.state.lock();
        s.stop_calls += 1;
        if !s.retain_callbacks {
            s.on_buffer = None;
            s.on_error = None;
        }
        s.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.device.is_active()
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: "mock-mic".into(),
            name: "Mock Microphone".into(),
            is_default: true,
            transport_type: None,
        }
    }
}
