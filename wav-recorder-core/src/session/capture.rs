use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::channel::{Command, CommandSender};
use crate::models::audio_models::{AudioSource, CaptureDiagnostics};
use crate::models::config::RecordingConfig;
use crate::models::error::RecorderError;
use crate::models::state::SessionState;
use crate::processing::frame_chunker::FrameChunker;
use crate::processing::wav_format;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider, DeviceErrorCallback};

/// State touched from the device's audio thread.
struct CaptureShared {
    /// Cleared on close; buffers arriving afterwards are ignored.
    connected: AtomicBool,
    chunker: Mutex<FrameChunker>,
    diagnostics: Mutex<CaptureDiagnostics>,
    fault: Mutex<Option<RecorderError>>,
}

impl CaptureShared {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            chunker: Mutex::new(FrameChunker::new(0, 1)),
            diagnostics: Mutex::new(CaptureDiagnostics::default()),
            fault: Mutex::new(None),
        }
    }
}

/// Owns the input device for one recording at a time.
///
/// While open, every complete frame of `buffer_len` sample frames is
/// posted as a `Record` command without blocking the audio thread. The
/// device is released by `close`, or on drop if the caller never closes.
pub struct AudioCaptureSession<P: CaptureProvider> {
    provider: P,
    shared: Arc<CaptureShared>,
    error_hook: Option<DeviceErrorCallback>,
    is_open: bool,
}

impl<P: CaptureProvider> AudioCaptureSession<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            shared: Arc::new(CaptureShared::new()),
            error_hook: None,
            is_open: false,
        }
    }

    /// Extra listener for device failures after `open`, called on the
    /// audio thread.
    pub fn set_error_hook(&mut self, hook: DeviceErrorCallback) {
        self.error_hook = Some(hook);
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    pub fn native_sample_rate(&self) -> Result<u32, RecorderError> {
        self.provider.native_sample_rate()
    }

    pub fn device_info(&self) -> AudioSource {
        self.provider.device_info()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        *self.shared.diagnostics.lock()
    }

    /// Whether the device has failed since `open`.
    pub fn has_fault(&self) -> bool {
        self.shared.fault.lock().is_some()
    }

    /// Take the latched device failure, if any.
    pub fn take_fault(&self) -> Option<RecorderError> {
        self.shared.fault.lock().take()
    }

    /// Acquire the device and start forwarding frames to `sender`.
    ///
    /// Acquisition errors are returned as-is and not retried.
    pub fn open(&mut self, config: &RecordingConfig, sender: CommandSender) -> Result<(), RecorderError> {
        if self.is_open {
            return Err(RecorderError::InvalidState {
                operation: "open capture session",
                state: SessionState::Capturing,
            });
        }
        config.validate().map_err(RecorderError::ConfigurationFailed)?;

        *self.shared.chunker.lock() = FrameChunker::new(config.buffer_len, config.num_channels);
        *self.shared.diagnostics.lock() = CaptureDiagnostics::default();
        *self.shared.fault.lock() = None;

        let on_buffer = Self::buffer_callback(Arc::clone(&self.shared), sender, config.num_channels);
        let on_error = Self::error_callback(Arc::clone(&self.shared), self.error_hook.clone());

        self.shared.connected.store(true, Ordering::Release);
        if let Err(e) = self.provider.start(config, on_buffer, on_error) {
            self.shared.connected.store(false, Ordering::Release);
            log::error!("failed to open input device: {}", e);
            return Err(e);
        }

        self.is_open = true;
        log::info!(
            "capture opened on {} ({} Hz, frames of {})",
            self.provider.device_info().name,
            config.sample_rate,
            config.buffer_len
        );
        Ok(())
    }

    /// Disconnect from the device, release it, and drop any partial frame.
    /// Calling this on a closed session does nothing.
    ///
    /// The provider is stopped even after it has reported a failure, so a
    /// lost device never keeps its callbacks.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.is_open = false;
        self.shared.connected.store(false, Ordering::Release);

        if !self.provider.is_active() {
            log::debug!("input device already inactive; releasing it anyway");
        }
        if let Err(e) = self.provider.stop() {
            log::error!("failed to stop input device: {}", e);
        }

        let mut chunker = self.shared.chunker.lock();
        if chunker.pending() > 0 {
            log::debug!("dropping {} samples of partial frame", chunker.pending());
        }
        chunker.reset();
        drop(chunker);

        let diagnostics = self.diagnostics();
        log::info!(
            "capture closed: {} frames posted, {} dropped",
            diagnostics.frames_posted,
            diagnostics.frames_dropped
        );
    }

    fn buffer_callback(shared: Arc<CaptureShared>, sender: CommandSender, target_channels: u16) -> AudioBufferCallback {
        Arc::new(move |samples: &[f32], channels: u16| {
            if !shared.connected.load(Ordering::Acquire) {
                return;
            }
            let (samples, channels) = if target_channels == 1 && channels > 1 {
                (Cow::Owned(wav_format::downmix_to_mono(samples, channels as usize)), 1)
            } else {
                (Cow::Borrowed(samples), channels)
            };

            let frames = shared.chunker.lock().write(&samples, channels);

            let mut posted = 0u64;
            let mut dropped = 0u64;
            for frame in frames {
                match sender.send(Command::Record { frame }) {
                    Ok(()) => posted += 1,
                    Err(_) => dropped += 1,
                }
            }

            let mut d = shared.diagnostics.lock();
            d.callback_count += 1;
            d.samples_received += samples.len() as u64;
            d.frames_posted += posted;
            d.frames_dropped += dropped;
        })
    }

    fn error_callback(shared: Arc<CaptureShared>, hook: Option<DeviceErrorCallback>) -> DeviceErrorCallback {
        Arc::new(move |error: RecorderError| {
            log::error!("input device failed during capture: {}", error);
            let error = match error {
                RecorderError::DeviceLost(_) => error,
                other => RecorderError::DeviceLost(other.to_string()),
            };
            shared.fault.lock().get_or_insert_with(|| error.clone());
            if let Some(ref hook) = hook {
                hook(error);
            }
        })
    }
}

impl<P: CaptureProvider> Drop for AudioCaptureSession<P> {
    fn drop(&mut self) {
        self.close();
    }
}
