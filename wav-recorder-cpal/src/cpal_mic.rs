//! cpal microphone capture provider.
//!
//! `cpal::Stream` is not `Send` on every host, so the stream lives on a
//! dedicated thread that builds it, reports the outcome, and holds it
//! until asked to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, FromSample, SampleFormat, SizedSample, SupportedBufferSize};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use wav_recorder_core::{
    AudioBufferCallback, AudioSource, CaptureProvider, DeviceErrorCallback, RecorderError,
    RecordingConfig,
};

use crate::device_enumerator::find_input_device;
use crate::permissions::{map_build_error, map_default_config_error, map_play_error, map_stream_error};

/// Microphone capture on top of cpal.
///
/// Requests the configured frame size from the host when it supports it;
/// the core re-blocks whatever buffer size actually arrives.
pub struct CpalMicCapture {
    device_name: Option<String>,
    running: Arc<AtomicBool>,
    stop_tx: Mutex<Option<Sender<()>>>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalMicCapture {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self::build(None)
    }

    /// Capture from the input device with this name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()))
    }

    fn build(device_name: Option<String>) -> Self {
        Self {
            device_name,
            running: Arc::new(AtomicBool::new(false)),
            stop_tx: Mutex::new(None),
            capture_handle: Mutex::new(None),
        }
    }
}

impl CaptureProvider for CpalMicCapture {
    fn is_available(&self) -> bool {
        find_input_device(self.device_name.as_deref()).is_ok()
    }

    fn native_sample_rate(&self) -> Result<u32, RecorderError> {
        let device = find_input_device(self.device_name.as_deref())?;
        let supported = device.default_input_config().map_err(map_default_config_error)?;
        Ok(supported.sample_rate().0)
    }

    fn start(
        &mut self,
        config: &RecordingConfig,
        on_buffer: AudioBufferCallback,
        on_error: DeviceErrorCallback,
    ) -> Result<(), RecorderError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(RecorderError::ConfigurationFailed("mic capture already running".into()));
        }

        let (ready_tx, ready_rx) = bounded::<Result<(), RecorderError>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let device_name = self.device_name.clone();
        let buffer_len = config.buffer_len;

        // A stream error ends the capture; `stop` still releases the thread.
        let running = Arc::clone(&self.running);
        let on_error: DeviceErrorCallback = Arc::new(move |error: RecorderError| {
            running.store(false, Ordering::SeqCst);
            on_error(error);
        });

        let handle = thread::Builder::new()
            .name("cpal-mic-capture".into())
            .spawn(move || {
                match open_stream(device_name.as_deref(), buffer_len, on_buffer, on_error) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        // Sender dropped or explicit stop both end the wait.
                        let _ = stop_rx.recv();
                        drop(stream);
                        log::debug!("cpal stream released");
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| RecorderError::Unknown(format!("failed to spawn mic thread: {}", e)))?;

        let opened = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(RecorderError::Unknown("mic thread exited before opening".into())));
        if let Err(e) = opened {
            let _ = handle.join();
            return Err(e);
        }

        self.running.store(true, Ordering::SeqCst);
        *self.stop_tx.lock() = Some(stop_tx);
        *self.capture_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.capture_handle.lock().take() {
            if handle.join().is_err() {
                return Err(RecorderError::Unknown("mic thread panicked".into()));
            }
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn device_info(&self) -> AudioSource {
        AudioSource {
            id: self.device_name.clone().unwrap_or_else(|| "default-mic".into()),
            name: self.device_name.clone().unwrap_or_else(|| "Default Microphone".into()),
            is_default: self.device_name.is_none(),
            transport_type: None,
        }
    }
}

impl Drop for CpalMicCapture {
    fn drop(&mut self) {
        // The stream thread may still be parked after a stream error.
        let _ = self.stop();
    }
}

/// Build and start an input stream delivering f32 buffers.
fn open_stream(
    device_name: Option<&str>,
    buffer_len: usize,
    on_buffer: AudioBufferCallback,
    on_error: DeviceErrorCallback,
) -> Result<cpal::Stream, RecorderError> {
    let device = find_input_device(device_name)?;
    let supported = device.default_input_config().map_err(map_default_config_error)?;
    let channels = supported.channels();
    let sample_format = supported.sample_format();

    let mut stream_config: cpal::StreamConfig = supported.config();
    if let (SupportedBufferSize::Range { min, max }, Ok(wanted)) = (supported.buffer_size(), u32::try_from(buffer_len)) {
        if (*min..=*max).contains(&wanted) {
            stream_config.buffer_size = BufferSize::Fixed(wanted);
        }
    }

    log::info!(
        "opening {} ({} Hz, {} ch, {:?}, buffer {:?})",
        device.name().unwrap_or_else(|_| "input device".into()),
        stream_config.sample_rate.0,
        channels,
        sample_format,
        stream_config.buffer_size
    );

    let stream = build_stream_with_fallback(&device, &mut stream_config, sample_format, &on_buffer, &on_error)?;
    stream.play().map_err(map_play_error)?;
    Ok(stream)
}

/// Retry with the host's default buffer size if the fixed one is refused.
fn build_stream_with_fallback(
    device: &cpal::Device,
    stream_config: &mut cpal::StreamConfig,
    sample_format: SampleFormat,
    on_buffer: &AudioBufferCallback,
    on_error: &DeviceErrorCallback,
) -> Result<cpal::Stream, RecorderError> {
    match build_for_format(device, stream_config, sample_format, on_buffer, on_error) {
        Err(RecorderError::ConfigurationFailed(reason)) if stream_config.buffer_size != BufferSize::Default => {
            log::warn!("fixed buffer size rejected ({}); using host default", reason);
            stream_config.buffer_size = BufferSize::Default;
            build_for_format(device, stream_config, sample_format, on_buffer, on_error)
        }
        other => other,
    }
}

fn build_for_format(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    sample_format: SampleFormat,
    on_buffer: &AudioBufferCallback,
    on_error: &DeviceErrorCallback,
) -> Result<cpal::Stream, RecorderError> {
    match sample_format {
        SampleFormat::F32 => build_input::<f32>(device, stream_config, on_buffer, on_error),
        SampleFormat::I16 => build_input::<i16>(device, stream_config, on_buffer, on_error),
        SampleFormat::U16 => build_input::<u16>(device, stream_config, on_buffer, on_error),
        SampleFormat::I32 => build_input::<i32>(device, stream_config, on_buffer, on_error),
        other => Err(RecorderError::ConfigurationFailed(format!(
            "unsupported sample format: {:?}",
            other
        ))),
    }
}

fn build_input<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    on_buffer: &AudioBufferCallback,
    on_error: &DeviceErrorCallback,
) -> Result<cpal::Stream, RecorderError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = stream_config.channels;
    let on_buffer = Arc::clone(on_buffer);
    let on_error = Arc::clone(on_error);
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            stream_config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                scratch.clear();
                scratch.extend(data.iter().map(|&s| f32::from_sample(s)));
                on_buffer(&scratch[..], channels);
            },
            move |err: cpal::StreamError| on_error(map_stream_error(err)),
            None,
        )
        .map_err(map_build_error)
}
