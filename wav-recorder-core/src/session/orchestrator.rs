use std::sync::Arc;

use crate::channel::{Command, CommandChannel};
use crate::models::audio_models::{AudioSource, CaptureDiagnostics};
use crate::models::blob::WavBlob;
use crate::models::config::{RecorderSettings, RecordingConfig};
use crate::models::error::RecorderError;
use crate::models::state::SessionState;
use crate::session::capture::AudioCaptureSession;
use crate::traits::capture_delegate::RecorderDelegate;
use crate::traits::capture_provider::CaptureProvider;

/// Public entry point: starts and stops recordings and holds the most
/// recent export.
///
/// Data flow:
/// ```text
/// [CaptureProvider] → [AudioCaptureSession] → Record … → [CommandChannel]
///                                                            ↓
///                        stop() ← WavBlob ← ExportWav ← [SampleAccumulator]
/// ```
///
/// One instance owns one capture session and one encoder thread for its
/// whole lifetime. Each cycle is `Idle → Capturing → Exporting → Idle`.
pub struct RecordingOrchestrator<P: CaptureProvider> {
    // Declared before `channel` so the device stops before the encoder thread.
    session: AudioCaptureSession<P>,
    channel: CommandChannel,
    settings: RecorderSettings,
    config: Option<RecordingConfig>,
    state: SessionState,
    blob: Option<WavBlob>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl<P: CaptureProvider> RecordingOrchestrator<P> {
    pub fn new(provider: P, settings: RecorderSettings) -> Result<Self, RecorderError> {
        settings.validate().map_err(RecorderError::ConfigurationFailed)?;
        Ok(Self {
            session: AudioCaptureSession::new(provider),
            channel: CommandChannel::spawn()?,
            settings,
            config: None,
            state: SessionState::Idle,
            blob: None,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        let hook = Arc::clone(&delegate);
        self.session.set_error_hook(Arc::new(move |error: RecorderError| hook.on_error(&error)));
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Format of the current or most recent session.
    pub fn config(&self) -> Option<&RecordingConfig> {
        self.config.as_ref()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.session.diagnostics()
    }

    pub fn device_info(&self) -> AudioSource {
        self.session.device_info()
    }

    /// Most recently exported recording.
    pub fn blob(&self) -> Option<&WavBlob> {
        self.blob.as_ref()
    }

    /// Forget the held recording. Accumulated samples are untouched.
    pub fn clear_blob(&mut self) {
        self.blob = None;
    }

    /// Start a new recording. Transitions: idle → capturing.
    ///
    /// Clears previously accumulated samples, sends the session format to
    /// the encoder, then opens the device. `on_started` runs once the
    /// device is delivering. On failure the state stays idle.
    pub fn start<F>(&mut self, on_started: F) -> Result<(), RecorderError>
    where
        F: FnOnce(&RecordingConfig),
    {
        if !self.state.is_idle() {
            return Err(RecorderError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        let config = match self.open_capture() {
            Ok(config) => config,
            Err(e) => {
                self.notify_error(&e);
                return Err(e);
            }
        };

        on_started(&config);
        self.config = Some(config);
        self.set_state(SessionState::Capturing);
        Ok(())
    }

    /// Stop recording and export. Transitions: capturing → exporting → idle.
    ///
    /// Blocks until the encoder has produced the blob for every frame
    /// captured so far, keeps it as the current blob, then releases the
    /// device. Once past the state check this always ends idle.
    pub fn stop(&mut self) -> Result<WavBlob, RecorderError> {
        if !self.state.is_capturing() {
            return Err(RecorderError::InvalidState {
                operation: "stop",
                state: self.state,
            });
        }
        if let Some(fault) = self.session.take_fault() {
            self.abort_capture();
            return Err(fault);
        }

        self.set_state(SessionState::Exporting);

        let mime_type = self
            .config
            .as_ref()
            .map(|c| c.mime_type.clone())
            .unwrap_or_else(|| self.settings.mime_type.clone());
        let result = self
            .channel
            .request_export(mime_type)
            .and_then(|ticket| ticket.wait());

        match result {
            Ok(blob) => {
                self.blob = Some(blob.clone());
                self.session.close();
                self.set_state(SessionState::Idle);
                log::info!(
                    "recording finished: {:.2}s, {} bytes",
                    blob.duration_secs(),
                    blob.len()
                );
                if let Some(ref delegate) = self.delegate {
                    delegate.on_recording_finished(&blob);
                }
                Ok(blob)
            }
            Err(e) => {
                log::error!("export failed: {}", e);
                self.session.close();
                self.set_state(SessionState::Idle);
                self.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Surface a device failure that happened while capturing.
    ///
    /// A lost device ends the recording: the device is released, captured
    /// samples and the held blob are discarded, and the state returns to idle.
    pub fn check_device(&mut self) -> Result<(), RecorderError> {
        if !self.state.is_capturing() {
            return Ok(());
        }
        match self.session.take_fault() {
            Some(fault) => {
                self.abort_capture();
                Err(fault)
            }
            None => Ok(()),
        }
    }

    fn open_capture(&mut self) -> Result<RecordingConfig, RecorderError> {
        let sample_rate = self.session.native_sample_rate()?;
        let config = self.settings.with_sample_rate(sample_rate);
        config.validate().map_err(RecorderError::ConfigurationFailed)?;

        self.channel.send(Command::Clear)?;
        self.channel.send(Command::Init { config: config.clone() })?;
        self.session.open(&config, self.channel.sender())?;
        Ok(config)
    }

    fn abort_capture(&mut self) {
        log::warn!("aborting recording after device loss");
        self.session.close();
        if let Err(e) = self.channel.send(Command::Clear) {
            log::error!("failed to clear samples: {}", e);
        }
        self.blob = None;
        self.set_state(SessionState::Idle);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::debug!("recorder state {} -> {}", self.state, state);
        }
        self.state = state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }

    fn notify_error(&self, error: &RecorderError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}
