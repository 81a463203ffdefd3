//! # wav-recorder-cpal
//!
//! Cross-platform microphone backend for wav-recorder, built on cpal.
//!
//! Provides (with the `cpal` feature):
//! - `CpalMicCapture` — `CaptureProvider` for the default or a named input device
//! - `device_enumerator` — input device listing
//! - `permissions` — host error classification and a microphone access check
//!
//! The feature is off by default because cpal links against the host's
//! audio system libraries (ALSA on Linux).
//!
//! ## Usage
//! ```ignore
//! use wav_recorder_cpal::CpalMicCapture;
//! use wav_recorder_core::{RecorderSettings, RecordingOrchestrator};
//!
//! let mut recorder = RecordingOrchestrator::new(CpalMicCapture::default_device(), RecorderSettings::default())?;
//! recorder.start(|config| println!("recording at {} Hz", config.sample_rate))?;
//! // ...
//! let blob = recorder.stop()?;
//! ```

pub mod permissions;

#[cfg(feature = "cpal")]
pub mod cpal_mic;
#[cfg(feature = "cpal")]
pub mod device_enumerator;

#[cfg(feature = "cpal")]
pub use cpal_mic::CpalMicCapture;
#[cfg(feature = "cpal")]
pub use device_enumerator::list_input_devices;
