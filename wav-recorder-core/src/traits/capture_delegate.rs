use crate::models::blob::WavBlob;
use crate::models::error::RecorderError;
use crate::models::state::SessionState;

/// Event delegate for recorder notifications.
///
/// `on_error` may be called from the device's audio thread; the other
/// methods are called from whichever thread drives the orchestrator.
/// Implementations should marshal to a UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called after every state transition.
    fn on_state_changed(&self, state: SessionState);

    /// Called when an error occurs during capture or export.
    fn on_error(&self, error: &RecorderError);

    /// Called when `stop` has produced a blob.
    fn on_recording_finished(&self, blob: &WavBlob);
}
