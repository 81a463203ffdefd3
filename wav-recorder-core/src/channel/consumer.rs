use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::command::{Command, RequestId};
use super::pending::{ExportTicket, PendingRequests};
use crate::models::blob::WavBlob;
use crate::models::config::RecordingConfig;
use crate::models::error::RecorderError;
use crate::processing::accumulator::SampleAccumulator;
use crate::processing::wav_format;

/// Cloneable producer side of the command channel.
///
/// `send` never blocks: the queue is unbounded, so memory grows with the
/// length of the recording until the consumer drains it.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
    pending: Arc<PendingRequests>,
}

impl CommandSender {
    pub fn send(&self, command: Command) -> Result<(), RecorderError> {
        self.tx.send(command).map_err(|_| RecorderError::ChannelClosed)
    }

    /// Queue an export and return a ticket for its result.
    ///
    /// The reply slot is registered before the command is queued so the
    /// consumer can never answer a request it does not know about.
    pub fn request_export(&self, mime_type: impl Into<String>) -> Result<ExportTicket, RecorderError> {
        let request_id = RequestId::new();
        let ticket = self.pending.register(request_id);
        let command = Command::ExportWav {
            request_id,
            mime_type: mime_type.into(),
        };
        if let Err(e) = self.send(command) {
            self.pending.cancel(request_id);
            return Err(e);
        }
        Ok(ticket)
    }

    /// Number of export requests still waiting for a reply.
    pub fn pending_exports(&self) -> usize {
        self.pending.len()
    }
}

/// FIFO command channel with a single consumer thread.
///
/// The consumer owns the `SampleAccumulator` and processes commands one
/// at a time, so every `Record` queued before an `ExportWav` is in that
/// export.
#[derive(Debug)]
pub struct CommandChannel {
    sender: CommandSender,
    handle: Option<thread::JoinHandle<()>>,
}

impl CommandChannel {
    pub fn spawn() -> Result<Self, RecorderError> {
        let (tx, rx) = unbounded();
        let pending = Arc::new(PendingRequests::new());

        let worker_pending = Arc::clone(&pending);
        let handle = thread::Builder::new()
            .name("wav-encoder".into())
            .spawn(move || run_consumer(rx, worker_pending))
            .map_err(|e| RecorderError::Unknown(format!("failed to spawn encoder thread: {}", e)))?;

        Ok(Self {
            sender: CommandSender { tx, pending },
            handle: Some(handle),
        })
    }

    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    pub fn send(&self, command: Command) -> Result<(), RecorderError> {
        self.sender.send(command)
    }

    pub fn request_export(&self, mime_type: impl Into<String>) -> Result<ExportTicket, RecorderError> {
        self.sender.request_export(mime_type)
    }

    /// Stop the consumer after it drains what is already queued.
    ///
    /// Requests that never got an answer fail with `ChannelClosed`.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.sender.send(Command::Shutdown);
        if handle.join().is_err() {
            log::error!("encoder thread panicked");
        }
        self.sender.pending.fail_all(RecorderError::ChannelClosed);
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_consumer(rx: Receiver<Command>, pending: Arc<PendingRequests>) {
    log::debug!("encoder thread started");
    let exit = ConsumerExit::new(rx, pending);
    let mut consumer = Consumer::new();
    // Ends on Shutdown or once every sender is gone.
    while let Some(command) = exit.recv() {
        if !consumer.handle(command, &exit.pending) {
            break;
        }
    }
    log::debug!("encoder thread stopped");
}

/// Tears down the consumer end of the channel, also when the loop unwinds.
///
/// The queue is disconnected before outstanding exports are failed, so a
/// request either reaches `fail_all` or is refused at `send`.
struct ConsumerExit {
    rx: Option<Receiver<Command>>,
    pending: Arc<PendingRequests>,
}

impl ConsumerExit {
    fn new(rx: Receiver<Command>, pending: Arc<PendingRequests>) -> Self {
        Self { rx: Some(rx), pending }
    }

    fn recv(&self) -> Option<Command> {
        self.rx.as_ref()?.recv().ok()
    }
}

impl Drop for ConsumerExit {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("encoder thread panicked; failing {} pending exports", self.pending.len());
        }
        drop(self.rx.take());
        self.pending.fail_all(RecorderError::ChannelClosed);
    }
}

/// Consumer-side state: the accumulator and the active session format.
#[derive(Debug, Default)]
pub(crate) struct Consumer {
    accumulator: SampleAccumulator,
    config: Option<RecordingConfig>,
}

impl Consumer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Apply one command. Returns false when the loop should stop.
    pub(crate) fn handle(&mut self, command: Command, pending: &PendingRequests) -> bool {
        match command {
            Command::Init { config } => match config.validate() {
                Ok(()) => {
                    log::debug!(
                        "init: {} Hz, {} ch, frames of {}",
                        config.sample_rate,
                        config.num_channels,
                        config.buffer_len
                    );
                    self.config = Some(config);
                }
                Err(reason) => {
                    log::error!("init rejected: {}", reason);
                    self.config = None;
                }
            },
            Command::Record { frame } => self.accumulator.record(frame),
            Command::ExportWav { request_id, mime_type } => {
                let result = self.export(&mime_type);
                if !pending.complete(request_id, result) {
                    log::warn!("export {} has no pending request; result dropped", request_id);
                }
            }
            Command::Clear => self.accumulator.clear(),
            Command::Shutdown => return false,
        }
        true
    }

    fn export(&self, mime_type: &str) -> Result<WavBlob, RecorderError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| RecorderError::ConfigurationFailed("export requested before init".into()))?;

        let (frames, total) = self.accumulator.snapshot();
        let bytes = wav_format::encode(frames, total, config.sample_rate, config.num_channels);
        log::debug!(
            "exported {} frames ({} samples, {} bytes)",
            frames.len(),
            total,
            bytes.len()
        );
        Ok(WavBlob::new(bytes, mime_type, config.sample_rate, config.num_channels, total))
    }

    #[cfg(test)]
    pub(crate) fn accumulator(&self) -> &SampleAccumulator {
        &self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::audio_models::AudioFrame;
    use crate::models::config::RecorderSettings;
    use crate::processing::wav_format::WavHeader;

    fn config(sample_rate: u32) -> RecordingConfig {
        RecorderSettings {
            buffer_len: 2,
            ..Default::default()
        }
        .with_sample_rate(sample_rate)
    }

    fn record(samples: &[f32]) -> Command {
        Command::Record {
            frame: AudioFrame::mono(samples.to_vec()),
        }
    }

    #[test]
    fn consumer_applies_commands_in_order() {
        let pending = PendingRequests::new();
        let mut consumer = Consumer::new();

        assert!(consumer.handle(Command::Init { config: config(8000) }, &pending));
        consumer.handle(record(&[0.5, -0.5]), &pending);
        consumer.handle(record(&[1.0, -1.0]), &pending);
        assert_eq!(consumer.accumulator().total_sample_count(), 4);

        let ticket = pending.register(RequestId::new());
        consumer.handle(
            Command::ExportWav {
                request_id: ticket.id(),
                mime_type: "audio/wav".into(),
            },
            &pending,
        );
        let blob = ticket.wait().unwrap();
        assert_eq!(blob.len(), 52);
        assert_eq!(blob.sample_rate(), 8000);

        // Export leaves the accumulator intact.
        assert_eq!(consumer.accumulator().frame_count(), 2);

        consumer.handle(Command::Clear, &pending);
        assert!(consumer.accumulator().is_empty());
        assert!(!consumer.handle(Command::Shutdown, &pending));
    }

    #[test]
    fn export_before_init_fails() {
        let pending = PendingRequests::new();
        let mut consumer = Consumer::new();
        let ticket = pending.register(RequestId::new());
        consumer.handle(
            Command::ExportWav {
                request_id: ticket.id(),
                mime_type: "audio/wav".into(),
            },
            &pending,
        );
        assert!(matches!(ticket.wait(), Err(RecorderError::ConfigurationFailed(_))));
    }

    #[test]
    fn export_with_unknown_id_is_dropped() {
        let pending = PendingRequests::new();
        let mut consumer = Consumer::new();
        consumer.handle(Command::Init { config: config(8000) }, &pending);
        assert!(consumer.handle(
            Command::ExportWav {
                request_id: RequestId::new(),
                mime_type: "audio/wav".into(),
            },
            &pending,
        ));
    }

    #[test]
    fn invalid_init_leaves_consumer_unconfigured() {
        let channel = CommandChannel::spawn().unwrap();
        let unrepresentable = RecordingConfig {
            num_channels: 40000,
            ..config(8000)
        };
        channel.send(Command::Init { config: unrepresentable }).unwrap();
        channel.send(record(&[0.5, 0.5])).unwrap();

        let ticket = channel.request_export("audio/wav").unwrap();
        let result = ticket.wait_timeout(Duration::from_secs(5)).expect("no reply");
        assert!(matches!(result, Err(RecorderError::ConfigurationFailed(_))));

        // The encoder thread is still serving requests.
        channel.send(Command::Init { config: config(8000) }).unwrap();
        let blob = channel.request_export("audio/wav").unwrap().wait().unwrap();
        assert_eq!(blob.total_sample_count(), 2);
    }

    #[test]
    fn encoder_panic_fails_outstanding_exports() {
        let (tx, rx) = unbounded::<Command>();
        let pending = Arc::new(PendingRequests::new());
        let ticket = pending.register(RequestId::new());

        let worker_pending = Arc::clone(&pending);
        let joined = thread::spawn(move || {
            let _exit = ConsumerExit::new(rx, worker_pending);
            panic!("encoder failure");
        })
        .join();
        assert!(joined.is_err());

        let result = ticket.wait_timeout(Duration::from_secs(5)).expect("no reply");
        assert_eq!(result, Err(RecorderError::ChannelClosed));
        assert!(pending.is_empty());
        assert!(tx.send(Command::Clear).is_err());
    }

    #[test]
    fn channel_round_trip() {
        let channel = CommandChannel::spawn().unwrap();
        channel.send(Command::Init { config: config(16000) }).unwrap();
        channel.send(record(&[0.25, 0.25])).unwrap();

        let blob = channel.request_export("audio/wav").unwrap().wait().unwrap();
        let header = WavHeader::parse(blob.bytes()).unwrap();
        assert_eq!(header.sample_rate, 16000);
        assert_eq!(header.data_size, 4);
        assert_eq!(blob.mime_type(), "audio/wav");
    }

    #[test]
    fn overlapping_exports_are_not_crossed() {
        let channel = CommandChannel::spawn().unwrap();
        channel.send(Command::Init { config: config(8000) }).unwrap();

        channel.send(record(&[0.1, 0.1])).unwrap();
        let first = channel.request_export("audio/wav").unwrap();
        channel.send(record(&[0.2, 0.2])).unwrap();
        let second = channel.request_export("audio/x-wav").unwrap();

        // Wait in reverse order of issue.
        let second_blob = second.wait().unwrap();
        let first_blob = first.wait().unwrap();

        assert_eq!(first_blob.total_sample_count(), 2);
        assert_eq!(first_blob.mime_type(), "audio/wav");
        assert_eq!(second_blob.total_sample_count(), 4);
        assert_eq!(second_blob.mime_type(), "audio/x-wav");
    }

    #[test]
    fn shutdown_closes_channel() {
        let mut channel = CommandChannel::spawn().unwrap();
        let sender = channel.sender();
        channel.shutdown();

        assert_eq!(sender.send(Command::Clear), Err(RecorderError::ChannelClosed));
        assert!(matches!(sender.request_export("audio/wav"), Err(RecorderError::ChannelClosed)));
        assert_eq!(sender.pending_exports(), 0);
    }

    #[test]
    fn export_resolves_within_reasonable_time() {
        let channel = CommandChannel::spawn().unwrap();
        channel.send(Command::Init { config: config(8000) }).unwrap();
        let ticket = channel.request_export("audio/wav").unwrap();
        let result = ticket.wait_timeout(Duration::from_secs(5)).expect("no reply");
        assert_eq!(result.unwrap().len(), 44);
    }
}
