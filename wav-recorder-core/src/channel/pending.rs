use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use super::command::RequestId;
use crate::models::blob::WavBlob;
use crate::models::error::RecorderError;

pub type ExportResult = Result<WavBlob, RecorderError>;

/// Reply slots for in-flight export requests, keyed by request id.
///
/// Completing a request removes its slot, so each request gets at most
/// one reply and a reply can only ever reach the request it names.
#[derive(Debug, Default)]
pub struct PendingRequests {
    slots: Mutex<HashMap<RequestId, Sender<ExportResult>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a reply slot for `id`.
    pub fn register(&self, id: RequestId) -> ExportTicket {
        let (tx, rx) = bounded(1);
        self.slots.lock().insert(id, tx);
        ExportTicket { id, rx }
    }

    /// Deliver `result` to the request `id`. Returns false if no such
    /// request is pending (unknown, already completed or cancelled).
    pub fn complete(&self, id: RequestId, result: ExportResult) -> bool {
        let Some(tx) = self.slots.lock().remove(&id) else {
            return false;
        };
        // The ticket may have been dropped; nobody is waiting then.
        let _ = tx.send(result);
        true
    }

    pub fn cancel(&self, id: RequestId) {
        self.slots.lock().remove(&id);
    }

    /// Fail every outstanding request with `error`.
    pub fn fail_all(&self, error: RecorderError) {
        let drained: Vec<_> = self.slots.lock().drain().collect();
        for (id, tx) in drained {
            log::warn!("export {} abandoned: {}", id, error);
            let _ = tx.send(Err(error.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

/// Handle to the eventual result of one export request.
#[derive(Debug)]
pub struct ExportTicket {
    id: RequestId,
    rx: Receiver<ExportResult>,
}

impl ExportTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Block until the consumer replies.
    pub fn wait(self) -> ExportResult {
        self.rx.recv().unwrap_or(Err(RecorderError::ChannelClosed))
    }

    /// Block for at most `timeout`. `None` means no reply yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ExportResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(RecorderError::ChannelClosed)),
        }
    }

    /// Take the reply if it has already arrived.
    pub fn try_take(&self) -> Option<ExportResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RecorderError::ChannelClosed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(samples: usize) -> WavBlob {
        WavBlob::new(vec![0; 44 + samples * 2], "audio/wav", 8000, 1, samples)
    }

    #[test]
    fn reply_reaches_only_its_request() {
        let pending = PendingRequests::new();
        let first = pending.register(RequestId::new());
        let second = pending.register(RequestId::new());

        assert!(pending.complete(second.id(), Ok(blob(2))));
        assert!(pending.complete(first.id(), Ok(blob(1))));

        assert_eq!(first.wait().unwrap().total_sample_count(), 1);
        assert_eq!(second.wait().unwrap().total_sample_count(), 2);
    }

    #[test]
    fn at_most_one_reply_per_request() {
        let pending = PendingRequests::new();
        let ticket = pending.register(RequestId::new());

        assert!(pending.complete(ticket.id(), Ok(blob(1))));
        assert!(!pending.complete(ticket.id(), Ok(blob(2))));
        assert!(pending.is_empty());
        assert_eq!(ticket.wait().unwrap().total_sample_count(), 1);
    }

    #[test]
    fn unknown_id_is_ignored() {
        let pending = PendingRequests::new();
        assert!(!pending.complete(RequestId::new(), Ok(blob(0))));
    }

    #[test]
    fn ticket_without_reply_times_out() {
        let pending = PendingRequests::new();
        let ticket = pending.register(RequestId::new());
        assert!(ticket.try_take().is_none());
        assert!(ticket.wait_timeout(Duration::from_millis(10)).is_none());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn cancelled_ticket_reports_closed() {
        let pending = PendingRequests::new();
        let ticket = pending.register(RequestId::new());
        pending.cancel(ticket.id());
        assert_eq!(ticket.wait(), Err(RecorderError::ChannelClosed));
    }

    #[test]
    fn fail_all_fails_every_ticket() {
        let pending = PendingRequests::new();
        let a = pending.register(RequestId::new());
        let b = pending.register(RequestId::new());
        pending.fail_all(RecorderError::ChannelClosed);

        assert!(pending.is_empty());
        assert_eq!(a.wait(), Err(RecorderError::ChannelClosed));
        assert_eq!(b.try_take(), Some(Err(RecorderError::ChannelClosed)));
    }
}
