//! Ordered command channel between the capture side and the encoder thread.

pub mod command;
pub mod consumer;
pub mod pending;

pub use command::{Command, RequestId};
pub use consumer::{CommandChannel, CommandSender};
pub use pending::{ExportResult, ExportTicket, PendingRequests};
