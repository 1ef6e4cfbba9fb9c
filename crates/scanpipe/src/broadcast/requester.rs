use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

/// Non-owning handle to whoever asked for a job: an id plus the send side of
/// its outgoing message channel. The receiving side belongs to the boundary
/// layer, which may drop it at any time.
#[derive(Debug, Clone)]
pub struct Requester {
    id: String,
    sender: Sender<Vec<u8>>,
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Channel full; this message was dropped.
    Dropped,
    /// Receiver gone; nothing further will be delivered.
    Closed,
}

impl Requester {
    pub fn new(id: impl Into<String>, sender: Sender<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            sender,
        }
    }

    /// Creates a requester with a fresh id and a bounded channel, returning the
    /// receiving end for the boundary layer.
    pub fn channel(capacity: usize) -> (Self, Receiver<Vec<u8>>) {
        let (sender, receiver) = bounded(capacity);
        (Self::new(uuid::Uuid::new_v4().to_string(), sender), receiver)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Never blocks.
    pub fn deliver(&self, payload: Vec<u8>) -> Delivery {
        match self.sender.try_send(payload) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => {
                debug!(requester = %self.id, "requester channel full, dropping message");
                Delivery::Dropped
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(requester = %self.id, "requester disconnected");
                Delivery::Closed
            }
        }
    }
}
