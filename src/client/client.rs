use std::sync::RwLock;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::broker::message::Message;

/// Server-side representative of one subscriber connection.
///
/// A client owns the send half of its delivery queue; the receive half goes
/// to the transport task that drains it onto the wire. The broker stores the
/// client in its channel's membership map, so dropping the map entry drops
/// the only sender and the transport observes end-of-stream.
#[derive(Debug)]
pub struct Client {
    id: String,
    channel: String,
    last_event_id: RwLock<String>,
    sender: UnboundedSender<Message>,
}

impl Client {
    /// Create a client for `channel`, resuming from `last_event_id` (empty
    /// for a fresh subscription). Returns the client together with the
    /// receive half of its delivery queue.
    pub fn new(last_event_id: &str, channel: &str) -> (Self, UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let client = Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel: channel.to_string(),
            last_event_id: RwLock::new(last_event_id.to_string()),
            sender,
        };

        (client, receiver)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the channel this client is subscribed to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Identifier of the last message delivered to this client.
    pub fn last_event_id(&self) -> String {
        self.last_event_id.read().unwrap().clone()
    }

    /// Queue a message for this client and advance its last-event-id.
    ///
    /// Called only from the owning channel's broadcast path, which is the
    /// single writer of `last_event_id`. Enqueueing after the transport has
    /// gone away is a no-op.
    pub(crate) fn deliver(&self, message: &Message) {
        *self.last_event_id.write().unwrap() = message.id().to_string();

        if self.sender.send(message.clone()).is_err() {
            debug!(client = %self.id, "delivery queue closed, message dropped");
        }
    }
}
