use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::broker::channel::Channel;
use crate::broker::message::Message;
use crate::client::Client;
use crate::utils::Error;

/// Structural events, processed strictly one at a time by the dispatch loop.
#[derive(Debug)]
enum BrokerEvent {
    Attach(Client),
    Detach { channel: String, client_id: String },
    CloseChannel(String),
    Shutdown,
}

type ChannelTable = Arc<RwLock<HashMap<String, Arc<Channel>>>>;

/// The broadcast core: owns the channel table and serializes all lifecycle
/// events on a single dispatch task.
///
/// Attach, detach, channel close and shutdown are submitted to the dispatch
/// loop over an unbounded queue and applied sequentially, so structural
/// races cannot arise. Broadcasts bypass the loop: they look channels up
/// directly through the table's read lock and fan out under the target
/// channel's own lock, unaffected by attach/detach churn elsewhere.
///
/// A channel exists in the table iff it has at least one client; channels
/// are created lazily by the first attach and destroyed when the last
/// client detaches.
#[derive(Debug)]
pub struct Broker {
    channels: ChannelTable,
    events: UnboundedSender<BrokerEvent>,
}

impl Broker {
    /// Create a broker and spawn its dispatch loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let channels: ChannelTable = Arc::new(RwLock::new(HashMap::new()));
        let (events, receiver) = mpsc::unbounded_channel();

        tokio::spawn(dispatch(Arc::clone(&channels), receiver));

        Self { channels, events }
    }

    /// Submit a client for attachment to its channel, creating the channel
    /// if this is its first subscriber. Never blocks.
    pub fn attach(&self, client: Client) -> Result<(), Error> {
        self.events
            .send(BrokerEvent::Attach(client))
            .map_err(|_| Error::ShuttingDown)
    }

    /// Submit a detach for the given client. Best-effort and non-blocking:
    /// an unknown client or channel is a no-op, and a detach submitted
    /// after shutdown is silently dropped.
    pub fn detach(&self, channel: &str, client_id: &str) {
        let event = BrokerEvent::Detach {
            channel: channel.to_string(),
            client_id: client_id.to_string(),
        };

        if self.events.send(event).is_err() {
            debug!(client = %client_id, "detach after shutdown ignored");
        }
    }

    /// Broadcast a message to every client of `channel`.
    ///
    /// Returns [`Error::NoClients`] when the channel does not exist; a
    /// broadcast never creates a channel.
    pub fn broadcast(&self, channel: &str, message: &Message) -> Result<(), Error> {
        match self.get_channel(channel) {
            Some(ch) => {
                ch.broadcast(message);
                debug!(channel, "message broadcast");
                Ok(())
            }
            None => {
                debug!(channel, "message not sent, channel has no clients");
                Err(Error::NoClients {
                    channel: channel.to_string(),
                })
            }
        }
    }

    /// Broadcast a message to the subset of `channel`'s clients whose id is
    /// in `client_ids`. Same lookup discipline as [`Broker::broadcast`].
    pub fn broadcast_to(
        &self,
        channel: &str,
        client_ids: &[String],
        message: &Message,
    ) -> Result<(), Error> {
        match self.get_channel(channel) {
            Some(ch) => {
                ch.broadcast_to(message, client_ids);
                debug!(channel, "message broadcast to subset");
                Ok(())
            }
            None => {
                debug!(channel, "message not sent, channel has no clients");
                Err(Error::NoClients {
                    channel: channel.to_string(),
                })
            }
        }
    }

    /// Total number of clients across all channels.
    pub fn client_count(&self) -> usize {
        let channels = self.channels.read().unwrap();

        channels.values().map(|ch| ch.client_count()).sum()
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.read().unwrap().contains_key(name)
    }

    pub fn get_channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.read().unwrap().get(name).cloned()
    }

    /// Names of all channels that currently have clients.
    pub fn channels(&self) -> Vec<String> {
        self.channels.read().unwrap().keys().cloned().collect()
    }

    /// Submit a close for the named channel, detaching all its clients.
    /// Asynchronous with respect to the caller.
    pub fn close_channel(&self, name: &str) {
        if self
            .events
            .send(BrokerEvent::CloseChannel(name.to_string()))
            .is_err()
        {
            debug!(channel = %name, "close after shutdown ignored");
        }
    }

    /// Tear down every channel immediately without stopping the dispatch
    /// loop. A later attach recreates its channel.
    pub fn restart(&self) {
        info!("restarting broker");
        close_all(&self.channels);
    }

    /// Submit shutdown: every channel is destroyed and the dispatch loop
    /// stops, after which structural submissions are rejected. Calling this
    /// again after the loop has stopped is a safe no-op.
    pub fn shutdown(&self) {
        if self.events.send(BrokerEvent::Shutdown).is_err() {
            debug!("broker already shut down");
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain the channel table and close every channel.
fn close_all(channels: &ChannelTable) {
    let drained: Vec<Arc<Channel>> = {
        let mut table = channels.write().unwrap();
        table.drain().map(|(_, ch)| ch).collect()
    };

    for ch in drained {
        ch.close();
        info!(channel = %ch.name(), "channel closed");
    }
}

/// The dispatch loop: sole writer of the channel table.
///
/// Events are applied in arrival order with no concurrency, which gives
/// every structural change a total order. Locks are held only for the
/// table or membership operation itself, never across an await.
async fn dispatch(channels: ChannelTable, mut events: UnboundedReceiver<BrokerEvent>) {
    info!("broker started");

    while let Some(event) = events.recv().await {
        match event {
            BrokerEvent::Attach(client) => {
                let channel = {
                    let mut table = channels.write().unwrap();

                    Arc::clone(table.entry(client.channel().to_string()).or_insert_with(|| {
                        info!(channel = %client.channel(), "channel created");
                        Arc::new(Channel::new(client.channel()))
                    }))
                };

                debug!(channel = %channel.name(), client = %client.id(), "client attached");
                channel.add_client(client);
            }

            BrokerEvent::Detach { channel, client_id } => {
                let existing = channels.read().unwrap().get(&channel).cloned();

                if let Some(ch) = existing {
                    ch.remove_client(&client_id);
                    debug!(channel = %channel, client = %client_id, "client detached");

                    if ch.client_count() == 0 {
                        channels.write().unwrap().remove(&channel);
                        info!(channel = %channel, "channel closed");
                    }
                }
            }

            BrokerEvent::CloseChannel(name) => {
                let removed = channels.write().unwrap().remove(&name);

                match removed {
                    Some(ch) => {
                        ch.close();
                        info!(channel = %name, "channel closed");
                    }
                    None => warn!(channel = %name, "requested to close nonexistent channel"),
                }
            }

            BrokerEvent::Shutdown => {
                close_all(&channels);
                info!("broker stopped");
                return;
            }
        }
    }
}
