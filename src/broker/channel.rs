use std::collections::HashMap;
use std::sync::RwLock;

use crate::broker::message::Message;
use crate::client::Client;

/// A named broadcast group.
///
/// The channel owns the membership map of currently attached clients and
/// guards it with its own read/write lock: broadcasts (readers) on one
/// channel never block attach/detach or broadcasts on another. Membership
/// mutation happens only on the broker's dispatch loop; broadcasts may run
/// from any task.
#[derive(Debug)]
pub struct Channel {
    name: String,
    last_event_id: RwLock<String>,
    clients: RwLock<HashMap<String, Client>>,
}

impl Channel {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            last_event_id: RwLock::new(String::new()),
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the last message broadcast on this channel.
    pub fn last_event_id(&self) -> String {
        self.last_event_id.read().unwrap().clone()
    }

    /// Number of clients currently attached.
    pub fn client_count(&self) -> usize {
        self.clients.read().unwrap().len()
    }

    pub(crate) fn add_client(&self, client: Client) {
        let mut clients = self.clients.write().unwrap();
        clients.insert(client.id().to_string(), client);
    }

    /// Remove a client, closing its delivery queue. Removing an id that is
    /// not a member is a no-op.
    ///
    /// The write lock excludes in-flight broadcasts, so once this returns no
    /// delivery to the removed client can start.
    pub(crate) fn remove_client(&self, id: &str) {
        // dropping the map entry drops the only queue sender, which ends
        // the transport's receive loop
        let mut clients = self.clients.write().unwrap();
        clients.remove(id);
    }

    /// Deliver a message to every attached client.
    ///
    /// Runs under the read lock, concurrently with broadcasts on other
    /// channels. Each client sees broadcasts in invocation order; order
    /// across clients is unspecified.
    pub(crate) fn broadcast(&self, message: &Message) {
        *self.last_event_id.write().unwrap() = message.id().to_string();

        let clients = self.clients.read().unwrap();

        for client in clients.values() {
            client.deliver(message);
        }
    }

    /// Deliver a message to the attached clients whose id is in `ids`.
    /// Ids that are not members are silently skipped.
    pub(crate) fn broadcast_to(&self, message: &Message, ids: &[String]) {
        *self.last_event_id.write().unwrap() = message.id().to_string();

        let clients = self.clients.read().unwrap();

        for id in ids {
            if let Some(client) = clients.get(id) {
                client.deliver(message);
            }
        }
    }

    /// Detach every client, closing all delivery queues.
    pub(crate) fn close(&self) {
        let mut clients = self.clients.write().unwrap();
        clients.clear();
    }
}
