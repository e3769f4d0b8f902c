//! Error types surfaced by the broadcast core and the connection-open path.

use thiserror::Error;

/// Errors returned by [`Broker`](crate::broker::Broker) operations and the
/// SSE connection-open path.
///
/// Broadcast errors are informational: the broker never halts because of
/// them. Detaching an unknown client or closing an unknown channel are
/// logged no-ops, not errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// A broadcast targeted a channel with no connected clients.
    #[error("channel '{channel}' has no clients")]
    NoClients {
        /// Name of the channel the broadcast targeted.
        channel: String,
    },

    /// The authorization callback rejected the connection.
    #[error("client not authorized")]
    Unauthorized,

    /// The broker has shut down and no longer accepts structural events.
    #[error("broker is shut down")]
    ShuttingDown,
}
