use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderMap, Uri};
use tokio::sync::mpsc::UnboundedSender;

/// Maps an incoming request to a channel name. Default is the request path.
pub type ChannelNameFn = dyn Fn(&Uri) -> String + Send + Sync;

/// Decides whether a client (by id) with the given request headers may
/// attach. Default is to allow everyone.
pub type AuthorizeFn = dyn Fn(&str, &HeaderMap) -> bool + Send + Sync;

/// Server-wide configuration consumed by the SSE transport.
pub struct Options {
    /// Retry interval (ms) applied to outgoing messages that don't carry
    /// their own. 0 leaves the client's default untouched.
    pub retry_interval: u64,

    /// Extra response headers, e.g. for CORS.
    pub headers: HashMap<String, String>,

    /// Custom channel naming; `None` uses the request path.
    pub channel_name: Option<Arc<ChannelNameFn>>,

    /// Authorization callback, run before the client is attached.
    pub authorize: Option<Arc<AuthorizeFn>>,

    /// Best-effort sink receiving each detached client's id. The queue is
    /// unbounded, so a slow consumer never blocks detachment.
    pub disconnect: Option<UnboundedSender<String>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            retry_interval: 0,
            headers: HashMap::new(),
            channel_name: None,
            authorize: None,
            disconnect: None,
        }
    }
}
