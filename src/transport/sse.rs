use std::convert::Infallible;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use futures_util::stream;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::broker::{Broker, Options};
use crate::client::Client;

#[derive(Clone)]
struct AppState {
    broker: Arc<Broker>,
    options: Arc<Options>,
}

/// Serve the SSE endpoint on every path of `addr` until the listener fails.
pub async fn serve(addr: &str, broker: Arc<Broker>, options: Options) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("sse server listening on http://{addr}");

    axum::serve(listener, router(broker, options)).await
}

/// Build the router handling event-stream subscriptions on every path.
/// Exposed so the endpoint can be mounted into a larger application.
pub fn router(broker: Arc<Broker>, options: Options) -> Router {
    let state = AppState {
        broker,
        options: Arc::new(options),
    };

    Router::new().fallback(subscribe).with_state(state)
}

async fn subscribe(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    match method {
        Method::GET => open_stream(state, uri, headers),
        Method::OPTIONS => {
            // preflight: just the extra (CORS) headers
            let mut response = StatusCode::NO_CONTENT.into_response();
            apply_extra_headers(&mut response, &state.options);
            response
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Turn one GET request into an attached client and stream its delivery
/// queue back as an event stream.
fn open_stream(state: AppState, uri: Uri, headers: HeaderMap) -> Response {
    let channel = match &state.options.channel_name {
        Some(name_fn) => name_fn(&uri),
        None => uri.path().to_string(),
    };

    let last_event_id = headers
        .get("last-event-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let (client, receiver) = Client::new(last_event_id, &channel);

    if let Some(authorize) = &state.options.authorize {
        if !authorize(client.id(), &headers) {
            warn!(client = %client.id(), channel = %channel, "client not authorized");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let client_id = client.id().to_string();

    if state.broker.attach(client).is_err() {
        warn!(channel = %channel, "connection rejected, broker is shut down");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    debug!(client = %client_id, channel = %channel, "stream opened");

    // Detaches exactly once, whether the queue is closed by the core or the
    // peer drops the connection (either way the stream below is dropped).
    let guard = DetachGuard {
        broker: Arc::clone(&state.broker),
        channel,
        client_id,
        disconnect: state.options.disconnect.clone(),
    };

    let retry = state.options.retry_interval;

    // The guard travels with the receiver as the stream's state, so it is
    // dropped when the queue closes or the response body is dropped.
    let frames = stream::unfold((receiver, guard), move |(mut receiver, guard)| async move {
        let message = receiver.recv().await?;

        let message = if retry > 0 && !message.has_retry() {
            // delivery-local copy; the broadcast instance stays shared
            message.with_retry(retry)
        } else {
            message
        };

        Some((
            Ok::<Bytes, Infallible>(message.to_string().into()),
            (receiver, guard),
        ))
    });

    let mut response = Body::from_stream(frames).into_response();

    let response_headers = response.headers_mut();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response_headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response_headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    apply_extra_headers(&mut response, &state.options);

    response
}

fn apply_extra_headers(response: &mut Response, options: &Options) {
    for (name, value) in &options.headers {
        match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "invalid extra header, skipped"),
        }
    }
}

/// Reports the disconnect exactly once when the response stream is dropped,
/// whichever side ended it.
struct DetachGuard {
    broker: Arc<Broker>,
    channel: String,
    client_id: String,
    disconnect: Option<UnboundedSender<String>>,
}

impl Drop for DetachGuard {
    fn drop(&mut self) {
        debug!(client = %self.client_id, channel = %self.channel, "stream closed");
        self.broker.detach(&self.channel, &self.client_id);

        if let Some(sink) = &self.disconnect {
            let _ = sink.send(self.client_id.clone());
        }
    }
}
