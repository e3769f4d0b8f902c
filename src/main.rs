use std::sync::Arc;

use tracing::{error, info};

use ssecast::broker::{Broker, Options};
use ssecast::config::load_config;
use ssecast::{transport, utils};

#[tokio::main]
async fn main() {
    let settings = load_config().expect("failed to load configuration");
    utils::logging::init(&settings.sse.log_level);

    let broker = Arc::new(Broker::new());

    let options = Options {
        retry_interval: settings.sse.retry_ms,
        ..Options::default()
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    tokio::select! {
        result = transport::sse::serve(&addr, Arc::clone(&broker), options) => {
            if let Err(err) = result {
                error!("server error: {err}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            broker.shutdown();
        }
    }
}
