//! Configuration loading: `config/default.toml` (optional) and environment
//! variables merged over built-in defaults.
//!
//! Environment variables use the `SSECAST` prefix with `__` as the nesting
//! separator, e.g. `SSECAST_SERVER__PORT=9000`.

mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{ServerSettings, Settings, SseSettings};

/// Load configuration from the default file and environment variables,
/// merged over [`Settings::default`].
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("ssecast")
                .prefix_separator("_")
                .separator("__"),
        );

    let config = builder.build()?;

    // Deserialize what is available, then fill the gaps
    let partial: PartialSettings = config.try_deserialize()?;

    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        sse: SseSettings {
            retry_ms: partial
                .sse
                .as_ref()
                .and_then(|s| s.retry_ms)
                .unwrap_or(default.sse.retry_ms),
            log_level: partial
                .sse
                .as_ref()
                .and_then(|s| s.log_level.clone())
                .unwrap_or(default.sse.log_level),
        },
    })
}
