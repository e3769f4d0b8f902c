use serde::Deserialize;

/// Top-level configuration for the binary: where to listen and how the SSE
/// stream behaves.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub sse: SseSettings,
}

/// Bind address for the HTTP server.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Stream behavior: client retry interval and log verbosity.
#[derive(Debug, Deserialize, Clone)]
pub struct SseSettings {
    /// Retry interval (ms) sent with messages that don't set their own.
    /// 0 keeps the client default.
    pub retry_ms: u64,
    pub log_level: String,
}

/// Partial configuration as loaded from files or environment; missing
/// values fall back to defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub sse: Option<PartialSseSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialSseSettings {
    pub retry_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            sse: SseSettings {
                retry_ms: 0,
                log_level: "info".to_string(),
            },
        }
    }
}
