/// Initialize the tracing subscriber for the application.
///
/// Maps a level string ("error", "warn", ...) onto `tracing::Level`,
/// defaulting to INFO for anything unrecognized.
pub fn init(default_level: &str) {
    let level = match default_level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" | "warning" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };

    // try_init so tests and embedding applications can call this repeatedly
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
