use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Setup logging of events reported by the loader.
///
/// Events at `default` and above are logged unless the RUST_LOG
/// environment variable says otherwise.
///
/// E.g. To enable debug level logging:
///   RUST_LOG=DEBUG
///
/// Or to trace only the individual workers:
///   RUST_LOG=INFO,zoneload::worker=TRACE
///
/// Calling this more than once is harmless. Only the first call installs a
/// subscriber.
pub fn init_logging(default: LevelFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default.into())
                .from_env_lossy(),
        )
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}
