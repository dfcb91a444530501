use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_DIRECTIVES: &str = "info,heimdall=debug,sea_orm=warn,sqlx::query=warn";

pub const LOG_FILE_PREFIX: &str = "heimdall-server.log";

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

/// Installs the global subscriber: human-readable stdout plus a JSON file rotated daily
/// under `log_dir`. File writes happen on a background thread; keep the returned guard
/// alive until shutdown or buffered lines are lost.
pub fn init_logging(log_dir: &str) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::registry()
        .with(env_filter(rust_log.as_deref()))
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}
