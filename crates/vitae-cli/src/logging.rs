//! Tracing subscriber set-up for the CLI.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_FILE_PREFIX: &str = "vitae.log";
const DEFAULT_DIRECTIVES: &str =
    "warn,vitae=info,vitae_core=info,vitae_infrastructure=info,vitae_application=info";

/// Installs the global subscriber.
///
/// `RUST_LOG` (or the defaults above) selects what is recorded. Everything
/// selected goes to a daily file under `logs_dir`; stderr only shows warnings
/// unless `verbose` is set. Keep the returned guard alive until exit so the
/// file writer can flush.
pub fn init(logs_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_level);

    let (file_layer, guard) = match std::fs::create_dir_all(logs_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("warning: file logging disabled ({}): {}", logs_dir.display(), e);
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
