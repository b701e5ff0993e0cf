// Logger initialization

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "async_nlp=debug,tower_http=debug,axum=debug";

/// Install the global subscriber: stdout always, plus a daily rolling file
/// under `directory` when one is given. Keep the returned guard alive for
/// the life of the process or buffered file output is lost.
pub fn init_logger(directory: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "async-nlp.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}
