use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking writer flushing until dropped.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Installs the global subscriber. Logs go to a daily rolling file under
/// `log_dir` when given, otherwise to stderr. Returns `None` when a
/// subscriber is already installed or the directory cannot be created.
pub fn init(log_dir: Option<&Path>) -> Option<LoggingGuard> {
    let (writer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok()?;
            let file_appender = tracing_appender::rolling::daily(dir, "textmark.log");
            tracing_appender::non_blocking(file_appender)
        }
        None => tracing_appender::non_blocking(io::stderr()),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("textmark=info"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(log_dir.is_some())
            .with_line_number(log_dir.is_some()),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(panic = %panic_info, "panic");
    }));

    if let Some(dir) = log_dir {
        tracing::info!(log_dir = %dir.display(), "tracing initialized");
    }

    Some(LoggingGuard {
        _guard: guard,
        log_dir: log_dir.map(Path::to_path_buf),
    })
}
