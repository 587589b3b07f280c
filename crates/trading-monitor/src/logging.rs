//! Logging setup.

use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Setup logging with the given level, optionally mirrored to `file`.
///
/// `RUST_LOG` wins over `level` when set. The returned guard flushes the
/// file writer on drop, so hold it for the life of the process.
pub fn setup_logging(
    level: &str,
    json: bool,
    file: Option<&Path>,
) -> Result<Option<WorkerGuard>, InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, guard) = match file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // A second call (tests, embedding) keeps the first subscriber.
    if json {
        let file_layer = writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .with(file_layer)
            .try_init();
    } else {
        let file_layer = writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .with(file_layer)
            .try_init();
    }

    Ok(guard)
}

/// Non-blocking writer appending to exactly `path`.
fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), InitError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ml-trader.log".to_string());

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)?;
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_layer_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("session.log");

        let guard = setup_logging("info", false, Some(&path)).unwrap();
        assert!(guard.is_some());
        tracing::info!(symbol = "NVDA", "file logging check");
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("file logging check"));
    }
}
