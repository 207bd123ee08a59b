use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

/// Install the global subscriber, writing to stderr and, when given, appending
/// to `log_file` as well. `RUST_LOG` overrides the default `info` level.
///
/// A log file that cannot be opened is reported and skipped; logging to
/// stderr still works.
pub fn init(log_file: Option<&Path>) {
    let _ = tracing_log::LogTracer::init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let (writer, open_error) = match log_file.map(open_log_file) {
        Some(Ok(file)) => (BoxMakeWriter::new(io::stderr.and(Mutex::new(file))), None),
        Some(Err(e)) => (BoxMakeWriter::new(io::stderr), Some(e)),
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .try_init();

    if let (Some(path), Some(e)) = (log_file, open_error) {
        log::warn!("cannot open log file {}: {}", path.display(), e);
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
