use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// A log file that can be opened, swapped and closed after the subscriber is
/// installed. Writes are dropped while no file is open.
#[derive(Debug, Clone, Default)]
pub struct FileSink {
    file: Arc<Mutex<Option<File>>>,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `path` in append mode, replacing any previously open file.
    pub fn open(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut guard = self.lock()?;
        *guard = Some(file);
        Ok(())
    }

    pub fn close(&self) -> io::Result<()> {
        let mut guard = self.lock()?;
        if let Some(mut file) = guard.take() {
            file.flush()?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, Option<File>>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))
    }
}

pub struct FileSinkWriter {
    file: Arc<Mutex<Option<File>>>,
}

impl Write for FileSinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))?;
        match guard.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log sink lock poisoned"))?;
        match guard.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileSink {
    type Writer = FileSinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        FileSinkWriter {
            file: Arc::clone(&self.file),
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Slot for the detailed log layer. The subscriber is installed before the
/// download directory exists, so the file layer is attached later.
#[derive(Clone)]
pub struct DetailedLog {
    handle: reload::Handle<Option<BoxedLayer>, Registry>,
}

impl DetailedLog {
    fn new() -> (reload::Layer<Option<BoxedLayer>, Registry>, Self) {
        let (layer, handle) = reload::Layer::new(None);
        (layer, Self { handle })
    }

    /// Starts appending to `path` through a non-blocking writer. Keep the
    /// guard alive until exit or buffered lines are lost.
    pub fn attach(&self, path: &Path) -> io::Result<WorkerGuard> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| io::Error::other(format!("not a file path: {}", path.display())))?;

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name.to_string_lossy())
            .build(dir)
            .map_err(io::Error::other)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .compact()
            .boxed();
        self.handle
            .reload(Some(layer))
            .map_err(io::Error::other)?;

        Ok(guard)
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("creator_sync=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Stdout plus the per-run log, with a slot for the detailed log. The file
/// layers never emit ANSI escapes.
pub fn init_daemon_logger(verbose: bool, run_log: &FileSink) -> DetailedLog {
    let (detailed_layer, detailed) = DetailedLog::new();

    tracing_subscriber::registry()
        .with(detailed_layer)
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(run_log.clone())
                .with_ansi(false)
                .with_target(false)
                .compact(),
        )
        .init();

    detailed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_drops_writes_while_closed() {
        let sink = FileSink::new();
        let mut writer = sink.make_writer();
        assert_eq!(writer.write(b"nobody hears this").unwrap(), 17);
        assert!(!sink.is_open());
    }

    #[test]
    fn test_file_sink_swaps_files() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.log");
        let second = temp_dir.path().join("second.log");
        let sink = FileSink::new();

        sink.open(&first).unwrap();
        sink.make_writer().write_all(b"one\n").unwrap();
        sink.open(&second).unwrap();
        sink.make_writer().write_all(b"two\n").unwrap();
        sink.close().unwrap();
        sink.make_writer().write_all(b"three\n").unwrap();

        assert_eq!(std::fs::read_to_string(&first).unwrap(), "one\n");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "two\n");
    }

    #[test]
    fn test_file_sink_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("detailed.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let sink = FileSink::new();
        sink.open(&path).unwrap();
        sink.make_writer().write_all(b"later\n").unwrap();
        sink.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn test_detailed_log_attaches_after_start() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("detailed_download.log");
        let (layer, detailed) = DetailedLog::new();
        let subscriber = tracing_subscriber::registry()
            .with(layer)
            .with(EnvFilter::new("info"));

        let guard = tracing::subscriber::with_default(subscriber, || {
            tracing::info!("before the file exists");
            let guard = detailed.attach(&path).unwrap();
            tracing::info!("alice: [info] Downloading 1 format(s)");
            guard
        });
        // guard 釋放時才會把緩衝寫進檔案
        drop(guard);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("alice: [info] Downloading 1 format(s)"));
        assert!(!content.contains("before the file exists"));
    }

    #[test]
    fn test_detailed_log_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("detailed_download.log");
        std::fs::write(&path, "earlier run\n").unwrap();
        let (layer, detailed) = DetailedLog::new();
        let subscriber = tracing_subscriber::registry()
            .with(layer)
            .with(EnvFilter::new("info"));

        let guard = tracing::subscriber::with_default(subscriber, || {
            let guard = detailed.attach(&path).unwrap();
            tracing::warn!("later run");
            guard
        });
        drop(guard);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier run\n"));
        assert!(content.contains("later run"));
    }
}
