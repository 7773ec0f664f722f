//! File writer for the persistent log layer.
//!
//! The terminal layer writes straight to stderr so stdout carries only
//! spoken text and the final reply. The file layer gets its own
//! [`MakeWriter`](tracing_subscriber::fmt::MakeWriter) so it can run with
//! an independent `EnvFilter`.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// Log file name inside the configured log directory.
pub const LOG_FILE_NAME: &str = "relay.log";

/// [`MakeWriter`](tracing_subscriber::fmt::MakeWriter) for the file layer.
///
/// Appends every log line to the persistent log file. The file layer
/// should be constructed with `.with_ansi(false)` so the formatter
/// never emits ANSI escape codes.
#[derive(Clone)]
pub struct FileMakeWriter {
    file: Arc<Mutex<File>>,
}

impl FileMakeWriter {
    pub fn new(file: Arc<Mutex<File>>) -> Self {
        Self { file }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FileMakeWriter {
    type Writer = FileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriter {
            file: Arc::clone(&self.file),
            buf: Vec::with_capacity(256),
        }
    }
}

/// Per-event writer for file output.
///
/// Buffers one formatted event and appends it under the lock on drop, so
/// lines from concurrent tasks never interleave.
pub struct FileWriter {
    file: Arc<Mutex<File>>,
    buf: Vec<u8>,
}

impl Write for FileWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }

        let mut file = self.file.lock();
        let _ = file.write_all(&self.buf);
        let _ = file.flush();
    }
}

/// Opens `<log_dir>/relay.log` in append mode.
///
/// Returns `None` if the directory or file cannot be created; file
/// logging is never fatal.
pub fn open_log_file(log_dir: &Path) -> Option<Arc<Mutex<File>>> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "Warning: cannot create log directory {}: {e}",
            log_dir.display()
        );
        return None;
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(Arc::new(Mutex::new(file))),
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", log_path.display());
            None
        }
    }
}
