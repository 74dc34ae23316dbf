//! Logging utilities
//!
//! A size-rotated file writer for the JSON log layer enabled by `--log-file`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default maximum log file size (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of rotated files kept next to the active one
pub const DEFAULT_MAX_FILES: usize = 5;

/// A log file writer that rotates by size
///
/// The active file is `<path>`; rotated files are `<path>.1` (newest) up to
/// `<path>.<max_files>` (oldest). Anything older is deleted.
#[derive(Debug, Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<RotationState>>,
}

#[derive(Debug)]
struct RotationState {
    path: PathBuf,
    file: Option<File>,
    size: u64,
    max_size: u64,
    max_files: usize,
}

impl RotatingFileWriter {
    /// Open (or create) the log file at `path`
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.file_name().is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("log path has no file name: {}", path.display()),
            ));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = open_append(&path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            inner: Arc::new(Mutex::new(RotationState {
                path,
                file: Some(file),
                size,
                max_size,
                max_files,
            })),
        })
    }

    /// Writer with the default limits (10MB per file, 5 rotated files)
    pub fn with_defaults(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }

    fn state(&self) -> MutexGuard<'_, RotationState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl RotationState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        if self.max_files == 0 {
            fs::remove_file(&self.path).ok();
        } else {
            fs::remove_file(self.rotated_path(self.max_files)).ok();
            for index in (1..self.max_files).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            if self.path.exists() {
                fs::rename(&self.path, self.rotated_path(1))?;
            }
        }

        self.file = Some(open_append(&self.path)?);
        self.size = 0;
        Ok(())
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}", index));
        self.path.with_file_name(name)
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state();

        // An oversized record still lands in a fresh file
        if state.size > 0 && state.size + buf.len() as u64 > state.max_size {
            state.rotate()?;
        }

        // A failed rotation left no file open; try again
        if state.file.is_none() {
            state.rotate()?;
        }

        let file = state
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))?;
        let written = file.write(buf)?;
        state.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.state().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
