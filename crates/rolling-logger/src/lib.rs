//! Rolling Logger
//!
//! Writes log lines to `<dir>/<app>.log`, rotating to `<app>.log.1`,
//! `<app>.log.2`, ... once the active file reaches a size cap, and keeps the
//! most recent lines in memory for display in the app.
//!
//! `log` records are bridged into `tracing`, so library code can keep using
//! the `log` macros.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Rotate once the active file would grow past this many bytes
    pub max_file_bytes: u64,
    /// Rotated files kept next to the active one
    pub max_files: usize,
    /// Lines kept in the in-memory ring buffer
    pub buffer_lines: usize,
    pub level: Level,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 3,
            buffer_lines: 500,
            level: Level::INFO,
        }
    }
}

static LOGGER: OnceLock<Arc<RollingLog>> = OnceLock::new();

struct Inner {
    file: File,
    written: u64,
    recent: VecDeque<String>,
}

/// Size-capped log file set plus ring buffer
pub struct RollingLog {
    dir: PathBuf,
    app_name: String,
    config: LoggerConfig,
    inner: Mutex<Inner>,
}

impl RollingLog {
    pub fn open(dir: &Path, app_name: &str, config: LoggerConfig) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            inner: Mutex::new(Inner {
                file,
                written,
                recent: VecDeque::with_capacity(config.buffer_lines),
            }),
            config,
        })
    }

    /// `<app>.log` for index 0, `<app>.log.N` for rotated files
    pub fn path(&self, index: usize) -> PathBuf {
        match index {
            0 => self.dir.join(format!("{}.log", self.app_name)),
            n => self.dir.join(format!("{}.log.{}", self.app_name, n)),
        }
    }

    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let line = line.trim_end_matches('\n');
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let len = line.len() as u64 + 1;
        if inner.written > 0 && inner.written + len > self.config.max_file_bytes {
            self.rotate(&mut inner)?;
        }
        writeln!(inner.file, "{}", line)?;
        inner.written += len;

        if self.config.buffer_lines > 0 {
            if inner.recent.len() == self.config.buffer_lines {
                inner.recent.pop_front();
            }
            inner.recent.push_back(line.to_string());
        }
        Ok(())
    }

    pub fn recent_lines(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.recent.iter().cloned().collect()
    }

    fn rotate(&self, inner: &mut Inner) -> io::Result<()> {
        inner.file.flush()?;
        if self.config.max_files == 0 {
            inner.file = File::create(self.path(0))?;
            inner.written = 0;
            return Ok(());
        }

        let oldest = self.path(self.config.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.config.max_files).rev() {
            let from = self.path(index);
            if from.exists() {
                fs::rename(&from, self.path(index + 1))?;
            }
        }
        inner.file = OpenOptions::new().create(true).append(true).open(self.path(0))?;
        inner.written = 0;
        Ok(())
    }
}

/// Buffers one formatted event and hands it to the log on drop
pub struct EventWriter {
    log: Arc<RollingLog>,
    buf: Vec<u8>,
}

impl Write for EventWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|l| !l.is_empty()) {
            let _ = self.log.write_line(line);
        }
    }
}

#[derive(Clone)]
struct RollingMakeWriter(Arc<RollingLog>);

impl<'a> MakeWriter<'a> for RollingMakeWriter {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            log: self.0.clone(),
            buf: Vec::new(),
        }
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the rolling logger as the global subscriber with default limits
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> io::Result<()> {
    init_logger_with(log_dir, app_name, LoggerConfig::default())
}

pub fn init_logger_with(log_dir: PathBuf, app_name: &str, config: LoggerConfig) -> io::Result<()> {
    let level = LevelFilter::from_level(config.level);
    let log = Arc::new(RollingLog::open(&log_dir, app_name, config)?);

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_writer(RollingMakeWriter(log.clone()));

    tracing_subscriber::registry()
        .with(layer)
        .with(level)
        .try_init()
        .map_err(io::Error::other)?;

    LOGGER
        .set(log)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "rolling logger already initialized"))
}

/// Lines recently written by the global logger, oldest first
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(|log| log.recent_lines()).unwrap_or_default()
}

pub fn info(msg: &str) -> io::Result<()> {
    ensure_initialized()?;
    log::info!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> io::Result<()> {
    ensure_initialized()?;
    log::error!("{}", msg);
    Ok(())
}

fn ensure_initialized() -> io::Result<()> {
    match LOGGER.get() {
        Some(_) => Ok(()),
        None => Err(io::Error::new(io::ErrorKind::NotFound, "rolling logger not initialized")),
    }
}
