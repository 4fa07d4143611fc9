//! Rolling File Logger
//!
//! Writes log output to `<app_name>.log` inside a log directory and rotates it
//! to `<app_name>.log.1` once the file passes a size limit. The most recent
//! lines are also kept in a circular buffer so an in-app log viewer can show
//! them without reading the file back.
//!
//! `log` records are bridged into the `tracing` subscriber, so library code
//! only needs the `log` macros.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Size at which the active log file is rotated
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Number of lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

static LOGGER: OnceLock<RollingFile> = OnceLock::new();
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Logger setup errors
#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized,
    NotInitialized,
    Subscriber(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "Log file error: {}", e),
            LoggerError::AlreadyInitialized => write!(f, "Logger already initialized"),
            LoggerError::NotInitialized => write!(f, "Logger not initialized"),
            LoggerError::Subscriber(msg) => write!(f, "Failed to install subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

/// Size-rotated log file with an in-memory tail
#[derive(Clone)]
pub struct RollingFile {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    recent: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl RollingFile {
    /// Open (or append to) `<log_dir>/<app_name>.log`
    pub fn open(
        log_dir: &Path,
        app_name: &str,
        max_bytes: u64,
        capacity: usize,
    ) -> Result<Self, LoggerError> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                path,
                file,
                written,
                max_bytes,
                recent: VecDeque::with_capacity(capacity),
                capacity,
                partial: String::new(),
            })),
        })
    }

    /// Path of the active log file
    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Most recent complete lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-write leaves the buffer usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let backup = self.path.with_extension("log.1");
        fs::rename(&self.path, &backup)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if self.recent.len() == self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.trim_end_matches(['\n', '\r']).to_string());
        }
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.written > 0 && inner.written + buf.len() as u64 > inner.max_bytes {
            inner.rotate()?;
        }
        inner.file.write_all(buf)?;
        inner.written += buf.len() as u64;
        inner.remember(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

/// Install the global logger. Call once at startup.
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), LoggerError> {
    if INITIALIZED.load(Ordering::SeqCst) {
        return Err(LoggerError::AlreadyInitialized);
    }

    #[cfg(not(target_os = "android"))]
    {
        let file = RollingFile::open(&log_dir, app_name, DEFAULT_MAX_BYTES, DEFAULT_BUFFER_LINES)?;
        LOGGER
            .set(file.clone())
            .map_err(|_| LoggerError::AlreadyInitialized)?;

        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || file.clone())
            .try_init()
            .map_err(|e| LoggerError::Subscriber(e.to_string()))?;
    }

    #[cfg(target_os = "android")]
    {
        let _ = &log_dir;
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag(app_name),
        );
    }

    INITIALIZED.store(true, Ordering::SeqCst);
    log::info!(
        "[{}] {} logger started",
        chrono::Local::now().format("%H:%M:%S%.3f"),
        app_name
    );
    Ok(())
}

/// Lines currently held in the in-memory buffer
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(RollingFile::recent_lines).unwrap_or_default()
}

fn ensure_initialized() -> Result<(), LoggerError> {
    if INITIALIZED.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(LoggerError::NotInitialized)
    }
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    log::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    log::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    log::error!("{}", msg);
    Ok(())
}
