//! Rotating log files on the SD card.
//!
//! On [`LogRotator::init`] the log directory is scanned for files named
//! `<prefix><NNNNN>.txt`, the oldest ones are deleted until one slot is
//! free, and a new file with the next sequence number is opened. From then
//! on every log line is appended through [`LogFileSink`] and a background
//! thread fsyncs the file whenever something was written since the last
//! sync.
//!
//! ```text
//!   before (max_files = 5)          after init
//!   L00003.txt  ── deleted
//!   L00004.txt  ── deleted
//!   L00005.txt                      L00005.txt
//!   L00006.txt                      L00006.txt
//!   L00007.txt                      L00007.txt
//!   L00008.txt                      L00008.txt
//!                                   L00009.txt  ◄── active
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info, warn};

use super::lock_with_timeout;
use crate::adapters::log_sink::TeeLogger;
use crate::config::SystemConfig;
use crate::drivers::task_pin::{self, TaskSpec};
use crate::error::{LoggerError, StorageError};

pub const LOG_EXTENSION: &str = ".txt";

/// Wait for the file lock when appending a line.
pub const APPEND_LOCK_TIMEOUT: Duration = Duration::from_millis(50);
/// Wait for the file lock on a periodic sync.
pub const SYNC_LOCK_TIMEOUT: Duration = Duration::from_millis(50);
/// Wait for the file lock on an explicit [`LogRotator::flush`].
pub const FLUSH_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatorConfig {
    pub dir: PathBuf,
    pub prefix: String,
    /// Files kept on the card, including the new active one. At least 1.
    pub max_files: usize,
    pub sync_interval_ms: u32,
}

impl From<&SystemConfig> for RotatorConfig {
    fn from(c: &SystemConfig) -> Self {
        Self {
            dir: c.log_dir_path(),
            prefix: c.log_prefix.clone(),
            max_files: c.log_max_files.max(1),
            sync_interval_ms: c.log_sync_interval_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Naming and rotation planning
// ---------------------------------------------------------------------------

/// `L` + 7 → `L00007.txt`.
pub fn log_file_name(prefix: &str, seq: u32) -> String {
    format!("{prefix}{seq:05}{LOG_EXTENSION}")
}

/// Sequence number encoded in a log file name, if it has one.
pub fn parse_seq(name: &str, prefix: &str) -> Option<u32> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(LOG_EXTENSION)?;
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

fn is_log_name(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix) && name.ends_with(LOG_EXTENSION)
}

/// Names of existing log files in `dir`, sorted oldest first.
pub fn list_logs(dir: &Path, prefix: &str) -> Result<Vec<String>, StorageError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        error!("Logger: cannot list {}: {}", dir.display(), e);
        StorageError::ListFailed
    })?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_log_name(name, prefix))
        .collect();
    names.sort();
    Ok(names)
}

/// What rotation will do to a sorted listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    /// Oldest files to remove so that `max_files - 1` remain.
    pub delete: Vec<String>,
    /// Sequence number for the new file: highest existing + 1, or 1.
    pub next_seq: u32,
}

pub fn plan_rotation(sorted: &[String], prefix: &str, max_files: usize) -> RotationPlan {
    let keep = max_files.max(1) - 1;
    let excess = sorted.len().saturating_sub(keep);
    let next_seq = sorted
        .iter()
        .filter_map(|name| parse_seq(name, prefix))
        .max()
        .map_or(1, |max| max.saturating_add(1));
    RotationPlan {
        delete: sorted[..excess].to_vec(),
        next_seq,
    }
}

// ---------------------------------------------------------------------------
// Active file
// ---------------------------------------------------------------------------

struct ActiveLog {
    file: File,
    dirty: bool,
}

/// The open log file, shared between the logger and the sync thread.
///
/// Nothing in here may call the `log` macros while holding the lock: the
/// logger appends through this same lock.
pub struct LogFileSink {
    path: PathBuf,
    seq: u32,
    state: Mutex<Option<ActiveLog>>,
    dropped: AtomicU32,
}

impl LogFileSink {
    /// Create `path`, write the session header and force it to the card.
    pub fn create(path: PathBuf, seq: u32) -> Result<Self, StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                error!("Logger: cannot open {}: {}", path.display(), e);
                StorageError::OpenFailed
            })?;
        writeln!(file, "=== Log #{seq} started ===").map_err(|_| StorageError::WriteFailed)?;
        file.sync_all().map_err(|_| StorageError::SyncFailed)?;

        Ok(Self {
            path,
            seq,
            state: Mutex::new(Some(ActiveLog { file, dirty: false })),
            dropped: AtomicU32::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Lines lost to a busy lock, a write error or a closed file.
    pub fn dropped_lines(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Append one formatted line. Returns `false` if the line was dropped.
    pub fn append(&self, line: &str) -> bool {
        let written = match lock_with_timeout(&self.state, APPEND_LOCK_TIMEOUT) {
            Some(mut guard) => match guard.as_mut() {
                Some(active) => {
                    let ok = active.file.write_all(line.as_bytes()).is_ok();
                    active.dirty |= ok;
                    ok
                }
                None => false,
            },
            None => false,
        };
        if !written {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        written
    }

    /// Fsync if anything was appended since the last sync.
    ///
    /// `Ok(true)` synced, `Ok(false)` nothing to do (or already closed).
    pub fn sync_if_dirty(&self, timeout: Duration) -> Result<bool, LoggerError> {
        let mut guard = lock_with_timeout(&self.state, timeout).ok_or(LoggerError::Busy)?;
        let Some(active) = guard.as_mut() else {
            return Ok(false);
        };
        if !active.dirty {
            return Ok(false);
        }
        active
            .file
            .flush()
            .and_then(|()| active.file.sync_all())
            .map_err(|_| StorageError::SyncFailed)?;
        active.dirty = false;
        Ok(true)
    }

    /// Final sync and close. Waits for the lock without a timeout.
    fn close(&self) -> Result<(), StorageError> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.take() {
            Some(mut active) => active
                .file
                .flush()
                .and_then(|()| active.file.sync_all())
                .map_err(|_| StorageError::SyncFailed),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Rotator
// ---------------------------------------------------------------------------

/// Owns the active log file and its periodic sync thread.
pub struct LogRotator {
    sink: Arc<LogFileSink>,
    tee: &'static TeeLogger,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl LogRotator {
    /// Rotate, open the next file, attach it to `tee` and start syncing.
    pub fn init(cfg: &RotatorConfig, tee: &'static TeeLogger) -> Result<Self, LoggerError> {
        fs::create_dir_all(&cfg.dir).map_err(|e| {
            error!("Logger: cannot create {}: {}", cfg.dir.display(), e);
            StorageError::DirCreateFailed
        })?;

        let existing = list_logs(&cfg.dir, &cfg.prefix)?;
        let plan = plan_rotation(&existing, &cfg.prefix, cfg.max_files);
        for name in &plan.delete {
            match fs::remove_file(cfg.dir.join(name)) {
                Ok(()) => info!("Logger: removed old log {}", name),
                Err(e) => warn!("Logger: could not remove {}: {}", name, e),
            }
        }

        let path = cfg.dir.join(log_file_name(&cfg.prefix, plan.next_seq));
        let sink = Arc::new(LogFileSink::create(path, plan.next_seq)?);
        tee.attach(sink.clone());

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = Duration::from_millis(u64::from(cfg.sync_interval_ms.max(1)));
        let worker_sink = sink.clone();
        let spawned = task_pin::spawn_on_core(TaskSpec::LOG_SYNC, move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => match worker_sink.sync_if_dirty(SYNC_LOCK_TIMEOUT) {
                    Ok(_) | Err(LoggerError::Busy) => {}
                    Err(e) => warn!("Logger: periodic sync failed: {}", e),
                },
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        let worker = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                tee.detach(&sink);
                let _ = sink.close();
                error!("Logger: sync thread spawn failed: {}", e);
                return Err(LoggerError::SpawnFailed);
            }
        };

        info!(
            "Logger: writing to {} ({} old file(s) removed)",
            sink.path().display(),
            plan.delete.len()
        );
        Ok(Self {
            sink,
            tee,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }

    pub fn path(&self) -> &Path {
        self.sink.path()
    }

    pub fn seq(&self) -> u32 {
        self.sink.seq()
    }

    pub fn sink(&self) -> &Arc<LogFileSink> {
        &self.sink
    }

    /// Force buffered lines to the card now.
    pub fn flush(&self) -> Result<(), LoggerError> {
        self.sink.sync_if_dirty(FLUSH_LOCK_TIMEOUT).map(|_| ())
    }

    /// Stop the sync thread, detach from the logger, sync and close.
    pub fn deinit(mut self) -> Result<(), LoggerError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), LoggerError> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Logger: sync thread panicked");
            }
        }
        self.tee.detach(&self.sink);
        self.sink.close()?;
        Ok(())
    }
}

impl Drop for LogRotator {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
