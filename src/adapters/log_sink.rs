//! Console + file tee for the `log` facade.
//!
//! Every record goes to the console logger first. If a [`LogFileSink`] is
//! attached, the record is also formatted ESP-IDF style
//! (`I (12345) target: message`) into a bounded line buffer and appended to
//! the active log file. A line that does not fit is truncated; a file lock
//! that stays busy drops the line for the file only.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::adapters::time::Esp32Clock;
use crate::app::ports::MonotonicClock;
use crate::error::LoggerError;
use crate::storage::log_rotator::{FLUSH_LOCK_TIMEOUT, LogFileSink};

/// Upper bound for one formatted line, newline included.
pub const LINE_BUF_BYTES: usize = 512;

type LineBuf = heapless::String<LINE_BUF_BYTES>;

static TEE: OnceLock<TeeLogger> = OnceLock::new();

pub struct TeeLogger {
    console: Box<dyn Log>,
    level: LevelFilter,
    line_max: AtomicUsize,
    clock: Esp32Clock,
    file: RwLock<Option<Arc<LogFileSink>>>,
}

impl TeeLogger {
    pub fn new(console: Box<dyn Log>, level: LevelFilter, line_max: usize) -> Self {
        Self {
            console,
            level,
            line_max: AtomicUsize::new(line_max.clamp(2, LINE_BUF_BYTES)),
            clock: Esp32Clock::new(),
            file: RwLock::new(None),
        }
    }

    /// Register the process-wide tee with the `log` facade.
    pub fn install(
        console: Box<dyn Log>,
        level: LevelFilter,
        line_max: usize,
    ) -> Result<&'static TeeLogger, LoggerError> {
        let mut fresh = false;
        let tee = TEE.get_or_init(|| {
            fresh = true;
            TeeLogger::new(console, level, line_max)
        });
        if !fresh {
            return Err(LoggerError::AlreadyInstalled);
        }
        log::set_logger(tee).map_err(|_| LoggerError::AlreadyInstalled)?;
        log::set_max_level(level);
        Ok(tee)
    }

    /// Change the file line limit, newline included.
    pub fn set_line_max(&self, bytes: usize) {
        self.line_max
            .store(bytes.clamp(2, LINE_BUF_BYTES), Ordering::Relaxed);
    }

    /// Start copying records into `sink`. Replaces any previous sink.
    pub fn attach(&self, sink: Arc<LogFileSink>) {
        *self.file.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    /// Stop copying into `sink`. A different attached sink is left alone.
    pub fn detach(&self, sink: &Arc<LogFileSink>) -> bool {
        let mut slot = self.file.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|cur| Arc::ptr_eq(cur, sink)) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn has_file(&self) -> bool {
        self.file
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn current_sink(&self) -> Option<Arc<LogFileSink>> {
        self.file
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Render one record into `buf`, cut at `line_max` bytes including the
    /// trailing newline.
    fn format_line(&self, record: &Record<'_>, buf: &mut LineBuf) {
        let mut w = Bounded {
            buf: &mut *buf,
            limit: self.line_max.load(Ordering::Relaxed) - 1,
        };
        // A full buffer ends the write early; what fit is kept.
        let _ = write!(
            w,
            "{} ({}) {}: {}",
            level_letter(record.level()),
            self.clock.now_ms(),
            record.target(),
            record.args()
        );
        let _ = buf.push('\n');
    }
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.console.log(record);

        if let Some(sink) = self.current_sink() {
            let mut line = LineBuf::new();
            self.format_line(record, &mut line);
            sink.append(&line);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(sink) = self.current_sink() {
            let _ = sink.sync_if_dirty(FLUSH_LOCK_TIMEOUT);
        }
    }
}

fn level_letter(level: Level) -> char {
    match level {
        Level::Error => 'E',
        Level::Warn => 'W',
        Level::Info => 'I',
        Level::Debug => 'D',
        Level::Trace => 'V',
    }
}

/// `fmt::Write` into a heapless string that refuses to split a character.
struct Bounded<'a> {
    buf: &'a mut LineBuf,
    limit: usize,
}

impl fmt::Write for Bounded<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.buf.len() + ch.len_utf8() > self.limit {
                return Err(fmt::Error);
            }
            self.buf.push(ch).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}
