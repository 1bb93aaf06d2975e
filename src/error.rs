//! Unified error types for the spray controller firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level wiring in `main` uniform. All variants are `Copy` so they can be
//! passed across the UI lock and thread boundaries without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// Removable storage could not be read or written.
    Storage(StorageError),
    /// The UI toolkit refused to build a widget or timer.
    Ui(UiError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Ui(e) => write!(f, "ui: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// A directory on the card could not be created.
    DirCreateFailed,
    /// A file could not be opened or created.
    OpenFailed,
    /// Writing to an open file failed.
    WriteFailed,
    /// Flush / fsync to the medium failed.
    SyncFailed,
    /// A directory listing could not be read.
    ListFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirCreateFailed => write!(f, "directory create failed"),
            Self::OpenFailed => write!(f, "file open failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::SyncFailed => write!(f, "sync failed"),
            Self::ListFailed => write!(f, "directory list failed"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// UI errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiError {
    /// The toolkit could not allocate a widget.
    WidgetCreateFailed,
    /// A screen was addressed before it was created.
    ScreenMissing,
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WidgetCreateFailed => write!(f, "widget create failed"),
            Self::ScreenMissing => write!(f, "screen not created"),
        }
    }
}

impl std::error::Error for UiError {}

impl From<UiError> for Error {
    fn from(e: UiError) -> Self {
        Self::Ui(e)
    }
}

// ---------------------------------------------------------------------------
// Logger errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerError {
    /// The log directory or file could not be prepared.
    Storage(StorageError),
    /// A global logger was already registered.
    AlreadyInstalled,
    /// The file lock was not free within the allowed wait.
    Busy,
    /// The periodic sync thread could not be started.
    SpawnFailed,
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "{e}"),
            Self::AlreadyInstalled => write!(f, "logger already installed"),
            Self::Busy => write!(f, "log file busy"),
            Self::SpawnFailed => write!(f, "sync thread spawn failed"),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<StorageError> for LoggerError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}
