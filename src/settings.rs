//! User settings and their persistence to the SD card.
//!
//! The file is a tiny line-oriented `key=value` document:
//!
//! ```text
//! # Intercooler Spray Controller Settings
//! trigger_temp=40
//! spray_duration=2.0
//! spray_interval=10
//! brightness=70
//! ```
//!
//! `load` applies only in-range values and silently skips everything else;
//! `save` writes the whole record and forces it to the medium.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::error::StorageError;

pub const TRIGGER_TEMP_RANGE: RangeInclusive<i32> = 20..=70;
pub const SPRAY_DURATION_RANGE: RangeInclusive<f32> = 0.5..=10.0;
pub const SPRAY_DURATION_STEP: f32 = 0.5;
pub const SPRAY_INTERVAL_RANGE: RangeInclusive<i32> = 5..=30;
pub const BRIGHTNESS_MAX: u8 = 100;

const HEADER: &str = "# Intercooler Spray Controller Settings";

// ---------------------------------------------------------------------------
// In-memory record
// ---------------------------------------------------------------------------

/// The four user-tunable values. Setters clamp into the valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    trigger_temp: i32,
    spray_duration: f32,
    spray_interval: i32,
    brightness: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trigger_temp: 40,
            spray_duration: 2.0,
            spray_interval: 10,
            brightness: 70,
        }
    }
}

impl Settings {
    /// Spray trigger temperature in °C.
    pub fn trigger_temp(&self) -> i32 {
        self.trigger_temp
    }

    pub fn set_trigger_temp(&mut self, celsius: i32) {
        self.trigger_temp = celsius.clamp(*TRIGGER_TEMP_RANGE.start(), *TRIGGER_TEMP_RANGE.end());
    }

    /// Spray pulse length in seconds, always a multiple of 0.5.
    pub fn spray_duration(&self) -> f32 {
        self.spray_duration
    }

    pub fn set_spray_duration(&mut self, secs: f32) {
        let clamped = secs.clamp(*SPRAY_DURATION_RANGE.start(), *SPRAY_DURATION_RANGE.end());
        self.spray_duration = (clamped / SPRAY_DURATION_STEP).round() * SPRAY_DURATION_STEP;
    }

    /// Minimum seconds between two spray pulses.
    pub fn spray_interval(&self) -> i32 {
        self.spray_interval
    }

    pub fn set_spray_interval(&mut self, secs: i32) {
        self.spray_interval = secs.clamp(*SPRAY_INTERVAL_RANGE.start(), *SPRAY_INTERVAL_RANGE.end());
    }

    /// Backlight level in percent.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_brightness(&mut self, percent: i32) {
        self.brightness = percent.clamp(0, i32::from(BRIGHTNESS_MAX)) as u8;
    }

    /// Apply one `key=value` pair from the file. Returns `true` if accepted.
    fn apply_pair(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        match key.trim() {
            "trigger_temp" => match value.parse::<i32>() {
                Ok(v) if TRIGGER_TEMP_RANGE.contains(&v) => {
                    self.trigger_temp = v;
                    true
                }
                _ => false,
            },
            "spray_duration" => match value.parse::<f32>() {
                Ok(v) if SPRAY_DURATION_RANGE.contains(&v) => {
                    self.set_spray_duration(v);
                    true
                }
                _ => false,
            },
            "spray_interval" => match value.parse::<i32>() {
                Ok(v) if SPRAY_INTERVAL_RANGE.contains(&v) => {
                    self.spray_interval = v;
                    true
                }
                _ => false,
            },
            "brightness" => match value.parse::<i32>() {
                Ok(v) if (0..=i32::from(BRIGHTNESS_MAX)).contains(&v) => {
                    self.brightness = v as u8;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "{HEADER}")?;
        writeln!(w, "trigger_temp={}", self.trigger_temp)?;
        writeln!(w, "spray_duration={:.1}", self.spray_duration)?;
        writeln!(w, "spray_interval={}", self.spray_interval)?;
        writeln!(w, "brightness={}", self.brightness)
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Result of a [`SettingsStore::load`] that did not hit an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// File read; `applied` values were in range, `rejected` lines skipped.
    Loaded { applied: usize, rejected: usize },
    /// No settings file yet; defaults stay in effect.
    NotFound,
}

/// Owns the live [`Settings`] and the file they persist to.
pub struct SettingsStore {
    path: PathBuf,
    current: Settings,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Immutable snapshot of the live values.
    pub fn get_current(&self) -> Settings {
        self.current
    }

    pub fn current_mut(&mut self) -> &mut Settings {
        &mut self.current
    }

    /// Merge the file into the live values.
    ///
    /// Out-of-range, unparsable and unknown entries are skipped and the
    /// previous value is kept.
    pub fn load(&mut self) -> Result<LoadStatus, StorageError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Settings: no settings file found, using defaults");
                return Ok(LoadStatus::NotFound);
            }
            Err(e) => {
                error!("Settings: open {} failed: {}", self.path.display(), e);
                return Err(StorageError::OpenFailed);
            }
        };

        info!("Settings: loading from {}", self.path.display());
        let mut applied = 0;
        let mut rejected = 0;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|_| StorageError::OpenFailed)?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if self.current.apply_pair(key, value) {
                debug!("Settings:   {} = {}", key, value);
                applied += 1;
            } else {
                debug!("Settings:   skipped '{}'", line);
                rejected += 1;
            }
        }

        info!("Settings: loaded ({} applied, {} skipped)", applied, rejected);
        Ok(LoadStatus::Loaded { applied, rejected })
    }

    /// Write all four values and force them to the card.
    pub fn save(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                error!("Settings: mkdir {} failed: {}", dir.display(), e);
                StorageError::DirCreateFailed
            })?;
        }

        let mut file = File::create(&self.path).map_err(|e| {
            error!("Settings: failed to open {} for writing: {}", self.path.display(), e);
            StorageError::OpenFailed
        })?;
        self.current
            .write_to(&mut file)
            .map_err(|_| StorageError::WriteFailed)?;
        file.flush().map_err(|_| StorageError::SyncFailed)?;
        file.sync_all().map_err(|_| StorageError::SyncFailed)?;

        info!("Settings: saved to {}", self.path.display());
        Ok(())
    }
}
