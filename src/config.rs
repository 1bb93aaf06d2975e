//! System configuration parameters
//!
//! All tunable timing, threshold, and storage-layout parameters for the
//! spray controller. Defaults are compiled in; an optional JSON file on the
//! card (`system/CONFIG.JSN`) may override any subset of them at boot.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Override file, relative to [`SystemConfig::storage_root`].
pub const CONFIG_OVERRIDE_FILE: &str = "system/CONFIG.JSN";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Acquisition ---
    /// Thermistor + button sampling period (milliseconds)
    pub acquisition_period_ms: u32,
    /// Quiet window after the last edge before a button level is committed
    pub debounce_ms: u32,

    // --- Screen manager ---
    /// Idle time before a settings screen returns to Main
    pub inactivity_timeout_ms: u32,
    /// Minimum spacing between two accepted swipe navigations
    pub nav_cooldown_ms: u32,
    /// Slide animation length
    pub transition_ms: u32,
    /// UI owner tick (toolkit timers, animations, input)
    pub ui_tick_ms: u32,
    /// Main screen clock label refresh
    pub clock_refresh_ms: u32,

    // --- Display thresholds (independent of the user trigger temperature) ---
    /// Temperature label turns orange at or above this (°C)
    pub temp_warning_c: f32,
    /// Temperature label turns red at or above this (°C)
    pub temp_critical_c: f32,

    // --- Logging ---
    /// Periodic fsync of the active log file
    pub log_sync_interval_ms: u32,
    /// Total log files kept on the card, including the active one
    pub log_max_files: usize,
    /// A formatted log line is truncated to this many bytes in the file
    pub log_line_max_bytes: usize,

    // --- Storage layout ---
    /// Mount point of the removable card
    pub storage_root: PathBuf,
    /// Settings file, relative to `storage_root`
    pub settings_file: PathBuf,
    /// Log directory, relative to `storage_root`
    pub log_dir: PathBuf,
    /// Log file name prefix (`L00001.txt`)
    pub log_prefix: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Acquisition
            acquisition_period_ms: 100, // 10 Hz
            debounce_ms: 50,

            // Screen manager
            inactivity_timeout_ms: 15_000,
            nav_cooldown_ms: 400,
            transition_ms: 300,
            ui_tick_ms: 10,
            clock_refresh_ms: 1_000,

            // Display thresholds
            temp_warning_c: 40.0,
            temp_critical_c: 50.0,

            // Logging
            log_sync_interval_ms: 1_000,
            log_max_files: 5,
            log_line_max_bytes: 512,

            // Storage
            storage_root: PathBuf::from("/sdcard"),
            settings_file: PathBuf::from("system/SETTINGS.TXT"),
            log_dir: PathBuf::from("system/logs"),
            log_prefix: String::from("L"),
        }
    }
}

impl SystemConfig {
    /// Absolute path of the settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.storage_root.join(&self.settings_file)
    }

    /// Absolute path of the log directory.
    pub fn log_dir_path(&self) -> PathBuf {
        self.storage_root.join(&self.log_dir)
    }

    /// Load `<root>/system/CONFIG.JSN` over the defaults.
    ///
    /// A missing or malformed file is not fatal: defaults are returned and
    /// a warning is logged. Missing fields keep their default value.
    pub fn load_or_default(storage_root: &Path) -> Self {
        let path = storage_root.join(CONFIG_OVERRIDE_FILE);
        let mut config = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<SystemConfig>(&bytes) {
                Ok(cfg) => {
                    info!("Config: overrides loaded from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!("Config: {} is malformed ({}), using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.storage_root = storage_root.to_path_buf();
        config.sanitize();
        config
    }

    /// Pull nonsensical overrides back to safe values.
    fn sanitize(&mut self) {
        let d = Self::default();
        if self.acquisition_period_ms == 0 {
            self.acquisition_period_ms = d.acquisition_period_ms;
        }
        if self.ui_tick_ms == 0 {
            self.ui_tick_ms = d.ui_tick_ms;
        }
        if self.log_sync_interval_ms == 0 {
            self.log_sync_interval_ms = d.log_sync_interval_ms;
        }
        if self.log_max_files == 0 {
            self.log_max_files = 1;
        }
        if self.log_line_max_bytes < 2 {
            self.log_line_max_bytes = d.log_line_max_bytes;
        }
        if self.temp_critical_c < self.temp_warning_c {
            warn!("Config: critical threshold below warning, restoring defaults");
            self.temp_warning_c = d.temp_warning_c;
            self.temp_critical_c = d.temp_critical_c;
        }
    }
}
