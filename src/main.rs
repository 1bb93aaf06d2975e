//! Intercooler spray controller firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  core 1                                core 0                    │
//! │  ┌──────────────┐  try_lock  ┌──────────────────────┐  stdin     │
//! │  │ acquisition  │──────────▶│ Arc<Mutex<UiSession>> │◀── console │
//! │  │ 100 ms       │            │  ScreenManager        │            │
//! │  └──────▲───────┘            │  SettingsStore        │            │
//! │         │ is_asserted()      └──────────▲───────────┘            │
//! │  ┌──────┴───────┐                       │ lock() every 10 ms     │
//! │  │ debounce 5 ms│◀── GPIO ISR      UI owner (this thread)        │
//! │  └──────────────┘                                                │
//! │  ┌──────────────┐                                                │
//! │  │ log-sync 1 s │──▶ /sdcard/system/logs/Lnnnnn.txt              │
//! │  └──────────────┘                                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{LevelFilter, error, info, warn};

use sprayctl::acquisition::AcquisitionLoop;
use sprayctl::adapters::console::spawn_console;
use sprayctl::adapters::display::HeadlessDisplay;
use sprayctl::adapters::log_sink::TeeLogger;
use sprayctl::adapters::time::Esp32Clock;
use sprayctl::app::ports::MonotonicClock;
use sprayctl::app::session::{UiSession, lock_ui};
use sprayctl::config::SystemConfig;
use sprayctl::drivers::debounce::{DebounceWorker, DebouncedInput};
use sprayctl::drivers::hw_init::{self, Adc2Thermistor, GpioLine, LedcBacklight};
use sprayctl::drivers::task_pin::{TaskSpec, spawn_on_core};
use sprayctl::error::Error;
use sprayctl::pins;
use sprayctl::sensors::thermistor::{Calibration, ThermistorSampler};
use sprayctl::settings::{LoadStatus, SettingsStore};
use sprayctl::storage::log_rotator::{LogRotator, RotatorConfig};

const PANEL_WIDTH: i32 = 480;
const PANEL_HEIGHT: i32 = 480;
const DEBOUNCE_POLL: Duration = Duration::from_millis(5);
const SD_ROOT: &str = "/sdcard";

type Session = UiSession<HeadlessDisplay, LedcBacklight, Esp32Clock>;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap + logging ────────────────────────
    esp_idf_svc::sys::link_patches();
    let tee = TeeLogger::install(
        Box::new(esp_idf_svc::log::EspLogger::new()),
        LevelFilter::Info,
        SystemConfig::default().log_line_max_bytes,
    )?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SprayCtl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::load_or_default(Path::new(SD_ROOT));
    tee.set_line_max(config.log_line_max_bytes);

    let rotator = match LogRotator::init(&RotatorConfig::from(&config), tee) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!("Logger: SD logging unavailable ({}), console only", e);
            None
        }
    };

    // ── 2. Settings ───────────────────────────────────────────
    let mut store = SettingsStore::new(config.settings_path());
    match store.load() {
        Ok(LoadStatus::Loaded { applied, rejected }) => {
            info!("Settings: {} value(s) applied, {} rejected", applied, rejected);
        }
        Ok(LoadStatus::NotFound) => {}
        Err(e) => warn!("Settings: load failed ({}), using defaults", e),
    }

    // ── 3. Peripherals ────────────────────────────────────────
    let backlight = LedcBacklight::init().map_err(|e| {
        error!("HAL init failed: {}", e);
        Error::Init("backlight")
    })?;
    let adc = Adc2Thermistor::init().map_err(|e| {
        error!("HAL init failed: {}", e);
        Error::Init("thermistor ADC")
    })?;

    let power = Arc::new(DebouncedInput::new("power", config.debounce_ms, true));
    let tank = Arc::new(DebouncedInput::new("tank", config.debounce_ms, true));
    if let Err(e) = hw_init::init_button_inputs(&power, &tank) {
        error!("Input ISR setup failed: {}, indicators will not update", e);
    }

    // ── 4. UI session (brightness applied, Main shown) ────────
    let clock = Esp32Clock::new();
    let (input_tx, input_rx) = mpsc::channel();
    let display = HeadlessDisplay::new(PANEL_WIDTH, PANEL_HEIGHT).with_events(input_rx);
    let session: Arc<Mutex<Session>> = Arc::new(Mutex::new(UiSession::new(
        display,
        backlight,
        clock,
        store,
        &config,
        clock.now_ms(),
    )?));

    // ── 5. Worker threads ─────────────────────────────────────
    let halt = Arc::new(AtomicBool::new(false));
    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    let mut debounce = DebounceWorker::default();
    debounce.add(power.clone(), GpioLine(pins::POWER_BUTTON_GPIO));
    debounce.add(tank.clone(), GpioLine(pins::TANK_BUTTON_GPIO));
    {
        let halt = halt.clone();
        workers.push(spawn_on_core(TaskSpec::DEBOUNCE, move || {
            while !halt.load(Ordering::Acquire) {
                debounce.service_all(clock.now_ms());
                std::thread::sleep(DEBOUNCE_POLL);
            }
        })?);
    }

    {
        let halt = halt.clone();
        let session = session.clone();
        let period = Duration::from_millis(u64::from(config.acquisition_period_ms));
        let mut acquisition =
            AcquisitionLoop::new(ThermistorSampler::new(adc, Calibration::default()), power, tank);
        workers.push(spawn_on_core(TaskSpec::ACQUISITION, move || {
            info!("Acquisition: running every {} ms", period.as_millis());
            while !halt.load(Ordering::Acquire) {
                let report = acquisition.cycle(&*session);
                if report.lock_misses > 0 {
                    log::debug!("Acquisition: {} update(s) deferred, UI busy", report.lock_misses);
                }
                std::thread::sleep(period);
            }
        })?);
    }

    // The console blocks on stdin, so it is not joined on shutdown.
    if let Err(e) = spawn_console(input_tx, halt.clone()) {
        warn!("Console: not started ({})", e);
    }

    // ── 6. UI owner loop ──────────────────────────────────────
    info!("UI: owner loop every {} ms", config.ui_tick_ms);
    while !halt.load(Ordering::Acquire) {
        lock_ui(&session).tick(clock.now_ms());
        FreeRtos::delay_ms(config.ui_tick_ms);
    }

    // ── 7. Shutdown, reverse order ────────────────────────────
    info!("Shutdown: stopping workers");
    for worker in workers {
        if worker.join().is_err() {
            warn!("Shutdown: a worker thread panicked");
        }
    }
    match Arc::try_unwrap(session) {
        Ok(lock) => {
            let display = lock
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .teardown();
            info!("Shutdown: UI torn down ({} widget(s) left)", display.widget_count());
        }
        Err(_) => warn!("Shutdown: UI still shared, skipping teardown"),
    }
    if let Some(rotator) = rotator {
        if let Err(e) = rotator.flush() {
            warn!("Logger: final flush failed ({})", e);
        }
        if let Err(e) = rotator.deinit() {
            warn!("Logger: deinit failed ({})", e);
        }
    }
    info!("Shutdown: complete");
    Ok(())
}
