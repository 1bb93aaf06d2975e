//! The lock-guarded UI state.
//!
//! ```text
//!   UI owner thread ──lock()──────▶ ┌──────────────────────────┐
//!     tick(now): toolkit pump,      │ UiSession                │
//!     events, timers                │  toolkit · ScreenManager │
//!                                   │  SettingsStore · backlight│
//!   acquisition thread ─try_lock()─▶└──────────────────────────┘
//!     set_temperature / indicators
//! ```
//!
//! Every widget access goes through a `UiSession` method, and a
//! `UiSession` is only ever reached through one `Mutex`, so the widget
//! tree is a single critical section.

use std::sync::{Mutex, MutexGuard, TryLockError};

use log::{error, info};

use crate::app::events::UiEvent;
use crate::app::ports::{Backlight, UiToolkit, UiUpdatePort, WallClock};
use crate::config::SystemConfig;
use crate::error::{StorageError, UiError};
use crate::settings::{Settings, SettingsStore};
use crate::ui::manager::{ManagerConfig, NavOutcome, NavRecord, ScreenManager};
use crate::ui::{ScreenCtx, ScreenId, Transition};

/// Upper bound on toolkit events drained in one tick.
const MAX_EVENTS_PER_TICK: usize = 16;

pub const STATUS_SAVED: &str = "Settings saved!";
pub const STATUS_SAVE_FAILED: &str = "Save failed!";

/// Take the UI lock without blocking. `None` if another context holds it.
/// A poisoned lock is recovered.
pub fn try_lock_ui<T>(lock: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match lock.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

/// Take the UI lock, waiting if necessary.
pub fn lock_ui<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub struct UiSession<U: UiToolkit, B: Backlight, C: WallClock> {
    ui: U,
    backlight: B,
    clock: C,
    store: SettingsStore,
    screens: ScreenManager,
}

macro_rules! screen_ctx {
    ($self:ident, $now:expr) => {
        (
            &mut $self.screens,
            ScreenCtx {
                ui: &mut $self.ui,
                settings: $self.store.current_mut(),
                backlight: &mut $self.backlight,
                clock: &$self.clock,
                now_ms: $now,
            },
        )
    };
}

impl<U: UiToolkit, B: Backlight, C: WallClock> UiSession<U, B, C> {
    /// Apply the stored brightness, then build and show the Main screen.
    pub fn new(
        mut ui: U,
        mut backlight: B,
        clock: C,
        mut store: SettingsStore,
        config: &SystemConfig,
        now_ms: u32,
    ) -> Result<Self, UiError> {
        backlight.set_percent(store.get_current().brightness());
        let screens = {
            let mut ctx = ScreenCtx {
                ui: &mut ui,
                settings: store.current_mut(),
                backlight: &mut backlight,
                clock: &clock,
                now_ms,
            };
            ScreenManager::new(ManagerConfig::from(config), &mut ctx)?
        };
        Ok(Self {
            ui,
            backlight,
            clock,
            store,
            screens,
        })
    }

    // ── UI owner entry points ─────────────────────────────────

    /// One UI-owner tick: pump the toolkit, dispatch its events, then run
    /// slide completion, inactivity and screen timers.
    pub fn tick(&mut self, now_ms: u32) {
        for _ in 0..MAX_EVENTS_PER_TICK {
            let Some(event) = self.ui.run_pending(now_ms) else {
                break;
            };
            self.handle_event(event, now_ms);
        }
        let (screens, mut ctx) = screen_ctx!(self, now_ms);
        screens.tick(&mut ctx);
    }

    /// Dispatch one toolkit event.
    pub fn handle_event(&mut self, event: UiEvent, now_ms: u32) -> Option<NavOutcome> {
        match event {
            UiEvent::Gesture(direction) => {
                let (screens, mut ctx) = screen_ctx!(self, now_ms);
                Some(screens.handle_gesture(direction, &mut ctx))
            }
            UiEvent::Slider(slider) => {
                let (screens, mut ctx) = screen_ctx!(self, now_ms);
                screens.handle_slider(slider, &mut ctx);
                None
            }
            UiEvent::SaveRequested => {
                self.screens.note_interaction(now_ms);
                // Status text is shown either way; the error is logged by the store.
                let _ = self.save_settings();
                None
            }
        }
    }

    /// Programmatic navigation (no cooldown gate).
    pub fn navigate(&mut self, target: ScreenId, transition: Transition, now_ms: u32) -> NavOutcome {
        let (screens, mut ctx) = screen_ctx!(self, now_ms);
        screens.navigate(target, transition, &mut ctx)
    }

    /// Programmatic navigation by arena index. Unknown indices are rejected.
    pub fn navigate_index(&mut self, idx: usize, transition: Transition, now_ms: u32) -> NavOutcome {
        let (screens, mut ctx) = screen_ctx!(self, now_ms);
        screens.navigate_index(idx, transition, &mut ctx)
    }

    pub fn current_screen(&self) -> ScreenId {
        self.screens.current()
    }

    pub fn last_transition(&self) -> Option<NavRecord> {
        self.screens.last_transition()
    }

    pub fn screens(&self) -> &ScreenManager {
        &self.screens
    }

    pub fn toolkit(&self) -> &U {
        &self.ui
    }

    pub fn toolkit_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn backlight(&self) -> &B {
        &self.backlight
    }

    // ── Settings entry points ─────────────────────────────────

    /// Snapshot of the live settings.
    pub fn settings(&self) -> Settings {
        self.store.get_current()
    }

    pub fn spray_duration(&self) -> f32 {
        self.store.get_current().spray_duration()
    }

    pub fn set_spray_duration(&mut self, secs: f32) {
        self.store.current_mut().set_spray_duration(secs);
    }

    pub fn spray_interval(&self) -> i32 {
        self.store.get_current().spray_interval()
    }

    pub fn set_spray_interval(&mut self, secs: i32) {
        self.store.current_mut().set_spray_interval(secs);
    }

    pub fn set_trigger_temperature(&mut self, celsius: i32) {
        self.store.current_mut().set_trigger_temp(celsius);
    }

    pub fn brightness(&self) -> u8 {
        self.store.get_current().brightness()
    }

    /// Clamp to 0–100 and apply to the backlight.
    pub fn set_brightness(&mut self, percent: i32) {
        let settings = self.store.current_mut();
        settings.set_brightness(percent);
        self.backlight.set_percent(settings.brightness());
    }

    /// Persist the live settings and show the outcome on the main screen.
    pub fn save_settings(&mut self) -> Result<(), StorageError> {
        let result = self.store.save();
        let status = match result {
            Ok(()) => {
                info!("UiSession: settings saved");
                STATUS_SAVED
            }
            Err(e) => {
                error!("UiSession: settings save failed: {}", e);
                STATUS_SAVE_FAILED
            }
        };
        if let Some(main) = self.screens.main_screen() {
            main.set_status(&mut self.ui, status);
        }
        result
    }

    /// Destroy every screen and hand the toolkit back.
    pub fn teardown(self) -> U {
        let Self { mut ui, screens, .. } = self;
        screens.teardown(&mut ui);
        ui
    }
}

impl<U: UiToolkit, B: Backlight, C: WallClock> UiUpdatePort for UiSession<U, B, C> {
    fn set_temperature(&mut self, celsius: f32) {
        if let Some(main) = self.screens.main_screen() {
            main.set_temperature(&mut self.ui, celsius);
        }
    }

    fn set_power_indicator(&mut self, on: bool) {
        if let Some(main) = self.screens.main_screen() {
            main.set_power(&mut self.ui, on);
        }
    }

    fn set_tank_empty_indicator(&mut self, empty: bool) {
        if let Some(main) = self.screens.main_screen() {
            main.set_tank_empty(&mut self.ui, empty);
        }
    }

    fn set_relay_indicator(&mut self, active: bool) {
        if let Some(main) = self.screens.main_screen() {
            main.set_relay(&mut self.ui, active);
        }
    }

    fn trigger_temperature(&self) -> i32 {
        self.store.get_current().trigger_temp()
    }
}
