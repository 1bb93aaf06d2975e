//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ScreenManager / AcquisitionLoop (domain)
//! ```
//!
//! Driven adapters (display toolkit, backlight PWM, ADC, RTC) implement these
//! traits. The UI session and the acquisition loop consume them via generics
//! or `dyn`, so the domain core never touches a register directly.

use crate::app::events::UiEvent;
use crate::error::{SensorError, UiError};

// ───────────────────────────────────────────────────────────────
// UI toolkit port (domain ↔ widget renderer)
// ───────────────────────────────────────────────────────────────

/// Opaque widget reference handed out by the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetHandle(pub u32);

/// 24-bit colour, `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const GREEN: Self = Self(0x00FF00);
    pub const ORANGE: Self = Self(0xFFA500);
    pub const RED: Self = Self(0xFF0000);
    pub const WHITE: Self = Self(0xFFFFFF);
}

/// Widget classes the screens need. Styling is the toolkit's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// Full-screen container; one per screen.
    Screen,
    Label,
    /// On/off lamp with a fixed on-colour.
    Indicator(Rgb),
    Slider { min: i32, max: i32 },
    /// Tap target that reports [`UiEvent::SaveRequested`].
    SaveButton,
}

/// The widget toolkit as seen by the screen manager.
///
/// Every method must be called with the UI lock held. `run_pending` is the
/// toolkit's own timer/animation/input pump and returns the next input event
/// it produced, if any.
pub trait UiToolkit {
    /// Shared root container all screens are created under.
    fn root(&self) -> WidgetHandle;

    /// Panel resolution in pixels `(width, height)`.
    fn resolution(&self) -> (i32, i32);

    fn create_widget(&mut self, parent: WidgetHandle, kind: WidgetKind) -> Result<WidgetHandle, UiError>;

    fn destroy_widget(&mut self, widget: WidgetHandle);

    fn set_hidden(&mut self, widget: WidgetHandle, hidden: bool);

    fn set_position(&mut self, widget: WidgetHandle, x: i32, y: i32);

    fn set_text(&mut self, widget: WidgetHandle, text: &str);

    fn set_color(&mut self, widget: WidgetHandle, color: Rgb);

    fn set_slider_value(&mut self, widget: WidgetHandle, value: i32);

    fn set_indicator(&mut self, widget: WidgetHandle, on: bool);

    /// Interpolate the widget's position from `from` to `to` over `duration_ms`.
    fn animate_position(&mut self, widget: WidgetHandle, from: (i32, i32), to: (i32, i32), duration_ms: u32);

    /// Run pending toolkit work and pop the next input event.
    fn run_pending(&mut self, now_ms: u32) -> Option<UiEvent>;
}

// ───────────────────────────────────────────────────────────────
// Backlight port (domain → LEDC PWM)
// ───────────────────────────────────────────────────────────────

pub trait Backlight {
    /// Apply a brightness in percent. Callers clamp to 0–100 first.
    fn set_percent(&mut self, percent: u8);
}

// ───────────────────────────────────────────────────────────────
// ADC port (hardware → thermistor sampler)
// ───────────────────────────────────────────────────────────────

/// One-shot analog conversion on the thermistor channel.
pub trait AdcPort {
    /// Raw 12-bit conversion result.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock ports
// ───────────────────────────────────────────────────────────────

/// Local wall-clock time for the main screen clock.
pub trait WallClock {
    /// `(hour, minute)`, or `None` if the RTC has not been set.
    fn local_hour_minute(&self) -> Option<(u8, u8)>;
}

/// Milliseconds since boot, wrapping at `u32::MAX`.
pub trait MonotonicClock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// UI update port (acquisition loop → screens, under the UI lock)
// ───────────────────────────────────────────────────────────────

/// Entry points the acquisition loop drives. Implemented by
/// [`UiSession`](super::session::UiSession); callers hold the UI lock.
pub trait UiUpdatePort {
    fn set_temperature(&mut self, celsius: f32);

    fn set_power_indicator(&mut self, on: bool);

    fn set_tank_empty_indicator(&mut self, empty: bool);

    fn set_relay_indicator(&mut self, active: bool);

    /// User trigger temperature in °C.
    fn trigger_temperature(&self) -> i32;
}
