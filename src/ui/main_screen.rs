//! Home screen: intercooler temperature, status lamps, clock and SAVE.
//!
//! ```text
//!  ┌──────────────────────────────┐
//!  │            41.5°             │  ← colour-coded by warning/critical
//!  │                              │
//!  │  (●) Relay   12:34   Tank (●)│
//!  │  (●) Power          [ SAVE ] │
//!  │        Settings saved!       │
//!  └──────────────────────────────┘
//! ```

use core::fmt::Write as _;

use crate::app::ports::{Rgb, UiToolkit, WidgetHandle, WidgetKind};
use crate::error::UiError;
use crate::ui::ScreenCtx;
use crate::ui::timer::Periodic;

/// Display colour bands. Independent of the user trigger temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempThresholds {
    pub warning_c: f32,
    pub critical_c: f32,
}

impl TempThresholds {
    pub fn color_for(&self, celsius: f32) -> Rgb {
        if celsius >= self.critical_c {
            Rgb::RED
        } else if celsius >= self.warning_c {
            Rgb::ORANGE
        } else {
            Rgb::GREEN
        }
    }
}

pub struct MainScreen {
    container: WidgetHandle,
    temp_label: WidgetHandle,
    relay_led: WidgetHandle,
    tank_led: WidgetHandle,
    power_led: WidgetHandle,
    clock_label: WidgetHandle,
    status_label: WidgetHandle,
    clock_timer: Periodic,
    thresholds: TempThresholds,
}

impl MainScreen {
    pub fn create(
        ctx: &mut ScreenCtx<'_>,
        thresholds: TempThresholds,
        clock_refresh_ms: u32,
    ) -> Result<Self, UiError> {
        let root = ctx.ui.root();
        let container = ctx.ui.create_widget(root, WidgetKind::Screen)?;
        match Self::build(ctx.ui, container, thresholds, clock_refresh_ms, ctx.now_ms) {
            Ok(screen) => {
                screen.refresh_clock(ctx);
                Ok(screen)
            }
            Err(e) => {
                ctx.ui.destroy_widget(container);
                Err(e)
            }
        }
    }

    fn build(
        ui: &mut dyn UiToolkit,
        container: WidgetHandle,
        thresholds: TempThresholds,
        clock_refresh_ms: u32,
        now_ms: u32,
    ) -> Result<Self, UiError> {
        let temp_label = ui.create_widget(container, WidgetKind::Label)?;
        ui.set_text(temp_label, "--.-°");
        ui.set_color(temp_label, Rgb::WHITE);

        let relay_led = ui.create_widget(container, WidgetKind::Indicator(Rgb::GREEN))?;
        ui.set_indicator(relay_led, false);
        let tank_led = ui.create_widget(container, WidgetKind::Indicator(Rgb::RED))?;
        ui.set_indicator(tank_led, false);
        let power_led = ui.create_widget(container, WidgetKind::Indicator(Rgb::GREEN))?;
        ui.set_indicator(power_led, false);

        let clock_label = ui.create_widget(container, WidgetKind::Label)?;
        ui.set_text(clock_label, "--:--");

        ui.create_widget(container, WidgetKind::SaveButton)?;
        let status_label = ui.create_widget(container, WidgetKind::Label)?;
        ui.set_text(status_label, "");

        Ok(Self {
            container,
            temp_label,
            relay_led,
            tank_led,
            power_led,
            clock_label,
            status_label,
            clock_timer: Periodic::new(clock_refresh_ms, now_ms),
            thresholds,
        })
    }

    pub fn container(&self) -> WidgetHandle {
        self.container
    }

    pub fn on_show(&mut self, ctx: &mut ScreenCtx<'_>) {
        self.clock_timer.resume(ctx.now_ms);
        self.refresh_clock(ctx);
    }

    pub fn on_hide(&mut self, _ctx: &mut ScreenCtx<'_>) {
        self.clock_timer.pause();
    }

    pub fn tick(&mut self, ctx: &mut ScreenCtx<'_>) {
        if self.clock_timer.poll(ctx.now_ms) {
            self.refresh_clock(ctx);
        }
    }

    pub fn destroy(self, ui: &mut dyn UiToolkit) {
        ui.destroy_widget(self.container);
    }

    fn refresh_clock(&self, ctx: &mut ScreenCtx<'_>) {
        let mut text: heapless::String<8> = heapless::String::new();
        match ctx.clock.local_hour_minute() {
            Some((h, m)) => {
                let _ = write!(text, "{:02}:{:02}", h, m);
            }
            None => {
                let _ = text.push_str("--:--");
            }
        }
        ctx.ui.set_text(self.clock_label, &text);
    }

    // ── Update entry points (UI lock held by caller) ──────────

    pub fn set_temperature(&self, ui: &mut dyn UiToolkit, celsius: f32) {
        let mut text: heapless::String<16> = heapless::String::new();
        let _ = write!(text, "{:.1}°", celsius);
        ui.set_text(self.temp_label, &text);
        ui.set_color(self.temp_label, self.thresholds.color_for(celsius));
    }

    pub fn set_power(&self, ui: &mut dyn UiToolkit, on: bool) {
        ui.set_indicator(self.power_led, on);
    }

    pub fn set_tank_empty(&self, ui: &mut dyn UiToolkit, empty: bool) {
        ui.set_indicator(self.tank_led, empty);
    }

    pub fn set_relay(&self, ui: &mut dyn UiToolkit, active: bool) {
        ui.set_indicator(self.relay_led, active);
    }

    pub fn set_status(&self, ui: &mut dyn UiToolkit, text: &str) {
        ui.set_text(self.status_label, text);
    }
}
