//! Slider screens for the four user settings.
//!
//! All four share one layout (title, big value label, slider, hint) and
//! differ only in the [`SettingField`] they edit. Raw slider values are
//! mapped to setting units by the field:
//!
//! | Field          | Slider  | Unit            | Label   |
//! |----------------|---------|-----------------|---------|
//! | TriggerTemp    | 20–70   | °C              | `45°C`  |
//! | SprayDuration  | 1–20    | 0.5 s per step  | `2.5s`  |
//! | SprayInterval  | 5–30    | s               | `10s`   |
//! | Brightness     | 0–100   | %               | `70%`   |

use core::fmt::Write as _;

use log::info;

use crate::app::events::SliderEvent;
use crate::app::ports::{UiToolkit, WidgetHandle, WidgetKind};
use crate::error::UiError;
use crate::settings::{SPRAY_DURATION_STEP, Settings};
use crate::ui::{ScreenCtx, ScreenId};

pub type LabelText = heapless::String<16>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    TriggerTemp,
    SprayDuration,
    SprayInterval,
    Brightness,
}

impl SettingField {
    /// The field edited on `screen`, if it is a settings screen.
    pub fn for_screen(screen: ScreenId) -> Option<Self> {
        match screen {
            ScreenId::Main => None,
            ScreenId::Brightness => Some(Self::Brightness),
            ScreenId::TriggerTemp => Some(Self::TriggerTemp),
            ScreenId::SprayDuration => Some(Self::SprayDuration),
            ScreenId::SprayInterval => Some(Self::SprayInterval),
        }
    }

    pub fn slider_range(self) -> (i32, i32) {
        match self {
            Self::TriggerTemp => (20, 70),
            Self::SprayDuration => (1, 20),
            Self::SprayInterval => (5, 30),
            Self::Brightness => (0, 100),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::TriggerTemp => "TRIGGER TEMP",
            Self::SprayDuration => "SPRAY DURATION",
            Self::SprayInterval => "SPRAY INTERVAL",
            Self::Brightness => "BRIGHTNESS",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::Brightness => "Swipe up to return",
            Self::SprayInterval => "Swipe right to go back",
            Self::TriggerTemp | Self::SprayDuration => "Swipe left / right",
        }
    }

    /// Current setting expressed as a slider position.
    pub fn read_raw(self, settings: &Settings) -> i32 {
        match self {
            Self::TriggerTemp => settings.trigger_temp(),
            Self::SprayDuration => (settings.spray_duration() / SPRAY_DURATION_STEP).round() as i32,
            Self::SprayInterval => settings.spray_interval(),
            Self::Brightness => i32::from(settings.brightness()),
        }
    }

    /// Commit a slider position into `settings`.
    pub fn write_raw(self, settings: &mut Settings, raw: i32) {
        match self {
            Self::TriggerTemp => settings.set_trigger_temp(raw),
            Self::SprayDuration => settings.set_spray_duration(raw as f32 * SPRAY_DURATION_STEP),
            Self::SprayInterval => settings.set_spray_interval(raw),
            Self::Brightness => settings.set_brightness(raw),
        }
    }

    pub fn format(self, raw: i32) -> LabelText {
        let mut text = LabelText::new();
        let _ = match self {
            Self::TriggerTemp => write!(text, "{}°C", raw),
            Self::SprayDuration => write!(text, "{:.1}s", raw as f32 * SPRAY_DURATION_STEP),
            Self::SprayInterval => write!(text, "{}s", raw),
            Self::Brightness => write!(text, "{}%", raw),
        };
        text
    }
}

pub struct SettingScreen {
    field: SettingField,
    container: WidgetHandle,
    value_label: WidgetHandle,
    slider: WidgetHandle,
    /// Last raw value rendered into `value_label`.
    last_rendered: i32,
}

impl SettingScreen {
    pub fn create(ctx: &mut ScreenCtx<'_>, field: SettingField) -> Result<Self, UiError> {
        let root = ctx.ui.root();
        let container = ctx.ui.create_widget(root, WidgetKind::Screen)?;
        Self::build(ctx, field, container).inspect_err(|_| ctx.ui.destroy_widget(container))
    }

    fn build(ctx: &mut ScreenCtx<'_>, field: SettingField, container: WidgetHandle) -> Result<Self, UiError> {
        let ui = &mut *ctx.ui;
        let title = ui.create_widget(container, WidgetKind::Label)?;
        ui.set_text(title, field.title());

        let value_label = ui.create_widget(container, WidgetKind::Label)?;
        let (min, max) = field.slider_range();
        let slider = ui.create_widget(container, WidgetKind::Slider { min, max })?;

        let hint = ui.create_widget(container, WidgetKind::Label)?;
        ui.set_text(hint, field.hint());

        let mut screen = Self {
            field,
            container,
            value_label,
            slider,
            last_rendered: i32::MIN,
        };
        screen.sync_from_settings(ctx);
        Ok(screen)
    }

    pub fn field(&self) -> SettingField {
        self.field
    }

    pub fn container(&self) -> WidgetHandle {
        self.container
    }

    /// Reload slider and label from the live settings.
    pub fn on_show(&mut self, ctx: &mut ScreenCtx<'_>) {
        self.sync_from_settings(ctx);
    }

    pub fn on_hide(&mut self, _ctx: &mut ScreenCtx<'_>) {}

    pub fn destroy(self, ui: &mut dyn UiToolkit) {
        ui.destroy_widget(self.container);
    }

    fn sync_from_settings(&mut self, ctx: &mut ScreenCtx<'_>) {
        let raw = self.field.read_raw(ctx.settings);
        ctx.ui.set_slider_value(self.slider, raw);
        self.render(ctx.ui, raw);
    }

    fn render(&mut self, ui: &mut dyn UiToolkit, raw: i32) {
        if raw != self.last_rendered {
            ui.set_text(self.value_label, &self.field.format(raw));
            self.last_rendered = raw;
        }
    }

    /// Handle a slider event. The caller resets the inactivity deadline.
    ///
    /// Positions outside the slider range are clamped, so the label always
    /// shows the value that gets stored.
    pub fn handle_slider(&mut self, event: SliderEvent, ctx: &mut ScreenCtx<'_>) {
        let (min, max) = self.field.slider_range();
        match event {
            SliderEvent::Pressed => {}
            SliderEvent::Dragging(raw) => self.render(ctx.ui, raw.clamp(min, max)),
            SliderEvent::Released(raw) => {
                let raw = raw.clamp(min, max);
                self.render(ctx.ui, raw);
                self.field.write_raw(ctx.settings, raw);
                if self.field == SettingField::Brightness {
                    ctx.backlight.set_percent(ctx.settings.brightness());
                }
                info!("SettingScreen: {} = {}", self.field.title(), self.field.format(raw));
            }
        }
    }
}
