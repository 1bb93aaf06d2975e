//! Mock UI adapters for integration tests.
//!
//! `MockToolkit` records every toolkit call so tests can assert on the full
//! widget history, and keeps live widget state in a `HeadlessDisplay` so
//! they can also ask what is on screen right now.

use std::collections::VecDeque;
use std::path::PathBuf;

use sprayctl::adapters::display::HeadlessDisplay;
use sprayctl::app::events::UiEvent;
use sprayctl::app::ports::{Backlight, Rgb, UiToolkit, WallClock, WidgetHandle, WidgetKind};
use sprayctl::app::session::UiSession;
use sprayctl::config::SystemConfig;
use sprayctl::error::UiError;
use sprayctl::settings::SettingsStore;

pub const PANEL: (i32, i32) = (480, 480);

// ── Toolkit call record ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum UiCall {
    Create { parent: WidgetHandle, kind: WidgetKind, handle: WidgetHandle },
    CreateRefused { parent: WidgetHandle, kind: WidgetKind },
    Destroy(WidgetHandle),
    SetHidden(WidgetHandle, bool),
    SetPosition(WidgetHandle, i32, i32),
    SetText(WidgetHandle, String),
    SetColor(WidgetHandle, Rgb),
    SetSlider(WidgetHandle, i32),
    SetIndicator(WidgetHandle, bool),
    Animate { widget: WidgetHandle, from: (i32, i32), to: (i32, i32), duration_ms: u32 },
}

// ── MockToolkit ───────────────────────────────────────────────

pub struct MockToolkit {
    pub calls: Vec<UiCall>,
    display: HeadlessDisplay,
    events: VecDeque<UiEvent>,
    /// Successful creations left before every further one is refused.
    creates_left: Option<usize>,
}

#[allow(dead_code)]
impl MockToolkit {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            display: HeadlessDisplay::new(PANEL.0, PANEL.1),
            events: VecDeque::new(),
            creates_left: None,
        }
    }

    /// Let `n` more widgets be created, then fail every creation.
    pub fn fail_creation_after(&mut self, n: usize) {
        self.creates_left = Some(n);
    }

    pub fn allow_creation(&mut self) {
        self.creates_left = None;
    }

    pub fn push_event(&mut self, event: UiEvent) {
        self.events.push_back(event);
    }

    /// Screen containers in creation order.
    pub fn screen_containers(&self) -> Vec<WidgetHandle> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                UiCall::Create { kind: WidgetKind::Screen, handle, .. } => Some(*handle),
                _ => None,
            })
            .collect()
    }

    /// Children created under `parent`, in creation order.
    pub fn children(&self, parent: WidgetHandle) -> Vec<(WidgetHandle, WidgetKind)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                UiCall::Create { parent: p, kind, handle } if *p == parent => Some((*handle, *kind)),
                _ => None,
            })
            .collect()
    }

    pub fn text_writes(&self, widget: WidgetHandle) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, UiCall::SetText(w, _) if *w == widget))
            .count()
    }

    pub fn destroyed(&self) -> Vec<WidgetHandle> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                UiCall::Destroy(w) => Some(*w),
                _ => None,
            })
            .collect()
    }

    pub fn live_widgets(&self) -> usize {
        self.display.widget_count()
    }

    pub fn exists(&self, w: WidgetHandle) -> bool {
        self.display.exists(w)
    }

    pub fn text(&self, w: WidgetHandle) -> Option<&str> {
        self.display.text(w)
    }

    pub fn is_hidden(&self, w: WidgetHandle) -> Option<bool> {
        self.display.is_hidden(w)
    }

    pub fn position(&self, w: WidgetHandle) -> Option<(i32, i32)> {
        self.display.position(w)
    }

    pub fn indicator(&self, w: WidgetHandle) -> Option<bool> {
        self.display.indicator(w)
    }

    pub fn color(&self, w: WidgetHandle) -> Option<Rgb> {
        self.display.color(w)
    }

    pub fn slider_value(&self, w: WidgetHandle) -> Option<i32> {
        self.display.slider_value(w)
    }
}

impl UiToolkit for MockToolkit {
    fn root(&self) -> WidgetHandle {
        self.display.root()
    }

    fn resolution(&self) -> (i32, i32) {
        self.display.resolution()
    }

    fn create_widget(&mut self, parent: WidgetHandle, kind: WidgetKind) -> Result<WidgetHandle, UiError> {
        if let Some(left) = self.creates_left.as_mut() {
            if *left == 0 {
                self.calls.push(UiCall::CreateRefused { parent, kind });
                return Err(UiError::WidgetCreateFailed);
            }
            *left -= 1;
        }
        let handle = self.display.create_widget(parent, kind)?;
        self.calls.push(UiCall::Create { parent, kind, handle });
        Ok(handle)
    }

    fn destroy_widget(&mut self, widget: WidgetHandle) {
        self.calls.push(UiCall::Destroy(widget));
        self.display.destroy_widget(widget);
    }

    fn set_hidden(&mut self, widget: WidgetHandle, hidden: bool) {
        self.calls.push(UiCall::SetHidden(widget, hidden));
        self.display.set_hidden(widget, hidden);
    }

    fn set_position(&mut self, widget: WidgetHandle, x: i32, y: i32) {
        self.calls.push(UiCall::SetPosition(widget, x, y));
        self.display.set_position(widget, x, y);
    }

    fn set_text(&mut self, widget: WidgetHandle, text: &str) {
        self.calls.push(UiCall::SetText(widget, text.to_string()));
        self.display.set_text(widget, text);
    }

    fn set_color(&mut self, widget: WidgetHandle, color: Rgb) {
        self.calls.push(UiCall::SetColor(widget, color));
        self.display.set_color(widget, color);
    }

    fn set_slider_value(&mut self, widget: WidgetHandle, value: i32) {
        self.calls.push(UiCall::SetSlider(widget, value));
        self.display.set_slider_value(widget, value);
    }

    fn set_indicator(&mut self, widget: WidgetHandle, on: bool) {
        self.calls.push(UiCall::SetIndicator(widget, on));
        self.display.set_indicator(widget, on);
    }

    fn animate_position(&mut self, widget: WidgetHandle, from: (i32, i32), to: (i32, i32), duration_ms: u32) {
        self.calls.push(UiCall::Animate { widget, from, to, duration_ms });
        self.display.animate_position(widget, from, to, duration_ms);
    }

    fn run_pending(&mut self, _now_ms: u32) -> Option<UiEvent> {
        self.events.pop_front()
    }
}

impl Default for MockToolkit {
    fn default() -> Self {
        Self::new()
    }
}

// ── Backlight + clock ─────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockBacklight {
    pub levels: Vec<u8>,
}

#[allow(dead_code)]
impl MockBacklight {
    pub fn last(&self) -> Option<u8> {
        self.levels.last().copied()
    }
}

impl Backlight for MockBacklight {
    fn set_percent(&mut self, percent: u8) {
        self.levels.push(percent);
    }
}

/// Wall clock frozen at one reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub Option<(u8, u8)>);

impl WallClock for FixedClock {
    fn local_hour_minute(&self) -> Option<(u8, u8)> {
        self.0
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type TestSession = UiSession<MockToolkit, MockBacklight, FixedClock>;

/// Fresh directory under the system temp dir, unique per test tag.
pub fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sprayctl-it-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Session with default settings, built at `now_ms`.
pub fn session_at(tag: &str, now_ms: u32) -> TestSession {
    let store = SettingsStore::new(temp_dir(tag).join("system").join("SETTINGS.TXT"));
    session_with(MockToolkit::new(), store, FixedClock(None), now_ms)
}

pub fn session_with(ui: MockToolkit, store: SettingsStore, clock: FixedClock, now_ms: u32) -> TestSession {
    UiSession::new(
        ui,
        MockBacklight::default(),
        clock,
        store,
        &SystemConfig::default(),
        now_ms,
    )
    .expect("main screen builds")
}

/// Handles of the Main screen widgets, in build order.
pub struct MainWidgets {
    pub container: WidgetHandle,
    pub temp: WidgetHandle,
    pub relay: WidgetHandle,
    pub tank: WidgetHandle,
    pub power: WidgetHandle,
    pub clock: WidgetHandle,
    pub status: WidgetHandle,
}

pub fn main_widgets(ui: &MockToolkit) -> MainWidgets {
    let container = ui.screen_containers()[0];
    let kids: Vec<WidgetHandle> = ui.children(container).into_iter().map(|(h, _)| h).collect();
    assert_eq!(kids.len(), 7, "main screen layout changed");
    MainWidgets {
        container,
        temp: kids[0],
        relay: kids[1],
        tank: kids[2],
        power: kids[3],
        clock: kids[4],
        status: kids[6],
    }
}
