//! Integration tests: screen navigation, inactivity return, settings
//! screens and the acquisition → main screen path, driven through
//! `UiSession` with the mock toolkit.

use std::sync::{Arc, Mutex};

use sprayctl::acquisition::AcquisitionLoop;
use sprayctl::app::events::{Direction, SliderEvent, UiEvent};
use sprayctl::app::ports::{Rgb, WidgetHandle, WidgetKind};
use sprayctl::app::session::{STATUS_SAVE_FAILED, STATUS_SAVED};
use sprayctl::drivers::debounce::{DebouncedInput, SimPin};
use sprayctl::error::UiError;
use sprayctl::sensors::thermistor::{Calibration, SimAdc, ThermistorSampler};
use sprayctl::settings::SettingsStore;
use sprayctl::ui::ScreenId;
use sprayctl::ui::Transition;
use sprayctl::ui::manager::NavOutcome;

use crate::mock_ui::{
    FixedClock, MockToolkit, PANEL, TestSession, UiCall, main_widgets, session_at, session_with, temp_dir,
};

const T0: u32 = 1_000;

fn swipe(s: &mut TestSession, dir: Direction, now: u32) -> NavOutcome {
    s.handle_event(UiEvent::Gesture(dir), now)
        .expect("gestures always report an outcome")
}

fn navigated_to(outcome: NavOutcome) -> Option<(ScreenId, Transition)> {
    match outcome {
        NavOutcome::Navigated(rec) => Some((rec.to, rec.transition)),
        _ => None,
    }
}

/// `(value label, slider)` of the settings screen built `nth` (1 = first after Main).
fn setting_widgets(ui: &MockToolkit, nth: usize) -> (WidgetHandle, WidgetHandle) {
    let container = ui.screen_containers()[nth];
    let kids = ui.children(container);
    assert!(matches!(kids[2].1, WidgetKind::Slider { .. }));
    (kids[1].0, kids[2].0)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_applies_brightness_and_shows_only_main() {
    let s = session_at("startup", T0);
    assert_eq!(s.current_screen(), ScreenId::Main);
    assert_eq!(s.backlight().levels, vec![70]);
    assert!(s.screens().is_created(ScreenId::Main));
    for id in [ScreenId::Brightness, ScreenId::TriggerTemp, ScreenId::SprayDuration, ScreenId::SprayInterval] {
        assert!(!s.screens().is_created(id), "{:?} built eagerly", id);
    }
    let main = main_widgets(s.toolkit());
    assert_eq!(s.toolkit().is_hidden(main.container), Some(false));
    assert_eq!(s.toolkit().text(main.temp), Some("--.-°"));
    assert_eq!(s.toolkit().text(main.clock), Some("--:--"));
    assert_eq!(s.last_transition(), None);
}

#[test]
fn main_clock_shows_wall_time_when_set() {
    let store = SettingsStore::new(temp_dir("clock").join("SETTINGS.TXT"));
    let s = session_with(MockToolkit::new(), store, FixedClock(Some((9, 5))), T0);
    let main = main_widgets(s.toolkit());
    assert_eq!(s.toolkit().text(main.clock), Some("09:05"));
}

// ── Routing ───────────────────────────────────────────────────

#[test]
fn swipe_down_opens_brightness_from_above() {
    let mut s = session_at("down", T0);
    let outcome = swipe(&mut s, Direction::Down, T0);
    assert_eq!(navigated_to(outcome), Some((ScreenId::Brightness, Transition::SlideDown)));
    assert_eq!(s.current_screen(), ScreenId::Brightness);
    assert!(s.screens().is_created(ScreenId::Brightness));

    let ui = s.toolkit();
    let incoming = ui.screen_containers()[1];
    let h = PANEL.1;
    assert!(ui.calls.iter().any(|c| matches!(
        c,
        UiCall::Animate { widget, from, to: (0, 0), .. } if *widget == incoming && *from == (0, -h)
    )));
}

#[test]
fn left_chain_walks_every_settings_screen_and_back() {
    let mut s = session_at("chain", T0);
    let mut now = T0;
    for expected in [ScreenId::TriggerTemp, ScreenId::SprayDuration, ScreenId::SprayInterval] {
        let outcome = swipe(&mut s, Direction::Left, now);
        assert_eq!(navigated_to(outcome), Some((expected, Transition::SlideLeft)));
        now += 500;
    }
    assert_eq!(swipe(&mut s, Direction::Left, now), NavOutcome::NoRoute);
    now += 500;
    for expected in [ScreenId::SprayDuration, ScreenId::TriggerTemp, ScreenId::Main] {
        let outcome = swipe(&mut s, Direction::Right, now);
        assert_eq!(navigated_to(outcome), Some((expected, Transition::SlideRight)));
        now += 500;
    }
}

#[test]
fn revisiting_a_screen_reuses_its_widgets() {
    let mut s = session_at("reuse", T0);
    swipe(&mut s, Direction::Down, T0);
    swipe(&mut s, Direction::Up, T0 + 500);
    swipe(&mut s, Direction::Down, T0 + 1_000);
    assert_eq!(s.toolkit().screen_containers().len(), 2);
}

#[test]
fn outgoing_screen_is_hidden_once_the_slide_completes() {
    let mut s = session_at("slide", T0);
    let main = main_widgets(s.toolkit()).container;
    swipe(&mut s, Direction::Left, T0);
    assert_eq!(s.toolkit().is_hidden(main), Some(false));
    s.tick(T0 + 299);
    assert_eq!(s.toolkit().is_hidden(main), Some(false));
    s.tick(T0 + 300);
    assert_eq!(s.toolkit().is_hidden(main), Some(true));
    let incoming = s.toolkit().screen_containers()[1];
    assert_eq!(s.toolkit().position(incoming), Some((0, 0)));
}

// ── Cooldown ──────────────────────────────────────────────────

#[test]
fn gestures_inside_the_cooldown_are_dropped() {
    let mut s = session_at("cooldown", T0);
    assert!(swipe(&mut s, Direction::Down, T0).changed_screen());
    assert_eq!(swipe(&mut s, Direction::Up, T0 + 200), NavOutcome::CooldownActive);
    assert_eq!(s.current_screen(), ScreenId::Brightness);
    assert!(swipe(&mut s, Direction::Up, T0 + 400).changed_screen());
    assert_eq!(s.current_screen(), ScreenId::Main);
}

#[test]
fn unmapped_gesture_still_starts_the_cooldown() {
    let mut s = session_at("noroute", T0);
    assert_eq!(swipe(&mut s, Direction::Up, T0), NavOutcome::NoRoute);
    assert_eq!(s.current_screen(), ScreenId::Main);
    assert_eq!(swipe(&mut s, Direction::Down, T0 + 100), NavOutcome::CooldownActive);
    assert!(swipe(&mut s, Direction::Down, T0 + 400).changed_screen());
}

#[test]
fn programmatic_navigation_ignores_the_cooldown() {
    let mut s = session_at("programmatic", T0);
    swipe(&mut s, Direction::Down, T0);
    let outcome = s.navigate(ScreenId::SprayInterval, Transition::None, T0 + 10);
    assert_eq!(navigated_to(outcome), Some((ScreenId::SprayInterval, Transition::None)));
    assert_eq!(s.navigate(ScreenId::SprayInterval, Transition::None, T0 + 20), NavOutcome::AlreadyCurrent);
}

#[test]
fn unknown_screen_index_is_rejected() {
    let mut s = session_at("index", T0);
    assert_eq!(s.navigate_index(ScreenId::COUNT, Transition::None, T0), NavOutcome::OutOfRange);
    assert_eq!(s.current_screen(), ScreenId::Main);
    let outcome = s.navigate_index(ScreenId::Brightness.index(), Transition::SlideDown, T0);
    assert_eq!(navigated_to(outcome), Some((ScreenId::Brightness, Transition::SlideDown)));
}

// ── Inactivity ────────────────────────────────────────────────

#[test]
fn brightness_returns_to_main_sliding_up_after_15s() {
    let mut s = session_at("idle-bright", T0);
    swipe(&mut s, Direction::Down, T0);
    assert_eq!(s.screens().inactivity_remaining(T0 + 5_000), Some(10_000));
    s.tick(T0 + 14_999);
    assert_eq!(s.current_screen(), ScreenId::Brightness);
    s.tick(T0 + 15_000);
    assert_eq!(s.current_screen(), ScreenId::Main);
    let rec = s.last_transition().unwrap();
    assert_eq!((rec.from, rec.to, rec.transition), (ScreenId::Brightness, ScreenId::Main, Transition::SlideUp));
}

#[test]
fn settings_screens_return_to_main_sliding_right() {
    let mut s = session_at("idle-setting", T0);
    swipe(&mut s, Direction::Left, T0);
    swipe(&mut s, Direction::Left, T0 + 500);
    s.tick(T0 + 500 + 15_000);
    assert_eq!(s.current_screen(), ScreenId::Main);
    assert_eq!(s.last_transition().unwrap().transition, Transition::SlideRight);
}

#[test]
fn slider_activity_postpones_the_inactivity_return() {
    let mut s = session_at("idle-slider", T0);
    swipe(&mut s, Direction::Left, T0);
    s.handle_event(UiEvent::Slider(SliderEvent::Pressed), T0 + 10_000);
    s.tick(T0 + 16_000);
    assert_eq!(s.current_screen(), ScreenId::TriggerTemp);
    s.tick(T0 + 25_000);
    assert_eq!(s.current_screen(), ScreenId::Main);
}

#[test]
fn main_screen_never_times_out() {
    let mut s = session_at("idle-main", T0);
    s.tick(T0 + 60_000);
    assert_eq!(s.current_screen(), ScreenId::Main);
    assert_eq!(s.last_transition(), None);
}

// ── Construction failure ──────────────────────────────────────

#[test]
fn failed_build_keeps_the_previous_screen() {
    let mut s = session_at("buildfail", T0);
    let main = main_widgets(s.toolkit()).container;
    // Container succeeds, its first label does not.
    s.toolkit_mut().fail_creation_after(1);

    let outcome = swipe(&mut s, Direction::Down, T0);
    assert_eq!(outcome, NavOutcome::BuildFailed(UiError::WidgetCreateFailed));
    assert_eq!(s.current_screen(), ScreenId::Main);
    assert!(!s.screens().is_created(ScreenId::Brightness));
    assert_eq!(s.toolkit().is_hidden(main), Some(false));

    let partial = s.toolkit().screen_containers()[1];
    assert!(s.toolkit().destroyed().contains(&partial));
    assert!(!s.toolkit().exists(partial));

    s.toolkit_mut().allow_creation();
    assert!(swipe(&mut s, Direction::Down, T0 + 400).changed_screen());
}

// ── Settings screens ──────────────────────────────────────────

#[test]
fn brightness_release_commits_and_drives_the_backlight() {
    let mut s = session_at("bright-slider", T0);
    swipe(&mut s, Direction::Down, T0);
    let (label, slider) = setting_widgets(s.toolkit(), 1);
    assert_eq!(s.toolkit().text(label), Some("70%"));
    assert_eq!(s.toolkit().slider_value(slider), Some(70));

    s.handle_event(UiEvent::Slider(SliderEvent::Dragging(40)), T0 + 100);
    assert_eq!(s.toolkit().text(label), Some("40%"));
    assert_eq!(s.brightness(), 70);
    assert_eq!(s.backlight().last(), Some(70));

    s.handle_event(UiEvent::Slider(SliderEvent::Released(35)), T0 + 200);
    assert_eq!(s.toolkit().text(label), Some("35%"));
    assert_eq!(s.brightness(), 35);
    assert_eq!(s.backlight().last(), Some(35));
}

#[test]
fn dragging_only_repaints_on_a_new_value() {
    let mut s = session_at("drag-repaint", T0);
    swipe(&mut s, Direction::Left, T0);
    let (label, _) = setting_widgets(s.toolkit(), 1);
    let before = s.toolkit().text_writes(label);
    for _ in 0..3 {
        s.handle_event(UiEvent::Slider(SliderEvent::Dragging(55)), T0 + 50);
    }
    assert_eq!(s.toolkit().text_writes(label), before + 1);
    assert_eq!(s.toolkit().text(label), Some("55°C"));
    assert_eq!(s.settings().trigger_temp(), 40);
}

#[test]
fn released_duration_is_stored_in_half_seconds() {
    let mut s = session_at("duration", T0);
    swipe(&mut s, Direction::Left, T0);
    swipe(&mut s, Direction::Left, T0 + 500);
    let (label, _) = setting_widgets(s.toolkit(), 2);
    s.handle_event(UiEvent::Slider(SliderEvent::Released(7)), T0 + 600);
    assert_eq!(s.toolkit().text(label), Some("3.5s"));
    assert!((s.spray_duration() - 3.5).abs() < f32::EPSILON);
}

#[test]
fn out_of_range_slider_values_are_clamped_before_display() {
    let mut s = session_at("slider-clamp", T0);
    swipe(&mut s, Direction::Left, T0);
    let (label, _) = setting_widgets(s.toolkit(), 1);

    s.handle_event(UiEvent::Slider(SliderEvent::Dragging(-5)), T0 + 100);
    assert_eq!(s.toolkit().text(label), Some("20°C"));

    s.handle_event(UiEvent::Slider(SliderEvent::Released(999)), T0 + 200);
    assert_eq!(s.toolkit().text(label), Some("70°C"));
    assert_eq!(s.settings().trigger_temp(), 70);
}

#[test]
fn brightness_label_and_backlight_agree_past_the_top() {
    let mut s = session_at("bright-clamp", T0);
    swipe(&mut s, Direction::Down, T0);
    let (label, _) = setting_widgets(s.toolkit(), 1);
    s.handle_event(UiEvent::Slider(SliderEvent::Released(250)), T0 + 100);
    assert_eq!(s.toolkit().text(label), Some("100%"));
    assert_eq!(s.brightness(), 100);
    assert_eq!(s.backlight().last(), Some(100));
}

#[test]
fn settings_screen_reloads_values_changed_elsewhere() {
    let mut s = session_at("reload", T0);
    swipe(&mut s, Direction::Left, T0);
    swipe(&mut s, Direction::Right, T0 + 500);
    s.set_trigger_temperature(62);
    swipe(&mut s, Direction::Left, T0 + 1_000);
    let (label, slider) = setting_widgets(s.toolkit(), 1);
    assert_eq!(s.toolkit().text(label), Some("62°C"));
    assert_eq!(s.toolkit().slider_value(slider), Some(62));
}

// ── Save ──────────────────────────────────────────────────────

#[test]
fn save_reports_success_on_the_main_status_label() {
    let dir = temp_dir("save-ok");
    let path = dir.join("system").join("SETTINGS.TXT");
    let mut s = session_with(MockToolkit::new(), SettingsStore::new(&path), FixedClock(None), T0);
    s.set_spray_interval(12);
    s.handle_event(UiEvent::SaveRequested, T0 + 100);

    let main = main_widgets(s.toolkit());
    assert_eq!(s.toolkit().text(main.status), Some(STATUS_SAVED));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("spray_interval=12"), "{text}");
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn save_reports_failure_when_the_card_is_unwritable() {
    let dir = temp_dir("save-fail");
    let blocker = dir.join("system");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let store = SettingsStore::new(blocker.join("SETTINGS.TXT"));
    let mut s = session_with(MockToolkit::new(), store, FixedClock(None), T0);

    assert!(s.save_settings().is_err());
    let main = main_widgets(s.toolkit());
    assert_eq!(s.toolkit().text(main.status), Some(STATUS_SAVE_FAILED));
    let _ = std::fs::remove_dir_all(dir);
}

// ── Event pump ────────────────────────────────────────────────

#[test]
fn tick_drains_queued_toolkit_events() {
    let mut s = session_at("pump", T0);
    s.toolkit_mut().push_event(UiEvent::Gesture(Direction::Left));
    s.toolkit_mut().push_event(UiEvent::Slider(SliderEvent::Released(50)));
    s.tick(T0);
    assert_eq!(s.current_screen(), ScreenId::TriggerTemp);
    assert_eq!(s.settings().trigger_temp(), 50);
}

// ── Teardown ──────────────────────────────────────────────────

#[test]
fn teardown_destroys_every_created_screen() {
    let mut s = session_at("teardown", T0);
    swipe(&mut s, Direction::Down, T0);
    swipe(&mut s, Direction::Up, T0 + 500);
    swipe(&mut s, Direction::Left, T0 + 1_000);
    let ui = s.teardown();
    let containers = ui.screen_containers();
    assert_eq!(containers.len(), 3);
    for c in containers {
        assert!(ui.destroyed().contains(&c));
    }
    assert_eq!(ui.live_widgets(), 0);
}

// ── Acquisition → main screen ─────────────────────────────────

/// ADC code for roughly 50 °C with the default divider.
const RAW_50C: u16 = 1081;

#[test]
fn acquisition_updates_main_while_a_settings_screen_is_shown() {
    let mut s = session_at("acq", T0);
    swipe(&mut s, Direction::Left, T0);
    let main = main_widgets(s.toolkit());
    let session = Arc::new(Mutex::new(s));

    let power = Arc::new(DebouncedInput::new("power", 50, true));
    let tank = Arc::new(DebouncedInput::new("tank", 50, true));
    let mut pin = SimPin::new(false);
    assert!(power.seed(&mut pin));
    let mut acq = AcquisitionLoop::new(
        ThermistorSampler::new(SimAdc::new(RAW_50C), Calibration::default()),
        power,
        tank,
    );

    let report = acq.cycle(&*session);
    assert!(report.temperature_forwarded);
    assert_eq!(report.relay_forwarded, Some(true));

    let s = session.lock().unwrap();
    assert_eq!(s.current_screen(), ScreenId::TriggerTemp);
    let temp = s.toolkit().text(main.temp).unwrap();
    assert!(temp.ends_with('°') && temp != "--.-°", "{temp}");
    assert_ne!(s.toolkit().color(main.temp), Some(Rgb::WHITE));
    assert_eq!(s.toolkit().indicator(main.power), Some(true));
    assert_eq!(s.toolkit().indicator(main.tank), Some(false));
    assert_eq!(s.toolkit().indicator(main.relay), Some(true));
}
