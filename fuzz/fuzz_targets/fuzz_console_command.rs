//! Fuzz target: `parse_command` (serial console input)
//!
//! Feeds arbitrary UTF-8 lines to the console parser. It must never panic,
//! and anything it accepts must survive a re-parse of its own canonical
//! spelling.
//!
//! cargo fuzz run fuzz_console_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use sprayctl::adapters::console::parse_command;
use sprayctl::app::events::{Direction, SliderEvent, UiEvent};

fn canonical(event: UiEvent) -> String {
    match event {
        UiEvent::Gesture(Direction::Up) => "u".into(),
        UiEvent::Gesture(Direction::Down) => "d".into(),
        UiEvent::Gesture(Direction::Left) => "l".into(),
        UiEvent::Gesture(Direction::Right) => "r".into(),
        UiEvent::Slider(SliderEvent::Pressed) => "press".into(),
        UiEvent::Slider(SliderEvent::Dragging(v)) => format!("drag {v}"),
        UiEvent::Slider(SliderEvent::Released(v)) => format!("release {v}"),
        UiEvent::SaveRequested => "save".into(),
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if let Some(event) = parse_command(line) {
        assert_eq!(parse_command(&canonical(event)), Some(event));
    }
});
