//! Serial console input.
//!
//! Reads lines from stdin (UART / USB-CDC on the device) and turns them
//! into [`UiEvent`]s for the headless display:
//!
//! | line            | event                       |
//! |-----------------|-----------------------------|
//! | `u` `d` `l` `r` | swipe up / down / left / right |
//! | `press`         | slider pressed              |
//! | `drag <n>`      | slider dragged to `n`       |
//! | `release <n>`   | slider released at `n`      |
//! | `save`          | SAVE tapped                 |
//!
//! `halt` is handled by the reader itself: it raises the shutdown flag and
//! stops reading.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use log::{info, warn};

use crate::app::events::{Direction, SliderEvent, UiEvent};
use crate::drivers::task_pin::{self, TaskSpec};

/// Parse one console line. Case-insensitive; surrounding blanks ignored.
pub fn parse_command(line: &str) -> Option<UiEvent> {
    let mut words = line.split_whitespace();
    let cmd = words.next()?.to_ascii_lowercase();
    let arg = words.next().map(str::parse::<i32>);
    if words.next().is_some() {
        return None;
    }
    match (cmd.as_str(), arg) {
        ("u" | "up", None) => Some(UiEvent::Gesture(Direction::Up)),
        ("d" | "down", None) => Some(UiEvent::Gesture(Direction::Down)),
        ("l" | "left", None) => Some(UiEvent::Gesture(Direction::Left)),
        ("r" | "right", None) => Some(UiEvent::Gesture(Direction::Right)),
        ("press", None) => Some(UiEvent::Slider(SliderEvent::Pressed)),
        ("drag", Some(Ok(v))) => Some(UiEvent::Slider(SliderEvent::Dragging(v))),
        ("release", Some(Ok(v))) => Some(UiEvent::Slider(SliderEvent::Released(v))),
        ("save", None) => Some(UiEvent::SaveRequested),
        _ => None,
    }
}

/// Start the console reader. It ends on `halt`, when stdin closes, or when
/// the receiving side of `tx` is dropped.
pub fn spawn_console(tx: Sender<UiEvent>, halt: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
    task_pin::spawn_on_core(TaskSpec::CONSOLE, move || {
        info!("Console: ready (u/d/l/r, press, drag N, release N, save, halt)");
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if line.trim().eq_ignore_ascii_case("halt") {
                info!("Console: halt requested");
                halt.store(true, Ordering::Release);
                break;
            }
            match parse_command(&line) {
                Some(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                None => warn!("Console: unknown command '{}'", line.trim()),
            }
        }
        info!("Console: input closed");
    })
}
