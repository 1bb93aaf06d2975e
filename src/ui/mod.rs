//! Multi-screen touch UI.
//!
//! ```text
//!              ┌────────────┐
//!              │ Brightness │
//!              └────────────┘
//!      swipe Down ▲    │ swipe Up
//!                 │    ▼
//!              ┌──────┐      ┌─────────────┐      ┌───────────────┐      ┌───────────────┐
//!              │ Main │ ◀──▶ │ TriggerTemp │ ◀──▶ │ SprayDuration │ ◀──▶ │ SprayInterval │
//!              └──────┘      └─────────────┘      └───────────────┘      └───────────────┘
//!                  swipe Left moves one screen right, swipe Right one screen left
//! ```
//!
//! The [`manager::ScreenManager`] owns the navigation state and the arena of
//! lazily-created screens; [`main_screen`] and [`setting_screen`] implement
//! the per-screen widget contract.

pub mod main_screen;
pub mod manager;
pub mod setting_screen;
pub mod timer;

use crate::app::ports::{Backlight, UiToolkit, WallClock};
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Screen identity
// ---------------------------------------------------------------------------

/// Every screen the panel can show. The ordinal is only an arena index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScreenId {
    Main = 0,
    Brightness = 1,
    TriggerTemp = 2,
    SprayDuration = 3,
    SprayInterval = 4,
}

impl ScreenId {
    /// Total number of screens, used to size the arena.
    pub const COUNT: usize = 5;

    pub const ALL: [ScreenId; Self::COUNT] = [
        Self::Main,
        Self::Brightness,
        Self::TriggerTemp,
        Self::SprayDuration,
        Self::SprayInterval,
    ];

    /// Convert an arena index back to a `ScreenId`. `None` if out of range.
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Brightness => "brightness",
            Self::TriggerTemp => "trigger_temp",
            Self::SprayDuration => "spray_duration",
            Self::SprayInterval => "spray_interval",
        }
    }
}

// ---------------------------------------------------------------------------
// Transition animations
// ---------------------------------------------------------------------------

/// Cosmetic animation played while switching screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Swap visibility instantly.
    None,
    /// Incoming screen rises from the bottom edge.
    SlideUp,
    /// Incoming screen drops from the top edge.
    SlideDown,
    /// Incoming screen enters from the right edge.
    SlideLeft,
    /// Incoming screen enters from the left edge.
    SlideRight,
}

/// Start/end offsets for one slide, relative to the screen origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidePlan {
    pub incoming_from: (i32, i32),
    pub outgoing_to: (i32, i32),
}

impl Transition {
    /// Offsets for a panel of `width` x `height`, or `None` for an instant swap.
    pub fn plan(self, width: i32, height: i32) -> Option<SlidePlan> {
        let (incoming_from, outgoing_to) = match self {
            Self::None => return None,
            Self::SlideUp => ((0, height), (0, -height)),
            Self::SlideDown => ((0, -height), (0, height)),
            Self::SlideLeft => ((width, 0), (-width, 0)),
            Self::SlideRight => ((-width, 0), (width, 0)),
        };
        Some(SlidePlan {
            incoming_from,
            outgoing_to,
        })
    }
}

// ---------------------------------------------------------------------------
// Screen context
// ---------------------------------------------------------------------------

/// Everything a screen hook may touch. Built by the session for the
/// duration of one locked call.
pub struct ScreenCtx<'a> {
    pub ui: &'a mut dyn UiToolkit,
    pub settings: &'a mut Settings,
    pub backlight: &'a mut dyn Backlight,
    pub clock: &'a dyn WallClock,
    pub now_ms: u32,
}
