//! Input events produced by the UI toolkit and consumed by the
//! [`UiSession`](super::session::UiSession).
//!
//! The toolkit translates its own gesture / slider / button callbacks into
//! these variants, so the screen logic never sees toolkit event codes.

/// Swipe direction reported by the touch controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

/// Slider interaction on the active settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderEvent {
    /// Finger down on the knob.
    Pressed,
    /// Knob moved; carries the raw slider value.
    Dragging(i32),
    /// Finger lifted; carries the final raw slider value.
    Released(i32),
}

/// Everything the UI owner can receive from the toolkit in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Gesture(Direction),
    Slider(SliderEvent),
    /// The SAVE control was tapped.
    SaveRequested,
}
