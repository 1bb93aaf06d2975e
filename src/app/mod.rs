//! Application core: the coordination layer between sensors, storage and
//! the touch UI.
//!
//! All interaction with the display toolkit, backlight, ADC and clocks
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without a panel attached.

pub mod events;
pub mod ports;
pub mod session;
