//! Sensor subsystem.
//!
//! Only the intercooler thermistor lives here; the two front-panel inputs
//! are handled by [`drivers::debounce`](crate::drivers::debounce).

pub mod thermistor;
