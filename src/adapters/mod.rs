//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                    |
//! |------------|---------------------|--------------------------------|
//! | `display`  | UiToolkit           | In-memory widget table + log   |
//! | `console`  | (UiEvent producer)  | stdin on UART / USB-CDC        |
//! | `log_sink` | `log::Log`          | Console logger + SD log file   |
//! | `time`     | MonotonicClock      | ESP32 system timer             |
//! |            | WallClock           | newlib `localtime_r`           |
//!
//! Backlight, ADC and input-pin adapters live in `drivers::hw_init` next to
//! the register setup they depend on.

pub mod console;
pub mod display;
pub mod log_sink;
pub mod time;
