//! Input debouncing, hardware initialisation, and task helpers.

pub mod debounce;
pub mod hw_init;
pub mod task_pin;
