//! Intercooler spray controller firmware library.
//!
//! Exposes the coordination logic (screen manager, acquisition loop,
//! settings and log storage) for integration testing on the host. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod acquisition;
pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod settings;
pub mod storage;
pub mod ui;

pub mod adapters;
pub mod drivers;
pub mod sensors;
