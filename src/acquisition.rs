//! Periodic sensor acquisition.
//!
//! Each cycle (100 ms by default):
//!
//! 1. Average a thermistor sample. A valid temperature is forwarded to the
//!    main screen if the UI lock is free right now.
//! 2. Read both debounced inputs; forward a value only when it differs from
//!    the last value this loop successfully forwarded.
//! 3. Derive the relay lamp (power on, tank not empty, temperature at or
//!    above the user trigger) and forward it on change.
//!
//! The lock is taken with `try_lock` per update: a busy UI never stalls
//! sampling, it only defers that one update to a later cycle.

use std::sync::{Arc, Mutex};

use log::debug;

use crate::app::ports::{AdcPort, UiUpdatePort};
use crate::app::session::try_lock_ui;
use crate::drivers::debounce::DebouncedInput;
use crate::sensors::thermistor::{ThermistorSample, ThermistorSampler};

/// What one cycle did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleReport {
    pub sample: Option<ThermistorSample>,
    pub temperature_forwarded: bool,
    pub power_forwarded: Option<bool>,
    pub tank_forwarded: Option<bool>,
    pub relay_forwarded: Option<bool>,
    /// Updates dropped because the UI lock was busy.
    pub lock_misses: u32,
}

/// Last values pushed to the UI. `None` until the first successful push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Forwarded {
    power: Option<bool>,
    tank_empty: Option<bool>,
    relay: Option<bool>,
}

pub struct AcquisitionLoop<A: AdcPort> {
    sampler: ThermistorSampler<A>,
    power: Arc<DebouncedInput>,
    tank: Arc<DebouncedInput>,
    forwarded: Forwarded,
    last_valid_temp: Option<f32>,
}

impl<A: AdcPort> AcquisitionLoop<A> {
    pub fn new(sampler: ThermistorSampler<A>, power: Arc<DebouncedInput>, tank: Arc<DebouncedInput>) -> Self {
        Self {
            sampler,
            power,
            tank,
            forwarded: Forwarded::default(),
            last_valid_temp: None,
        }
    }

    /// Most recent valid temperature, if any.
    pub fn last_valid_temperature(&self) -> Option<f32> {
        self.last_valid_temp
    }

    pub fn cycle<S: UiUpdatePort>(&mut self, ui: &Mutex<S>) -> CycleReport {
        let mut report = CycleReport::default();

        // ── Temperature ───────────────────────────────────────
        let sample = self.sampler.sample();
        report.sample = Some(sample);
        if let Some(celsius) = sample.celsius() {
            self.last_valid_temp = Some(celsius);
            match try_lock_ui(ui) {
                Some(mut guard) => {
                    guard.set_temperature(celsius);
                    report.temperature_forwarded = true;
                }
                None => report.lock_misses += 1,
            }
        }

        // ── Inputs ────────────────────────────────────────────
        let power_on = self.power.is_asserted();
        if self.forwarded.power != Some(power_on) {
            match try_lock_ui(ui) {
                Some(mut guard) => {
                    guard.set_power_indicator(power_on);
                    self.forwarded.power = Some(power_on);
                    report.power_forwarded = Some(power_on);
                    debug!("Acquisition: power -> {}", power_on);
                }
                None => report.lock_misses += 1,
            }
        }

        let tank_empty = self.tank.is_asserted();
        if self.forwarded.tank_empty != Some(tank_empty) {
            match try_lock_ui(ui) {
                Some(mut guard) => {
                    guard.set_tank_empty_indicator(tank_empty);
                    self.forwarded.tank_empty = Some(tank_empty);
                    report.tank_forwarded = Some(tank_empty);
                    debug!("Acquisition: tank_empty -> {}", tank_empty);
                }
                None => report.lock_misses += 1,
            }
        }

        // ── Relay lamp ────────────────────────────────────────
        match try_lock_ui(ui) {
            Some(mut guard) => {
                let trigger = guard.trigger_temperature() as f32;
                let relay = power_on
                    && !tank_empty
                    && self.last_valid_temp.is_some_and(|t| t >= trigger);
                if self.forwarded.relay != Some(relay) {
                    guard.set_relay_indicator(relay);
                    self.forwarded.relay = Some(relay);
                    report.relay_forwarded = Some(relay);
                    debug!("Acquisition: relay -> {}", relay);
                }
            }
            None => report.lock_misses += 1,
        }

        report
    }
}
