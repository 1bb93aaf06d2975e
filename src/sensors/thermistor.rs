//! NTC thermistor temperature sensor (100 kOhm @ 25 C, B = 3950).
//!
//! Wired as the low side of a voltage divider under a fixed 100 kOhm
//! resistor to 3V3, read through a 12-bit one-shot ADC:
//!
//! ```text
//!   3V3 ──[ R_series ]──┬── ADC2_CH8 (GPIO19)
//!                       │
//!                    [ NTC ]
//!                       │
//!                      GND
//! ```
//!
//! `R_ntc = R_series * V / (V_supply - V)`, then the Beta equation
//! `1/T = 1/T0 + (1/B) * ln(R/R0)` with T in Kelvin.

use log::warn;

use crate::app::ports::AdcPort;

/// Sentinel carried by an invalid [`ThermistorSample`].
pub const INVALID_TEMP_C: f32 = -999.0;

/// Out-of-band readings between two diagnostics (~2 s at 10 Hz).
const OUT_OF_RANGE_WARN_EVERY: u32 = 20;

const KELVIN_OFFSET: f32 = 273.15;

/// Divider and ADC constants. Changing any of these changes the calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// NTC resistance at `t0_c`.
    pub r0_ohm: f32,
    pub t0_c: f32,
    pub beta: f32,
    pub r_series_ohm: f32,
    pub v_supply: f32,
    /// Readings within this distance of 0 V or `v_supply` are rejected.
    pub guard_v: f32,
    /// ADC full-scale input in millivolts.
    pub adc_full_scale_mv: u32,
    /// Largest raw code the ADC returns.
    pub adc_max_code: u32,
    /// Conversions averaged into one sample.
    pub reads_per_sample: u8,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            r0_ohm: 100_000.0,
            t0_c: 25.0,
            beta: 3950.0,
            r_series_ohm: 100_000.0,
            v_supply: 3.3,
            guard_v: 0.01,
            adc_full_scale_mv: 3300,
            adc_max_code: 4095,
            reads_per_sample: 8,
        }
    }
}

impl Calibration {
    /// Integer raw-code to millivolt conversion (`raw * 3300 / 4095`).
    pub fn raw_to_millivolts(&self, raw: u16) -> u32 {
        u32::from(raw) * self.adc_full_scale_mv / self.adc_max_code
    }

    /// Pure divider + Beta conversion. `None` outside the guard band.
    pub fn temperature_from_voltage(&self, volts: f32) -> Option<f32> {
        if volts <= self.guard_v || volts >= self.v_supply - self.guard_v {
            return None;
        }
        let r_ntc = self.r_series_ohm * volts / (self.v_supply - volts);
        let inv_t = 1.0 / (self.t0_c + KELVIN_OFFSET) + (r_ntc / self.r0_ohm).ln() / self.beta;
        Some(1.0 / inv_t - KELVIN_OFFSET)
    }
}

/// One averaged reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermistorSample {
    /// Averaged divider voltage, or `-1` if no conversion succeeded.
    pub raw_millivolts: i32,
    /// Degrees Celsius, or [`INVALID_TEMP_C`].
    pub temperature_c: f32,
}

impl ThermistorSample {
    pub const INVALID: Self = Self {
        raw_millivolts: -1,
        temperature_c: INVALID_TEMP_C,
    };

    pub fn is_valid(&self) -> bool {
        self.temperature_c > INVALID_TEMP_C
    }

    /// The temperature, if this sample may be shown.
    pub fn celsius(&self) -> Option<f32> {
        self.is_valid().then_some(self.temperature_c)
    }
}

/// Averages several ADC conversions into a [`ThermistorSample`].
pub struct ThermistorSampler<A: AdcPort> {
    adc: A,
    cal: Calibration,
    out_of_range_count: u32,
}

impl<A: AdcPort> ThermistorSampler<A> {
    pub fn new(adc: A, cal: Calibration) -> Self {
        Self {
            adc,
            cal,
            out_of_range_count: 0,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.cal
    }

    /// Take `reads_per_sample` conversions and average the successful ones.
    pub fn sample(&mut self) -> ThermistorSample {
        let mut sum_mv: u32 = 0;
        let mut valid: u32 = 0;
        for _ in 0..self.cal.reads_per_sample {
            match self.adc.read_raw() {
                Ok(raw) => {
                    sum_mv += self.cal.raw_to_millivolts(raw);
                    valid += 1;
                }
                Err(e) => warn!("Thermistor: {}", e),
            }
        }
        if valid == 0 {
            return ThermistorSample::INVALID;
        }

        let avg_mv = sum_mv as f32 / valid as f32;
        match self.cal.temperature_from_voltage(avg_mv / 1000.0) {
            Some(celsius) => ThermistorSample {
                raw_millivolts: avg_mv as i32,
                temperature_c: celsius,
            },
            None => {
                self.out_of_range_count += 1;
                if self.out_of_range_count >= OUT_OF_RANGE_WARN_EVERY {
                    warn!(
                        "Thermistor: voltage out of range: {:.0} mV (disconnected?)",
                        avg_mv
                    );
                    self.out_of_range_count = 0;
                }
                ThermistorSample {
                    raw_millivolts: avg_mv as i32,
                    temperature_c: INVALID_TEMP_C,
                }
            }
        }
    }
}

// ── Simulation ADC ────────────────────────────────────────────

/// Host-side ADC that returns an injectable raw code.
#[cfg(not(target_os = "espidf"))]
pub struct SimAdc {
    raw: std::sync::Arc<core::sync::atomic::AtomicU16>,
}

#[cfg(not(target_os = "espidf"))]
impl SimAdc {
    pub fn new(raw: u16) -> Self {
        Self {
            raw: std::sync::Arc::new(core::sync::atomic::AtomicU16::new(raw)),
        }
    }

    /// Shared handle for injecting new readings from a test or simulator.
    pub fn handle(&self) -> std::sync::Arc<core::sync::atomic::AtomicU16> {
        self.raw.clone()
    }
}

#[cfg(not(target_os = "espidf"))]
impl AdcPort for SimAdc {
    fn read_raw(&mut self) -> Result<u16, crate::error::SensorError> {
        Ok(self.raw.load(core::sync::atomic::Ordering::Relaxed))
    }
}
