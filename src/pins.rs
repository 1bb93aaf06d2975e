//! GPIO / peripheral pin assignments for the spray controller board
//! (ESP32-S3 with 480x480 RGB touch panel).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Thermistor (100 kΩ NTC, B = 3950, 100 kΩ series resistor to 3V3)
// ---------------------------------------------------------------------------

/// Intercooler NTC divider midpoint.
/// ADC2 channel 8 (GPIO 19 on ESP32-S3).
pub const THERMISTOR_ADC_GPIO: i32 = 19;
/// ADC unit index for the thermistor (0 = ADC1, 1 = ADC2).
pub const THERMISTOR_ADC_UNIT: u32 = 1;
/// ADC channel number within [`THERMISTOR_ADC_UNIT`].
pub const THERMISTOR_ADC_CHANNEL: u32 = 8;

// ---------------------------------------------------------------------------
// Front-panel inputs (active-low, internal pull-up, any-edge interrupt)
// ---------------------------------------------------------------------------

/// Ignition / power-sense input. LOW = power on.
pub const POWER_BUTTON_GPIO: i32 = 43;
/// Water-tank float switch. LOW = tank empty.
pub const TANK_BUTTON_GPIO: i32 = 44;

// ---------------------------------------------------------------------------
// Display backlight (LEDC PWM)
// ---------------------------------------------------------------------------

/// LCD backlight enable / PWM.
pub const LCD_BACKLIGHT_GPIO: i32 = 6;
/// LEDC base frequency for the backlight (20 kHz, above hearing).
pub const BACKLIGHT_PWM_FREQ_HZ: u32 = 20_000;
/// LEDC timer resolution (bits).  10-bit gives 0 – 1023 duty levels.
pub const BACKLIGHT_PWM_RESOLUTION_BITS: u32 = 10;
