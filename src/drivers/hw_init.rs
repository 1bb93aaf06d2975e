//! One-shot hardware peripheral initialization.
//!
//! Configures the thermistor ADC channel, the two front-panel inputs and
//! the LEDC backlight using raw ESP-IDF sys calls. Called once from
//! `main()` before any worker thread starts.

use std::sync::Arc;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::Backlight;
use crate::drivers::debounce::DebouncedInput;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC2 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, wrap: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(wrap(ret)) }
}

// ── Thermistor ADC (oneshot, ADC2) ────────────────────────────

/// ADC2 oneshot unit reading the thermistor divider.
#[cfg(target_os = "espidf")]
pub struct Adc2Thermistor {
    handle: adc_oneshot_unit_handle_t,
}

// SAFETY: the oneshot handle is owned by exactly one Adc2Thermistor, which
// is moved into the acquisition thread and only used from there.
#[cfg(target_os = "espidf")]
unsafe impl Send for Adc2Thermistor {}

#[cfg(target_os = "espidf")]
impl Adc2Thermistor {
    pub fn init() -> Result<Self, HwInitError> {
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_2,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        // SAFETY: called once at boot; `handle` outlives the call.
        check(unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) }, HwInitError::AdcInitFailed)?;

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: `handle` was just created by adc_oneshot_new_unit.
        check(
            unsafe { adc_oneshot_config_channel(handle, pins::THERMISTOR_ADC_CHANNEL, &chan_cfg) },
            HwInitError::AdcInitFailed,
        )?;

        info!(
            "hw_init: ADC2 CH{} configured (GPIO{} thermistor, 12 dB)",
            pins::THERMISTOR_ADC_CHANNEL,
            pins::THERMISTOR_ADC_GPIO
        );
        Ok(Self { handle })
    }
}

#[cfg(target_os = "espidf")]
impl crate::app::ports::AdcPort for Adc2Thermistor {
    fn read_raw(&mut self) -> Result<u16, crate::error::SensorError> {
        let mut raw: i32 = 0;
        // SAFETY: handle valid for the lifetime of self; single owner.
        let ret = unsafe { adc_oneshot_read(self.handle, pins::THERMISTOR_ADC_CHANNEL, &mut raw) };
        if ret != ESP_OK as i32 {
            return Err(crate::error::SensorError::AdcReadFailed);
        }
        Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
    }
}

// ── Backlight (LEDC PWM) ──────────────────────────────────────

/// Percent (0–100) to a duty value for a `bits`-wide LEDC timer.
pub fn percent_to_duty(percent: u8, bits: u32) -> u32 {
    let max = (1u32 << bits) - 1;
    u32::from(percent.min(100)) * max / 100
}

/// LCD backlight on LEDC channel 0 / timer 0.
pub struct LedcBacklight {
    duty: u32,
}

impl LedcBacklight {
    #[cfg(target_os = "espidf")]
    pub fn init() -> Result<Self, HwInitError> {
        let timer = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num: ledc_timer_t_LEDC_TIMER_0,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
            freq_hz: pins::BACKLIGHT_PWM_FREQ_HZ,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        // SAFETY: called once from main before any other LEDC user.
        check(unsafe { ledc_timer_config(&timer) }, HwInitError::LedcInitFailed)?;

        let channel = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: ledc_channel_t_LEDC_CHANNEL_0,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pins::LCD_BACKLIGHT_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        // SAFETY: timer 0 configured above.
        check(unsafe { ledc_channel_config(&channel) }, HwInitError::LedcInitFailed)?;

        info!(
            "hw_init: LEDC backlight on GPIO{} ({} Hz, {}-bit)",
            pins::LCD_BACKLIGHT_GPIO,
            pins::BACKLIGHT_PWM_FREQ_HZ,
            pins::BACKLIGHT_PWM_RESOLUTION_BITS
        );
        Ok(Self { duty: 0 })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn init() -> Result<Self, HwInitError> {
        log::info!("hw_init(sim): backlight init skipped");
        Ok(Self { duty: 0 })
    }

    /// Last duty written.
    pub fn duty(&self) -> u32 {
        self.duty
    }
}

impl Backlight for LedcBacklight {
    fn set_percent(&mut self, percent: u8) {
        self.duty = percent_to_duty(percent, crate::pins::BACKLIGHT_PWM_RESOLUTION_BITS);
        self.apply();
    }
}

impl LedcBacklight {
    #[cfg(target_os = "espidf")]
    fn apply(&self) {
        // SAFETY: channel configured in init(); only the UI owner calls this.
        unsafe {
            ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_channel_t_LEDC_CHANNEL_0, self.duty);
            ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_channel_t_LEDC_CHANNEL_0);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn apply(&self) {}
}

// ── Front-panel inputs ────────────────────────────────────────

/// A configured input pin read through `gpio_get_level`.
#[cfg(target_os = "espidf")]
#[derive(Debug, Clone, Copy)]
pub struct GpioLine(pub i32);

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::ErrorType for GpioLine {
    type Error = core::convert::Infallible;
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::InputPin for GpioLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        // SAFETY: register read of a pin configured as input.
        Ok(unsafe { gpio_get_level(self.0) } != 0)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn input_edge_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is a leaked `Arc<DebouncedInput>` registered below and
    // never freed; note_edge only touches atomics.
    let input = unsafe { &*(arg as *const DebouncedInput) };
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    input.note_edge(now_ms);
}

/// Configure the power and tank inputs (pull-up, any edge) and route their
/// interrupts to the matching [`DebouncedInput`].
#[cfg(target_os = "espidf")]
pub fn init_button_inputs(
    power: &Arc<DebouncedInput>,
    tank: &Arc<DebouncedInput>,
) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: (1u64 << pins::POWER_BUTTON_GPIO) | (1u64 << pins::TANK_BUTTON_GPIO),
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    // SAFETY: single-threaded init path.
    check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;

    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HwInitError::IsrInstallFailed(ret));
    }

    for (gpio, input) in [(pins::POWER_BUTTON_GPIO, power), (pins::TANK_BUTTON_GPIO, tank)] {
        let arg = Arc::into_raw(Arc::clone(input)) as *mut core::ffi::c_void;
        // SAFETY: `arg` stays valid forever (leaked strong count above).
        check(
            unsafe { gpio_isr_handler_add(gpio, Some(input_edge_isr), arg) },
            HwInitError::IsrInstallFailed,
        )?;
    }

    info!(
        "hw_init: inputs on GPIO{} (power) and GPIO{} (tank), any edge",
        pins::POWER_BUTTON_GPIO,
        pins::TANK_BUTTON_GPIO
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_inputs(
    _power: &Arc<DebouncedInput>,
    _tank: &Arc<DebouncedInput>,
) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): input ISRs skipped");
    Ok(())
}
