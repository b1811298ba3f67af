//! LM35 linear temperature sensor (10 mV/°C, no calibration needed).
//!
//! Read via the ESP32-S3 ADC in oneshot mode. The LM35's output is
//! linear in temperature, so conversion is pure integer arithmetic:
//! millivolts over tenths.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH4 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

#[cfg(not(feature = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(feature = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(feature = "espidf"))]
static SIM_TEMP_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(feature = "espidf"))]
pub fn sim_set_temp_adc(raw: u16) {
    SIM_TEMP_ADC.store(raw, Ordering::Relaxed);
}

/// Inject a simulated temperature directly in degrees.
#[cfg(not(feature = "espidf"))]
pub fn sim_set_celsius(celsius: u8) {
    sim_set_temp_adc(celsius_to_adc(celsius));
}

const ADC_MAX: u32 = 4095;
const V_REF_MV: u32 = 3300;
const MV_PER_DEGREE: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct TemperatureReading {
    pub raw: u16,
    pub celsius: u8,
}

pub struct Lm35Sensor {
    _adc_gpio: i32,
}

impl Lm35Sensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    pub fn read(&self) -> TemperatureReading {
        let raw = self.read_adc();
        TemperatureReading {
            raw,
            celsius: adc_to_celsius(raw),
        }
    }

    #[cfg(feature = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(hw_init::ADC1_CH_TEMP)
    }

    #[cfg(not(feature = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_TEMP_ADC.load(Ordering::Relaxed)
    }
}

/// Convert a 12-bit ADC count to whole degrees, saturating at 255.
fn adc_to_celsius(raw: u16) -> u8 {
    let mv = u32::from(raw) * V_REF_MV / ADC_MAX;
    (mv / MV_PER_DEGREE).min(255) as u8
}

/// Inverse of [`adc_to_celsius`], for simulation injection.
#[cfg(not(feature = "espidf"))]
fn celsius_to_adc(celsius: u8) -> u16 {
    let mv = u32::from(celsius) * MV_PER_DEGREE;
    // Round up so truncation in the forward conversion lands back on
    // the injected degree value.
    ((mv * ADC_MAX).div_ceil(V_REF_MV)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_is_linear_in_millivolts() {
        assert_eq!(adc_to_celsius(0), 0);
        // 4095 counts = 3300 mV = 330 degrees, saturated to 255.
        assert_eq!(adc_to_celsius(4095), 255);
        // 250 mV ≈ 25 °C: 310 counts → 249 mV → 24, 311 → 250 mV → 25.
        assert_eq!(adc_to_celsius(311), 25);
    }

    #[test]
    fn sim_injection_round_trips_whole_degrees() {
        for celsius in [0u8, 15, 20, 30, 40, 45, 50, 55, 100] {
            assert_eq!(adc_to_celsius(celsius_to_adc(celsius)), celsius, "{celsius}");
        }
    }
}
