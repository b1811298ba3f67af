//! System configuration parameters
//!
//! All tunable parameters for the ThermoGuard supervisory node.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Temperature thresholds (degrees C, byte domain) ---
    /// At or below this the motor is stopped
    pub stop_below_c: u8,
    /// At this temperature the motor reaches 100% duty; between
    /// `stop_below_c` and here the duty is interpolated
    pub full_duty_at_c: u8,
    /// Above this the machine leaves Normal for Emergency
    pub emergency_above_c: u8,

    // --- Escalation ---
    /// Consecutive emergency ticks before escalating to Abnormal
    pub escalation_ticks: u8,

    // --- Persistence ---
    /// Persistent-store slot holding the mode byte
    pub mode_slot: u16,

    // --- Timing ---
    /// Control tick period (milliseconds)
    pub tick_period_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thresholds
            stop_below_c: 20,
            full_duty_at_c: 40,
            emergency_above_c: 50,

            // Escalation: 14 ticks at 0.5 s per tick = 7 s in Emergency
            escalation_ticks: 14,

            // Persistence
            mode_slot: 0,

            // Timing
            tick_period_ms: 500, // 2 Hz
        }
    }
}

impl SystemConfig {
    /// The temperature band in which an edge event emits the shutdown
    /// code: `[full_duty_at_c, emergency_above_c]`.
    pub fn shutdown_band(&self) -> core::ops::RangeInclusive<u8> {
        self.full_duty_at_c..=self.emergency_above_c
    }
}
