//! GPIO / peripheral pin assignments for the supervisory node board.
//!
//! Single source of truth — every driver references this module rather
//! than hard-coding pin numbers. Change a pin here and it propagates
//! everywhere.

// ---------------------------------------------------------------------------
// Cooling motor driver (DRV8871 H-bridge)
// ---------------------------------------------------------------------------

/// LEDC PWM channel for motor speed control.
pub const MOTOR_PWM_GPIO: i32 = 1;
/// Digital output: HIGH = clockwise, LOW = counter-clockwise.
pub const MOTOR_DIR_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Temperature sensor (LM35, analog)
// ---------------------------------------------------------------------------

/// LM35 linear temperature sensor — 10 mV/°C, read via ADC1.
/// ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const TEMP_ADC_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Operator edge-signal button (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button routed to the edge-interrupt shutdown path.
pub const EDGE_BUTTON_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Alarm / telemetry link to the actuation node (UART1 TX only)
// ---------------------------------------------------------------------------

pub const LINK_TX_GPIO: i32 = 17;
pub const LINK_RX_GPIO: i32 = 18;
/// Matches the actuation node's receiver configuration (8N1).
pub const LINK_BAUD: u32 = 9_600;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits). 8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the cooling motor (25 kHz — inaudible).
pub const MOTOR_PWM_FREQ_HZ: u32 = 25_000;
