//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements       | Connects to               |
//! |-------------|------------------|---------------------------|
//! | `hardware`  | SensorPort       | ESP32 ADC (LM35)          |
//! |             | ActuatorPort     | ESP32 PWM, GPIO (motor)   |
//! | `store`     | ModeStorePort    | NVS / in-memory store     |
//! |             | ConfigPort       |                           |
//! | `uart_link` | AlarmLinkPort    | UART1 TX / capture buffer |
//! | `log_sink`  | EventSink        | Serial log output         |

pub mod hardware;
pub mod log_sink;
pub mod store;
pub mod uart_link;
