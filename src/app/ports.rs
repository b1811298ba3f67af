//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Driven adapters (sensor, motor, store, link, fail-safe, event sink)
//! implement these traits. The [`Supervisor`](crate::supervisor::Supervisor)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Context rules
//!
//! - **ModeStorePort** operations are *blocking* (busy-wait on device
//!   readiness). They MUST only be called from the main cooperative
//!   task — never from an interrupt handler, whose time budget the wait
//!   loop would blow.
//! - **AlarmLinkPort::send** is fire-and-forget and bounded; it is the
//!   only port the edge-interrupt path is allowed to touch.

use crate::config::SystemConfig;
use crate::drivers::failsafe::FailsafeTimeout;
use crate::fsm::context::MotorCommand;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain the temperature.
pub trait SensorPort {
    /// Read the current temperature as a degree-valued byte.
    /// No error path and no declared upper bound — the transition table
    /// routes anything above the emergency threshold to Emergency.
    fn read_temperature(&mut self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the cooling motor.
pub trait ActuatorPort {
    /// Apply a motor command (stop or clockwise at a duty).
    fn set_motor(&mut self, cmd: MotorCommand);
}

// ───────────────────────────────────────────────────────────────
// Persistent mode store (domain ↔ EEPROM/NVS)
// ───────────────────────────────────────────────────────────────

/// Durable single-byte slot surviving power loss and resets.
///
/// Both operations block until the device is ready (prior write
/// committed). Caller-context only: main cooperative task, never an
/// interrupt handler.
pub trait ModeStorePort {
    /// Read the last committed byte at `slot`.
    /// `None` means the slot has never been written (first boot).
    fn read_mode(&self, slot: u16) -> Option<u8>;

    /// Block until any prior write completes, then commit `raw` at `slot`.
    fn write_mode(&mut self, slot: u16, raw: u8) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Alarm link (domain → peer node)
// ───────────────────────────────────────────────────────────────

/// One-directional byte channel to the peer actuation node.
/// Fire-and-forget: no acknowledgment, no retry. Byte semantics:
/// 0xFF = shutdown, 0xFE = abnormal, anything else is a literal
/// temperature sample (see [`crate::alarm::AlarmCode`] for the known
/// domain collision).
pub trait AlarmLinkPort {
    fn send(&mut self, byte: u8);
}

// ───────────────────────────────────────────────────────────────
// Fail-safe (domain → watchdog)
// ───────────────────────────────────────────────────────────────

/// Hardware watchdog primitive. `arm` starts an independent countdown
/// to an unconditional reset; the supervisor never re-arms it with more
/// time and never disarms it, so one call is an irrevocable commitment.
/// Fire-and-forget: there is no confirmation that the countdown engaged.
pub trait FailsafePort {
    fn arm(&mut self, timeout: FailsafeTimeout);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log,
/// diagnostics console, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting: invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently
/// clamped, so a corrupted blob cannot reorder the temperature
/// thresholds or zero the escalation bound.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ModeStorePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying device reported a write failure.
    WriteFailed,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write failed"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
