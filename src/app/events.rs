//! Outbound application events.
//!
//! The [`Supervisor`](crate::supervisor::Supervisor) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them — log to serial, feed a
//! diagnostics console, etc.

use crate::drivers::failsafe::FailsafeTimeout;
use crate::fsm::ModeId;

/// Structured events emitted by the supervisory core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The supervisor has started (carries the resumed mode).
    Started(ModeId),

    /// The mode machine transitioned between modes.
    ModeChanged { from: ModeId, to: ModeId },

    /// A sentinel alarm byte was sent on the link.
    AlarmSent(u8),

    /// The hardware fail-safe countdown was armed.
    FailsafeArmed(FailsafeTimeout),

    /// An edge signal was observed since the previous cycle
    /// (the shutdown code, if due, was sent from the interrupt path).
    EdgeObserved { temperature: u8 },

    /// The persisted mode byte did not decode; the cycle was frozen.
    PersistedModeUnreadable(u8),
}
