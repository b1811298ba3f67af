//! Alarm-link byte encoding.
//!
//! The link to the peer actuation node carries single bytes with three
//! meanings: two reserved sentinel codes, and everything else as a
//! literal temperature sample for peer-side display logic.
//!
//! ## Known encoding collision
//!
//! The sentinels occupy the same byte domain as a temperature sample: a
//! sensor reading of 254 or 255 degrees would be indistinguishable from a
//! control code on the wire. The supervisor performs no clamping, so this
//! stands as long as the sensor's reportable range stays below 254.
//! Widening the encoding (or bounding the sensor) is an open decision;
//! neither is done here.

/// Reserved sentinel bytes on the alarm link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlarmCode {
    /// Peer must cut its motor immediately (operator shutdown request).
    Shutdown = 0xFF,
    /// Supervisor escalated to the Abnormal mode.
    Abnormal = 0xFE,
}

impl AlarmCode {
    /// Wire representation.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether a received byte is a sentinel rather than a temperature.
    pub const fn is_sentinel(byte: u8) -> bool {
        byte >= AlarmCode::Abnormal as u8
    }
}

impl core::fmt::Display for AlarmCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "SHUTDOWN(0xFF)"),
            Self::Abnormal => write!(f, "ABNORMAL(0xFE)"),
        }
    }
}
