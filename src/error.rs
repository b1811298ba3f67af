#![allow(dead_code)] // Some variants are reserved for adapter error paths

//! Unified error types for the ThermoGuard firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the entry point's error handling uniform. All variants are `Copy` so
//! they can be cheaply passed around without allocation. The mode state
//! machine itself has no error type: failure there is state escalation
//! or a hardware reset.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// The persistent mode store failed.
    Store(StoreFault),
    /// The alarm link failed to transmit.
    Link(LinkError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// ADC channel could not be configured.
    ChannelConfigFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::ChannelConfigFailed => write!(f, "ADC channel config failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Persistent-store faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// The storage backend could not be opened.
    OpenFailed,
    /// A committed write could not be confirmed.
    CommitFailed,
}

impl fmt::Display for StoreFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed => write!(f, "open failed"),
            Self::CommitFailed => write!(f, "commit failed"),
        }
    }
}

impl From<StoreFault> for Error {
    fn from(e: StoreFault) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Alarm-link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// UART TX FIFO rejected the byte.
    TxFailed,
    /// UART driver is not installed.
    NotInstalled,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TxFailed => write!(f, "TX failed"),
            Self::NotInstalled => write!(f, "driver not installed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
