//! ThermoGuard supervisory-node firmware.
//!
//! The supervisory node of a two-node thermal safety controller: it
//! samples the temperature, drives the cooling motor proportionally,
//! walks a persisted mode machine (Normal / Emergency / Abnormal), and
//! reports to the peer actuation node over a one-byte serial link.
//!
//! ## Architecture
//!
//! Hexagonal: [`supervisor::Supervisor`] is the domain core and talks to
//! the world only through the port traits in [`app::ports`]. The
//! [`adapters`] module binds those ports to real peripherals on the
//! device and to in-memory simulations on the host, so the entire
//! control logic is testable with `cargo test` off-target.
//!
//! ## Concurrency model
//!
//! One cooperative main task plus two interrupt handlers (periodic tick,
//! edge signal). Interrupt-shared state is confined to the single-byte
//! atomics in [`isr::IsrCells`]; handlers communicate with the main loop
//! through the lock-free queue in [`events`].

pub mod adapters;
pub mod alarm;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod isr;
pub mod sensors;
pub mod supervisor;

pub mod pins;
