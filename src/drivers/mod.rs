//! Hardware drivers for the supervisory node board.

pub mod button;
pub mod failsafe;
pub mod hw_init;
pub mod motor;
pub mod tick;
