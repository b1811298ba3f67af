//! Sensor abstractions.

pub mod temperature;
