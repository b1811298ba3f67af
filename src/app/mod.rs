//! Application layer: port traits and outbound events.
//!
//! The supervisor consumes hardware exclusively through the traits in
//! [`ports`]; adapters on the other side implement them.

pub mod events;
pub mod ports;
