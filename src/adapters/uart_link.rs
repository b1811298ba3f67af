//! UART alarm/telemetry link adapter.
//!
//! Implements [`AlarmLinkPort`] for the main task. Bytes go out on
//! UART1 TX to the actuation node; there is no acknowledgment and no
//! retry. The interrupt path has its own zero-state view of the same
//! FIFO (see [`crate::drivers::button`]).
//!
//! On host builds every sent byte is captured in a bounded buffer so
//! tests can assert on the exact wire traffic.

use crate::app::ports::AlarmLinkPort;

#[cfg(feature = "espidf")]
use crate::drivers::hw_init;

pub struct UartLink {
    #[cfg(not(feature = "espidf"))]
    sent: heapless::Vec<u8, 64>,
}

impl UartLink {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            sent: heapless::Vec::new(),
        }
    }

    /// Bytes sent so far (simulation only, oldest first).
    #[cfg(not(feature = "espidf"))]
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Clear the capture buffer (simulation only).
    #[cfg(not(feature = "espidf"))]
    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Default for UartLink {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmLinkPort for UartLink {
    fn send(&mut self, byte: u8) {
        #[cfg(feature = "espidf")]
        hw_init::uart_write_byte(byte);

        #[cfg(not(feature = "espidf"))]
        {
            // Oldest bytes are the interesting ones in tests; drop on
            // overflow just like the hardware FIFO would.
            let _ = self.sent.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_wire_traffic_in_order() {
        let mut link = UartLink::new();
        link.send(42);
        link.send(0xFE);
        link.send(0xFF);
        assert_eq!(link.sent(), &[42, 0xFE, 0xFF]);

        link.clear();
        assert!(link.sent().is_empty());
    }
}
