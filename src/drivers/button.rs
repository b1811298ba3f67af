//! Operator edge-signal button.
//!
//! Active-low momentary switch with external pull-up; GPIO fires on the
//! falling edge. Unlike a UI button there is no gesture machine here:
//! the edge itself is the command, and the time-critical response (the
//! conditional shutdown byte) happens inside the interrupt handler, not
//! in the main loop.
//!
//! Handler budget: one atomic timestamp check, the single-byte atomics
//! in [`IsrCells`](crate::isr::IsrCells), and at most one UART FIFO
//! write. No blocking operations.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::ports::AlarmLinkPort;
use crate::drivers::hw_init;
use crate::events::{push_event, Event};
use crate::isr::{edge_alarm, ISR_CELLS};

/// Edges closer together than this are contact bounce, not commands.
const DEBOUNCE_MS: u32 = 50;

/// Timestamp of the last accepted edge (milliseconds since boot,
/// truncated to u32). Written and read only from the ISR.
static LAST_EDGE_MS: AtomicU32 = AtomicU32::new(0);

/// ISR-context view of the alarm link: a direct, non-blocking UART FIFO
/// write. The main-loop adapter owns the driver handle; this type
/// deliberately owns nothing.
struct UartIsrLink;

impl AlarmLinkPort for UartIsrLink {
    fn send(&mut self, byte: u8) {
        hw_init::uart_write_byte(byte);
    }
}

/// Debounce gate. Returns `true` when the edge is a genuine command.
fn edge_accepted(now_ms: u32) -> bool {
    let last = LAST_EDGE_MS.load(Ordering::Relaxed);
    if last != 0 && now_ms.wrapping_sub(last) < DEBOUNCE_MS {
        return false;
    }
    LAST_EDGE_MS.store(now_ms, Ordering::Relaxed);
    true
}

/// ISR handler — register this on the edge-button GPIO falling edge.
///
/// Runs the full interrupt-side shutdown path: debounce, raise the
/// edge flag, and send the shutdown code if the cached temperature lies
/// in the shutdown band. Then queues an [`Event::EdgeSignal`] so the
/// main loop can log the observation.
pub fn edge_isr_handler(now_ms: u32) {
    if !edge_accepted(now_ms) {
        return;
    }
    edge_alarm(&ISR_CELLS, &mut UartIsrLink);
    push_event(Event::EdgeSignal);
}
