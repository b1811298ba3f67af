//! Interrupt-visible shared state.
//!
//! Everything an interrupt handler may touch lives in one [`IsrCells`]
//! struct of single-byte atomics: the mode mirror, the cached
//! temperature sample, the emergency tick counter, and the edge-signal
//! flag. Single-byte width means no value can be torn by preemption on
//! this target, so neither side takes a lock.
//!
//! Two handlers operate on these cells:
//!
//! - [`IsrCells::tick`] — the periodic timer handler. Touches only the
//!   counter and the mode mirror; no blocking operation inside.
//! - [`edge_alarm`] — the edge-signal (button) handler. Reads the cached
//!   temperature and conditionally performs a single byte send. Runs in
//!   the interrupt context itself, independent of the main cycle, and
//!   never alters the mode.
//!
//! The persistent store's blocking primitives must never be called from
//! either handler; they are confined to the supervisor's main task.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::alarm::AlarmCode;
use crate::app::ports::AlarmLinkPort;
use crate::fsm::ModeId;

/// Single-byte atomics shared between interrupt and main-cycle contexts.
pub struct IsrCells {
    /// Mirror of the supervisor's current mode, for the tick handler.
    mode: AtomicU8,
    /// Most recently sampled temperature, for the edge handler.
    temperature: AtomicU8,
    /// Ticks spent in Emergency; 0 whenever the mode is not Emergency.
    emergency_ticks: AtomicU8,
    /// Raised by the edge ISR, consumed once per main cycle.
    edge_pending: AtomicBool,
    /// Shutdown band bounds, written once at startup from config.
    band_lo: AtomicU8,
    band_hi: AtomicU8,
}

/// Process-wide instance for ISR callbacks registered with the hardware.
pub static ISR_CELLS: IsrCells = IsrCells::new();

impl IsrCells {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(ModeId::Normal as u8),
            temperature: AtomicU8::new(0),
            emergency_ticks: AtomicU8::new(0),
            edge_pending: AtomicBool::new(false),
            band_lo: AtomicU8::new(40),
            band_hi: AtomicU8::new(50),
        }
    }

    /// Set the shutdown band from config. Call once at startup, before
    /// the edge interrupt is enabled.
    pub fn configure_band(&self, lo: u8, hi: u8) {
        self.band_lo.store(lo, Ordering::Relaxed);
        self.band_hi.store(hi, Ordering::Relaxed);
    }

    // ── Main-cycle side ───────────────────────────────────────

    /// Publish the supervisor's current mode for the tick handler.
    pub fn set_mode(&self, mode: ModeId) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Cache the latest temperature sample for the edge handler.
    pub fn cache_temperature(&self, celsius: u8) {
        self.temperature.store(celsius, Ordering::Release);
    }

    /// Current emergency tick count.
    pub fn emergency_ticks(&self) -> u8 {
        self.emergency_ticks.load(Ordering::Acquire)
    }

    /// Reset the emergency counter (Abnormal entry does this).
    pub fn reset_emergency_ticks(&self) {
        self.emergency_ticks.store(0, Ordering::Release);
    }

    /// Consume the edge-signal flag. Returns `true` at most once per
    /// raised edge.
    pub fn take_edge(&self) -> bool {
        self.edge_pending.swap(false, Ordering::AcqRel)
    }

    // ── Interrupt side ────────────────────────────────────────

    /// Periodic tick handler. If the mode is Emergency, increment the
    /// counter by one; otherwise reset it to zero. Safe in interrupt
    /// context: two atomic byte operations, nothing else.
    pub fn tick(&self) {
        if self.mode.load(Ordering::Acquire) == ModeId::Emergency as u8 {
            // Saturation is unnecessary: escalation fires long before
            // the counter could wrap, and the supervisor resets it.
            let t = self.emergency_ticks.load(Ordering::Relaxed);
            self.emergency_ticks
                .store(t.wrapping_add(1), Ordering::Release);
        } else {
            self.emergency_ticks.store(0, Ordering::Release);
        }
    }

    /// Most recently cached temperature (edge-handler view).
    pub fn cached_temperature(&self) -> u8 {
        self.temperature.load(Ordering::Acquire)
    }

    fn raise_edge(&self) {
        self.edge_pending.store(true, Ordering::Release);
    }
}

/// Edge-signal handler body.
///
/// Runs in interrupt context: reads the cached temperature and, when it
/// lies inside the shutdown band, sends [`AlarmCode::Shutdown`] on the
/// link immediately — exactly once per edge, regardless of the current
/// mode. The link's `send` is fire-and-forget and must not block.
///
/// Returns `true` when the code was sent.
pub fn edge_alarm(cells: &IsrCells, link: &mut impl AlarmLinkPort) -> bool {
    cells.raise_edge();

    let t = cells.cached_temperature();
    let lo = cells.band_lo.load(Ordering::Relaxed);
    let hi = cells.band_hi.load(Ordering::Relaxed);
    if t >= lo && t <= hi {
        link.send(AlarmCode::Shutdown.as_byte());
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingLink(Vec<u8>);
    impl AlarmLinkPort for RecordingLink {
        fn send(&mut self, byte: u8) {
            self.0.push(byte);
        }
    }

    #[test]
    fn tick_counts_only_in_emergency() {
        let cells = IsrCells::new();
        cells.set_mode(ModeId::Normal);
        cells.tick();
        cells.tick();
        assert_eq!(cells.emergency_ticks(), 0);

        cells.set_mode(ModeId::Emergency);
        for _ in 0..5 {
            cells.tick();
        }
        assert_eq!(cells.emergency_ticks(), 5);

        // Leaving Emergency resets on the next tick.
        cells.set_mode(ModeId::Normal);
        cells.tick();
        assert_eq!(cells.emergency_ticks(), 0);
    }

    #[test]
    fn edge_sends_shutdown_inside_band() {
        let cells = IsrCells::new();
        let mut link = RecordingLink(Vec::new());

        cells.cache_temperature(42);
        assert!(edge_alarm(&cells, &mut link));
        assert_eq!(link.0, vec![0xFF]);
        assert!(cells.take_edge());
        assert!(!cells.take_edge(), "flag is consumed once per edge");
    }

    #[test]
    fn edge_silent_outside_band() {
        let cells = IsrCells::new();
        let mut link = RecordingLink(Vec::new());

        for t in [0u8, 10, 39, 51, 200] {
            cells.cache_temperature(t);
            assert!(!edge_alarm(&cells, &mut link), "t={t} must not emit");
        }
        assert!(link.0.is_empty());
    }

    #[test]
    fn edge_band_boundaries_inclusive() {
        let cells = IsrCells::new();
        let mut link = RecordingLink(Vec::new());

        cells.cache_temperature(40);
        assert!(edge_alarm(&cells, &mut link));
        cells.cache_temperature(50);
        assert!(edge_alarm(&cells, &mut link));
        assert_eq!(link.0, vec![0xFF, 0xFF]);
    }
}
