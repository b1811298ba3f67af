//! Supervisor — the hexagonal core.
//!
//! [`Supervisor`] owns the mode FSM and its context, and runs the
//! cooperative main cycle. All I/O flows through port traits injected at
//! call sites, making the entire core testable with mock adapters.
//!
//! ```text
//!  SensorPort ───▶ ┌──────────────────────────┐ ──▶ AlarmLinkPort
//!  ModeStorePort ◀─│        Supervisor        │ ──▶ FailsafePort
//!  ActuatorPort ◀──│   FSM · write-through    │ ──▶ EventSink
//!                  └──────────────────────────┘
//! ```
//!
//! ## Cycle ordering
//!
//! The persisted-mode write for a cycle always precedes the actuator and
//! link output of that cycle, so an observer sampling the store never
//! sees an output that does not correspond to the committed mode. A
//! reset mid-cycle therefore resumes in the last *decided* mode.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{
    ActuatorPort, AlarmLinkPort, EventSink, FailsafePort, ModeStorePort, SensorPort,
};
use crate::config::SystemConfig;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_mode_table;
use crate::fsm::{Fsm, ModeId};
use crate::isr::IsrCells;

/// The supervisory core: mode machine, persistence integration, and
/// per-cycle orchestration.
pub struct Supervisor {
    fsm: Fsm,
    ctx: FsmContext,
    cycle_count: u64,
}

impl Supervisor {
    /// Construct the supervisor from configuration.
    ///
    /// Does **not** touch hardware — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_mode_table(), ModeId::Normal);
        Self {
            fsm,
            ctx,
            cycle_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot-time initialisation: seed or resume the persisted mode.
    ///
    /// - Empty slot (first boot): seed Normal.
    /// - Valid byte: resume that mode. A slot holding Abnormal re-enters
    ///   the terminal mode immediately, which re-arms the fail-safe on
    ///   the first cycle — the deliberate post-reset lock.
    /// - Garbage byte: left in place; every cycle will stall until an
    ///   external rewrite clears it.
    pub fn start(
        &mut self,
        cells: &IsrCells,
        store: &mut impl ModeStorePort,
        sink: &mut impl EventSink,
    ) {
        let cfg = &self.ctx.config;
        cells.configure_band(cfg.full_duty_at_c, cfg.emergency_above_c);
        let slot = cfg.mode_slot;

        self.fsm.start(&mut self.ctx);

        match store.read_mode(slot) {
            None => {
                info!("first boot: seeding persisted mode = Normal");
                if let Err(e) = store.write_mode(slot, ModeId::Normal.as_byte()) {
                    warn!("mode slot seed failed: {e}");
                }
            }
            Some(raw) => match ModeId::from_byte(raw) {
                Some(mode) => {
                    self.fsm.force_transition(mode, &mut self.ctx);
                }
                None => {
                    warn!("persisted mode byte 0x{raw:02X} is unreadable; cycles will stall");
                }
            },
        }

        cells.set_mode(self.fsm.current_mode());
        sink.emit(&AppEvent::Started(self.fsm.current_mode()));
        info!("supervisor started in {:?}", self.fsm.current_mode());
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full control cycle:
    /// read persisted mode → sample sensor → evaluate transition table →
    /// commit decision → drive actuator → telemetry/alarm → fail-safe.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`] — this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn cycle(
        &mut self,
        cells: &IsrCells,
        hw: &mut (impl SensorPort + ActuatorPort),
        store: &mut impl ModeStorePort,
        link: &mut impl AlarmLinkPort,
        failsafe: &mut impl FailsafePort,
        sink: &mut impl EventSink,
    ) {
        self.cycle_count += 1;
        let slot = self.ctx.config.mode_slot;

        // 1. Read the persisted mode. A garbage byte freezes the cycle:
        //    no actuator change, no alarm, no telemetry.
        let Some(raw) = store.read_mode(slot) else {
            warn!("mode slot empty mid-run; cycle frozen");
            return;
        };
        let Some(persisted) = ModeId::from_byte(raw) else {
            sink.emit(&AppEvent::PersistedModeUnreadable(raw));
            warn!("persisted mode byte 0x{raw:02X} unreadable; cycle frozen");
            return;
        };

        // 2. The store is authoritative: follow it if it diverges from
        //    the live machine (post-reset resume, external rewrite).
        if persisted != self.fsm.current_mode() {
            self.fsm.force_transition(persisted, &mut self.ctx);
        }
        let prev = self.fsm.current_mode();

        // 3. Sample the sensor and cache the byte for the edge ISR.
        let temperature = hw.read_temperature();
        self.ctx.temperature = temperature;
        cells.cache_temperature(temperature);

        // 4. Snapshot the shared emergency counter, then evaluate.
        self.ctx.emergency_ticks = cells.emergency_ticks();
        self.fsm.tick(&mut self.ctx);

        let mode = self.fsm.current_mode();
        cells.set_mode(mode);

        // 5. Write-through persist, before any output of this cycle.
        //    If the commit fails the outputs are withheld: emitting them
        //    would break the store/output ordering guarantee.
        if let Err(e) = store.write_mode(slot, mode.as_byte()) {
            warn!("mode persist failed ({e}); outputs withheld this cycle");
            return;
        }

        // 6. Apply the (possibly retained) motor command.
        hw.set_motor(self.ctx.commands.motor);

        // 7. Telemetry byte for the peer node's display logic.
        link.send(temperature);

        // 8. Sentinel alarm, if the table emitted one this cycle.
        if let Some(code) = self.ctx.take_alarm() {
            link.send(code.as_byte());
            sink.emit(&AppEvent::AlarmSent(code.as_byte()));
        }

        // 9. Fail-safe arming (once per Abnormal cycle, never re-armed
        //    with more time, never disarmed).
        if let Some(timeout) = self.ctx.take_failsafe() {
            failsafe.arm(timeout);
            sink.emit(&AppEvent::FailsafeArmed(timeout));
        }
        if self.ctx.take_counter_reset() {
            cells.reset_emergency_ticks();
        }

        // 10. Consume the edge flag raised since the previous cycle; the
        //     shutdown code itself was already sent from the ISR.
        if cells.take_edge() {
            sink.emit(&AppEvent::EdgeObserved { temperature });
        }

        if mode != prev {
            sink.emit(&AppEvent::ModeChanged {
                from: prev,
                to: mode,
            });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current operating mode.
    pub fn mode(&self) -> ModeId {
        self.fsm.current_mode()
    }

    /// Total control cycles executed since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Clone of the live configuration.
    pub fn current_config(&self) -> SystemConfig {
        self.ctx.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::PersistentStore;
    use crate::drivers::failsafe::FailsafeTimeout;

    struct NullHw;
    impl SensorPort for NullHw {
        fn read_temperature(&mut self) -> u8 {
            25
        }
    }
    impl ActuatorPort for NullHw {
        fn set_motor(&mut self, _cmd: crate::fsm::context::MotorCommand) {}
    }
    struct NullLink;
    impl AlarmLinkPort for NullLink {
        fn send(&mut self, _byte: u8) {}
    }
    struct NullFailsafe;
    impl FailsafePort for NullFailsafe {
        fn arm(&mut self, _timeout: FailsafeTimeout) {}
    }
    struct NullSink;
    impl EventSink for NullSink {
        fn emit(&mut self, _event: &AppEvent) {}
    }

    #[test]
    fn first_boot_seeds_normal() {
        let cells = IsrCells::new();
        let mut store = PersistentStore::new().unwrap();
        let mut sup = Supervisor::new(SystemConfig::default());
        sup.start(&cells, &mut store, &mut NullSink);
        assert_eq!(store.read_mode(0), Some(ModeId::Normal.as_byte()));
        assert_eq!(sup.mode(), ModeId::Normal);
    }

    #[test]
    fn resumes_persisted_abnormal_on_start() {
        let cells = IsrCells::new();
        let mut store = PersistentStore::new().unwrap();
        store.write_mode(0, ModeId::Abnormal.as_byte()).unwrap();

        let mut sup = Supervisor::new(SystemConfig::default());
        sup.start(&cells, &mut store, &mut NullSink);
        assert_eq!(sup.mode(), ModeId::Abnormal);
    }

    #[test]
    fn garbage_persisted_byte_freezes_cycles() {
        let cells = IsrCells::new();
        let mut store = PersistentStore::new().unwrap();
        store.write_mode(0, 0x7A).unwrap();

        let mut sup = Supervisor::new(SystemConfig::default());
        sup.start(&cells, &mut store, &mut NullSink);
        sup.cycle(
            &cells,
            &mut NullHw,
            &mut store,
            &mut NullLink,
            &mut NullFailsafe,
            &mut NullSink,
        );
        // The stall never rewrites the slot.
        assert_eq!(store.read_mode(0), Some(0x7A));
        assert_eq!(sup.mode(), ModeId::Normal);
    }
}
