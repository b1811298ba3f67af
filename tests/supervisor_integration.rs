//! Integration tests: Supervisor → FSM → persisted mode → link/actuator.

use thermoguard::adapters::store::PersistentStore;
use thermoguard::adapters::uart_link::UartLink;
use thermoguard::app::events::AppEvent;
use thermoguard::app::ports::{
    ActuatorPort, AlarmLinkPort, EventSink, FailsafePort, ModeStorePort, SensorPort,
};
use thermoguard::config::SystemConfig;
use thermoguard::drivers::failsafe::{Failsafe, FailsafeTimeout};
use thermoguard::fsm::context::MotorCommand;
use thermoguard::fsm::ModeId;
use thermoguard::isr::{edge_alarm, IsrCells};
use thermoguard::supervisor::Supervisor;

use std::cell::RefCell;
use std::rc::Rc;

// ── Mock implementations ──────────────────────────────────────

struct MockHw {
    temperature: u8,
    motor_calls: Vec<MotorCommand>,
}

impl MockHw {
    fn new(temperature: u8) -> Self {
        Self {
            temperature,
            motor_calls: Vec::new(),
        }
    }

    fn last_motor(&self) -> Option<MotorCommand> {
        self.motor_calls.last().copied()
    }
}

impl SensorPort for MockHw {
    fn read_temperature(&mut self) -> u8 {
        self.temperature
    }
}

impl ActuatorPort for MockHw {
    fn set_motor(&mut self, cmd: MotorCommand) {
        self.motor_calls.push(cmd);
    }
}

#[derive(Default)]
struct RecordingSink(Vec<AppEvent>);

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(*event);
    }
}

/// One supervisory rig with all ports mocked.
struct Rig {
    cells: IsrCells,
    sup: Supervisor,
    hw: MockHw,
    store: PersistentStore,
    link: UartLink,
    failsafe: Failsafe,
    sink: RecordingSink,
}

impl Rig {
    fn boot(temperature: u8) -> Self {
        let mut rig = Self {
            cells: IsrCells::new(),
            sup: Supervisor::new(SystemConfig::default()),
            hw: MockHw::new(temperature),
            store: PersistentStore::new().unwrap(),
            link: UartLink::new(),
            failsafe: Failsafe::new(),
            sink: RecordingSink::default(),
        };
        rig.sup.start(&rig.cells, &mut rig.store, &mut rig.sink);
        rig
    }

    /// One hardware tick followed by one control cycle, exactly the
    /// order the periodic timer callback produces.
    fn cycle(&mut self) {
        self.cells.tick();
        self.sup.cycle(
            &self.cells,
            &mut self.hw,
            &mut self.store,
            &mut self.link,
            &mut self.failsafe,
            &mut self.sink,
        );
    }

    fn cycles(&mut self, n: usize) {
        for _ in 0..n {
            self.cycle();
        }
    }

    fn persisted(&self) -> Option<u8> {
        self.store.read_mode(0)
    }
}

// ── Normal-mode control law ───────────────────────────────────

#[test]
fn cold_plant_stops_motor_and_persists_normal() {
    let mut rig = Rig::boot(15);
    rig.cycle();

    assert_eq!(rig.sup.mode(), ModeId::Normal);
    assert_eq!(rig.hw.last_motor(), Some(MotorCommand::Stop));
    assert_eq!(rig.persisted(), Some(ModeId::Normal.as_byte()));
    // Telemetry byte is the raw sample.
    assert_eq!(rig.link.sent(), &[15]);
}

#[test]
fn proportional_band_drives_interpolated_duty() {
    let mut rig = Rig::boot(30);
    rig.cycle();
    assert_eq!(rig.hw.last_motor(), Some(MotorCommand::Clockwise { duty: 50 }));

    rig.hw.temperature = 45;
    rig.cycle();
    assert_eq!(rig.hw.last_motor(), Some(MotorCommand::Clockwise { duty: 100 }));
    assert_eq!(rig.sup.mode(), ModeId::Normal);
}

// ── Emergency and escalation ──────────────────────────────────

#[test]
fn sustained_overtemperature_escalates_to_abnormal() {
    let cfg = SystemConfig::default();
    let mut rig = Rig::boot(55);

    // First cycle leaves Normal for Emergency (no actuator change on
    // the way out — the motor command is still the boot-time Stop).
    rig.cycle();
    assert_eq!(rig.sup.mode(), ModeId::Emergency);
    assert_eq!(rig.persisted(), Some(ModeId::Emergency.as_byte()));

    // The counter ticks once per cycle while the mode mirror shows
    // Emergency; escalation fires when the snapshot reaches the bound.
    let mut extra = 0;
    while rig.sup.mode() == ModeId::Emergency {
        rig.cycle();
        extra += 1;
        assert!(extra < 100, "escalation must terminate");
    }

    assert_eq!(rig.sup.mode(), ModeId::Abnormal);
    assert_eq!(
        extra,
        cfg.escalation_ticks as usize,
        "escalation after exactly the configured number of emergency ticks"
    );
    assert_eq!(rig.persisted(), Some(ModeId::Abnormal.as_byte()));

    // Exactly one 0xFE on the wire; everything else is telemetry.
    let sentinels: Vec<u8> = rig.link.sent().iter().copied().filter(|b| *b == 0xFE).collect();
    assert_eq!(sentinels, vec![0xFE]);

    // The escalation cycle only emits the code; the fail-safe is armed
    // on the first full Abnormal cycle that follows.
    assert_eq!(rig.failsafe.armed(), None);
    rig.cycle();
    assert_eq!(rig.failsafe.armed(), Some(FailsafeTimeout::Ms16));

    // Abnormal is sticky: cooling down changes nothing, the arm request
    // repeats every cycle, and the armed class never grows.
    rig.hw.temperature = 10;
    rig.sink.0.clear();
    rig.cycles(3);
    assert_eq!(rig.sup.mode(), ModeId::Abnormal);
    assert_eq!(rig.failsafe.armed(), Some(FailsafeTimeout::Ms16));
    let arms = rig
        .sink
        .0
        .iter()
        .filter(|e| matches!(e, AppEvent::FailsafeArmed(_)))
        .count();
    assert_eq!(arms, 3, "arm requested on every Abnormal cycle");
    assert_eq!(rig.hw.last_motor(), Some(MotorCommand::full()));
}

#[test]
fn emergency_recovers_without_alarm_when_cooled_in_time() {
    let mut rig = Rig::boot(55);
    rig.cycle();
    rig.cycles(5);
    assert_eq!(rig.sup.mode(), ModeId::Emergency);
    assert_eq!(rig.hw.last_motor(), Some(MotorCommand::full()));

    rig.hw.temperature = 45;
    rig.cycle();
    assert_eq!(rig.sup.mode(), ModeId::Normal);
    assert_eq!(rig.persisted(), Some(ModeId::Normal.as_byte()));

    // Counter resets once the mode mirror leaves Emergency.
    rig.cycle();
    assert_eq!(rig.cells.emergency_ticks(), 0);

    assert!(
        !rig.link.sent().contains(&0xFE),
        "no abnormal code on a recovered excursion"
    );
    assert_eq!(rig.failsafe.armed(), None);
}

// ── Edge-interrupt shutdown path ──────────────────────────────

#[test]
fn edge_in_band_sends_shutdown_and_is_observed_next_cycle() {
    let mut rig = Rig::boot(42);
    rig.cycle(); // caches T=42 for the ISR

    rig.link.clear();
    assert!(edge_alarm(&rig.cells, &mut rig.link));
    assert_eq!(rig.link.sent(), &[0xFF]);

    // Mode and persisted byte are untouched by the interrupt path.
    assert_eq!(rig.sup.mode(), ModeId::Normal);
    assert_eq!(rig.persisted(), Some(ModeId::Normal.as_byte()));

    rig.sink.0.clear();
    rig.cycle();
    assert!(rig
        .sink
        .0
        .iter()
        .any(|e| matches!(e, AppEvent::EdgeObserved { temperature: 42 })));
}

#[test]
fn edge_outside_band_stays_silent() {
    let mut rig = Rig::boot(10);
    rig.cycle();

    rig.link.clear();
    assert!(!edge_alarm(&rig.cells, &mut rig.link));
    assert!(rig.link.sent().is_empty());
}

// ── Persistence semantics ─────────────────────────────────────

#[test]
fn persisted_abnormal_survives_a_simulated_reset() {
    let mut rig = Rig::boot(55);
    rig.cycle();
    while rig.sup.mode() != ModeId::Abnormal {
        rig.cycle();
    }
    let store = rig.store;

    // "Reboot": fresh supervisor, cells, adapters; same store.
    let mut rig2 = Rig {
        cells: IsrCells::new(),
        sup: Supervisor::new(SystemConfig::default()),
        hw: MockHw::new(25),
        store,
        link: UartLink::new(),
        failsafe: Failsafe::new(),
        sink: RecordingSink::default(),
    };
    rig2.sup.start(&rig2.cells, &mut rig2.store, &mut rig2.sink);
    assert_eq!(rig2.sup.mode(), ModeId::Abnormal);

    // The first post-reset cycle re-enters the lock: full speed, armed.
    rig2.cycle();
    assert_eq!(rig2.hw.last_motor(), Some(MotorCommand::full()));
    assert_eq!(rig2.failsafe.armed(), Some(FailsafeTimeout::Ms16));
}

#[test]
fn persist_failure_withholds_all_outputs_that_cycle() {
    let mut rig = Rig::boot(30);
    rig.cycle();
    let motor_calls = rig.hw.motor_calls.len();
    let wire_bytes = rig.link.sent().len();

    rig.store.sim_fail_writes(true);
    rig.cycle();
    assert_eq!(rig.hw.motor_calls.len(), motor_calls, "no actuator output");
    assert_eq!(rig.link.sent().len(), wire_bytes, "no wire output");

    rig.store.sim_fail_writes(false);
    rig.cycle();
    assert_eq!(rig.hw.motor_calls.len(), motor_calls + 1);
}

// ── Write-through ordering ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Persist,
    Motor,
    Send,
}

type Trace = Rc<RefCell<Vec<Op>>>;

struct TracingHw(Trace);
impl SensorPort for TracingHw {
    fn read_temperature(&mut self) -> u8 {
        45
    }
}
impl ActuatorPort for TracingHw {
    fn set_motor(&mut self, _cmd: MotorCommand) {
        self.0.borrow_mut().push(Op::Motor);
    }
}

struct TracingStore {
    inner: PersistentStore,
    trace: Trace,
}
impl ModeStorePort for TracingStore {
    fn read_mode(&self, slot: u16) -> Option<u8> {
        self.inner.read_mode(slot)
    }
    fn write_mode(&mut self, slot: u16, raw: u8) -> Result<(), thermoguard::app::ports::StoreError> {
        self.trace.borrow_mut().push(Op::Persist);
        self.inner.write_mode(slot, raw)
    }
}

struct TracingLink(Trace);
impl AlarmLinkPort for TracingLink {
    fn send(&mut self, _byte: u8) {
        self.0.borrow_mut().push(Op::Send);
    }
}

struct NullFailsafe;
impl FailsafePort for NullFailsafe {
    fn arm(&mut self, _timeout: FailsafeTimeout) {}
}

#[test]
fn persisted_write_precedes_every_output() {
    let trace: Trace = Rc::new(RefCell::new(Vec::new()));
    let cells = IsrCells::new();
    let mut sup = Supervisor::new(SystemConfig::default());
    let mut hw = TracingHw(Rc::clone(&trace));
    let mut store = TracingStore {
        inner: PersistentStore::new().unwrap(),
        trace: Rc::clone(&trace),
    };
    let mut link = TracingLink(Rc::clone(&trace));
    let mut sink = RecordingSink::default();

    sup.start(&cells, &mut store, &mut sink);
    trace.borrow_mut().clear(); // drop the boot seed write

    for _ in 0..3 {
        cells.tick();
        sup.cycle(&cells, &mut hw, &mut store, &mut link, &mut NullFailsafe, &mut sink);

        let ops = trace.borrow_mut().split_off(0);
        assert_eq!(
            ops.first(),
            Some(&Op::Persist),
            "cycle must commit the mode before touching any output"
        );
        assert!(ops[1..].iter().all(|op| *op != Op::Persist));
        assert!(ops.contains(&Op::Motor));
        assert!(ops.contains(&Op::Send));
    }
}

// ── Frozen cycle on garbage byte ──────────────────────────────

#[test]
fn garbage_byte_freezes_until_externally_rewritten() {
    let mut rig = Rig::boot(30);
    rig.cycle();

    // External corruption of the slot.
    rig.store.write_mode(0, 0xAB).unwrap();
    rig.sink.0.clear();
    rig.link.clear();
    let motor_calls = rig.hw.motor_calls.len();

    rig.cycles(3);
    assert_eq!(rig.hw.motor_calls.len(), motor_calls);
    assert!(rig.link.sent().is_empty());
    assert_eq!(rig.persisted(), Some(0xAB), "stall never rewrites the slot");
    let stalls = rig
        .sink
        .0
        .iter()
        .filter(|e| matches!(e, AppEvent::PersistedModeUnreadable(0xAB)))
        .count();
    assert_eq!(stalls, 3);

    // External recovery: rewrite a valid byte and the loop resumes.
    rig.store.write_mode(0, ModeId::Normal.as_byte()).unwrap();
    rig.cycle();
    assert_eq!(rig.hw.motor_calls.len(), motor_calls + 1);
    assert_eq!(rig.sup.mode(), ModeId::Normal);
}
