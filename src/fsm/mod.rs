//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ModeTable                                                   │
//! │  ┌───────────┬───────────┬──────────┬───────────────────┐    │
//! │  │ ModeId    │ on_enter  │ on_exit  │ on_update         │    │
//! │  ├───────────┼───────────┼──────────┼───────────────────┤    │
//! │  │ Normal    │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │    │
//! │  │ Emergency │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │    │
//! │  │ Abnormal  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │    │
//! │  │ Shutdown  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │    │
//! │  └───────────┴───────────┴──────────┴───────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each cycle the engine calls `on_update` for the **current** mode.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current mode, then `on_enter` for the next, and updates the current
//! pointer. All functions receive `&mut FsmContext` holding the sampled
//! temperature, the emergency-counter snapshot, command outputs, and
//! config.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Enumeration of all operating modes. The byte value doubles as the
/// persisted wire format in the mode slot.
/// Must stay in sync with the table built in [`states::build_mode_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModeId {
    Normal = 0,
    Emergency = 1,
    Abnormal = 2,
    /// Reserved terminal mode; never entered by the transition table.
    Shutdown = 3,
}

impl ModeId {
    /// Total number of modes — used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `ModeId`. Panics on out-of-range in
    /// debug builds; returns `Abnormal` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Normal,
            1 => Self::Emergency,
            2 => Self::Abnormal,
            3 => Self::Shutdown,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Abnormal
            }
        }
    }

    /// Decode a persisted mode byte. Garbage (anything other than the
    /// four defined values) yields `None`; the supervisor freezes the
    /// cycle rather than guessing.
    pub fn from_byte(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Normal),
            1 => Some(Self::Emergency),
            2 => Some(Self::Abnormal),
            3 => Some(Self::Shutdown),
            _ => None,
        }
    }

    /// Persisted wire representation.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each transition.
pub type ModeActionFn = fn(&mut FsmContext);

/// Signature for the per-cycle update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type ModeUpdateFn = fn(&mut FsmContext) -> Option<ModeId>;

// ---------------------------------------------------------------------------
// Mode descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single mode.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct ModeDescriptor {
    pub id: ModeId,
    pub name: &'static str,
    pub on_enter: Option<ModeActionFn>,
    pub on_exit: Option<ModeActionFn>,
    pub on_update: ModeUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the mode table (array of [`ModeDescriptor`]) and is driven with
/// a mutable [`FsmContext`] threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `ModeId as usize`.
    table: [ModeDescriptor; ModeId::COUNT],
    /// Index of the currently active mode.
    current: usize,
    /// Monotonically increasing tick counter (wraps at u64::MAX).
    tick_count: u64,
    /// Tick at which the current mode was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given mode table, starting in `initial`.
    pub fn new(table: [ModeDescriptor; ModeId::COUNT], initial: ModeId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting mode.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in mode: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one cycle.
    ///
    /// 1. Call `on_update` for the current mode.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (used by the supervisor to resume
    /// the persisted mode after a reset).
    pub fn force_transition(&mut self, next: ModeId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current mode's identity.
    pub fn current_mode(&self) -> ModeId {
        ModeId::from_index(self.current)
    }

    /// How many ticks the FSM has been in the current mode.
    pub fn ticks_in_current_mode(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: ModeId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current mode
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        // Enter new mode
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::{FsmContext, MotorCommand};
    use super::*;
    use crate::alarm::AlarmCode;
    use crate::config::SystemConfig;

    fn make_ctx() -> FsmContext {
        FsmContext::new(SystemConfig::default())
    }

    fn make_fsm() -> Fsm {
        Fsm::new(states::build_mode_table(), ModeId::Normal)
    }

    #[test]
    fn starts_in_normal() {
        let fsm = make_fsm();
        assert_eq!(fsm.current_mode(), ModeId::Normal);
    }

    #[test]
    fn tick_increments_counter() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        ctx.temperature = 15;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.ticks_in_current_mode(), 1);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.ticks_in_current_mode(), 2);
    }

    #[test]
    fn normal_to_emergency_on_overtemperature() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);

        ctx.temperature = 51;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_mode(), ModeId::Emergency);
    }

    #[test]
    fn emergency_recovers_to_normal_when_cool() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);

        ctx.temperature = 60;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_mode(), ModeId::Emergency);

        ctx.temperature = 45;
        ctx.emergency_ticks = 3;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_mode(), ModeId::Normal);
        assert_eq!(ctx.commands.motor, MotorCommand::full());
    }

    #[test]
    fn emergency_escalates_after_escalation_ticks() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);

        ctx.temperature = 60;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_mode(), ModeId::Emergency);

        ctx.emergency_ticks = ctx.config.escalation_ticks;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_mode(), ModeId::Abnormal);
        assert_eq!(ctx.take_alarm(), Some(AlarmCode::Abnormal));
    }

    #[test]
    fn abnormal_is_sticky_and_rearms_every_cycle() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        fsm.force_transition(ModeId::Abnormal, &mut ctx);

        for _ in 0..5 {
            ctx.temperature = 10; // cooling down does not matter
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_mode(), ModeId::Abnormal);
            assert!(ctx.take_failsafe().is_some(), "fail-safe armed each cycle");
            assert_eq!(ctx.commands.motor, MotorCommand::full());
        }
    }

    #[test]
    fn shutdown_mode_is_inert() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        fsm.force_transition(ModeId::Shutdown, &mut ctx);

        ctx.temperature = 200;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_mode(), ModeId::Shutdown);
        assert!(ctx.take_alarm().is_none());
        assert!(ctx.take_failsafe().is_none());
    }

    #[test]
    fn mode_id_from_index_roundtrip() {
        for i in 0..ModeId::COUNT {
            let id = ModeId::from_index(i);
            assert_eq!(id as usize, i);
        }
    }

    #[test]
    fn mode_byte_roundtrip_and_garbage() {
        for m in [
            ModeId::Normal,
            ModeId::Emergency,
            ModeId::Abnormal,
            ModeId::Shutdown,
        ] {
            assert_eq!(ModeId::from_byte(m.as_byte()), Some(m));
        }
        assert_eq!(ModeId::from_byte(4), None);
        assert_eq!(ModeId::from_byte(0xFF), None);
    }
}
