//! Shared mutable context threaded through every mode handler.
//!
//! `FsmContext` is the single struct that mode handlers read from and
//! write to. It contains the latest temperature sample, a snapshot of
//! the emergency tick counter, the per-cycle command outputs, and the
//! configuration. Think of it as the "blackboard" in a blackboard
//! architecture: handlers decide, the supervisor performs the I/O.

use crate::alarm::AlarmCode;
use crate::config::SystemConfig;
use crate::drivers::failsafe::FailsafeTimeout;

// ---------------------------------------------------------------------------
// Motor command (written by mode handlers; applied by the supervisor)
// ---------------------------------------------------------------------------

/// Desired motor drive for the current cycle.
///
/// The command is *retained* across cycles: a handler arm that issues no
/// actuator action (e.g. Normal → Emergency) leaves the previous command
/// standing, and the supervisor re-applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    Stop,
    /// Clockwise rotation at the given duty (1–100).
    Clockwise { duty: u8 },
}

impl MotorCommand {
    /// Full-speed clockwise.
    pub const fn full() -> Self {
        Self::Clockwise { duty: 100 }
    }
}

// ---------------------------------------------------------------------------
// Per-cycle outputs
// ---------------------------------------------------------------------------

/// Outputs a mode handler may request for the current cycle.
/// `alarm`, `arm_failsafe`, and `reset_counter` are one-shot and taken
/// by the supervisor each cycle; `motor` is retained.
#[derive(Debug, Clone, Copy)]
pub struct CycleCommands {
    /// Motor drive (retained across cycles).
    pub motor: MotorCommand,
    /// Sentinel code to emit on the alarm link this cycle.
    pub alarm: Option<AlarmCode>,
    /// Fail-safe arm request for this cycle.
    pub arm_failsafe: Option<FailsafeTimeout>,
    /// Request to zero the shared emergency counter.
    pub reset_counter: bool,
}

impl Default for CycleCommands {
    fn default() -> Self {
        Self {
            motor: MotorCommand::Stop,
            alarm: None,
            arm_failsafe: None,
            reset_counter: false,
        }
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every mode handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current mode was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Inputs (written by the supervisor before each tick) --
    /// Latest temperature sample (degrees, byte domain).
    pub temperature: u8,
    /// Snapshot of the shared emergency counter for this cycle.
    pub emergency_ticks: u8,

    // -- Outputs --
    /// Commands the supervisor applies after the FSM tick.
    pub commands: CycleCommands,

    // -- Configuration --
    pub config: SystemConfig,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            temperature: 0,
            emergency_ticks: 0,
            commands: CycleCommands::default(),
            config,
        }
    }

    /// Take the pending alarm code, if any (one-shot).
    pub fn take_alarm(&mut self) -> Option<AlarmCode> {
        self.commands.alarm.take()
    }

    /// Take the pending fail-safe arm request, if any (one-shot).
    pub fn take_failsafe(&mut self) -> Option<FailsafeTimeout> {
        self.commands.arm_failsafe.take()
    }

    /// Take the counter-reset request (one-shot).
    pub fn take_counter_reset(&mut self) -> bool {
        core::mem::take(&mut self.commands.reset_counter)
    }
}
