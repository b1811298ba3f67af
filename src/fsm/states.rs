//! Concrete mode handler functions and table builder.
//!
//! Each mode is defined by three plain `fn` pointers — no closures, no
//! dynamic dispatch, no heap. This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  NORMAL ──[T > 50]──▶ EMERGENCY ──[counter >= 14]──▶ ABNORMAL
//!    ▲                      │                              │
//!    └──────[T < 50]────────┘              [watchdog reset, re-entered
//!                                           from the persisted mode]
//! ```
//!
//! Abnormal is sticky within the process lifetime: every cycle it
//! commands full speed and arms the fail-safe, which the supervisor
//! never re-arms with more time. The only exit is the hardware reset.

use super::context::{FsmContext, MotorCommand};
use super::{ModeDescriptor, ModeId};
use crate::alarm::AlarmCode;
use crate::drivers::failsafe::FailsafeTimeout;
use log::{error, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table. Called once at startup.
pub fn build_mode_table() -> [ModeDescriptor; ModeId::COUNT] {
    [
        // Index 0 — Normal
        ModeDescriptor {
            id: ModeId::Normal,
            name: "Normal",
            on_enter: Some(normal_enter),
            on_exit: None,
            on_update: normal_update,
        },
        // Index 1 — Emergency
        ModeDescriptor {
            id: ModeId::Emergency,
            name: "Emergency",
            on_enter: Some(emergency_enter),
            on_exit: None,
            on_update: emergency_update,
        },
        // Index 2 — Abnormal
        ModeDescriptor {
            id: ModeId::Abnormal,
            name: "Abnormal",
            on_enter: Some(abnormal_enter),
            on_exit: None,
            on_update: abnormal_update,
        },
        // Index 3 — Shutdown (reserved)
        ModeDescriptor {
            id: ModeId::Shutdown,
            name: "Shutdown",
            on_enter: None,
            on_exit: None,
            on_update: shutdown_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Duty interpolation
// ═══════════════════════════════════════════════════════════════════════════

/// Map `value` into a 0–100 percentage over `[lo, hi]`.
///
/// Clamps `value` into the range first, then computes
/// `((value - lo) * 100) / (hi - lo)` with integer division truncating
/// toward zero.
pub fn percentage(value: u8, lo: u8, hi: u8) -> u8 {
    debug_assert!(lo < hi, "percentage range must be non-empty");
    let v = value.clamp(lo, hi);
    ((u32::from(v - lo) * 100) / u32::from(hi - lo)) as u8
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL mode
// ═══════════════════════════════════════════════════════════════════════════

fn normal_enter(ctx: &mut FsmContext) {
    info!("NORMAL: T={}°C, proportional cooling", ctx.temperature);
}

fn normal_update(ctx: &mut FsmContext) -> Option<ModeId> {
    let t = ctx.temperature;
    let cfg = &ctx.config;

    if t <= cfg.stop_below_c {
        ctx.commands.motor = MotorCommand::Stop;
        None
    } else if t < cfg.full_duty_at_c {
        ctx.commands.motor = MotorCommand::Clockwise {
            duty: percentage(t, cfg.stop_below_c, cfg.full_duty_at_c),
        };
        None
    } else if t <= cfg.emergency_above_c {
        ctx.commands.motor = MotorCommand::full();
        None
    } else {
        // No actuator change on the way out: the previous command stands
        // until the Emergency handler asserts full speed next cycle.
        Some(ModeId::Emergency)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  EMERGENCY mode — time-bounded full-speed cooling
// ═══════════════════════════════════════════════════════════════════════════

fn emergency_enter(ctx: &mut FsmContext) {
    warn!(
        "EMERGENCY: T={}°C, escalation in {} ticks unless it cools below {}°C",
        ctx.temperature, ctx.config.escalation_ticks, ctx.config.emergency_above_c
    );
}

fn emergency_update(ctx: &mut FsmContext) -> Option<ModeId> {
    // Escalation check comes first: once the counter hits the bound the
    // abnormal code is emitted and no motor command is issued this cycle.
    if ctx.emergency_ticks >= ctx.config.escalation_ticks {
        ctx.commands.alarm = Some(AlarmCode::Abnormal);
        return Some(ModeId::Abnormal);
    }

    ctx.commands.motor = MotorCommand::full();

    if ctx.temperature < ctx.config.emergency_above_c {
        return Some(ModeId::Normal);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ABNORMAL mode — sticky terminal, fail-safe armed every cycle
// ═══════════════════════════════════════════════════════════════════════════

fn abnormal_enter(ctx: &mut FsmContext) {
    error!(
        "ABNORMAL: unrecoverable at T={}°C — arming fail-safe, awaiting hardware reset",
        ctx.temperature
    );
}

fn abnormal_update(ctx: &mut FsmContext) -> Option<ModeId> {
    // Re-asserted every cycle. The fail-safe is armed with the shortest
    // timeout class and never re-armed with more time, so the hardware
    // reset is the only exit from this mode.
    ctx.commands.motor = MotorCommand::full();
    ctx.commands.arm_failsafe = Some(FailsafeTimeout::Ms16);
    ctx.commands.reset_counter = true;
    ctx.emergency_ticks = 0;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SHUTDOWN mode — reserved, never entered by the table
// ═══════════════════════════════════════════════════════════════════════════

fn shutdown_update(_ctx: &mut FsmContext) -> Option<ModeId> {
    // Reserved terminal value in the persisted byte domain. If ever
    // resumed from storage, it takes no action and issues no transition.
    None
}
