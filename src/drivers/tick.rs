//! Periodic tick timers using ESP-IDF's esp_timer API.
//!
//! Two periodic timers drive the system:
//!
//! - **control** — fires at the configured cycle period; bumps the
//!   emergency counter in [`ISR_CELLS`](crate::isr::ISR_CELLS) and
//!   queues a [`Event::ControlTick`].
//! - **telemetry** — a slow heartbeat for the serial console.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() which uses AtomicU8.
//!
//! On simulation targets the timers are not started; the host loop
//! drives events by sleeping.

#[cfg(feature = "espidf")]
use crate::events::{push_event, Event};
#[cfg(feature = "espidf")]
use crate::isr::ISR_CELLS;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
use log::info;

/// Telemetry heartbeat period (microseconds).
#[cfg(feature = "espidf")]
const TELEMETRY_PERIOD_US: u64 = 5_000_000;

#[cfg(feature = "espidf")]
static mut CONTROL_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(feature = "espidf")]
static mut TELEMETRY_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: CONTROL_TIMER is written once in `start_timers()` before any
/// timer callbacks fire. Only called from the single main task.
#[cfg(feature = "espidf")]
unsafe fn control_timer() -> esp_timer_handle_t {
    unsafe { CONTROL_TIMER }
}

/// SAFETY: Same invariants as `control_timer()`.
#[cfg(feature = "espidf")]
unsafe fn telemetry_timer() -> esp_timer_handle_t {
    unsafe { TELEMETRY_TIMER }
}

#[cfg(feature = "espidf")]
unsafe extern "C" fn control_tick_cb(_arg: *mut core::ffi::c_void) {
    // Counter first, so the supervisor's snapshot this cycle sees it.
    ISR_CELLS.tick();
    push_event(Event::ControlTick);
}

#[cfg(feature = "espidf")]
unsafe extern "C" fn telemetry_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::TelemetryTick);
}

/// Start the hardware tick timers.
///
/// `control_period_ms` comes from [`SystemConfig::tick_period_ms`]
/// (500 ms, 2 Hz by default).
///
/// [`SystemConfig::tick_period_ms`]: crate::config::SystemConfig
#[cfg(feature = "espidf")]
pub fn start_timers(control_period_ms: u32) {
    // SAFETY: CONTROL_TIMER and TELEMETRY_TIMER are written here once at
    // boot from the single main-task context before any timer callbacks
    // fire. The callbacks only touch atomics and the lock-free queue.
    unsafe {
        let control_args = esp_timer_create_args_t {
            callback: Some(control_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"control\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&control_args, &raw mut CONTROL_TIMER);
        if ret != ESP_OK {
            log::error!("tick: control timer create failed (rc={ret})");
            return;
        }
        let ret = esp_timer_start_periodic(CONTROL_TIMER, u64::from(control_period_ms) * 1_000);
        if ret != ESP_OK {
            log::error!("tick: control timer start failed (rc={ret})");
            return;
        }

        let telemetry_args = esp_timer_create_args_t {
            callback: Some(telemetry_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"telemetry\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&telemetry_args, &raw mut TELEMETRY_TIMER);
        if ret != ESP_OK {
            log::error!("tick: telemetry timer create failed (rc={ret})");
            return;
        }
        let ret = esp_timer_start_periodic(TELEMETRY_TIMER, TELEMETRY_PERIOD_US);
        if ret != ESP_OK {
            log::error!("tick: telemetry timer start failed (rc={ret})");
            return;
        }

        info!("tick: control@{control_period_ms}ms + telemetry@5s started");
    }
}

#[cfg(not(feature = "espidf"))]
pub fn start_timers(_control_period_ms: u32) {
    log::info!("tick(sim): timers not started (events driven by sleep loop)");
}

/// Stop all hardware tick timers.
#[cfg(feature = "espidf")]
pub fn stop_timers() {
    // SAFETY: handles are valid if start_timers() succeeded; null-check
    // prevents double-free.
    unsafe {
        let ct = control_timer();
        if !ct.is_null() {
            esp_timer_stop(ct);
        }
        let tt = telemetry_timer();
        if !tt.is_null() {
            esp_timer_stop(tt);
        }
    }
}

#[cfg(not(feature = "espidf"))]
pub fn stop_timers() {}

// ── Simulation tick source ────────────────────────────────────

/// Host-side stand-in for the periodic hardware timer.
///
/// Holds a single registration slot as an explicit `Option`: firing with
/// no callback registered is a visible no-op, not a call through a null
/// pointer. Registering a new callback replaces the previous one; there
/// is no unregister.
///
/// The canonical callback mirrors what the hardware timer does:
/// `ISR_CELLS.tick()` followed by `push_event(Event::ControlTick)`.
#[cfg(not(feature = "espidf"))]
pub struct TickSource {
    callback: Option<Box<dyn FnMut() + Send>>,
}

#[cfg(not(feature = "espidf"))]
impl TickSource {
    pub fn new() -> Self {
        Self { callback: None }
    }

    /// Install the periodic callback, replacing any previous one.
    pub fn register(&mut self, callback: impl FnMut() + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Deliver one tick. Returns `false` when no callback is registered.
    pub fn fire(&mut self) -> bool {
        match self.callback.as_mut() {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }
}

#[cfg(not(feature = "espidf"))]
impl Default for TickSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(feature = "espidf")))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn fire_without_registration_is_a_visible_noop() {
        let mut source = TickSource::new();
        assert!(!source.fire());
    }

    #[test]
    fn registration_replaces_the_previous_callback() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));
        let mut source = TickSource::new();

        let c = Arc::clone(&first);
        source.register(move || {
            c.fetch_add(1, Ordering::Relaxed);
        });
        assert!(source.fire());
        assert!(source.fire());

        let c = Arc::clone(&second);
        source.register(move || {
            c.fetch_add(1, Ordering::Relaxed);
        });
        assert!(source.fire());

        assert_eq!(first.load(Ordering::Relaxed), 2);
        assert_eq!(second.load(Ordering::Relaxed), 1);
    }
}
