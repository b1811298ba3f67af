//! ThermoGuard supervisory node — main entry point.
//!
//! Hexagonal architecture with event-driven execution:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  HardwareAdapter   UartLink     PersistentStore          │
//! │  (Sensor+Actuator) (AlarmLink)  (ModeStore+Config)       │
//! │  LogEventSink      Failsafe                              │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ──────────────      │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │          Supervisor (pure logic)               │      │
//! │  │  Mode FSM · write-through persistence          │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use thermoguard::adapters::hardware::HardwareAdapter;
use thermoguard::adapters::log_sink::LogEventSink;
use thermoguard::adapters::store::PersistentStore;
use thermoguard::adapters::uart_link::UartLink;
use thermoguard::app::ports::ConfigPort;
use thermoguard::config::SystemConfig;
use thermoguard::drivers::failsafe::Failsafe;
use thermoguard::drivers::{hw_init, tick};
use thermoguard::events::{self, Event};
use thermoguard::isr::ISR_CELLS;
use thermoguard::supervisor::Supervisor;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("ThermoGuard supervisory node v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        log::error!("HAL init failed: {e} — halting");
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Persistent store + config ──────────────────────────
    let mut store = PersistentStore::new()
        .map_err(|e| anyhow::anyhow!("persistent store init failed: {e}"))?;
    let config = match store.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("Config load failed ({e}), using defaults");
            SystemConfig::default()
        }
    };

    // ── 4. Adapters ───────────────────────────────────────────
    let mut hw = HardwareAdapter::new();
    let mut link = UartLink::new();
    let mut failsafe = Failsafe::new();
    let mut sink = LogEventSink;

    // ── 5. Supervisor: resume the persisted mode ──────────────
    let mut supervisor = Supervisor::new(config.clone());
    supervisor.start(&ISR_CELLS, &mut store, &mut sink);

    // ── 6. Timers + edge interrupt ────────────────────────────
    // Order matters: the band and cached temperature cells were seeded
    // by start(), so the edge ISR is enabled only after that.
    tick::start_timers(config.tick_period_ms);
    if let Err(e) = hw_init::init_isr_service() {
        log::error!("ISR service init failed: {e} — edge path disabled");
    }

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    loop {
        events::drain_events(|event| match event {
            Event::ControlTick => {
                supervisor.cycle(
                    &ISR_CELLS,
                    &mut hw,
                    &mut store,
                    &mut link,
                    &mut failsafe,
                    &mut sink,
                );
            }

            Event::EdgeSignal => {
                // The conditional shutdown byte already went out from
                // the ISR; the flag is consumed inside the next cycle.
            }

            Event::TelemetryTick => {
                info!(
                    "telemetry: mode={:?} T={}°C motor={:?} cycles={}",
                    supervisor.mode(),
                    ISR_CELLS.cached_temperature(),
                    hw.motor_state(),
                    supervisor.cycle_count(),
                );
            }
        });

        // Nothing else to do between interrupts; the FreeRTOS idle task
        // runs while the queue is empty.
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
}
