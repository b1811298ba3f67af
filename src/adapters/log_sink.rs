//! Log-based event sink.
//!
//! Renders every [`AppEvent`] to the serial log at a severity matching
//! its safety weight. This is the only observability surface the node
//! carries; the peer link byte stream is the machine-readable one.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => info!("event: started in {mode:?}"),
            AppEvent::ModeChanged { from, to } => info!("event: mode {from:?} -> {to:?}"),
            AppEvent::AlarmSent(byte) => warn!("event: alarm 0x{byte:02X} sent to peer"),
            AppEvent::FailsafeArmed(timeout) => {
                error!("event: fail-safe armed ({timeout}), hardware reset pending");
            }
            AppEvent::EdgeObserved { temperature } => {
                warn!("event: edge signal observed at T={temperature}°C");
            }
            AppEvent::PersistedModeUnreadable(raw) => {
                error!("event: persisted mode byte 0x{raw:02X} unreadable, cycle frozen");
            }
        }
    }
}
