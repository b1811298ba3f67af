//! Hardware fail-safe (watchdog) driver.
//!
//! Unlike a conventional liveness watchdog that the main loop feeds,
//! this one is used as a one-way commitment device: the supervisor arms
//! it when the Abnormal mode is entered and then never services it, so
//! the countdown expires and the hardware resets the node regardless of
//! what the software does afterwards.
//!
//! ## Arming discipline
//!
//! The first `arm` call configures the countdown. Every later call is
//! ignored: re-configuring the hardware would restart the countdown and
//! extend the time to reset, which must never happen once the
//! commitment is made.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

use log::{debug, warn};

use crate::app::ports::FailsafePort;

/// Fail-safe countdown classes supported by the reset hardware.
///
/// `Ms16` is the shortest class and the one the supervisor uses; the
/// longer classes exist for bench diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailsafeTimeout {
    Ms16,
    Ms32,
    Ms65,
    Ms130,
    Ms260,
    Ms520,
    S1,
    S2,
}

impl FailsafeTimeout {
    /// Nominal countdown duration in milliseconds.
    pub const fn as_ms(self) -> u32 {
        match self {
            Self::Ms16 => 16,
            Self::Ms32 => 32,
            Self::Ms65 => 65,
            Self::Ms130 => 130,
            Self::Ms260 => 260,
            Self::Ms520 => 520,
            Self::S1 => 1_000,
            Self::S2 => 2_000,
        }
    }
}

impl core::fmt::Display for FailsafeTimeout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}ms", self.as_ms())
    }
}

/// The fail-safe driver. One instance, owned by the main task.
pub struct Failsafe {
    armed: Option<FailsafeTimeout>,
}

impl Failsafe {
    pub fn new() -> Self {
        Self { armed: None }
    }

    /// Countdown class armed so far, if any.
    pub fn armed(&self) -> Option<FailsafeTimeout> {
        self.armed
    }

    #[cfg(feature = "espidf")]
    fn arm_hw(timeout: FailsafeTimeout) {
        // Configure the task watchdog with panic-on-trigger and subscribe
        // the current task, then never reset it. The panic handler
        // reboots the chip.
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: timeout.as_ms(),
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                warn!("failsafe: wdt reconfigure returned {ret}");
            }
            let ret = esp_task_wdt_add(core::ptr::null_mut());
            if ret != ESP_OK {
                warn!("failsafe: wdt subscribe returned {ret}");
            }
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn arm_hw(_timeout: FailsafeTimeout) {}
}

impl Default for Failsafe {
    fn default() -> Self {
        Self::new()
    }
}

impl FailsafePort for Failsafe {
    fn arm(&mut self, timeout: FailsafeTimeout) {
        if let Some(first) = self.armed {
            // Already committed. Reconfiguring would restart the countdown.
            debug!("failsafe: already armed at {first}, ignoring {timeout}");
            return;
        }
        warn!("failsafe: armed, reset in {timeout}");
        Self::arm_hw(timeout);
        self.armed = Some(timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_arm_sticks_later_arms_ignored() {
        let mut fs = Failsafe::new();
        assert_eq!(fs.armed(), None);

        fs.arm(FailsafeTimeout::Ms16);
        assert_eq!(fs.armed(), Some(FailsafeTimeout::Ms16));

        // Re-arming, even with a longer class, never extends the countdown.
        fs.arm(FailsafeTimeout::S2);
        fs.arm(FailsafeTimeout::Ms16);
        assert_eq!(fs.armed(), Some(FailsafeTimeout::Ms16));
    }

    #[test]
    fn timeout_classes_ascend() {
        let classes = [
            FailsafeTimeout::Ms16,
            FailsafeTimeout::Ms32,
            FailsafeTimeout::Ms65,
            FailsafeTimeout::Ms130,
            FailsafeTimeout::Ms260,
            FailsafeTimeout::Ms520,
            FailsafeTimeout::S1,
            FailsafeTimeout::S2,
        ];
        for pair in classes.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].as_ms() < pair[1].as_ms());
        }
        assert_eq!(FailsafeTimeout::Ms16.as_ms(), 16);
    }
}
