//! Persistent storage adapter (NVS).
//!
//! Implements both [`ModeStorePort`] and [`ConfigPort`].
//!
//! The mode slot is a single `u8` NVS entry; each write is followed by
//! `nvs_commit`, which blocks until the previous commit has drained.
//! That blocking is exactly the store's contract: the supervisor's
//! write-through ordering relies on it, and it is also why the store
//! must never be touched from an interrupt handler.
//!
//! Config blobs are postcard-encoded and range-validated before every
//! save, so a corrupted or hostile blob cannot reorder the temperature
//! thresholds or zero the escalation bound.

use log::info;
#[cfg(feature = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort, ModeStorePort, StoreError};
use crate::config::SystemConfig;

#[cfg(not(feature = "espidf"))]
use std::cell::RefCell;
#[cfg(not(feature = "espidf"))]
use std::collections::HashMap;

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
const NAMESPACE: &str = "thermoguard";
const CONFIG_KEY: &str = "syscfg";

#[cfg(feature = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

pub struct PersistentStore {
    #[cfg(not(feature = "espidf"))]
    slots: HashMap<u16, u8>,
    #[cfg(not(feature = "espidf"))]
    blobs: RefCell<HashMap<String, Vec<u8>>>,
    #[cfg(not(feature = "espidf"))]
    fail_writes: bool,
}

impl PersistentStore {
    /// Create the store and initialise the NVS flash partition.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("store: erasing and re-initialising NVS partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("store: ESP-IDF NVS initialised");
        }

        #[cfg(not(feature = "espidf"))]
        info!("store: simulation backend");

        Ok(Self {
            #[cfg(not(feature = "espidf"))]
            slots: HashMap::new(),
            #[cfg(not(feature = "espidf"))]
            blobs: RefCell::new(HashMap::new()),
            #[cfg(not(feature = "espidf"))]
            fail_writes: false,
        })
    }

    /// Make every subsequent `write_mode` fail (simulation only).
    #[cfg(not(feature = "espidf"))]
    pub fn sim_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Open the NVS namespace, execute a closure with the handle, then close.
    #[cfg(feature = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = NAMESPACE.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    /// NUL-terminated NVS key for a mode slot ("mode0", "mode1", ...).
    #[cfg(feature = "espidf")]
    fn slot_key(slot: u16) -> [u8; 16] {
        use core::fmt::Write;
        let mut s = heapless::String::<12>::new();
        let _ = write!(s, "mode{slot}");
        let mut buf = [0u8; 16];
        let bytes = s.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        buf
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.stop_below_c >= cfg.full_duty_at_c {
        return Err(ConfigError::ValidationFailed(
            "stop_below_c must be < full_duty_at_c",
        ));
    }
    if cfg.full_duty_at_c >= cfg.emergency_above_c {
        return Err(ConfigError::ValidationFailed(
            "full_duty_at_c must be < emergency_above_c",
        ));
    }
    if cfg.escalation_ticks == 0 {
        return Err(ConfigError::ValidationFailed(
            "escalation_ticks must be >= 1",
        ));
    }
    if !(100..=5000).contains(&cfg.tick_period_ms) {
        return Err(ConfigError::ValidationFailed(
            "tick_period_ms must be 100–5000",
        ));
    }
    Ok(())
}

impl ModeStorePort for PersistentStore {
    fn read_mode(&self, slot: u16) -> Option<u8> {
        #[cfg(not(feature = "espidf"))]
        {
            self.slots.get(&slot).copied()
        }

        #[cfg(feature = "espidf")]
        {
            let key = Self::slot_key(slot);
            let result = Self::with_nvs_handle(false, |handle| {
                let mut value: u8 = 0;
                let ret = unsafe { nvs_get_u8(handle, key.as_ptr() as *const _, &mut value) };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(value)
            });
            match result {
                Ok(value) => Some(value),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => None,
                Err(e) => {
                    warn!("store: mode slot {slot} read error {e}");
                    None
                }
            }
        }
    }

    fn write_mode(&mut self, slot: u16, raw: u8) -> Result<(), StoreError> {
        #[cfg(not(feature = "espidf"))]
        {
            if self.fail_writes {
                return Err(StoreError::WriteFailed);
            }
            self.slots.insert(slot, raw);
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let key = Self::slot_key(slot);
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe { nvs_set_u8(handle, key.as_ptr() as *const _, raw) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                // Blocks until the write is durable.
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                warn!("store: mode slot {slot} write error {e}");
                StoreError::WriteFailed
            })
        }
    }
}

impl ConfigPort for PersistentStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(feature = "espidf"))]
        {
            if let Some(bytes) = self.blobs.borrow().get(CONFIG_KEY) {
                let cfg: SystemConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("store: loaded config");
                Ok(cfg)
            } else {
                info!("store: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }

        #[cfg(feature = "espidf")]
        {
            let result = Self::with_nvs_handle(false, |handle| {
                let key_cstr = b"syscfg\0";
                let mut size: usize = 0;

                // First call: get size.
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: SystemConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("store: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("store: no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
                Err(e) => {
                    warn!("store: config read error {e}, using defaults");
                    Ok(SystemConfig::default())
                }
            }
        }
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;

        #[cfg(not(feature = "espidf"))]
        {
            let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
            self.blobs.borrow_mut().insert(CONFIG_KEY.to_owned(), bytes);
            info!("store: config saved (simulation)");
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
            let result = Self::with_nvs_handle(true, |handle| {
                let key_cstr = b"syscfg\0";
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("store: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("store: config write error {e}");
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}
