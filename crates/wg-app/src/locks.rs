//! Per-device resolution locks.
//!
//! Two resolutions of the same device id would race on the same store
//! table and engine output. Every resolution runs its cache-or-compute
//! section under the device's lock, so within one process the second
//! caller waits and then finds the table the first one wrote. Callers
//! sharing a store across processes must still serialize by id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wg_core::DeviceId;

#[derive(Default)]
pub struct DeviceLocks {
    locks: Mutex<HashMap<DeviceId, Arc<Mutex<()>>>>,
}

impl DeviceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `device_id`.
    pub fn with_lock<R>(&self, device_id: DeviceId, f: impl FnOnce() -> R) -> R {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(locks.entry(device_id).or_default())
        };
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());
        f()
    }

    /// Number of device ids that have ever been locked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
