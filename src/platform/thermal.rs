use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;

use super::{CoolingDeviceId, ThermalCoolingDevice, ThermalFramework};
use crate::controller::CoolingDevice;
use crate::errors::{FanControlError, Result};
use crate::firmware::Firmware;

impl<F: Firmware + Send + Sync> ThermalCoolingDevice for CoolingDevice<F> {
    fn get_max_state(&self) -> u64 {
        u64::from(self.get_max_speed())
    }

    fn get_cur_state(&self) -> Result<u64> {
        self.get_current_speed().map(u64::from)
    }

    fn set_cur_state(&self, state: u64) -> Result<()> {
        self.set_current_speed(i64::try_from(state).unwrap_or(i64::MAX))
    }
}

struct Registered {
    name: String,
    device: Arc<dyn ThermalCoolingDevice>,
}

#[derive(Default)]
struct Inner {
    next_id: u32,
    devices: BTreeMap<CoolingDeviceId, Registered>,
}

/// In-process thermal framework: a table of named cooling devices.
#[derive(Default)]
pub struct ThermalRegistry {
    inner: Mutex<Inner>,
}

impl ThermalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a registered device by name.
    pub fn find(&self, name: &str) -> Option<Arc<dyn ThermalCoolingDevice>> {
        self.lock()
            .devices
            .values()
            .find(|registered| registered.name == name)
            .map(|registered| Arc::clone(&registered.device))
    }

    pub fn len(&self) -> usize {
        self.lock().devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ThermalFramework for ThermalRegistry {
    fn register_cooling_device(
        &self,
        name: &str,
        device: Arc<dyn ThermalCoolingDevice>,
    ) -> Result<CoolingDeviceId> {
        let mut inner = self.lock();

        if inner.devices.values().any(|registered| registered.name == name) {
            return Err(FanControlError::Registration(format!(
                "cooling device '{}' is already registered",
                name
            )));
        }

        let id = CoolingDeviceId(inner.next_id);
        inner.next_id += 1;
        inner.devices.insert(
            id,
            Registered {
                name: name.to_string(),
                device,
            },
        );
        info!("registered cooling device '{}' as {}", name, id.0);
        Ok(id)
    }

    fn unregister_cooling_device(&self, id: CoolingDeviceId) {
        if let Some(registered) = self.lock().devices.remove(&id) {
            info!("unregistered cooling device '{}'", registered.name);
        }
    }
}
