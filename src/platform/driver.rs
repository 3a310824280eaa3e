//! Bring-up and teardown of the fan driver.
//!
//! Registration order is cooling device, suspend notifier, shutdown notifier.
//! A failure unwinds whatever was registered in reverse order, forcing the fan
//! to automatic before the device is released.

use std::sync::Arc;

use log::{error, info, warn};

use super::{
    CoolingDeviceId, NotifierId, PowerEventSource, ShutdownNotifier, SuspendNotifier,
    ThermalCoolingDevice, ThermalFramework,
};
use crate::controller::CoolingDevice;
use crate::errors::{FanControlError, Result};
use crate::firmware::Firmware;

/// Name the cooling device is registered under.
pub const COOLING_DEVICE_NAME: &str = "Fan";

struct Registration {
    cooling: CoolingDeviceId,
    suspend: NotifierId,
    shutdown: NotifierId,
}

/// A cooling device registered with a thermal framework and a power event
/// source. Dropping the driver tears it down.
pub struct Driver<'a, F: Firmware + Send + Sync + 'static> {
    device: Arc<CoolingDevice<F>>,
    thermal: &'a dyn ThermalFramework,
    power: &'a dyn PowerEventSource,
    registration: Option<Registration>,
}

impl<'a, F: Firmware + Send + Sync + 'static> Driver<'a, F> {
    pub fn init(
        fan_id: u32,
        firmware: F,
        thermal: &'a dyn ThermalFramework,
        power: &'a dyn PowerEventSource,
    ) -> Result<Self> {
        let device = Arc::new(CoolingDevice::new(fan_id, firmware));

        let cooling_device: Arc<dyn ThermalCoolingDevice> = device.clone();
        let cooling = match thermal.register_cooling_device(COOLING_DEVICE_NAME, cooling_device) {
            Ok(id) => id,
            Err(failure) => {
                error!("failed to register cooling device: {}", failure);
                force_auto_best_effort(&device);
                return Err(registration_error("cooling device", failure));
            }
        };

        let suspend = match power
            .register_suspend_notifier(Arc::new(SuspendNotifier::new(Arc::clone(&device))))
        {
            Ok(id) => id,
            Err(failure) => {
                error!("failed to register suspend notifier: {}", failure);
                force_auto_best_effort(&device);
                thermal.unregister_cooling_device(cooling);
                return Err(registration_error("suspend notifier", failure));
            }
        };

        let shutdown = match power
            .register_shutdown_notifier(Arc::new(ShutdownNotifier::new(Arc::clone(&device))))
        {
            Ok(id) => id,
            Err(failure) => {
                error!("failed to register shutdown notifier: {}", failure);
                power.unregister_suspend_notifier(suspend);
                force_auto_best_effort(&device);
                thermal.unregister_cooling_device(cooling);
                return Err(registration_error("shutdown notifier", failure));
            }
        };

        force_auto_best_effort(&device);
        info!("fan {} driver ready", fan_id);

        Ok(Self {
            device,
            thermal,
            power,
            registration: Some(Registration {
                cooling,
                suspend,
                shutdown,
            }),
        })
    }

    pub fn device(&self) -> &Arc<CoolingDevice<F>> {
        &self.device
    }

    /// Unregister everything and leave the fan in automatic mode.
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };

        self.power.unregister_suspend_notifier(registration.suspend);
        self.power.unregister_shutdown_notifier(registration.shutdown);
        force_auto_best_effort(&self.device);
        self.thermal.unregister_cooling_device(registration.cooling);
        info!("fan driver released");
    }
}

impl<F: Firmware + Send + Sync + 'static> Drop for Driver<'_, F> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The device is going away either way, so a failure is only logged.
fn force_auto_best_effort<F: Firmware>(device: &CoolingDevice<F>) {
    if let Err(error) = device.force_auto() {
        warn!("could not force fan to automatic mode: {}", error);
    }
}

fn registration_error(what: &str, error: FanControlError) -> FanControlError {
    match error {
        FanControlError::Registration(message) => {
            FanControlError::Registration(format!("{}: {}", what, message))
        }
        other => FanControlError::Registration(format!("{}: {}", what, other)),
    }
}
