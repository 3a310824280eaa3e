//! Host-facing shell around the cooling device.
//!
//! The host reaches the fan through two frameworks: a thermal framework that
//! queries and sets the cooling state, and a power event source that delivers
//! suspend, resume and shutdown notifications. Both are traits here so the
//! [`Driver`] can be wired into the in-process implementations or into test
//! doubles.

pub(crate) mod dmi;
mod driver;
mod notifier;
mod thermal;

use std::sync::Arc;

pub use dmi::check_vendor;
pub use driver::{Driver, COOLING_DEVICE_NAME};
pub use notifier::{NotifierChains, ShutdownNotifier, SuspendNotifier};
pub use thermal::ThermalRegistry;

use crate::errors::Result;
use crate::power::{NotifyOutcome, PowerEvent};

/// Handle returned by [`ThermalFramework::register_cooling_device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoolingDeviceId(pub u32);

/// Handle returned when a notifier is registered with a [`PowerEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotifierId(pub u32);

/// Operations the thermal framework calls on a registered cooling device.
pub trait ThermalCoolingDevice: Send + Sync {
    fn get_max_state(&self) -> u64;

    fn get_cur_state(&self) -> Result<u64>;

    fn set_cur_state(&self, state: u64) -> Result<()>;
}

/// Registry of cooling devices driven by thermal policy.
pub trait ThermalFramework {
    fn register_cooling_device(
        &self,
        name: &str,
        device: Arc<dyn ThermalCoolingDevice>,
    ) -> Result<CoolingDeviceId>;

    fn unregister_cooling_device(&self, id: CoolingDeviceId);
}

/// Callback invoked for every event on the chain it is registered with.
pub trait PowerNotifier: Send + Sync {
    fn notify(&self, event: PowerEvent) -> NotifyOutcome;
}

/// Source of power transition notifications.
///
/// Suspend/resume and shutdown events travel on separate chains.
pub trait PowerEventSource {
    fn register_suspend_notifier(&self, notifier: Arc<dyn PowerNotifier>) -> Result<NotifierId>;

    fn unregister_suspend_notifier(&self, id: NotifierId);

    fn register_shutdown_notifier(&self, notifier: Arc<dyn PowerNotifier>) -> Result<NotifierId>;

    fn unregister_shutdown_notifier(&self, id: NotifierId);
}
