use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use super::{NotifierId, PowerEventSource, PowerNotifier};
use crate::controller::CoolingDevice;
use crate::errors::Result;
use crate::firmware::Firmware;
use crate::power::{NotifyOutcome, PowerEvent};

/// Suspend-chain notifier for a cooling device.
pub struct SuspendNotifier<F> {
    device: Arc<CoolingDevice<F>>,
}

impl<F> SuspendNotifier<F> {
    pub fn new(device: Arc<CoolingDevice<F>>) -> Self {
        Self { device }
    }
}

impl<F: Firmware + Send + Sync> PowerNotifier for SuspendNotifier<F> {
    fn notify(&self, event: PowerEvent) -> NotifyOutcome {
        self.device.handle_suspend_event(event)
    }
}

/// Shutdown-chain notifier for a cooling device.
pub struct ShutdownNotifier<F> {
    device: Arc<CoolingDevice<F>>,
}

impl<F> ShutdownNotifier<F> {
    pub fn new(device: Arc<CoolingDevice<F>>) -> Self {
        Self { device }
    }
}

impl<F: Firmware + Send + Sync> PowerNotifier for ShutdownNotifier<F> {
    fn notify(&self, event: PowerEvent) -> NotifyOutcome {
        self.device.handle_shutdown_event(event)
    }
}

type Chain = Vec<(NotifierId, Arc<dyn PowerNotifier>)>;

#[derive(Default)]
struct Inner {
    next_id: u32,
    suspend: Chain,
    shutdown: Chain,
}

/// In-process power event source with a suspend chain and a shutdown chain.
#[derive(Default)]
pub struct NotifierChains {
    inner: Mutex<Inner>,
}

impl NotifierChains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to the chain it belongs to.
    ///
    /// Reports [`NotifyOutcome::Handled`] when at least one notifier handled it.
    pub fn deliver(&self, event: PowerEvent) -> NotifyOutcome {
        // Snapshot the chain so notifiers run without the chain lock held.
        let chain: Vec<Arc<dyn PowerNotifier>> = {
            let inner = self.lock();
            let chain = if event.is_shutdown() { &inner.shutdown } else { &inner.suspend };
            chain.iter().map(|(_, notifier)| Arc::clone(notifier)).collect()
        };

        debug!("delivering {} to {} notifier(s)", event, chain.len());
        chain
            .iter()
            .map(|notifier| notifier.notify(event))
            .fold(NotifyOutcome::NotApplicable, |outcome, result| {
                if result == NotifyOutcome::Handled {
                    NotifyOutcome::Handled
                } else {
                    outcome
                }
            })
    }

    pub fn suspend_len(&self) -> usize {
        self.lock().suspend.len()
    }

    pub fn shutdown_len(&self) -> usize {
        self.lock().shutdown.len()
    }

    fn register(&self, notifier: Arc<dyn PowerNotifier>, shutdown: bool) -> NotifierId {
        let mut inner = self.lock();
        let id = NotifierId(inner.next_id);
        inner.next_id += 1;
        if shutdown {
            inner.shutdown.push((id, notifier));
        } else {
            inner.suspend.push((id, notifier));
        }
        id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PowerEventSource for NotifierChains {
    fn register_suspend_notifier(&self, notifier: Arc<dyn PowerNotifier>) -> Result<NotifierId> {
        Ok(self.register(notifier, false))
    }

    fn unregister_suspend_notifier(&self, id: NotifierId) {
        self.lock().suspend.retain(|(registered, _)| *registered != id);
    }

    fn register_shutdown_notifier(&self, notifier: Arc<dyn PowerNotifier>) -> Result<NotifierId> {
        Ok(self.register(notifier, true))
    }

    fn unregister_shutdown_notifier(&self, id: NotifierId) {
        self.lock().shutdown.retain(|(registered, _)| *registered != id);
    }
}
