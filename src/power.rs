//! Power lifecycle transitions.
//!
//! Suspend and shutdown force the physical fan back to automatic before the
//! machine goes down, while the stored manual setting is kept so resume can
//! reapply it.

use std::fmt;

use log::{debug, info, warn};

use crate::controller::CoolingDevice;
use crate::fan::{Lifecycle, Mode};
use crate::firmware::Firmware;

/// Power transition delivered by the power event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    /// About to enter a sleep state.
    SuspendPrepare,
    /// Back from a sleep state.
    PostSuspend,
    HibernationPrepare,
    PostHibernation,
    /// Reboot notifier events.
    Down,
    Halt,
    Restart,
    PowerOff,
}

impl PowerEvent {
    /// Events delivered on the reboot/shutdown chain.
    pub fn is_shutdown(&self) -> bool {
        matches!(
            self,
            PowerEvent::Down | PowerEvent::Halt | PowerEvent::Restart | PowerEvent::PowerOff
        )
    }
}

impl fmt::Display for PowerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerEvent::SuspendPrepare => "suspend-prepare",
            PowerEvent::PostSuspend => "post-suspend",
            PowerEvent::HibernationPrepare => "hibernation-prepare",
            PowerEvent::PostHibernation => "post-hibernation",
            PowerEvent::Down => "down",
            PowerEvent::Halt => "halt",
            PowerEvent::Restart => "restart",
            PowerEvent::PowerOff => "power-off",
        };
        write!(f, "{}", name)
    }
}

/// What a notifier reports back for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Handled,
    /// The event was not meant for us, or we are already in the target state.
    NotApplicable,
}

impl<F: Firmware> CoolingDevice<F> {
    /// Leave the fan in a safe state and reject commands until resume.
    ///
    /// Used for suspend and for every shutdown flavour.
    pub fn prepare_suspend(&self) -> NotifyOutcome {
        let mut state = self.lock();

        if state.lifecycle == Lifecycle::Suspended {
            debug!("fan {}: already suspended", state.id);
            return NotifyOutcome::NotApplicable;
        }

        if state.mode == Mode::Manual {
            if let Err(error) = self.firmware().restore_auto() {
                warn!("fan {}: could not restore automatic mode before suspend: {}", state.id, error);
            }
        }
        state.lifecycle = Lifecycle::Suspended;
        info!("fan {}: suspended ({} mode kept)", state.id, state.mode);
        NotifyOutcome::Handled
    }

    /// Accept commands again, reapplying the manual speed held before suspend.
    pub fn prepare_resume(&self) -> NotifyOutcome {
        let mut state = self.lock();

        if state.lifecycle == Lifecycle::Active {
            debug!("fan {}: already active", state.id);
            return NotifyOutcome::NotApplicable;
        }

        if state.mode == Mode::Manual {
            if let Err(error) = self.firmware().set_speed(state.id, state.speed) {
                warn!(
                    "fan {}: could not reapply speed {} after resume: {}",
                    state.id, state.speed, error
                );
            }
        }
        state.lifecycle = Lifecycle::Active;
        info!("fan {}: resumed", state.id);
        NotifyOutcome::Handled
    }

    /// Suspend-chain handler.
    pub fn handle_suspend_event(&self, event: PowerEvent) -> NotifyOutcome {
        match event {
            PowerEvent::SuspendPrepare => self.prepare_suspend(),
            PowerEvent::PostSuspend => self.prepare_resume(),
            _ => NotifyOutcome::NotApplicable,
        }
    }

    /// Shutdown-chain handler.
    pub fn handle_shutdown_event(&self, event: PowerEvent) -> NotifyOutcome {
        if event.is_shutdown() {
            self.prepare_suspend()
        } else {
            NotifyOutcome::NotApplicable
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;
    use crate::errors::FanControlError;
    use crate::firmware::SimulatedFirmware;

    fn manual_device(speed: i64) -> CoolingDevice<SimulatedFirmware> {
        let device = CoolingDevice::new(1, SimulatedFirmware::new());
        device.set_current_speed(speed).unwrap();
        device.firmware().clear_calls();
        device
    }

    #[test]
    fn suspend_resume_round_trip_restores_manual_speed() {
        let device = manual_device(180);

        assert_eq!(device.prepare_suspend(), NotifyOutcome::Handled);
        assert_eq!(device.snapshot().lifecycle, Lifecycle::Suspended);
        assert_eq!(device.snapshot().mode, Mode::Manual);
        assert_eq!(device.firmware().set_calls(), vec![(0, 0)]);

        assert!(matches!(device.set_current_speed(10), Err(FanControlError::Unavailable)));

        assert_eq!(device.prepare_resume(), NotifyOutcome::Handled);
        assert_eq!(device.snapshot().lifecycle, Lifecycle::Active);
        assert_eq!(device.firmware().set_calls(), vec![(0, 0), (1, 180)]);
        assert_eq!(device.get_current_speed().unwrap(), 180);
    }

    #[test]
    fn suspend_in_auto_mode_issues_no_firmware_call() {
        let device = CoolingDevice::new(1, SimulatedFirmware::new());

        assert_eq!(device.prepare_suspend(), NotifyOutcome::Handled);
        assert_eq!(device.prepare_resume(), NotifyOutcome::Handled);
        assert!(device.firmware().calls().is_empty());
    }

    #[test]
    fn second_suspend_is_not_applicable() {
        let device = manual_device(90);

        assert_eq!(device.prepare_suspend(), NotifyOutcome::Handled);
        let after_first = device.snapshot();
        assert_eq!(device.prepare_suspend(), NotifyOutcome::NotApplicable);

        assert_eq!(device.firmware().set_calls(), vec![(0, 0)]);
        assert_eq!(device.snapshot(), after_first);
    }

    #[test]
    fn resume_while_active_is_not_applicable() {
        let device = manual_device(90);
        assert_eq!(device.prepare_resume(), NotifyOutcome::NotApplicable);
        assert!(device.firmware().calls().is_empty());
    }

    #[test]
    fn suspend_completes_even_if_firmware_fails() {
        let device = manual_device(90);
        device.firmware().fail_next_sets(1);

        assert_eq!(device.prepare_suspend(), NotifyOutcome::Handled);
        assert_eq!(device.snapshot().lifecycle, Lifecycle::Suspended);
    }

    #[test]
    fn resume_completes_even_if_reapply_fails() {
        let device = manual_device(90);
        device.prepare_suspend();
        device.firmware().fail_next_sets(1);

        assert_eq!(device.prepare_resume(), NotifyOutcome::Handled);
        let state = device.snapshot();
        assert_eq!(state.lifecycle, Lifecycle::Active);
        assert_eq!(state.mode, Mode::Manual);
        assert_eq!(state.speed, 90);
    }

    #[test]
    fn shutdown_events_reuse_the_suspend_path() {
        for event in [PowerEvent::Down, PowerEvent::Halt, PowerEvent::Restart, PowerEvent::PowerOff] {
            let device = manual_device(200);

            assert_eq!(device.handle_shutdown_event(event), NotifyOutcome::Handled);
            assert_eq!(device.snapshot().lifecycle, Lifecycle::Suspended);

            let restores = device
                .firmware()
                .calls()
                .iter()
                .filter(|call| call.is_restore_auto())
                .count();
            assert_eq!(restores, 1, "event {}", event);
        }
    }

    #[test]
    fn chains_ignore_foreign_events() {
        let device = manual_device(200);

        assert_eq!(device.handle_shutdown_event(PowerEvent::SuspendPrepare), NotifyOutcome::NotApplicable);
        assert_eq!(device.handle_shutdown_event(PowerEvent::PostSuspend), NotifyOutcome::NotApplicable);
        assert_eq!(device.handle_suspend_event(PowerEvent::HibernationPrepare), NotifyOutcome::NotApplicable);
        assert_eq!(device.handle_suspend_event(PowerEvent::PostHibernation), NotifyOutcome::NotApplicable);
        assert_eq!(device.handle_suspend_event(PowerEvent::PowerOff), NotifyOutcome::NotApplicable);

        assert!(device.firmware().calls().is_empty());
        assert_eq!(device.snapshot().lifecycle, Lifecycle::Active);

        assert_eq!(device.handle_suspend_event(PowerEvent::SuspendPrepare), NotifyOutcome::Handled);
        assert_eq!(device.handle_suspend_event(PowerEvent::PostSuspend), NotifyOutcome::Handled);
    }

    #[test]
    fn shutdown_after_suspend_is_not_applicable() {
        let device = manual_device(200);
        device.handle_suspend_event(PowerEvent::SuspendPrepare);

        assert_eq!(device.handle_shutdown_event(PowerEvent::PowerOff), NotifyOutcome::NotApplicable);
        assert_eq!(device.firmware().set_calls(), vec![(0, 0)]);
    }

    #[test]
    fn racing_set_and_suspend_serialize() {
        for _ in 0..200 {
            let device = Arc::new(CoolingDevice::new(1, SimulatedFirmware::new()));
            let barrier = Arc::new(Barrier::new(2));

            let setter = {
                let device = Arc::clone(&device);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    device.set_current_speed(200)
                })
            };
            let suspender = {
                let device = Arc::clone(&device);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    device.prepare_suspend()
                })
            };

            let set_result = setter.join().unwrap();
            assert_eq!(suspender.join().unwrap(), NotifyOutcome::Handled);

            let state = device.snapshot();
            let calls = device.firmware().set_calls();
            assert_eq!(state.lifecycle, Lifecycle::Suspended);

            match set_result {
                Ok(()) => {
                    // Set landed first, then suspend forced auto.
                    assert_eq!(calls, vec![(1, 200), (0, 0)]);
                    assert_eq!(state.mode, Mode::Manual);
                    assert_eq!(state.speed, 200);
                }
                Err(FanControlError::Unavailable) => {
                    // Suspend won; the fan was in auto so nothing was sent.
                    assert!(calls.is_empty());
                    assert_eq!(state.mode, Mode::Auto);
                    assert_eq!(state.speed, 0);
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn concurrent_sets_leave_last_writer_in_state() {
        let device = Arc::new(CoolingDevice::new(1, SimulatedFirmware::new()));

        let handles: Vec<_> = (0..8)
            .map(|index| {
                let device = Arc::clone(&device);
                thread::spawn(move || {
                    for step in 0..50 {
                        device.set_current_speed((index * 30 + step) % 256).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let calls = device.firmware().set_calls();
        assert_eq!(calls.len(), 400);
        let (_, last_speed) = *calls.last().unwrap();
        assert_eq!(device.snapshot().speed, last_speed);
        assert_eq!(device.get_current_speed().unwrap(), last_speed);
    }
}
