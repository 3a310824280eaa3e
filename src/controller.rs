//! Cooling-device state machine.
//!
//! [`CoolingDevice`] pairs one fan's [`DeviceState`] with the firmware that
//! drives it. Every operation, including the power lifecycle transitions in
//! [`crate::power`], takes the same lock for its full duration and keeps it
//! across the firmware call, so a state change is only ever visible together
//! with the firmware command that caused it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::errors::{FanControlError, Result};
use crate::fan::{DeviceState, Mode, MAX_SPEED};
use crate::firmware::Firmware;

pub struct CoolingDevice<F> {
    state: Mutex<DeviceState>,
    firmware: F,
}

impl<F: Firmware> CoolingDevice<F> {
    /// Create the device for `fan_id` in automatic mode.
    pub fn new(fan_id: u32, firmware: F) -> Self {
        Self {
            state: Mutex::new(DeviceState::new(fan_id)),
            firmware,
        }
    }

    pub fn firmware(&self) -> &F {
        &self.firmware
    }

    /// Copy of the current state, taken under the lock.
    pub fn snapshot(&self) -> DeviceState {
        self.lock().clone()
    }

    pub fn get_max_speed(&self) -> u8 {
        MAX_SPEED
    }

    /// Current fan speed.
    ///
    /// In manual mode this is the last speed applied; in automatic mode the
    /// firmware is asked for the live value.
    pub fn get_current_speed(&self) -> Result<u8> {
        let state = self.lock();

        if !state.is_active() {
            return Err(FanControlError::Unavailable);
        }

        match state.mode {
            Mode::Auto => self.firmware.get_speed(state.id),
            Mode::Manual => Ok(state.speed),
        }
    }

    /// Apply `requested` and claim manual control of the fan.
    pub fn set_current_speed(&self, requested: i64) -> Result<()> {
        let speed = validate_speed(requested)?;
        let mut state = self.lock();

        if !state.is_active() {
            return Err(FanControlError::Unavailable);
        }

        self.firmware.set_speed(state.id, speed)?;

        state.speed = speed;
        if state.mode == Mode::Auto {
            info!("fan {}: switching to manual control", state.id);
            state.mode = Mode::Manual;
        }
        debug!("fan {}: speed set to {}", state.id, speed);
        Ok(())
    }

    /// Hand every fan back to the firmware curve.
    pub fn force_auto(&self) -> Result<()> {
        let mut state = self.lock();

        if !state.is_active() {
            return Err(FanControlError::Unavailable);
        }

        self.firmware.restore_auto()?;

        if state.mode == Mode::Manual {
            info!("fan {}: returning to automatic control", state.id);
        }
        state.mode = Mode::Auto;
        Ok(())
    }

    /// Every mutation happens after the fallible firmware call, so a poisoned
    /// lock still guards a consistent state.
    pub(crate) fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Check that `requested` is a speed the firmware accepts.
pub fn validate_speed(requested: i64) -> Result<u8> {
    u8::try_from(requested).map_err(|_| FanControlError::InvalidArgument(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fan::Lifecycle;
    use crate::firmware::{FirmwareCall, SimulatedFirmware};

    fn device() -> CoolingDevice<SimulatedFirmware> {
        CoolingDevice::new(1, SimulatedFirmware::new().with_live_speed(1, 90))
    }

    #[test]
    fn max_speed_is_constant() {
        assert_eq!(device().get_max_speed(), 255);
    }

    #[test]
    fn auto_mode_reads_live_speed_from_firmware() {
        let device = device();
        assert_eq!(device.get_current_speed().unwrap(), 90);
        assert_eq!(device.firmware().calls(), vec![FirmwareCall::Get { fan_id: 1 }]);
        assert_eq!(device.snapshot().speed, 0);
    }

    #[test]
    fn auto_mode_read_failure_is_propagated() {
        let device = device();
        device.firmware().fail_next_gets(1);

        let result = device.get_current_speed();
        assert!(matches!(result, Err(FanControlError::Firmware(_))));
        assert_eq!(device.snapshot(), DeviceState::new(1));
    }

    #[test]
    fn set_then_get_returns_requested_for_every_valid_speed() {
        let device = device();
        for requested in 0..=255i64 {
            device.set_current_speed(requested).unwrap();
            assert_eq!(i64::from(device.get_current_speed().unwrap()), requested);
        }
        // Manual reads never touch the firmware.
        assert!(device
            .firmware()
            .calls()
            .iter()
            .all(|call| matches!(call, FirmwareCall::Set { fan_id: 1, .. })));
    }

    #[test]
    fn set_claims_manual_control() {
        let device = device();
        device.set_current_speed(128).unwrap();

        let state = device.snapshot();
        assert_eq!(state.mode, Mode::Manual);
        assert_eq!(state.speed, 128);
        assert_eq!(device.firmware().set_calls(), vec![(1, 128)]);
    }

    #[test]
    fn out_of_range_set_is_rejected_before_firmware() {
        let device = device();
        device.set_current_speed(40).unwrap();
        device.firmware().clear_calls();

        for requested in [-1, 256, 1000, i64::MIN, i64::MAX] {
            let result = device.set_current_speed(requested);
            assert!(matches!(result, Err(FanControlError::InvalidArgument(value)) if value == requested));
        }

        assert!(device.firmware().calls().is_empty());
        let state = device.snapshot();
        assert_eq!(state.mode, Mode::Manual);
        assert_eq!(state.speed, 40);
    }

    #[test]
    fn failed_set_leaves_state_unchanged() {
        let device = device();
        device.firmware().fail_next_sets(1);

        let result = device.set_current_speed(200);
        assert!(matches!(result, Err(FanControlError::Firmware(_))));
        assert_eq!(device.snapshot(), DeviceState::new(1));

        device.set_current_speed(50).unwrap();
        device.firmware().fail_next_sets(1);
        assert!(device.set_current_speed(60).is_err());
        assert_eq!(device.snapshot().speed, 50);
    }

    #[test]
    fn force_auto_is_idempotent() {
        let device = device();
        device.set_current_speed(100).unwrap();

        device.force_auto().unwrap();
        assert_eq!(device.snapshot().mode, Mode::Auto);
        device.force_auto().unwrap();
        assert_eq!(device.snapshot().mode, Mode::Auto);

        assert_eq!(device.firmware().set_calls(), vec![(1, 100), (0, 0), (0, 0)]);
        assert_eq!(device.snapshot().lifecycle, Lifecycle::Active);
    }

    #[test]
    fn failed_force_auto_keeps_manual_mode() {
        let device = device();
        device.set_current_speed(100).unwrap();
        device.firmware().fail_next_sets(1);

        assert!(matches!(device.force_auto(), Err(FanControlError::Firmware(_))));
        assert_eq!(device.snapshot().mode, Mode::Manual);
    }

    #[test]
    fn operations_are_unavailable_while_suspended() {
        let device = device();
        device.set_current_speed(100).unwrap();
        device.lock().lifecycle = Lifecycle::Suspended;
        device.firmware().clear_calls();

        assert!(matches!(device.get_current_speed(), Err(FanControlError::Unavailable)));
        assert!(matches!(device.set_current_speed(10), Err(FanControlError::Unavailable)));
        assert!(matches!(device.force_auto(), Err(FanControlError::Unavailable)));

        assert!(device.firmware().calls().is_empty());
        let state = device.snapshot();
        assert_eq!(state.mode, Mode::Manual);
        assert_eq!(state.speed, 100);
    }

    #[test]
    fn invalid_argument_wins_over_unavailable() {
        let device = device();
        device.lock().lifecycle = Lifecycle::Suspended;
        assert!(matches!(
            device.set_current_speed(300),
            Err(FanControlError::InvalidArgument(300))
        ));
    }

    #[test]
    fn validate_speed_bounds() {
        assert_eq!(validate_speed(0).unwrap(), 0);
        assert_eq!(validate_speed(255).unwrap(), 255);
        assert!(validate_speed(-1).is_err());
        assert!(validate_speed(256).is_err());
    }
}
