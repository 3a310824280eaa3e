//! In-memory firmware that records every call.
//!
//! Backs the `--simulate` CLI flag and the controller tests. Failures can be
//! armed ahead of time to exercise the error paths.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use super::{Firmware, ALL_FANS, AUTO_SPEED};
use crate::errors::{FanControlError, Result};

/// A single request observed by [`SimulatedFirmware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareCall {
    Set { fan_id: u32, speed: u8 },
    Get { fan_id: u32 },
}

impl FirmwareCall {
    /// Whether this call is the "all fans back to automatic" sentinel.
    pub fn is_restore_auto(&self) -> bool {
        matches!(
            self,
            FirmwareCall::Set { fan_id: ALL_FANS, speed: AUTO_SPEED }
        )
    }
}

#[derive(Default)]
struct Inner {
    calls: Vec<FirmwareCall>,
    live_speeds: HashMap<u32, u8>,
    failing_sets: usize,
    failing_gets: usize,
}

#[derive(Default)]
pub struct SimulatedFirmware {
    inner: Mutex<Inner>,
}

impl SimulatedFirmware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `speed` whenever the live speed of `fan_id` is read.
    pub fn with_live_speed(self, fan_id: u32, speed: u8) -> Self {
        self.lock().live_speeds.insert(fan_id, speed);
        self
    }

    /// Make the next `count` set calls fail.
    pub fn fail_next_sets(&self, count: usize) {
        self.lock().failing_sets = count;
    }

    /// Make the next `count` get calls fail.
    pub fn fail_next_gets(&self, count: usize) {
        self.lock().failing_gets = count;
    }

    /// Every call seen so far, in order. Failed calls are included.
    pub fn calls(&self) -> Vec<FirmwareCall> {
        self.lock().calls.clone()
    }

    /// Only the set calls, as `(fan_id, speed)` pairs.
    pub fn set_calls(&self) -> Vec<(u32, u8)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match *call {
                FirmwareCall::Set { fan_id, speed } => Some((fan_id, speed)),
                FirmwareCall::Get { .. } => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Firmware for SimulatedFirmware {
    fn set_speed(&self, fan_id: u32, speed: u8) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(FirmwareCall::Set { fan_id, speed });

        if inner.failing_sets > 0 {
            inner.failing_sets -= 1;
            return Err(FanControlError::Firmware(format!(
                "simulated failure setting fan {} to {}",
                fan_id, speed
            )));
        }

        if fan_id != ALL_FANS {
            inner.live_speeds.insert(fan_id, speed);
        }
        debug!("simulated firmware: fan {} <- {}", fan_id, speed);
        Ok(())
    }

    fn get_speed(&self, fan_id: u32) -> Result<u8> {
        let mut inner = self.lock();
        inner.calls.push(FirmwareCall::Get { fan_id });

        if inner.failing_gets > 0 {
            inner.failing_gets -= 1;
            return Err(FanControlError::Firmware(format!(
                "simulated failure reading fan {}",
                fan_id
            )));
        }

        Ok(inner.live_speeds.get(&fan_id).copied().unwrap_or(0))
    }
}
