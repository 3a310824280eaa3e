//! Firmware command channel that actually moves the fan.
//!
//! The controller only needs two calls: command a speed and read the live
//! speed. Everything else about how the embedded controller is reached lives
//! behind [`Firmware`].

pub(crate) mod acpi;
mod simulated;

pub use acpi::AcpiCallFirmware;
pub use simulated::{FirmwareCall, SimulatedFirmware};

use std::sync::Arc;

use crate::errors::Result;

/// Fan id that addresses every managed fan at once.
pub const ALL_FANS: u32 = 0;

/// Speed that, sent to [`ALL_FANS`], hands control back to the firmware curve.
pub const AUTO_SPEED: u8 = 0;

/// Narrow capability interface over the fan firmware.
pub trait Firmware {
    /// Command `speed` (0–255) for `fan_id`.
    ///
    /// `(ALL_FANS, AUTO_SPEED)` restores automatic mode for all fans.
    fn set_speed(&self, fan_id: u32, speed: u8) -> Result<()>;

    /// Read the live speed the firmware reports for `fan_id`.
    fn get_speed(&self, fan_id: u32) -> Result<u8>;

    /// Put every managed fan back under firmware control.
    fn restore_auto(&self) -> Result<()> {
        self.set_speed(ALL_FANS, AUTO_SPEED)
    }
}

impl<F: Firmware + ?Sized> Firmware for Box<F> {
    fn set_speed(&self, fan_id: u32, speed: u8) -> Result<()> {
        (**self).set_speed(fan_id, speed)
    }

    fn get_speed(&self, fan_id: u32) -> Result<u8> {
        (**self).get_speed(fan_id)
    }
}

impl<F: Firmware + ?Sized> Firmware for Arc<F> {
    fn set_speed(&self, fan_id: u32, speed: u8) -> Result<()> {
        (**self).set_speed(fan_id, speed)
    }

    fn get_speed(&self, fan_id: u32) -> Result<u8> {
        (**self).get_speed(fan_id)
    }
}
