//! Embedded-controller backend using the Linux `acpi_call` module.
//!
//! `acpi_call` exposes a proc file: writing `"<method> <arg> ..."` evaluates
//! the ACPI method and the next read returns its result, either an integer
//! such as `0x4c` or a string starting with `Error:`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use super::Firmware;
use crate::config::Config;
use crate::errors::{FanControlError, Result};

pub const DEFAULT_CALL_PATH: &str = "/proc/acpi/call";

/// Sets the speed of a fan: `SFNV <fan_id> <speed>`.
pub const DEFAULT_SET_METHOD: &str = "\\_SB.PCI0.LPCB.EC0.SFNV";

/// Reads the live speed of a fan: `RFAN <index>`, indexed from zero.
pub const DEFAULT_GET_METHOD: &str = "\\_TZ.RFAN";

/// Firmware backed by ACPI method evaluation through `acpi_call`.
pub struct AcpiCallFirmware {
    call_path: PathBuf,
    set_method: String,
    get_method: String,
}

impl AcpiCallFirmware {
    /// Backend using the stock proc path and Zenbook method names.
    pub fn new() -> Self {
        Self {
            call_path: PathBuf::from(DEFAULT_CALL_PATH),
            set_method: DEFAULT_SET_METHOD.to_string(),
            get_method: DEFAULT_GET_METHOD.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            call_path: config.acpi_call_path.clone(),
            set_method: config.set_speed_method.clone(),
            get_method: config.get_speed_method.clone(),
        }
    }

    /// Evaluate `method` with integer arguments and return its integer result.
    fn evaluate(&self, method: &str, args: &[u64]) -> Result<u64> {
        let command = format_call(method, args);
        trace!("acpi_call <- {}", command);

        fs::write(&self.call_path, &command).map_err(|error| map_io_error(error, &self.call_path))?;
        let raw = fs::read_to_string(&self.call_path)
            .map_err(|error| map_io_error(error, &self.call_path))?;

        trace!("acpi_call -> {}", raw.trim_end_matches('\0').trim());
        parse_result(method, &raw)
    }
}

impl Default for AcpiCallFirmware {
    fn default() -> Self {
        Self::new()
    }
}

impl Firmware for AcpiCallFirmware {
    fn set_speed(&self, fan_id: u32, speed: u8) -> Result<()> {
        debug!("firmware: set fan {} to {}", fan_id, speed);
        self.evaluate(&self.set_method, &[u64::from(fan_id), u64::from(speed)])?;
        Ok(())
    }

    fn get_speed(&self, fan_id: u32) -> Result<u8> {
        let index = fan_id.checked_sub(1).ok_or_else(|| {
            FanControlError::Firmware(format!("fan {} has no speed sensor", fan_id))
        })?;
        let value = self.evaluate(&self.get_method, &[u64::from(index)])?;
        speed_from_value(&self.get_method, fan_id, value)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Build the line written to the `acpi_call` proc file.
fn format_call(method: &str, args: &[u64]) -> String {
    let mut command = method.to_string();
    for arg in args {
        command.push_str(&format!(" {:#x}", arg));
    }
    command
}

/// Parse what `acpi_call` returned for `method`.
fn parse_result(method: &str, raw: &str) -> Result<u64> {
    let content = raw.trim_end_matches('\0').trim();

    if content.starts_with("Error") {
        return Err(FanControlError::Firmware(format!("{}: {}", method, content)));
    }

    let parsed = match content.strip_prefix("0x").or_else(|| content.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => content.parse::<u64>(),
    };

    parsed.map_err(|parse_error| {
        FanControlError::Firmware(format!(
            "failed to parse '{}' returned by {}: {}",
            content, method, parse_error
        ))
    })
}

/// Narrow a value returned by the read method to a fan speed.
fn speed_from_value(method: &str, fan_id: u32, value: u64) -> Result<u8> {
    u8::try_from(value).map_err(|_| {
        FanControlError::Firmware(format!(
            "{} reported speed {} for fan {}, above 255",
            method, value, fan_id
        ))
    })
}

/// Map an `std::io::Error` on the proc file to a `FanControlError`.
fn map_io_error(error: std::io::Error, path: &Path) -> FanControlError {
    match error.kind() {
        ErrorKind::PermissionDenied => FanControlError::PermissionDenied(format!(
            "{}: {}: run as root",
            path.display(),
            error
        )),
        ErrorKind::NotFound => FanControlError::Firmware(format!(
            "{} not found: is the acpi_call module loaded?",
            path.display()
        )),
        _ => FanControlError::Io(error),
    }
}
