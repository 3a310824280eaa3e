//! Platform detection through the DMI system vendor string.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;

use crate::errors::{FanControlError, Result};

pub const DMI_VENDOR_PATH: &str = "/sys/class/dmi/id/sys_vendor";

pub const ASUS_VENDOR: &str = "ASUSTeK COMPUTER INC.";

/// Fail with [`FanControlError::NoDevice`] unless the vendor read from
/// `vendor_path` is exactly `expected`.
pub fn check_vendor(vendor_path: &Path, expected: &str) -> Result<()> {
    let vendor = match fs::read_to_string(vendor_path) {
        Ok(content) => content.trim().to_string(),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(FanControlError::NoDevice(format!(
                "{} not found: cannot identify the platform",
                vendor_path.display()
            )))
        }
        Err(error) if error.kind() == ErrorKind::PermissionDenied => {
            return Err(FanControlError::PermissionDenied(format!(
                "{}: {}",
                vendor_path.display(),
                error
            )))
        }
        Err(error) => return Err(FanControlError::Io(error)),
    };

    debug!("system vendor: '{}'", vendor);
    if vendor != expected {
        return Err(FanControlError::NoDevice(format!(
            "system vendor '{}' is not '{}'",
            vendor, expected
        )));
    }
    Ok(())
}
