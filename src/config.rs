//! Driver configuration, read from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{FanControlError, Result};
use crate::firmware::acpi::{DEFAULT_CALL_PATH, DEFAULT_GET_METHOD, DEFAULT_SET_METHOD};
use crate::platform::dmi::{ASUS_VENDOR, DMI_VENDOR_PATH};

/// Read when no `--config` is given; absent means defaults.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/zenfan.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fan to manage (1 = CPU fan, 2 = GPU fan).
    pub fan_id: u32,
    pub acpi_call_path: PathBuf,
    pub set_speed_method: String,
    pub get_speed_method: String,
    pub dmi_vendor_path: PathBuf,
    pub expected_vendor: String,
    pub skip_vendor_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fan_id: 1,
            acpi_call_path: PathBuf::from(DEFAULT_CALL_PATH),
            set_speed_method: DEFAULT_SET_METHOD.to_string(),
            get_speed_method: DEFAULT_GET_METHOD.to_string(),
            dmi_vendor_path: PathBuf::from(DMI_VENDOR_PATH),
            expected_vendor: ASUS_VENDOR.to_string(),
            skip_vendor_check: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(|error| {
            FanControlError::Config(format!("{}: {}", path.display(), error))
        })?;
        config.validate()?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn validate(&self) -> Result<()> {
        if self.fan_id == 0 {
            return Err(FanControlError::Config(
                "fan_id 0 addresses all fans and cannot be managed directly".into(),
            ));
        }
        if self.set_speed_method.trim().is_empty() || self.get_speed_method.trim().is_empty() {
            return Err(FanControlError::Config("firmware method names must not be empty".into()));
        }
        Ok(())
    }
}
