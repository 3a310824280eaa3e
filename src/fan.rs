use std::fmt;

/// Highest speed the firmware accepts.
pub const MAX_SPEED: u8 = 0xFF;

/// Lowest speed the firmware accepts.
pub const MIN_SPEED: u8 = 0x00;

/// Who controls the fan curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The firmware runs its own closed-loop curve.
    Auto,
    /// The last explicitly requested speed is authoritative.
    Manual,
}

/// Power lifecycle of the platform as seen by the fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    /// Mid-transition to a low-power or powered-off state. Fan commands are
    /// rejected.
    Suspended,
}

/// Mutable record of a single managed fan.
///
/// Lives behind the device lock in [`crate::controller::CoolingDevice`]; no
/// field is ever read or written without holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    /// Fan identifier passed to the firmware (1 = CPU fan, 2 = GPU fan).
    pub id: u32,
    pub mode: Mode,
    pub lifecycle: Lifecycle,
    /// Last successfully applied speed. Only trusted in [`Mode::Manual`].
    pub speed: u8,
}

impl DeviceState {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            mode: Mode::Auto,
            lifecycle: Lifecycle::Active,
            speed: MIN_SPEED,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Auto => write!(f, "auto"),
            Mode::Manual => write!(f, "manual"),
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Active => write!(f, "active"),
            Lifecycle::Suspended => write!(f, "suspended"),
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Manual => write!(
                f,
                "fan {}: {} [{}, speed {}]",
                self.id, self.lifecycle, self.mode, self.speed
            ),
            Mode::Auto => write!(f, "fan {}: {} [{}]", self.id, self.lifecycle, self.mode),
        }
    }
}
