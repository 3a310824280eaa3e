use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FanControlError>;

#[derive(Error, Debug)]
pub enum FanControlError {
    #[error("speed {0} out of range (0–255)")]
    InvalidArgument(i64),

    #[error("fan is suspended, retry after resume")]
    Unavailable,

    #[error("firmware error: {0}")]
    Firmware(String),

    #[error("no compatible device: {0}")]
    NoDevice(String),

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FanControlError {
    /// Whether the caller may retry the same request later and expect it to
    /// succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FanControlError::Unavailable)
    }
}
