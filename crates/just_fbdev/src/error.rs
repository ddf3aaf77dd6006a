use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not open device '{}': {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not read screen information: {0}")]
    DeviceInfo(#[source] io::Error),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not map device memory: {0}")]
    Map(#[source] io::Error),
}

impl Error {
    /// `true` when the device was readable but could not be mapped, callers may retry
    /// without a device instead of reporting a misconfiguration
    #[inline]
    pub fn is_map_error(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat(reason.into())
    }
}
