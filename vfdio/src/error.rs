// SPDX-License-Identifier: MIT

/// Result type for flash backend operations.
pub type FlashIoResult<T = ()> = core::result::Result<T, FlashIoError>;

/// Error type for flash backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashIoError {
    /// Underlying device I/O error.
    Error(&'static str),

    /// Attempted to read or write out of bounds.
    OutOfBounds,

    /// No partition matched the lookup.
    NotFound,

    /// No OTA transfer is open, or the token does not match it.
    NoTransfer,

    /// Unsupported operation for this backend.
    Unsupported,
}

impl FlashIoError {
    pub fn msg(&self) -> &'static str {
        match self {
            FlashIoError::Error(msg) => msg,
            FlashIoError::OutOfBounds => "Out of bounds",
            FlashIoError::NotFound => "Partition not found",
            FlashIoError::NoTransfer => "No matching OTA transfer",
            FlashIoError::Unsupported => "Unsupported operation",
        }
    }
}

impl core::fmt::Display for FlashIoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.msg())
    }
}
