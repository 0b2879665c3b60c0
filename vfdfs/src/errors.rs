// SPDX-License-Identifier: MIT

use core::fmt;

pub use vfdio::error::*;

/// Errors surfaced to the application by the registration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// No root-directory sector has room for the entry (plus its LFN
    /// fragments), or the data region cannot hold the file span.
    CapacityExceeded,
    /// Partition lookup failed, or no running partition is known.
    NotFound,
}

impl RegisterError {
    pub fn msg(&self) -> &'static str {
        match self {
            RegisterError::CapacityExceeded => "Virtual disk capacity exceeded",
            RegisterError::NotFound => "Partition not found",
        }
    }
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

/// Why an OTA attempt ended without a committed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    /// The image was rejected before any flash write: bad header, wrong
    /// chip, vetoed by the application, or no free update slot.
    Validation(&'static str),
    /// The backend failed mid-transfer or at commit.
    Io(FlashIoError),
}

impl OtaError {
    pub fn msg(&self) -> &'static str {
        match self {
            OtaError::Validation(msg) => msg,
            OtaError::Io(e) => e.msg(),
        }
    }
}

impl From<FlashIoError> for OtaError {
    fn from(e: FlashIoError) -> Self {
        OtaError::Io(e)
    }
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

/// Errors crossing the SCSI boundary; each maps to a `-1` return toward
/// the host stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskIoError {
    /// A partition read behind a file's content failed.
    Read(FlashIoError),
    /// WRITE(10) targeted a read-only file.
    WriteRejected,
    /// The OTA pipeline rejected or lost the transfer.
    Ota(OtaError),
}

impl DiskIoError {
    pub fn msg(&self) -> &'static str {
        match self {
            DiskIoError::Read(e) => e.msg(),
            DiskIoError::WriteRejected => "Write to read-only file",
            DiskIoError::Ota(e) => e.msg(),
        }
    }
}

impl From<OtaError> for DiskIoError {
    fn from(e: OtaError) -> Self {
        DiskIoError::Ota(e)
    }
}

impl fmt::Display for DiskIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

pub type DiskIoResult<T = ()> = core::result::Result<T, DiskIoError>;
