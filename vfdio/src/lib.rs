// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// === Core modules ===
pub mod error;

// === Backend modules ===
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod host;

// === Prelude re-exports (central entrypoint) ===
pub mod prelude {
    pub use super::error::*;
    pub use super::Clock;
    pub use super::FlashStore;
    pub use super::OtaToken;
    pub use super::OtaWriter;
    pub use super::PartitionId;
    pub use super::PartitionKind;

    #[cfg(feature = "mem")]
    pub use super::mem::{MemClock, MemFlashStore, MemPartition};

    #[cfg(feature = "std")]
    pub use super::host::StdClock;
}

#[cfg(feature = "mem")]
pub use mem::{MemClock, MemFlashStore, MemPartition};

#[cfg(feature = "std")]
pub use host::StdClock;

pub use error::*;

/// Opaque handle to a flash partition owned by a [`FlashStore`] backend.
///
/// The raw value is only meaningful to the backend that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionId(u32);

impl PartitionId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

/// Coarse partition classification used for lookup fallback: application
/// image slots first, generic data partitions second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    App,
    Data,
}

/// Read-side view of the device's flash partitions.
///
/// Implementations may target real flash, a file, or RAM. Offsets are
/// partition-relative bytes.
pub trait FlashStore {
    /// Looks up a partition by name, preferring app slots over data
    /// partitions when both carry the same name.
    fn find_partition(&self, name: &str) -> Option<PartitionId>;

    /// Size of the partition in bytes.
    fn partition_size(&self, part: PartitionId) -> FlashIoResult<u64>;

    /// Reads `buf.len()` bytes from `offset` within the partition.
    fn read_at(&mut self, part: PartitionId, offset: u64, buf: &mut [u8]) -> FlashIoResult;

    /// The application slot currently executing.
    fn running_partition(&self) -> FlashIoResult<PartitionId>;

    /// The next app slot eligible to receive an update, if any.
    fn next_update_partition(&self) -> Option<PartitionId>;
}

/// Token for an open OTA transfer. Issued by [`OtaWriter::begin`] and
/// consumed by `end`/`abort`; not clonable, so a transfer can only be
/// finalized once.
#[derive(Debug, PartialEq, Eq)]
pub struct OtaToken(u32);

impl OtaToken {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

/// Streaming writer for over-the-air update images.
pub trait OtaWriter {
    /// Opens a transfer into `part`. `size_hint` is the total image size
    /// when known up front, `None` for streamed images of unknown length.
    fn begin(&mut self, part: PartitionId, size_hint: Option<u64>) -> FlashIoResult<OtaToken>;

    /// Appends `data` to the open transfer.
    fn write(&mut self, token: &OtaToken, data: &[u8]) -> FlashIoResult;

    /// Finalizes the transfer, validating whatever the backend validates.
    fn end(&mut self, token: OtaToken) -> FlashIoResult;

    /// Discards the transfer without finalizing it.
    fn abort(&mut self, token: OtaToken) -> FlashIoResult;

    /// Marks `part` as the boot target for the next restart.
    fn set_boot_partition(&mut self, part: PartitionId) -> FlashIoResult;
}

/// Monotonic millisecond clock.
///
/// The core never talks to an OS timer; it records deadlines against this
/// clock and the owning task checks them via polling.
pub trait Clock {
    fn now_ms(&self) -> u64;
}
