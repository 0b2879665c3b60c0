// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(not(feature = "std"), feature = "alloc"))]
extern crate alloc;

// === Core Modules ===
pub mod attr;
pub mod constant;
pub mod disk;
pub mod errors;
pub mod image;
pub mod meta;
pub mod ota;
pub mod scsi;
pub mod table;
pub mod testing;
pub mod types;
pub mod utils;

// READ(10) / WRITE(10) paths; extend `disk::VirtualDisk`.
mod router;
mod synth;

pub mod prelude {
    pub use crate::attr::DirAttributes;
    pub use crate::disk::{DiskConfig, VirtualDisk};
    pub use crate::errors::*;
    pub use crate::image::{AppDescriptor, FirmwareRejection};
    pub use crate::meta::{DiskMeta, DiskRegion};
    pub use crate::ota::{DefaultHooks, OtaPipeline, OtaState, UpdateHooks};
    pub use crate::scsi::SenseData;
    pub use crate::table::{ContentSource, FileEntry, FileTable};
    pub use vfdio::prelude::*;
}
