// SPDX-License-Identifier: MIT

//! WRITE(10) path: classifies host writes and feeds file-data writes
//! into the OTA pipeline.

use log::{debug, trace, warn};
use vfdio::{Clock, FlashStore, OtaWriter};
use zerocopy::FromBytes;

use crate::{
    constant::*,
    disk::VirtualDisk,
    errors::{DiskIoError, DiskIoResult},
    meta::DiskRegion,
    types::{DirEntry, LfnEntry},
    utils::{decode_lfn, decode_short_name},
};

impl<B, C> VirtualDisk<B, C>
where
    B: FlashStore + OtaWriter,
    C: Clock,
{
    /// Accepts one host write. Metadata writes (boot, FAT, root
    /// directory) are observed and dropped; writes into a writable
    /// file's span stream into the OTA pipeline; writes into a
    /// read-only file's span are rejected.
    ///
    /// Returns `buf.len()` for every accepted-and-ignored write, so the
    /// host sees its copy succeed even though nothing is persisted.
    pub fn write_sector(&mut self, lba: u32, offset: u32, buf: &[u8]) -> DiskIoResult<usize> {
        match self.meta.region(lba) {
            DiskRegion::Boot => {
                debug!("host write to boot sector ignored (lba:{})", lba);
            }
            DiskRegion::Fat { relative } => {
                debug!(
                    "host write to FAT ignored (lba:{}, fat sector {})",
                    lba, relative
                );
            }
            DiskRegion::RootDir { sector } => {
                debug!("host write to root directory (sector {})", sector);
                log_root_dir_write(buf);
            }
            DiskRegion::Data => {
                if let Some(file) = self.table.file_covering(lba) {
                    if file.read_only() {
                        warn!("host write to read-only file {}", file.name());
                        return Err(DiskIoError::WriteRejected);
                    }
                    trace!(
                        "File({}) WRITE {} bytes at lba:{} (offs:{})",
                        file.name(),
                        buf.len(),
                        lba,
                        offset
                    );
                    let now = self.clock.now_ms();
                    self.ota
                        .on_data_write(&mut self.backend, self.hooks.as_mut(), buf, now)?;
                } else {
                    trace!("host write outside any file span ignored (lba:{})", lba);
                }
            }
        }
        Ok(buf.len())
    }
}

/// Best-effort decode of directory entries the host tried to create or
/// update. Purely observational; the entries are never honored.
fn log_root_dir_write(buf: &[u8]) {
    for chunk in buf.chunks_exact(DIRENT_SIZE) {
        match chunk[0] {
            // End-of-directory marker: nothing further in this sector.
            0x00 => break,
            0xE5 => {
                debug!("host deleted a directory entry");
                continue;
            }
            _ => {}
        }

        if chunk[11] & LFN_ATTR_MASK == LFN_ATTRIBUTES {
            if let Ok(lfn) = LfnEntry::read_from_bytes(chunk) {
                if let Some(fragment) = decode_lfn(core::slice::from_ref(&lfn)) {
                    debug!("host wrote LFN fragment \"{}\"", fragment);
                }
            }
        } else if let Ok(entry) = DirEntry::read_from_bytes(chunk) {
            debug!(
                "host wrote directory entry \"{}\" (attrs {:#04x}, {} bytes, cluster {})",
                decode_short_name(&entry.short()),
                entry.attributes,
                entry.size.get(),
                entry.start_cluster.get()
            );
        }
    }
}

const LFN_ATTR_MASK: u8 = 0x3F;
