// SPDX-License-Identifier: MIT

//! READ(10) path: synthesizes any sector of the disk on demand.

use log::trace;
use vfdio::{Clock, FlashStore, OtaWriter};
use zerocopy::IntoBytes;

use crate::{
    constant::*,
    disk::VirtualDisk,
    errors::{DiskIoError, DiskIoResult},
    meta::DiskRegion,
    table::ContentSource,
    types::DirEntry,
};

impl<B, C> VirtualDisk<B, C>
where
    B: FlashStore + OtaWriter,
    C: Clock,
{
    /// Fills `buf` with the content of `lba`. Nothing is cached; boot,
    /// FAT, root-directory and file sectors are produced from the file
    /// table on every request.
    ///
    /// Returns `buf.len()`. `offset` applies to file-content reads only
    /// (partial-sector transfers from the host stack).
    pub fn read_sector(&mut self, lba: u32, offset: u32, buf: &mut [u8]) -> DiskIoResult<usize> {
        buf.fill(0);

        match self.meta.region(lba) {
            DiskRegion::Boot if lba == 0 => {
                let raw = self.boot.as_bytes();
                let n = buf.len().min(raw.len());
                buf[..n].copy_from_slice(&raw[..n]);
            }
            // Reserved sectors past the boot sector stay zero.
            DiskRegion::Boot => {}
            DiskRegion::Fat { relative } => self.fill_fat_sector(relative, buf),
            DiskRegion::RootDir { sector } => self.fill_root_dir_sector(sector, buf),
            DiskRegion::Data => self.fill_data_sector(lba, offset, buf)?,
        }

        Ok(buf.len())
    }

    /// One sector of the FAT. Both copies fold onto the same relative
    /// index, so they come out byte-identical.
    fn fill_fat_sector(&self, relative: u32, buf: &mut [u8]) {
        let per_sector = self.meta.clusters_per_fat_sector();
        let cluster_start = relative * per_sector;
        let cluster_end = cluster_start + per_sector - 1;
        trace!(
            "FAT sector {} (clusters {} - {})",
            relative,
            cluster_start,
            cluster_end
        );

        if relative == 0 {
            // Entry 0 carries the media descriptor, entry 1 is reserved.
            put_fat_entry(buf, 0, 0xFF00 | FAT_MEDIA_DESCRIPTOR as u16);
            put_fat_entry(buf, 1, FAT_ENTRY_END_OF_CHAIN);
        }

        for file in self.table.entries() {
            if !file.overlaps_clusters(cluster_start, cluster_end) {
                continue;
            }
            let first = (file.start_cluster() as u32).max(cluster_start);
            let last = (file.end_cluster() as u32).min(cluster_end);
            for cluster in first..=last {
                let idx = (cluster - cluster_start) as usize;
                if cluster == file.end_cluster() as u32 {
                    put_fat_entry(buf, idx, FAT_ENTRY_END_OF_CHAIN);
                } else {
                    put_fat_entry(buf, idx, (cluster + 1) as u16);
                }
            }
        }
    }

    /// One sector of the root directory: the volume label in slot 0 of
    /// sector 0, then each file's LFN fragments followed by its 8.3
    /// entry.
    fn fill_root_dir_sector(&self, sector: u32, buf: &mut [u8]) {
        let mut slot = 0usize;

        if sector == 0 {
            let label = DirEntry::volume_label(&self.boot.volume_label);
            put_dirent(buf, slot, label.as_bytes());
            slot += 1;
        }

        for file in self
            .table
            .entries()
            .iter()
            .filter(|f| f.root_dir_sector() == sector)
        {
            for lfn in file.lfn() {
                put_dirent(buf, slot, lfn.as_bytes());
                slot += 1;
            }
            let entry = DirEntry::file(
                file.short(),
                file.attributes().bits(),
                file.start_cluster(),
                file.size(),
            );
            put_dirent(buf, slot, entry.as_bytes());
            slot += 1;
        }
    }

    /// File-content sector: locate the covering file and serve from its
    /// source, zero-padding past the recorded size.
    fn fill_data_sector(&mut self, lba: u32, offset: u32, buf: &mut [u8]) -> DiskIoResult {
        let Some(file) = self.table.file_covering(lba) else {
            // No file claims this sector; the host sees zeros.
            return Ok(());
        };

        let sector_in_file = lba - file.start_sector();
        let file_offset =
            sector_in_file as u64 * self.meta.sector_size() as u64 + offset as u64;
        if file_offset >= file.size() as u64 {
            return Ok(());
        }
        let n = buf.len().min((file.size() as u64 - file_offset) as usize);
        trace!(
            "File({}) READ {} bytes from lba:{} (offs:{})",
            file.name(),
            n,
            lba,
            offset
        );

        match file.source() {
            ContentSource::Inline(bytes) => {
                buf[..n].copy_from_slice(&bytes[file_offset as usize..file_offset as usize + n]);
            }
            ContentSource::Partition(part) | ContentSource::OtaFirmware(part) => {
                let part = *part;
                self.backend
                    .read_at(part, file_offset, &mut buf[..n])
                    .map_err(DiskIoError::Read)?;
            }
        }
        Ok(())
    }
}

fn put_fat_entry(buf: &mut [u8], index: usize, value: u16) {
    let off = index * FAT_ENTRY_SIZE;
    if off + FAT_ENTRY_SIZE <= buf.len() {
        buf[off..off + FAT_ENTRY_SIZE].copy_from_slice(&value.to_le_bytes());
    }
}

fn put_dirent(buf: &mut [u8], slot: usize, raw: &[u8]) {
    let off = slot * DIRENT_SIZE;
    if off + DIRENT_SIZE <= buf.len() {
        buf[off..off + DIRENT_SIZE].copy_from_slice(raw);
    }
}
