// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{string::String, vec, vec::Vec};

use log::info;
use vfdio::PartitionId;

use crate::{
    attr::DirAttributes,
    constant::*,
    errors::RegisterError,
    meta::DiskMeta,
    types::LfnEntry,
    utils::{lfn_entries, short_name},
};

/// Where a registered file's bytes come from.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Bytes owned by the table.
    Inline(Vec<u8>),
    /// Backed by a flash partition, read through the backend.
    Partition(PartitionId),
    /// The running application image; reads go to the partition, writes
    /// into the span enter the OTA pipeline.
    OtaFirmware(PartitionId),
}

/// One registered file: naming, attributes, contiguous span, content.
/// Created by registration, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FileEntry {
    short: [u8; SHORT_NAME_LEN],
    lfn: Vec<LfnEntry>,
    printable_name: String,
    attributes: DirAttributes,
    size: u32,
    start_sector: u32,
    end_sector: u32,
    start_cluster: u16,
    end_cluster: u16,
    root_dir_sector: u32,
    source: ContentSource,
}

impl FileEntry {
    pub fn short(&self) -> &[u8; SHORT_NAME_LEN] {
        &self.short
    }

    pub fn lfn(&self) -> &[LfnEntry] {
        &self.lfn
    }

    pub fn name(&self) -> &str {
        &self.printable_name
    }

    pub fn attributes(&self) -> DirAttributes {
        self.attributes
    }

    pub fn read_only(&self) -> bool {
        self.attributes.contains(DirAttributes::READ_ONLY)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn start_sector(&self) -> u32 {
        self.start_sector
    }

    pub fn end_sector(&self) -> u32 {
        self.end_sector
    }

    pub fn start_cluster(&self) -> u16 {
        self.start_cluster
    }

    pub fn end_cluster(&self) -> u16 {
        self.end_cluster
    }

    pub fn root_dir_sector(&self) -> u32 {
        self.root_dir_sector
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    pub fn contains_lba(&self, lba: u32) -> bool {
        lba >= self.start_sector && lba <= self.end_sector
    }

    /// Whether any cluster of this file lands in `[first, last]`.
    pub fn overlaps_clusters(&self, first: u32, last: u32) -> bool {
        self.start_cluster as u32 <= last && self.end_cluster as u32 >= first
    }
}

/// Catalog of registered files, packed contiguously into the data region
/// starting at cluster 2. Root-directory slots are first-fit, with LFN
/// fragments accounted per sector.
#[derive(Debug)]
pub struct FileTable {
    meta: DiskMeta,
    entries: Vec<FileEntry>,
    slots_used: Vec<u16>,
}

impl FileTable {
    pub fn new(meta: &DiskMeta) -> Self {
        let mut slots_used = vec![0u16; meta.root_dir_sectors() as usize];
        // Slot 0 of root-dir sector 0 is the volume label.
        slots_used[0] = 1;
        Self {
            meta: *meta,
            entries: Vec::new(),
            slots_used,
        }
    }

    /// Registers a file. Fails without side effects when no root-dir
    /// sector fits the entry group or the data region cannot hold the
    /// span.
    pub fn register(
        &mut self,
        name: &str,
        size: u32,
        attributes: DirAttributes,
        source: ContentSource,
    ) -> Result<(), RegisterError> {
        let sn = short_name(name);
        let lfn = if sn.needs_lfn {
            lfn_entries(name, &sn.raw)
        } else {
            Vec::new()
        };

        let needed = 1 + lfn.len() as u16;
        let root_dir_sector = self
            .slots_used
            .iter()
            .position(|&used| self.meta.dirents_per_sector() - used >= needed)
            .ok_or(RegisterError::CapacityExceeded)?;

        let (start_sector, start_cluster) = match self.entries.last() {
            None => (self.meta.file_data_lba(), FAT_FIRST_DATA_CLUSTER),
            Some(prev) => (prev.end_sector + 1, prev.end_cluster + 1),
        };

        let span = size / self.meta.sector_size() as u32;
        let end_sector = start_sector + span;
        let end_cluster = start_cluster
            .checked_add(u16::try_from(span).map_err(|_| RegisterError::CapacityExceeded)?)
            .ok_or(RegisterError::CapacityExceeded)?;
        if end_sector >= self.meta.sector_count() as u32 {
            return Err(RegisterError::CapacityExceeded);
        }

        info!(
            "File({}) sectors: {} - {}, clusters: {} - {}, {} bytes",
            name, start_sector, end_sector, start_cluster, end_cluster, size
        );

        self.slots_used[root_dir_sector] += needed;
        self.entries.push(FileEntry {
            short: sn.raw,
            lfn,
            printable_name: name.into(),
            attributes,
            size,
            start_sector,
            end_sector,
            start_cluster,
            end_cluster,
            root_dir_sector: root_dir_sector as u32,
            source,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First file whose data span covers `lba`.
    pub fn file_covering(&self, lba: u32) -> Option<&FileEntry> {
        self.entries.iter().find(|f| f.contains_lba(lba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table16() -> FileTable {
        FileTable::new(&DiskMeta::new_custom(8192, 16))
    }

    #[test]
    fn spans_pack_contiguously_from_cluster_two() {
        let mut table = table16();
        table
            .register(
                "readme.txt",
                1500,
                DirAttributes::file(true),
                ContentSource::Inline(vec![0xAA; 1500]),
            )
            .unwrap();
        table
            .register(
                "next.bin",
                512,
                DirAttributes::file(false),
                ContentSource::Inline(vec![0; 512]),
            )
            .unwrap();

        let first = &table.entries()[0];
        assert_eq!(first.start_cluster(), 2);
        assert_eq!(first.end_cluster(), 4);
        assert_eq!(first.start_sector(), 66);
        assert_eq!(first.end_sector(), 68);

        let second = &table.entries()[1];
        assert_eq!(second.start_cluster(), 5);
        assert_eq!(second.start_sector(), 69);
        assert_eq!(second.end_cluster(), 6);
    }

    #[test]
    fn lba_lookup_finds_the_covering_file() {
        let mut table = table16();
        table
            .register(
                "readme.txt",
                1500,
                DirAttributes::file(true),
                ContentSource::Inline(vec![0xAA; 1500]),
            )
            .unwrap();

        assert!(table.file_covering(65).is_none());
        assert_eq!(table.file_covering(66).unwrap().name(), "readme.txt");
        assert_eq!(table.file_covering(68).unwrap().name(), "readme.txt");
        assert!(table.file_covering(69).is_none());
    }

    #[test]
    fn slot_exhaustion_leaves_table_unchanged() {
        let mut table = table16();
        // 16 slots, one taken by the volume label: 15 plain files fit.
        for i in 0..15 {
            table
                .register(
                    &format!("f{i}.bin"),
                    0,
                    DirAttributes::file(true),
                    ContentSource::Inline(Vec::new()),
                )
                .unwrap();
        }
        let err = table.register(
            "last.bin",
            0,
            DirAttributes::file(true),
            ContentSource::Inline(Vec::new()),
        );
        assert_eq!(err, Err(RegisterError::CapacityExceeded));
        assert_eq!(table.len(), 15);
    }

    #[test]
    fn lfn_fragments_count_against_the_slot_budget() {
        let mut table = table16();
        // 1 label + 5 * (2 LFN + 1 entry) = 16 slots exactly.
        for i in 0..5 {
            table
                .register(
                    &format!("a_very_long_name{i}.bin"),
                    0,
                    DirAttributes::file(true),
                    ContentSource::Inline(Vec::new()),
                )
                .unwrap();
        }
        assert_eq!(
            table.register(
                "one_more_long_name.bin",
                0,
                DirAttributes::file(true),
                ContentSource::Inline(Vec::new()),
            ),
            Err(RegisterError::CapacityExceeded)
        );
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut table = table16();
        let err = table.register(
            "huge.bin",
            8192 * 512,
            DirAttributes::file(true),
            ContentSource::Inline(Vec::new()),
        );
        assert_eq!(err, Err(RegisterError::CapacityExceeded));
        assert!(table.is_empty());
    }
}
