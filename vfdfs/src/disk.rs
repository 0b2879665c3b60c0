// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{boxed::Box, string::String, vec::Vec};

use log::info;
use vfdio::{Clock, FlashStore, OtaWriter};

use crate::{
    attr::DirAttributes,
    constant::*,
    errors::RegisterError,
    meta::DiskMeta,
    ota::{DefaultHooks, OtaPipeline, UpdateHooks},
    scsi::SenseData,
    table::{ContentSource, FileTable},
    types::Fat16Bpb,
};

/// Identity and policy knobs of one disk instance.
#[derive(Debug, Clone)]
pub struct DiskConfig {
    /// Volume label, space-padded to 11 bytes in the boot sector.
    pub label: String,
    pub serial_number: u32,
    /// INQUIRY identity strings (8 / 16 / 4 bytes on the wire).
    pub vendor_id: String,
    pub product_id: String,
    pub product_revision: String,
    /// Chip family expected in incoming firmware image headers.
    pub chip_id: u16,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            label: "VFLASH".into(),
            serial_number: 0,
            vendor_id: "VFD".into(),
            product_id: "Virtual Disk".into(),
            product_revision: "1.0".into(),
            chip_id: DEFAULT_CHIP_ID,
        }
    }
}

/// The virtual mass-storage disk: geometry, boot sector, file catalog
/// and OTA pipeline behind the SCSI callback surface.
///
/// One instance owns all mutable state; the USB glue installs it as the
/// handler for the stack's SCSI callbacks and calls [`poll`] from the
/// same task loop, so nothing here needs locking.
///
/// [`poll`]: VirtualDisk::poll
pub struct VirtualDisk<B, C> {
    pub(crate) meta: DiskMeta,
    pub(crate) boot: Fat16Bpb,
    pub(crate) config: DiskConfig,
    pub(crate) table: FileTable,
    pub(crate) ota: OtaPipeline,
    pub(crate) backend: B,
    pub(crate) clock: C,
    pub(crate) hooks: Box<dyn UpdateHooks>,
    pub(crate) sense: Option<SenseData>,
}

impl<B, C> VirtualDisk<B, C>
where
    B: FlashStore + OtaWriter,
    C: Clock,
{
    pub fn new(meta: DiskMeta, config: DiskConfig, backend: B, clock: C) -> Self {
        let boot = Fat16Bpb::from_meta(&meta, &config.label, config.serial_number);
        info!(
            "virtual disk \"{}\": {} sectors ({} bytes), {} reserved, \
             {} sectors per FAT, fat0 @ {}, fat1 @ {}, root dir @ {} ({} entries), \
             file data @ {}",
            config.label,
            meta.sector_count(),
            meta.total_bytes(),
            meta.reserved_sectors(),
            meta.sectors_per_fat(),
            meta.fat0_lba(),
            meta.fat1_lba(),
            meta.root_dir_lba(),
            meta.root_dir_slots(),
            meta.file_data_lba(),
        );

        Self {
            table: FileTable::new(&meta),
            ota: OtaPipeline::new(config.chip_id),
            meta,
            boot,
            config,
            backend,
            clock,
            hooks: Box::new(DefaultHooks),
            sense: None,
        }
    }

    /// Replaces the update callbacks. Install before `start`; the
    /// default accepts every image and only logs completion.
    pub fn set_hooks(&mut self, hooks: Box<dyn UpdateHooks>) {
        self.hooks = hooks;
    }

    pub fn meta(&self) -> &DiskMeta {
        &self.meta
    }

    pub fn table(&self) -> &FileTable {
        &self.table
    }

    pub fn ota(&self) -> &OtaPipeline {
        &self.ota
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Registers a read-only or writable file served from owned bytes.
    pub fn add_inline_file(
        &mut self,
        name: &str,
        content: impl Into<Vec<u8>>,
        read_only: bool,
    ) -> Result<(), RegisterError> {
        let content = content.into();
        let size =
            u32::try_from(content.len()).map_err(|_| RegisterError::CapacityExceeded)?;
        self.table.register(
            name,
            size,
            DirAttributes::file(read_only),
            ContentSource::Inline(content),
        )
    }

    /// Registers a file backed by the named flash partition.
    pub fn add_partition_file(
        &mut self,
        file_name: &str,
        partition_name: &str,
        writable: bool,
    ) -> Result<(), RegisterError> {
        let part = self
            .backend
            .find_partition(partition_name)
            .ok_or(RegisterError::NotFound)?;
        let size = self.partition_file_size(part)?;
        self.table.register(
            file_name,
            size,
            DirAttributes::file(!writable),
            ContentSource::Partition(part),
        )
    }

    /// Registers the running firmware image under `running_name`
    /// (read-only) and, when an update slot exists, that slot under
    /// `update_name` as the writable drop target for new images.
    pub fn add_firmware(
        &mut self,
        running_name: &str,
        update_name: &str,
    ) -> Result<(), RegisterError> {
        let running = self
            .backend
            .running_partition()
            .map_err(|_| RegisterError::NotFound)?;
        let size = self.partition_file_size(running)?;
        self.table.register(
            running_name,
            size,
            DirAttributes::file(true),
            ContentSource::OtaFirmware(running),
        )?;

        if let Some(next) = self.backend.next_update_partition().filter(|p| *p != running) {
            let size = self.partition_file_size(next)?;
            self.table.register(
                update_name,
                size,
                DirAttributes::file(false),
                ContentSource::Partition(next),
            )?;
        }
        Ok(())
    }

    /// Services the OTA inactivity deadline. Call from the task that
    /// owns the SCSI callbacks; timer contexts post here instead of
    /// touching OTA state themselves.
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();
        self.ota.poll(&mut self.backend, self.hooks.as_mut(), now);
    }

    fn partition_file_size(
        &self,
        part: vfdio::PartitionId,
    ) -> Result<u32, RegisterError> {
        let size = self
            .backend
            .partition_size(part)
            .map_err(|_| RegisterError::NotFound)?;
        u32::try_from(size).map_err(|_| RegisterError::CapacityExceeded)
    }
}
