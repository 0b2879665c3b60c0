// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

use vfdfs::constant::{DEFAULT_CHIP_ID, DEFAULT_ROOT_DIR_SLOTS, DEFAULT_SECTOR_COUNT};
use vfdfs::prelude::*;
use vfdio::{MemFlashStore, MemPartition, StdClock};

/// TOML description of a virtual disk: flash partitions to emulate and
/// files to expose.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(skip)]
    pub base_dir: PathBuf,

    pub label: Option<String>,
    pub serial: Option<u32>,
    pub chip_id: Option<u16>,
    pub sector_count: Option<u16>,
    pub root_dir_slots: Option<u16>,

    #[serde(default)]
    pub partitions: Vec<PartitionSpec>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
    pub firmware: Option<FirmwareSpec>,
}

#[derive(Debug, Deserialize)]
pub struct PartitionSpec {
    pub name: String,
    #[serde(default)]
    pub kind: PartitionKindSpec,
    /// Partition size in bytes; defaults to the source file's length.
    pub size: Option<u64>,
    /// Host file pre-loaded into the partition.
    pub source: Option<PathBuf>,
    /// Marks the emulated running app slot.
    #[serde(default)]
    pub running: bool,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKindSpec {
    App,
    #[default]
    Data,
}

#[derive(Debug, Deserialize)]
pub struct FileSpec {
    pub name: String,
    /// Host file served inline. Exactly one of `source`, `text`,
    /// `partition` must be set.
    pub source: Option<PathBuf>,
    /// Literal content served inline.
    pub text: Option<String>,
    /// Name of a partition to expose.
    pub partition: Option<String>,
    #[serde(default)]
    pub writable: bool,
}

#[derive(Debug, Deserialize)]
pub struct FirmwareSpec {
    #[serde(default = "default_running_name")]
    pub running: String,
    #[serde(default = "default_update_name")]
    pub update: String,
}

fn default_running_name() -> String {
    "firmware.bin".into()
}

fn default_update_name() -> String {
    "update.bin".into()
}

impl Manifest {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let mut manifest: Manifest = toml::from_str(&content)?;
        manifest.base_dir = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        Ok(manifest)
    }

    /// Assembles the in-memory flash store and the fully-registered disk.
    pub fn build_disk(&self) -> anyhow::Result<VirtualDisk<MemFlashStore, StdClock>> {
        let mut store = MemFlashStore::new();
        let mut running = None;

        for part in &self.partitions {
            let mut data = match &part.source {
                Some(source) => {
                    let path = self.base_dir.join(source);
                    fs::read(&path)
                        .with_context(|| format!("reading partition source {}", path.display()))?
                }
                None => Vec::new(),
            };
            match part.size {
                Some(size) => data.resize(size as usize, 0),
                None if data.is_empty() => {
                    bail!("partition \"{}\" needs a size or a source", part.name)
                }
                None => {}
            }

            let id = store.add_partition(match part.kind {
                PartitionKindSpec::App => MemPartition::app_with_data(&part.name, data),
                PartitionKindSpec::Data => MemPartition::data(&part.name, data),
            });
            if part.running {
                running = Some(id);
            }
        }
        if let Some(id) = running {
            store.set_running(id);
        }

        let config = DiskConfig {
            label: self.label.clone().unwrap_or_else(|| "VFLASH".into()),
            serial_number: self.serial.unwrap_or_else(generate_serial),
            chip_id: self.chip_id.unwrap_or(DEFAULT_CHIP_ID),
            ..DiskConfig::default()
        };
        let root_dir_slots = self.root_dir_slots.unwrap_or(DEFAULT_ROOT_DIR_SLOTS);
        if root_dir_slots == 0 || root_dir_slots % 16 != 0 {
            bail!("root_dir_slots must be a non-zero multiple of 16");
        }
        let meta = DiskMeta::new_custom(
            self.sector_count.unwrap_or(DEFAULT_SECTOR_COUNT),
            root_dir_slots,
        );
        let mut disk = VirtualDisk::new(meta, config, store, StdClock::new());

        for file in &self.files {
            let result = match (&file.source, &file.text, &file.partition) {
                (Some(source), None, None) => {
                    let path = self.base_dir.join(source);
                    let content = fs::read(&path)
                        .with_context(|| format!("reading file source {}", path.display()))?;
                    disk.add_inline_file(&file.name, content, !file.writable)
                }
                (None, Some(text), None) => {
                    disk.add_inline_file(&file.name, text.as_bytes().to_vec(), !file.writable)
                }
                (None, None, Some(partition)) => {
                    disk.add_partition_file(&file.name, partition, file.writable)
                }
                _ => bail!(
                    "file \"{}\" must set exactly one of source, text, partition",
                    file.name
                ),
            };
            result.map_err(|e| anyhow::anyhow!("registering \"{}\": {}", file.name, e))?;
        }

        if let Some(firmware) = &self.firmware {
            disk.add_firmware(&firmware.running, &firmware.update)
                .map_err(|e| anyhow::anyhow!("registering firmware files: {}", e))?;
        }

        Ok(disk)
    }
}

/// Random serial for manifests that do not pin one.
fn generate_serial() -> u32 {
    uuid::Uuid::new_v4().as_u128() as u32
}
