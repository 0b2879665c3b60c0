// SPDX-License-Identifier: MIT

//! End-to-end validation: synthesize a whole disk through the SCSI
//! surface, then re-read it like a generic FAT16 driver would.

use vfdfs::prelude::*;
use vfdfs::testing::sample_image;
use vfdfs::types::LfnEntry;
use vfdfs::utils::{decode_lfn, decode_short_name, lfn_checksum};
use vfdio::{MemClock, MemFlashStore, MemPartition};
use zerocopy::FromBytes;

const SECTOR: usize = 512;
const CHIP: u16 = 0x0002;

fn test_disk() -> (VirtualDisk<MemFlashStore, MemClock>, MemClock) {
    let mut store = MemFlashStore::new();
    let running = store.add_partition(MemPartition::app_with_data(
        "ota_0",
        sample_image(CHIP, 192 * 1024),
    ));
    store.add_partition(MemPartition::app("ota_1", 192 * 1024));
    store.add_partition(MemPartition::data("nvs", (0..4096).map(|i| i as u8).collect()));
    store.set_running(running);

    let clock = MemClock::new();
    let config = DiskConfig {
        label: "TEST".into(),
        serial_number: 0x1234_5678,
        chip_id: CHIP,
        ..DiskConfig::default()
    };
    let disk = VirtualDisk::new(DiskMeta::new_custom(8192, 16), config, store, clock.clone());
    (disk, clock)
}

fn populated_disk() -> (VirtualDisk<MemFlashStore, MemClock>, MemClock) {
    let (mut disk, clock) = test_disk();
    disk.add_inline_file("readme.txt", vec![0xAA; 1500], true)
        .expect("register readme");
    disk.add_inline_file("a_very_long_name.bin", vec![0x5A; 700], true)
        .expect("register LFN file");
    disk.add_partition_file("nvs.bin", "nvs", false)
        .expect("register partition file");
    disk.add_firmware("firmware.bin", "update.bin")
        .expect("register firmware");
    (disk, clock)
}

fn dump_image(disk: &mut VirtualDisk<MemFlashStore, MemClock>) -> Vec<u8> {
    let sectors = disk.meta().sector_count() as u32;
    let mut image = Vec::with_capacity(sectors as usize * SECTOR);
    for lba in 0..sectors {
        let mut buf = [0u8; SECTOR];
        assert_eq!(
            disk.read10(lba, 0, &mut buf),
            SECTOR as i32,
            "READ10 must fill lba {lba}"
        );
        image.extend_from_slice(&buf);
    }
    image
}

fn sector(image: &[u8], lba: u32) -> &[u8] {
    &image[lba as usize * SECTOR..(lba as usize + 1) * SECTOR]
}

fn fat_entry(image: &[u8], meta: &DiskMeta, cluster: u32) -> u16 {
    let off = meta.fat0_lba() as usize * SECTOR + cluster as usize * 2;
    u16::from_le_bytes([image[off], image[off + 1]])
}

/// Root-directory walk: (printable name, attrs, start cluster, size).
fn walk_root_dir(image: &[u8], meta: &DiskMeta) -> Vec<(String, u8, u16, u32)> {
    let mut out = Vec::new();
    let mut lfn_stack: Vec<LfnEntry> = Vec::new();

    for sector_idx in 0..meta.root_dir_sectors() {
        let raw = sector(image, meta.root_dir_lba() + sector_idx);
        for chunk in raw.chunks_exact(32) {
            if chunk[0] == 0x00 {
                continue;
            }
            if chunk[11] & 0x3F == 0x0F {
                lfn_stack.push(LfnEntry::read_from_bytes(chunk).expect("LFN entry"));
                continue;
            }

            let mut short = [0u8; 11];
            short.copy_from_slice(&chunk[..11]);
            let name = if lfn_stack.is_empty() {
                decode_short_name(&short)
            } else {
                // Every fragment of the chain must checksum the 8.3 name.
                let sum = lfn_checksum(&short);
                assert!(
                    lfn_stack.iter().all(|l| l.checksum == sum),
                    "LFN checksum mismatch for {short:?}"
                );
                decode_lfn(&lfn_stack).expect("LFN decodes")
            };
            lfn_stack.clear();

            out.push((
                name,
                chunk[11],
                u16::from_le_bytes([chunk[26], chunk[27]]),
                u32::from_le_bytes([chunk[28], chunk[29], chunk[30], chunk[31]]),
            ));
        }
    }
    out
}

#[test]
fn empty_disk_boot_fat_and_label() {
    let (mut disk, _clock) = test_disk();
    let image = dump_image(&mut disk);
    let meta = *disk.meta();

    // Boot sector: geometry, label, serial, trailer.
    let boot = sector(&image, 0);
    assert_eq!(&boot[0..3], &[0xEB, 0x3C, 0x90]);
    assert_eq!(u16::from_le_bytes([boot[11], boot[12]]), 512);
    assert_eq!(u16::from_le_bytes([boot[19], boot[20]]), 8192);
    assert_eq!(
        u32::from_le_bytes([boot[39], boot[40], boot[41], boot[42]]),
        0x1234_5678
    );
    assert_eq!(&boot[43..54], b"TEST       ");
    assert_eq!(&boot[510..512], &[0x55, 0xAA]);

    // FAT head: media descriptor and reserved entry, rest free.
    let fat0 = sector(&image, meta.fat0_lba());
    assert_eq!(u16::from_le_bytes([fat0[0], fat0[1]]), 0xFFF8);
    assert_eq!(u16::from_le_bytes([fat0[2], fat0[3]]), 0xFFFF);
    assert!(fat0[4..].iter().all(|&b| b == 0));

    // Root dir: only the volume label, attrs ARCHIVE | VOLUME_LABEL.
    let root = sector(&image, meta.root_dir_lba());
    assert_eq!(&root[0..11], b"TEST       ");
    assert_eq!(root[11], 0x28);
    assert!(root[32..].iter().all(|&b| b == 0));
}

#[test]
fn fat_copies_are_identical_and_chains_terminate() {
    let (mut disk, _clock) = populated_disk();
    let image = dump_image(&mut disk);
    let meta = *disk.meta();

    let fat_bytes = meta.sectors_per_fat() as usize * SECTOR;
    let fat0_off = meta.fat0_lba() as usize * SECTOR;
    let fat1_off = meta.fat1_lba() as usize * SECTOR;
    assert_eq!(
        &image[fat0_off..fat0_off + fat_bytes],
        &image[fat1_off..fat1_off + fat_bytes],
        "both FAT copies must be byte-identical"
    );

    for file in disk.table().entries() {
        let mut cluster = file.start_cluster() as u32;
        let mut hops = 0u32;
        loop {
            let next = fat_entry(&image, &meta, cluster);
            if next == 0xFFFF {
                break;
            }
            assert_eq!(next as u32, cluster + 1, "chain of {}", file.name());
            cluster = next as u32;
            hops += 1;
            assert!(hops <= meta.sector_count() as u32, "unterminated chain");
        }
        assert_eq!(
            cluster,
            file.end_cluster() as u32,
            "chain of {} must end at its last cluster",
            file.name()
        );
        assert_eq!(hops, file.end_cluster() as u32 - file.start_cluster() as u32);
    }
}

#[test]
fn root_directory_round_trips_names_in_registration_order() {
    let (mut disk, _clock) = populated_disk();
    let image = dump_image(&mut disk);
    let meta = *disk.meta();

    let listed = walk_root_dir(&image, &meta);
    let names: Vec<&str> = listed
        .iter()
        .skip(1) // volume label
        .map(|(name, _, _, _)| name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "README.TXT",
            "a_very_long_name.bin",
            "NVS.BIN",
            "FIRMWARE.BIN",
            "UPDATE.BIN"
        ]
    );

    // Volume label first, with the label attributes.
    assert_eq!(listed[0].0, "TEST");
    assert_eq!(listed[0].1, 0x28);

    // readme.txt: read-only archive at cluster 2 with its byte length.
    assert_eq!(listed[1].1, 0x21);
    assert_eq!(listed[1].2, 2);
    assert_eq!(listed[1].3, 1500);

    // The firmware file reports the true partition size.
    assert_eq!(listed[4].1, 0x21);
    assert_eq!(listed[4].3, 192 * 1024);

    // The update slot is writable.
    assert_eq!(listed[5].1, 0x20);
}

#[test]
fn file_contents_round_trip_with_zero_padding() {
    let (mut disk, _clock) = populated_disk();
    let image = dump_image(&mut disk);
    let meta = *disk.meta();

    // readme.txt occupies clusters 2..=4: 1500 bytes of 0xAA then zeros.
    let first = sector(&image, meta.file_data_lba());
    assert!(first.iter().all(|&b| b == 0xAA));
    let last = sector(&image, meta.file_data_lba() + 2);
    assert!(last[..476].iter().all(|&b| b == 0xAA));
    assert!(last[476..].iter().all(|&b| b == 0));

    // FAT chain of readme.txt: 2 -> 3 -> 4 -> end.
    assert_eq!(fat_entry(&image, &meta, 2), 3);
    assert_eq!(fat_entry(&image, &meta, 3), 4);
    assert_eq!(fat_entry(&image, &meta, 4), 0xFFFF);

    // Partition-backed file serves the partition's bytes.
    let nvs = disk.table().entries()[2].clone();
    let nvs_sector = sector(&image, nvs.start_sector());
    let expected: Vec<u8> = (0..512).map(|i| i as u8).collect();
    assert_eq!(nvs_sector, &expected[..]);

    // Sectors claimed by no file read as zeros.
    let free = disk.table().entries().last().unwrap().end_sector() + 1;
    assert!(sector(&image, free).iter().all(|&b| b == 0));
}

#[test]
fn firmware_file_serves_the_running_image() {
    let (mut disk, _clock) = populated_disk();
    let firmware = disk.table().entries()[3].clone();
    let expected = sample_image(CHIP, 192 * 1024);

    let mut buf = [0u8; SECTOR];
    assert_eq!(disk.read10(firmware.start_sector(), 0, &mut buf), 512);
    assert_eq!(&buf[..], &expected[..512]);
}

#[test]
fn writes_to_metadata_are_accepted_and_ignored() {
    let (mut disk, _clock) = populated_disk();
    let meta = *disk.meta();
    let before = dump_image(&mut disk);

    let junk = [0x77u8; SECTOR];
    assert_eq!(disk.write10(0, 0, &junk), SECTOR as i32);
    assert_eq!(disk.write10(meta.fat0_lba(), 0, &junk), SECTOR as i32);
    assert_eq!(disk.write10(meta.root_dir_lba(), 0, &junk), SECTOR as i32);

    // Writes outside any file span are ignored too.
    let free = disk.table().entries().last().unwrap().end_sector() + 1;
    assert_eq!(disk.write10(free, 0, &junk), SECTOR as i32);

    assert_eq!(dump_image(&mut disk), before, "nothing may be persisted");
}

#[test]
fn write_to_read_only_file_is_rejected() {
    let (mut disk, _clock) = populated_disk();
    let readme = disk.table().entries()[0].clone();
    let buf = [0u8; SECTOR];
    assert_eq!(disk.write10(readme.start_sector(), 0, &buf), -1);
    assert_eq!(disk.write10(readme.end_sector(), 0, &buf), -1);
}

#[test]
fn dropping_a_firmware_image_flashes_and_commits() {
    let (mut disk, clock) = populated_disk();
    let update = disk.table().entries()[4].clone();
    let image = sample_image(CHIP, 100 * 1024);

    for (i, chunk) in image.chunks(SECTOR).enumerate() {
        let lba = update.start_sector() + i as u32;
        assert_eq!(disk.write10(lba, 0, chunk), SECTOR as i32);
        clock.advance(3);
        disk.poll();
    }
    assert_eq!(disk.ota().bytes_received(), Some(100 * 1024));

    // One second of host silence debounces the end of the stream.
    clock.advance(1000);
    disk.poll();
    assert!(disk.ota().is_idle());

    let store = disk.backend();
    assert_eq!(store.completed_transfers().len(), 1);
    let (target, bytes) = store.completed_transfers()[0];
    assert_eq!(bytes, 100 * 1024);
    assert_eq!(store.boot_partition(), Some(target));
    assert_eq!(&store.partition_data(target).unwrap()[..image.len()], &image[..]);
}

#[test]
fn foreign_chip_image_is_discarded_silently() {
    let (mut disk, clock) = populated_disk();
    let update = disk.table().entries()[4].clone();
    let image = sample_image(0x0009, 64 * 1024);

    for (i, chunk) in image.chunks(SECTOR).take(8).enumerate() {
        let lba = update.start_sector() + i as u32;
        assert_eq!(disk.write10(lba, 0, chunk), SECTOR as i32);
    }
    clock.advance(2000);
    disk.poll();

    assert!(disk.ota().is_idle());
    assert!(disk.backend().completed_transfers().is_empty());
    assert_eq!(disk.backend().boot_partition(), None);
}

#[test]
fn unknown_scsi_opcode_sets_sense() {
    let (mut disk, _clock) = test_disk();

    assert_eq!(disk.scsi_command(&[0x1E, 0, 0, 0]), 0);
    assert_eq!(disk.sense(), None);

    assert_eq!(disk.scsi_command(&[0x35, 0, 0, 0]), -1);
    assert_eq!(
        disk.sense(),
        Some(SenseData {
            key: 0x05,
            asc: 0x20,
            ascq: 0x00
        })
    );

    let (count, size) = disk.capacity();
    assert_eq!((count, size), (8192, 512));
    assert!(disk.test_unit_ready());

    let mut vendor = [0u8; 8];
    let mut product = [0u8; 16];
    let mut rev = [0u8; 4];
    disk.inquiry(&mut vendor, &mut product, &mut rev);
    assert_eq!(&vendor[..3], b"VFD");
    assert_eq!(&product[..12], b"Virtual Disk");
}
