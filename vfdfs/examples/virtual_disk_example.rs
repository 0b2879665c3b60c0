// SPDX-License-Identifier: MIT

use std::time::Instant;

use vfdfs::prelude::*;
use vfdfs::testing::sample_image;
use vfdio::{MemClock, MemFlashStore, MemPartition};

fn main() {
    const CHIP: u16 = 0x0002;

    println!("=== Virtual Disk Walkthrough ===");

    // Emulated flash: two app slots plus a data partition.
    let mut store = MemFlashStore::new();
    let running = store.add_partition(MemPartition::app_with_data(
        "ota_0",
        sample_image(CHIP, 128 * 1024),
    ));
    store.add_partition(MemPartition::app("ota_1", 128 * 1024));
    store.add_partition(MemPartition::data("nvs", vec![0x42; 4096]));
    store.set_running(running);

    let clock = MemClock::new();
    let config = DiskConfig {
        label: "DEMO".into(),
        serial_number: 0xDEAD_BEEF,
        chip_id: CHIP,
        ..DiskConfig::default()
    };
    let mut disk = VirtualDisk::new(DiskMeta::new(), config, store, clock.clone());

    disk.add_inline_file("readme.txt", b"drop firmware.bin here".to_vec(), true)
        .expect("register readme");
    disk.add_partition_file("nvs.bin", "nvs", false)
        .expect("register nvs");
    disk.add_firmware("firmware.bin", "update.bin")
        .expect("register firmware");

    // 1. Host browses the disk.
    let t0 = Instant::now();
    let mut buf = [0u8; 512];
    for lba in 0..disk.meta().sector_count() as u32 {
        assert_eq!(disk.read10(lba, 0, &mut buf), 512);
    }
    println!(
        "Synthesized {} sectors in {:.2?}",
        disk.meta().sector_count(),
        t0.elapsed()
    );

    // 2. Host drops a new firmware image onto update.bin.
    let update = disk.table().entries().last().unwrap().clone();
    let image = sample_image(CHIP, 96 * 1024);
    let t1 = Instant::now();
    for (i, chunk) in image.chunks(512).enumerate() {
        let rc = disk.write10(update.start_sector() + i as u32, 0, chunk);
        assert_eq!(rc, 512);
    }

    // 3. One second of silence commits the update.
    clock.advance(1001);
    disk.poll();
    println!(
        "Streamed {} bytes of firmware in {:.2?}",
        image.len(),
        t1.elapsed()
    );
    println!(
        "Boot partition now: {:?}",
        disk.backend().boot_partition().expect("update committed")
    );
}
