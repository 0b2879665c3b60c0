// SPDX-License-Identifier: MIT

//! Builders for synthetic firmware images, shared by unit tests, the
//! integration suite and host tooling.

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use zerocopy::byteorder::{U16, U32};
use zerocopy::IntoBytes;

use crate::constant::*;
use crate::image::{AppDescRaw, ImageHeader};

/// A parseable application image of `len` bytes for `chip_id`: valid
/// header, valid descriptor ("blink" v1.2.3), deterministic filler.
pub fn sample_image(chip_id: u16, len: usize) -> Vec<u8> {
    assert!(len >= APP_DESC_IMAGE_OFFSET + core::mem::size_of::<AppDescRaw>());

    let header = ImageHeader {
        magic: IMAGE_HEADER_MAGIC,
        segment_count: 1,
        spi_mode: 0,
        spi_speed_size: 0,
        entry_addr: U32::new(0x4008_0000),
        wp_pin: 0xEE,
        spi_pin_drv: [0; 3],
        chip_id: U16::new(chip_id),
        min_chip_rev: 0,
        reserved: [0; 8],
        hash_appended: 1,
    };

    let mut desc = AppDescRaw {
        magic_word: U32::new(APP_DESC_MAGIC_WORD),
        secure_version: U32::new(0),
        reserv1: [U32::new(0); 2],
        version: [0; 32],
        project_name: [0; 32],
        time: [0; 16],
        date: [0; 16],
        idf_ver: [0; 32],
        app_elf_sha256: [0; 32],
        reserv2: [U32::new(0); 20],
    };
    desc.version[..5].copy_from_slice(b"1.2.3");
    desc.project_name[..5].copy_from_slice(b"blink");
    desc.time[..8].copy_from_slice(b"12:00:00");
    desc.date[..11].copy_from_slice(b"Jan  1 2026");
    desc.idf_ver[..4].copy_from_slice(b"v5.1");

    let mut image = Vec::with_capacity(len);
    image.extend_from_slice(header.as_bytes());
    // Segment header: load address + payload length.
    image.extend_from_slice(&0x3F40_0000u32.to_le_bytes());
    image.extend_from_slice(&((len - APP_DESC_IMAGE_OFFSET) as u32).to_le_bytes());
    image.extend_from_slice(desc.as_bytes());
    while image.len() < len {
        image.push((image.len() & 0xFF) as u8);
    }
    image
}
