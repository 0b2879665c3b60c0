// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::Context;

const SECTOR_SIZE: u64 = 512;

/// Hex-dumps `count` sectors of an exported image starting at `sector`.
pub fn run(path: &Path, sector: u64, count: u64) -> anyhow::Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("opening image {}", path.display()))?;
    println!("Analyzing image: {}", path.display());

    for idx in sector..sector + count {
        let mut buffer = [0u8; SECTOR_SIZE as usize];
        file.seek(SeekFrom::Start(idx * SECTOR_SIZE))?;
        file.read_exact(&mut buffer)
            .with_context(|| format!("reading sector {}", idx))?;

        println!("\n=== SECTOR {} ===", idx);
        dump_hex(&buffer, if idx == 0 { 128 } else { 64 });

        if idx == 0 {
            let signature = u16::from_le_bytes([buffer[510], buffer[511]]);
            if signature == 0xAA55 {
                println!("✓ Valid boot signature (0x55AA)");
            } else {
                println!("✗ Invalid boot signature: 0x{:04X}", signature);
            }
            println!(
                "Jump Boot: {:02X} {:02X} {:02X}",
                buffer[0], buffer[1], buffer[2]
            );
            println!("Volume Label: {}", String::from_utf8_lossy(&buffer[43..54]));
        }
    }
    Ok(())
}

fn dump_hex(buffer: &[u8], bytes_to_show: usize) {
    for i in (0..bytes_to_show).step_by(16) {
        print!("{:04X}: ", i);
        for j in 0..16 {
            if i + j < bytes_to_show {
                print!("{:02X} ", buffer[i + j]);
            }
        }
        print!(" | ");
        for j in 0..16 {
            if i + j < bytes_to_show {
                let c = buffer[i + j];
                if (32..=126).contains(&c) {
                    print!("{}", c as char);
                } else {
                    print!(".");
                }
            }
        }
        println!();
    }
}
