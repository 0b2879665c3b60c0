// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use log::info;

use vfdfs::prelude::*;
use vfdio::{MemFlashStore, StdClock};

/// Streams every synthesized sector of `disk` into a raw image file.
/// The result loop-mounts as a plain FAT16 superfloppy.
pub fn export(disk: &mut VirtualDisk<MemFlashStore, StdClock>, path: &Path) -> anyhow::Result<()> {
    let sector_size = disk.meta().sector_size() as usize;
    let sectors = disk.meta().sector_count() as u32;
    info!(
        "exporting {} sectors ({} bytes) to {}",
        sectors,
        disk.meta().total_bytes(),
        path.display()
    );

    let file = File::create(path)
        .with_context(|| format!("creating image file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let sty = indicatif::ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.white} {pos}/{len} (ETA {eta}) {msg}",
    )
    .unwrap()
    .progress_chars("█░░");
    let pb = indicatif::ProgressBar::new(sectors as u64);
    pb.set_style(sty);
    pb.set_message("Synthesizing sectors");

    let mut buf = vec![0u8; sector_size];
    for lba in 0..sectors {
        disk.read_sector(lba, 0, &mut buf)
            .map_err(|e| anyhow::anyhow!("synthesizing lba {}: {}", lba, e))?;
        writer.write_all(&buf)?;
        pb.inc(1);
    }
    pb.finish_with_message("image written");

    writer.flush()?;
    Ok(())
}
