// SPDX-License-Identifier: MIT

mod inspect;
mod manifest;
mod out;
mod utils;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::info;

use crate::manifest::Manifest;
use crate::utils::log::LogLevel;

#[derive(Parser)]
#[command(name = "vfdgen", version, about = "Virtual flash disk generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the synthesized FAT16 image described by a disk manifest
    Build {
        /// Manifest path
        #[arg(short, long, default_value = "disk.toml")]
        manifest: PathBuf,
        /// Output image path
        #[arg(short, long, default_value = "disk.img")]
        output: PathBuf,

        #[arg(long, short, action = clap::ArgAction::Count)]
        verbose: u8,

        #[arg(long, short)]
        quiet: bool,
    },
    /// Hex-dump sectors of an exported image
    Inspect {
        /// Image path
        image: PathBuf,

        /// First sector to dump
        #[arg(long, default_value_t = 0)]
        sector: u64,

        /// Number of sectors to dump
        #[arg(long, default_value_t = 4)]
        count: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
            quiet,
        } => {
            if quiet {
                utils::log::init(LogLevel::Quiet);
            } else if verbose > 0 {
                utils::log::init(LogLevel::Verbose);
            } else {
                utils::log::init(LogLevel::Normal);
            }
            let t0 = Instant::now();
            info!("vfdgen — v{}", env!("CARGO_PKG_VERSION"));

            let manifest = Manifest::from_file(&manifest)?;
            let mut disk = manifest.build_disk()?;
            out::img::export(&mut disk, &output)?;

            info!(
                "Done: {} ({} files) in {:.2?}",
                output.display(),
                disk.table().len(),
                t0.elapsed()
            );
            Ok(())
        }
        Commands::Inspect {
            image,
            sector,
            count,
        } => inspect::run(&image, sector, count),
    }
}
