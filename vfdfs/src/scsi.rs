// SPDX-License-Identifier: MIT

//! SCSI callback surface toward the external USB mass-storage stack.
//!
//! The stack's callbacks speak in `i32` byte counts with negative values
//! for errors; these adapters translate to and from the typed core.

use log::{debug, warn};
use vfdio::{Clock, FlashStore, OtaWriter};

use crate::disk::VirtualDisk;

pub const SCSI_CMD_PREVENT_ALLOW_MEDIUM_REMOVAL: u8 = 0x1E;

pub const SCSI_SENSE_ILLEGAL_REQUEST: u8 = 0x05;

/// Sense data reported for the last failed non-I/O command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseData {
    pub key: u8,
    pub asc: u8,
    pub ascq: u8,
}

impl<B, C> VirtualDisk<B, C>
where
    B: FlashStore + OtaWriter,
    C: Clock,
{
    /// INQUIRY: copies the configured identity strings, truncated to the
    /// wire widths. Unused tail bytes stay zero.
    pub fn inquiry(
        &self,
        vendor_id: &mut [u8; 8],
        product_id: &mut [u8; 16],
        product_rev: &mut [u8; 4],
    ) {
        copy_identity(vendor_id, &self.config.vendor_id);
        copy_identity(product_id, &self.config.product_id);
        copy_identity(product_rev, &self.config.product_revision);
    }

    /// TEST UNIT READY: the synthesized medium is always present.
    pub fn test_unit_ready(&self) -> bool {
        true
    }

    /// READ CAPACITY / READ FORMAT CAPACITY.
    pub fn capacity(&self) -> (u32, u16) {
        (self.meta.sector_count() as u32, self.meta.sector_size())
    }

    /// READ(10): bytes read, or `-1` on a backing-store failure.
    pub fn read10(&mut self, lba: u32, offset: u32, buf: &mut [u8]) -> i32 {
        match self.read_sector(lba, offset, buf) {
            Ok(n) => n as i32,
            Err(e) => {
                warn!("READ10 lba:{} failed: {}", lba, e);
                -1
            }
        }
    }

    /// WRITE(10): bytes accepted, or `-1` for rejected writes.
    pub fn write10(&mut self, lba: u32, offset: u32, buf: &[u8]) -> i32 {
        match self.write_sector(lba, offset, buf) {
            Ok(n) => n as i32,
            Err(e) => {
                warn!("WRITE10 lba:{} failed: {}", lba, e);
                -1
            }
        }
    }

    /// Any SCSI command without a dedicated callback. `cmd[0]` is the
    /// opcode; unknown opcodes set ILLEGAL REQUEST sense data.
    pub fn scsi_command(&mut self, cmd: &[u8]) -> i32 {
        match cmd.first() {
            Some(&SCSI_CMD_PREVENT_ALLOW_MEDIUM_REMOVAL) => {
                // The host pins the medium before long transfers; there
                // is nothing to eject.
                0
            }
            opcode => {
                debug!("unsupported SCSI opcode {:?}", opcode);
                self.sense = Some(SenseData {
                    key: SCSI_SENSE_ILLEGAL_REQUEST,
                    asc: 0x20,
                    ascq: 0x00,
                });
                -1
            }
        }
    }

    /// Sense data set by the last rejected command, if any.
    pub fn sense(&self) -> Option<SenseData> {
        self.sense
    }
}

fn copy_identity(dst: &mut [u8], src: &str) {
    dst.fill(0);
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src.as_bytes()[..n]);
}
