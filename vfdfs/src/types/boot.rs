// SPDX-License-Identifier: MIT

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{constant::*, meta::DiskMeta};

/// FAT16 boot sector: BPB + extended BPB, no bootstrap code.
///
/// Field types are explicitly little-endian, so `as_bytes()` is the wire
/// image on any host.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat16Bpb {
    pub jump_instruction: [u8; 3],
    pub oem_info: [u8; 8],
    pub sector_size: U16<LittleEndian>,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: U16<LittleEndian>,
    pub fat_copies: u8,
    pub root_directory_entries: U16<LittleEndian>,
    pub total_sectors_16: U16<LittleEndian>,
    pub media_descriptor: u8,
    pub sectors_per_fat: U16<LittleEndian>,
    pub sectors_per_track: U16<LittleEndian>,
    pub heads: U16<LittleEndian>,
    pub hidden_sectors: U32<LittleEndian>,
    pub total_sectors_32: U32<LittleEndian>,

    // Extended boot record
    pub physical_drive_num: u8,
    pub reserved: u8,
    pub extended_boot_sig: u8,
    pub volume_serial_number: U32<LittleEndian>,
    pub volume_label: [u8; 11],
    pub filesystem_identifier: [u8; 8],

    pub boot_code: [u8; FAT_BOOT_CODE_SIZE],
    pub signature: [u8; 2],
}

const _: () = assert!(core::mem::size_of::<Fat16Bpb>() == 512);

impl Fat16Bpb {
    /// Builds the boot sector for `meta` with a space-padded label.
    pub fn from_meta(meta: &DiskMeta, label: &str, serial_number: u32) -> Self {
        let mut volume_label = *FAT_VOLUME_LABEL_EMPTY;
        crate::utils::space_padded_copy(&mut volume_label, label.as_bytes());

        Self {
            jump_instruction: FAT_JUMP_BOOT,
            oem_info: *FAT_OEM_NAME,
            sector_size: U16::new(meta.sector_size()),
            sectors_per_cluster: DISK_SECTORS_PER_CLUSTER,
            reserved_sectors: U16::new(meta.reserved_sectors()),
            fat_copies: FAT_COPIES,
            root_directory_entries: U16::new(meta.root_dir_slots()),
            total_sectors_16: U16::new(meta.sector_count()),
            media_descriptor: FAT_MEDIA_DESCRIPTOR,
            sectors_per_fat: U16::new(meta.sectors_per_fat()),
            sectors_per_track: U16::new(FAT_SECTORS_PER_TRACK),
            heads: U16::new(FAT_HEADS),
            hidden_sectors: U32::new(FAT_HIDDEN_SECTORS),
            total_sectors_32: U32::new(0),
            physical_drive_num: FAT_DRIVE_NUMBER,
            reserved: 0,
            extended_boot_sig: FAT_BOOT_SIGNATURE,
            volume_serial_number: U32::new(serial_number),
            volume_label,
            filesystem_identifier: *FAT_FS_TYPE,
            boot_code: [0u8; FAT_BOOT_CODE_SIZE],
            signature: FAT_SIGNATURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[test]
    fn boot_sector_wire_layout() {
        let meta = DiskMeta::new_custom(8192, 16);
        let bpb = Fat16Bpb::from_meta(&meta, "TEST", 0x1234_5678);
        let raw = bpb.as_bytes();

        assert_eq!(raw.len(), 512);
        assert_eq!(&raw[0..3], &[0xEB, 0x3C, 0x90]);
        assert_eq!(&raw[3..11], b"MSDOS5.0");
        assert_eq!(u16::from_le_bytes([raw[11], raw[12]]), 512);
        assert_eq!(raw[13], 1); // sectors per cluster
        assert_eq!(u16::from_le_bytes([raw[14], raw[15]]), 1); // reserved
        assert_eq!(raw[16], 2); // FAT copies
        assert_eq!(u16::from_le_bytes([raw[17], raw[18]]), 16); // root entries
        assert_eq!(u16::from_le_bytes([raw[19], raw[20]]), 8192);
        assert_eq!(raw[21], 0xF8); // media descriptor
        assert_eq!(u16::from_le_bytes([raw[22], raw[23]]), 32); // sectors/FAT
        assert_eq!(raw[36], 0x80); // drive number
        assert_eq!(raw[38], 0x29); // extended boot signature
        assert_eq!(
            u32::from_le_bytes([raw[39], raw[40], raw[41], raw[42]]),
            0x1234_5678
        );
        assert_eq!(&raw[43..54], b"TEST       ");
        assert_eq!(&raw[54..62], b"FAT16   ");
        assert!(raw[62..510].iter().all(|&b| b == 0));
        assert_eq!(&raw[510..512], &[0x55, 0xAA]);
    }
}
