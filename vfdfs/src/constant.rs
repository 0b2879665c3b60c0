// SPDX-License-Identifier: MIT

// === Disk Layout Parameters ===

pub const DISK_SECTOR_SIZE: u16 = 512; // BPB_BytsPerSec
pub const DISK_SECTORS_PER_CLUSTER: u8 = 1; // BPB_SecPerClus
pub const DEFAULT_SECTOR_COUNT: u16 = 8192; // 4 MiB volume
pub const DEFAULT_RESERVED_SECTORS: u16 = 1; // BPB_RsvdSecCnt
pub const DEFAULT_ROOT_DIR_SLOTS: u16 = 64; // BPB_RootEntCnt
pub const FAT_COPIES: u8 = 2; // BPB_NumFATs
pub const FAT_HEADS: u16 = 1; // BPB_NumHeads
pub const FAT_SECTORS_PER_TRACK: u16 = 1; // BPB_SecPerTrk
pub const FAT_HIDDEN_SECTORS: u32 = 0; // BPB_HiddSec

pub const DIRENT_SIZE: usize = 32;

// === FAT Region Parameters ===

pub const FAT_ENTRY_SIZE: usize = 2;
pub const FAT_MEDIA_DESCRIPTOR: u8 = 0xF8; // BPB_Media
pub const FAT_ENTRY_FREE: u16 = 0x0000;
pub const FAT_ENTRY_END_OF_CHAIN: u16 = 0xFFFF;
pub const FAT_FIRST_DATA_CLUSTER: u16 = 2;

// === Standard FAT16 BPB / Extended BPB Constants ===

pub const FAT_JUMP_BOOT: [u8; 3] = [0xEB, 0x3C, 0x90]; // BS_jmpBoot
pub const FAT_OEM_NAME: &[u8; 8] = b"MSDOS5.0"; // BS_OEMName
pub const FAT_DRIVE_NUMBER: u8 = 0x80; // BS_DrvNum
pub const FAT_BOOT_SIGNATURE: u8 = 0x29; // BS_BootSig
pub const FAT_FS_TYPE: &[u8; 8] = b"FAT16   "; // BS_FilSysType
pub const FAT_SIGNATURE: [u8; 2] = [0x55, 0xAA]; // sector 0 trailer
pub const FAT_VOLUME_LABEL_EMPTY: &[u8; 11] = b"NO NAME    ";
pub const FAT_BOOT_CODE_SIZE: usize = 448;

// === Directory Entry Constants ===

// Longest printable name that still fits an 8.3 entry ("XXXXXXXX.XXX").
pub const MAX_SHORT_NAME_LEN: usize = 12;
pub const SHORT_NAME_LEN: usize = 11;
pub const SHORT_BASE_LEN: usize = 8;
pub const SHORT_EXT_LEN: usize = 3;
pub const LFN_CHARS_PER_ENTRY: usize = 13;
pub const LFN_LAST_FLAG: u8 = 0x40;
pub const LFN_ATTRIBUTES: u8 = 0x0F;

// Fixed placeholder stamp for create/update dates (2018-12-25).
pub const DIRENT_PLACEHOLDER_DATE: u16 = 0x4D99;

// === Firmware Image Constants ===

// First byte of an application image header.
pub const IMAGE_HEADER_MAGIC: u8 = 0xE9;
// Marker word opening the embedded application descriptor.
pub const APP_DESC_MAGIC_WORD: u32 = 0xABCD_5432;
// Image offset of the application descriptor: it opens the first segment,
// right behind the 24-byte image header and the 8-byte segment header.
pub const APP_DESC_IMAGE_OFFSET: usize = 32;
// Chip family accepted by default; overridable per disk instance.
pub const DEFAULT_CHIP_ID: u16 = 0x0002;

// === OTA Pipeline Parameters ===

// Host transfers arrive with no end-of-file marker; the stream is treated
// as complete after this much write silence.
pub const OTA_IDLE_TIMEOUT_MS: u64 = 1000;
