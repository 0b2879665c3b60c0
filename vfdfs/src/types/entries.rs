// SPDX-License-Identifier: MIT

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{attr::DirAttributes, constant::*};

/// 8.3 root-directory entry.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct DirEntry {
    pub name: [u8; 8],
    pub ext: [u8; 3],
    pub attributes: u8,
    pub reserved: u8,
    pub create_time_fine: u8,
    pub create_time: U16<LittleEndian>,
    pub create_date: U16<LittleEndian>,
    pub last_access_date: U16<LittleEndian>,
    pub high_start_cluster: U16<LittleEndian>,
    pub update_time: U16<LittleEndian>,
    pub update_date: U16<LittleEndian>,
    pub start_cluster: U16<LittleEndian>,
    pub size: U32<LittleEndian>,
}

const _: () = assert!(core::mem::size_of::<DirEntry>() == DIRENT_SIZE);

impl DirEntry {
    /// Entry for a registered file. `short` is the combined 11-byte
    /// name+ext field; dates carry the fixed placeholder stamp.
    pub fn file(short: &[u8; SHORT_NAME_LEN], attributes: u8, start_cluster: u16, size: u32) -> Self {
        let mut name = [b' '; 8];
        let mut ext = [b' '; 3];
        name.copy_from_slice(&short[..SHORT_BASE_LEN]);
        ext.copy_from_slice(&short[SHORT_BASE_LEN..]);

        Self {
            name,
            ext,
            attributes,
            reserved: 0,
            create_time_fine: 0,
            create_time: U16::new(0),
            create_date: U16::new(DIRENT_PLACEHOLDER_DATE),
            last_access_date: U16::new(0),
            high_start_cluster: U16::new(0),
            update_time: U16::new(0),
            update_date: U16::new(DIRENT_PLACEHOLDER_DATE),
            start_cluster: U16::new(start_cluster),
            size: U32::new(size),
        }
    }

    /// The volume-label entry occupying slot 0 of root-dir sector 0.
    pub fn volume_label(label: &[u8; SHORT_NAME_LEN]) -> Self {
        let mut entry = Self::file(label, DirAttributes::volume_label().bits(), 0, 0);
        entry.create_date = U16::new(0);
        entry.update_date = U16::new(0);
        entry
    }

    /// Combined 11-byte short-name field.
    pub fn short(&self) -> [u8; SHORT_NAME_LEN] {
        let mut out = [0u8; SHORT_NAME_LEN];
        out[..SHORT_BASE_LEN].copy_from_slice(&self.name);
        out[SHORT_BASE_LEN..].copy_from_slice(&self.ext);
        out
    }

    pub fn is_lfn(&self) -> bool {
        self.attributes & DirAttributes::LFN.bits() == LFN_ATTRIBUTES
    }
}

/// VFAT long-filename entry holding 13 UTF-16 code units.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct LfnEntry {
    pub sequence: u8,
    pub name1: [U16<LittleEndian>; 5],
    pub attributes: u8,
    pub entry_type: u8,
    pub checksum: u8,
    pub name2: [U16<LittleEndian>; 6],
    pub start_cluster: U16<LittleEndian>,
    pub name3: [U16<LittleEndian>; 2],
}

const _: () = assert!(core::mem::size_of::<LfnEntry>() == DIRENT_SIZE);

impl LfnEntry {
    pub fn new(order: u8, is_last: bool, chars: &[u16; LFN_CHARS_PER_ENTRY], checksum: u8) -> Self {
        let mut name1 = [U16::new(0xFFFF); 5];
        let mut name2 = [U16::new(0xFFFF); 6];
        let mut name3 = [U16::new(0xFFFF); 2];
        for (i, &c) in chars.iter().enumerate() {
            match i {
                0..=4 => name1[i] = U16::new(c),
                5..=10 => name2[i - 5] = U16::new(c),
                _ => name3[i - 11] = U16::new(c),
            }
        }

        Self {
            sequence: if is_last { order | LFN_LAST_FLAG } else { order },
            name1,
            attributes: LFN_ATTRIBUTES,
            entry_type: 0,
            checksum,
            name2,
            start_cluster: U16::new(0),
            name3,
        }
    }

    /// The 13 UTF-16 code units this fragment carries.
    pub fn chars(&self) -> [u16; LFN_CHARS_PER_ENTRY] {
        let mut out = [0xFFFFu16; LFN_CHARS_PER_ENTRY];
        let name1 = self.name1;
        let name2 = self.name2;
        let name3 = self.name3;
        for (i, c) in name1.iter().enumerate() {
            out[i] = c.get();
        }
        for (i, c) in name2.iter().enumerate() {
            out[5 + i] = c.get();
        }
        for (i, c) in name3.iter().enumerate() {
            out[11 + i] = c.get();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[test]
    fn dirent_wire_layout() {
        let entry = DirEntry::file(b"README  TXT", DirAttributes::file(true).bits(), 2, 1500);
        let raw = entry.as_bytes();

        assert_eq!(raw.len(), 32);
        assert_eq!(&raw[0..8], b"README  ");
        assert_eq!(&raw[8..11], b"TXT");
        assert_eq!(raw[11], 0x21); // ARCHIVE | READ_ONLY
        assert_eq!(u16::from_le_bytes([raw[16], raw[17]]), 0x4D99); // create date
        assert_eq!(u16::from_le_bytes([raw[24], raw[25]]), 0x4D99); // update date
        assert_eq!(u16::from_le_bytes([raw[26], raw[27]]), 2);
        assert_eq!(u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]), 1500);
    }

    #[test]
    fn volume_label_entry_attrs() {
        let entry = DirEntry::volume_label(b"TEST       ");
        let raw = entry.as_bytes();
        assert_eq!(&raw[0..11], b"TEST       ");
        assert_eq!(raw[11], 0x28); // ARCHIVE | VOLUME_LABEL
        assert_eq!(u16::from_le_bytes([raw[26], raw[27]]), 0);
    }

    #[test]
    fn lfn_wire_layout() {
        let mut chars = [0xFFFFu16; LFN_CHARS_PER_ENTRY];
        for (i, c) in "fragment_one!".encode_utf16().enumerate() {
            chars[i] = c;
        }
        let entry = LfnEntry::new(2, true, &chars, 0xAB);
        let raw = entry.as_bytes();

        assert_eq!(raw.len(), 32);
        assert_eq!(raw[0], 0x42); // order 2, last-in-sequence
        assert_eq!(raw[11], 0x0F); // LFN attributes
        assert_eq!(raw[12], 0x00); // type
        assert_eq!(raw[13], 0xAB); // checksum
        assert_eq!(u16::from_le_bytes([raw[26], raw[27]]), 0); // start cluster
        assert_eq!(entry.chars(), chars);
    }
}
