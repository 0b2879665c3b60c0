// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::string::String;

use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::constant::*;

/// Application image header, as flashed at the start of an app slot.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct ImageHeader {
    pub magic: u8,
    pub segment_count: u8,
    pub spi_mode: u8,
    pub spi_speed_size: u8,
    pub entry_addr: U32<LittleEndian>,
    pub wp_pin: u8,
    pub spi_pin_drv: [u8; 3],
    pub chip_id: U16<LittleEndian>,
    pub min_chip_rev: u8,
    pub reserved: [u8; 8],
    pub hash_appended: u8,
}

const _: () = assert!(core::mem::size_of::<ImageHeader>() == 24);

/// Raw application descriptor embedded at the head of the first segment.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct AppDescRaw {
    pub magic_word: U32<LittleEndian>,
    pub secure_version: U32<LittleEndian>,
    pub reserv1: [U32<LittleEndian>; 2],
    pub version: [u8; 32],
    pub project_name: [u8; 32],
    pub time: [u8; 16],
    pub date: [u8; 16],
    pub idf_ver: [u8; 32],
    pub app_elf_sha256: [u8; 32],
    pub reserv2: [U32<LittleEndian>; 20],
}

const _: () = assert!(core::mem::size_of::<AppDescRaw>() == 256);

/// Decoded application descriptor handed to the update-start hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDescriptor {
    pub secure_version: u32,
    pub project_name: String,
    pub version: String,
    pub idf_version: String,
    pub date: String,
    pub time: String,
}

/// Why the first data buffer of a transfer was not accepted as firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareRejection {
    /// First byte is not the image magic; an ordinary file copy.
    NotAnImage,
    /// Too short to carry a header and descriptor.
    Truncated,
    /// Image built for a different chip.
    WrongChip { expected: u16, found: u16 },
    /// Descriptor magic word missing.
    BadDescriptor,
}

fn nul_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Validates the head of a firmware image and extracts its descriptor.
///
/// `buf` is the first WRITE(10) payload of a transfer; a full header plus
/// descriptor must fit in it.
pub fn parse_firmware(buf: &[u8], expected_chip_id: u16) -> Result<AppDescriptor, FirmwareRejection> {
    if buf.first() != Some(&IMAGE_HEADER_MAGIC) {
        return Err(FirmwareRejection::NotAnImage);
    }
    if buf.len() < APP_DESC_IMAGE_OFFSET + core::mem::size_of::<AppDescRaw>() {
        return Err(FirmwareRejection::Truncated);
    }

    let (header, _) =
        ImageHeader::read_from_prefix(buf).map_err(|_| FirmwareRejection::Truncated)?;
    let found = header.chip_id.get();
    if found != expected_chip_id {
        return Err(FirmwareRejection::WrongChip {
            expected: expected_chip_id,
            found,
        });
    }

    let (desc, _) = AppDescRaw::read_from_prefix(&buf[APP_DESC_IMAGE_OFFSET..])
        .map_err(|_| FirmwareRejection::Truncated)?;
    if desc.magic_word.get() != APP_DESC_MAGIC_WORD {
        return Err(FirmwareRejection::BadDescriptor);
    }

    Ok(AppDescriptor {
        secure_version: desc.secure_version.get(),
        project_name: nul_terminated(&desc.project_name),
        version: nul_terminated(&desc.version),
        idf_version: nul_terminated(&desc.idf_ver),
        date: nul_terminated(&desc.date),
        time: nul_terminated(&desc.time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_image;

    #[test]
    fn valid_image_parses() {
        let image = sample_image(0x0002, 4096);
        let desc = parse_firmware(&image[..512], 0x0002).unwrap();
        assert_eq!(desc.project_name, "blink");
        assert_eq!(desc.version, "1.2.3");
        assert_eq!(desc.secure_version, 0);
    }

    #[test]
    fn plain_data_is_not_an_image() {
        assert_eq!(
            parse_firmware(&[0x41u8; 512], 0x0002),
            Err(FirmwareRejection::NotAnImage)
        );
    }

    #[test]
    fn short_first_buffer_is_truncated() {
        let image = sample_image(0x0002, 4096);
        assert_eq!(
            parse_firmware(&image[..64], 0x0002),
            Err(FirmwareRejection::Truncated)
        );
    }

    #[test]
    fn chip_mismatch_is_reported() {
        let image = sample_image(0x0005, 4096);
        assert_eq!(
            parse_firmware(&image[..512], 0x0002),
            Err(FirmwareRejection::WrongChip {
                expected: 0x0002,
                found: 0x0005
            })
        );
    }

    #[test]
    fn bad_descriptor_magic_is_reported() {
        let mut image = sample_image(0x0002, 4096);
        image[APP_DESC_IMAGE_OFFSET] ^= 0xFF;
        assert_eq!(
            parse_firmware(&image[..512], 0x0002),
            Err(FirmwareRejection::BadDescriptor)
        );
    }
}
