// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{format, string::String, vec::Vec};

use crate::constant::*;
use crate::types::LfnEntry;

/// Copies `src` into `dst`, space-padding the tail. Bytes past `dst`'s
/// length are dropped.
pub fn space_padded_copy(dst: &mut [u8], src: &[u8]) {
    for (i, slot) in dst.iter_mut().enumerate() {
        *slot = if i < src.len() { src[i] } else { b' ' };
    }
}

/// An 8.3 short name plus the decision whether a VFAT long-name chain is
/// required for the printable name it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    pub raw: [u8; SHORT_NAME_LEN],
    pub needs_lfn: bool,
}

/// Derives the 8.3 name for `name`, upper-cased and space-padded.
///
/// Names with a dot split into base (first 8 bytes) and extension (3
/// bytes after the first dot). Dotless names spill across the combined
/// 11-byte field. Names longer than 12 printable characters get the
/// `~1` mangling at positions 6-7 and an LFN chain alongside.
pub fn short_name(name: &str) -> ShortName {
    let mut raw = [b' '; SHORT_NAME_LEN];

    match name.find('.') {
        Some(pos) => {
            let base = &name.as_bytes()[..pos];
            let ext = &name.as_bytes()[pos + 1..];
            for (i, b) in base.iter().take(SHORT_BASE_LEN).enumerate() {
                raw[i] = b.to_ascii_uppercase();
            }
            for (i, b) in ext.iter().take(SHORT_EXT_LEN).enumerate() {
                raw[SHORT_BASE_LEN + i] = b.to_ascii_uppercase();
            }
        }
        None => {
            for (i, b) in name.as_bytes().iter().take(SHORT_NAME_LEN).enumerate() {
                raw[i] = b.to_ascii_uppercase();
            }
        }
    }

    let needs_lfn = name.chars().count() > MAX_SHORT_NAME_LEN;
    if needs_lfn {
        raw[6] = b'~';
        raw[7] = b'1';
    }

    ShortName { raw, needs_lfn }
}

/// Rolling checksum over the 11 bytes of an 8.3 name, stored in every
/// LFN fragment of the chain.
pub fn lfn_checksum(short: &[u8; SHORT_NAME_LEN]) -> u8 {
    let mut sum: u8 = 0;
    for &b in short {
        sum = sum.rotate_right(1).wrapping_add(b);
    }
    sum
}

/// Builds the LFN chain for `name`, already in on-disk order: the
/// fragment carrying the end of the name comes first, flagged with 0x40.
pub fn lfn_entries(name: &str, short: &[u8; SHORT_NAME_LEN]) -> Vec<LfnEntry> {
    let utf16: Vec<u16> = name.encode_utf16().collect();
    let count = utf16.len().div_ceil(LFN_CHARS_PER_ENTRY).max(1);
    let checksum = lfn_checksum(short);

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let start = i * LFN_CHARS_PER_ENTRY;
        let end = ((i + 1) * LFN_CHARS_PER_ENTRY).min(utf16.len());
        let chunk = &utf16[start..end];

        // Unused positions stay 0xFFFF; the null terminator lands right
        // behind the name when the final fragment has room for it.
        let mut chars = [0xFFFFu16; LFN_CHARS_PER_ENTRY];
        chars[..chunk.len()].copy_from_slice(chunk);
        if end == utf16.len() && chunk.len() < LFN_CHARS_PER_ENTRY {
            chars[chunk.len()] = 0x0000;
        }

        let order = (i + 1) as u8;
        out.push(LfnEntry::new(order, i + 1 == count, &chars, checksum));
    }

    out.reverse();
    out
}

/// Decodes an 8.3 name field back to `BASE.EXT` form. Test/diagnostic
/// helper; the mangled `~1` names come back mangled.
pub fn decode_short_name(short: &[u8; SHORT_NAME_LEN]) -> String {
    let base: String = short[..SHORT_BASE_LEN]
        .iter()
        .take_while(|&&b| b != b' ')
        .map(|&b| b as char)
        .collect();
    let ext: String = short[SHORT_BASE_LEN..]
        .iter()
        .take_while(|&&b| b != b' ')
        .map(|&b| b as char)
        .collect();

    if ext.is_empty() {
        base
    } else {
        format!("{base}.{ext}")
    }
}

/// Reassembles a printable name from LFN fragments in on-disk order.
pub fn decode_lfn(entries: &[LfnEntry]) -> Option<String> {
    let mut utf16 = Vec::with_capacity(entries.len() * LFN_CHARS_PER_ENTRY);
    for entry in entries.iter().rev() {
        for c in entry.chars() {
            if c == 0x0000 || c == 0xFFFF {
                break;
            }
            utf16.push(c);
        }
    }
    String::from_utf16(&utf16).ok()
}
