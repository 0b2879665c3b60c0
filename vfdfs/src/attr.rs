// SPDX-License-Identifier: MIT

bitflags::bitflags! {
    /// FAT directory-entry attribute bits carried by registered files.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirAttributes: u8 {
        const READ_ONLY    = 0x01;
        const HIDDEN       = 0x02;
        const SYSTEM       = 0x04;
        const VOLUME_LABEL = 0x08;
        const ARCHIVE      = 0x20;
        const LFN          = 0x0F;
    }
}

impl DirAttributes {
    /// Attributes for a plain registered file.
    pub fn file(read_only: bool) -> Self {
        let mut attr = DirAttributes::ARCHIVE;
        if read_only {
            attr |= DirAttributes::READ_ONLY;
        }
        attr
    }

    /// Attributes of the volume-label entry in root-dir slot 0.
    pub fn volume_label() -> Self {
        DirAttributes::ARCHIVE | DirAttributes::VOLUME_LABEL
    }
}
