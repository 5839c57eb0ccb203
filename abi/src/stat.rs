//! The `stat` record

use bitflags::bitflags;

bitflags! {
    /// File type and permission bits of [`Stat::mode`].
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatMode: u32 {
        const IFCHR = 0o020000;
        const IFBLK = 0o060000;
        const IFREG = 0o100000;
        const IRUSR = 0o400;
        const IWUSR = 0o200;
        const IRGRP = 0o040;
        const IWGRP = 0o020;
        const IROTH = 0o004;
        const IWOTH = 0o002;
    }
}

impl StatMode {
    /// Mask of the file-type bits.
    pub const TYPE_MASK: u32 = 0o170000;

    pub const fn file_type(self) -> u32 {
        self.bits() & Self::TYPE_MASK
    }
}

/// Metadata copied verbatim into the caller's buffer by `stat`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub ino: u64,
    pub mode: u32,
    /// Live descriptors referring to the inode, across all processes.
    pub nlink: u32,
    pub size: u64,
    pub blksize: u32,
    pub _pad: u32,
    pub blocks: u64,
}

impl Stat {
    pub fn mode(&self) -> StatMode {
        StatMode::from_bits_retain(self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_is_fixed() {
        assert_eq!(core::mem::size_of::<Stat>(), 40);
        assert_eq!(core::mem::align_of::<Stat>(), 8);
    }

    #[test]
    fn file_type_ignores_permissions() {
        let mode = StatMode::IFCHR | StatMode::IRUSR | StatMode::IWUSR;
        assert_eq!(mode.file_type(), StatMode::IFCHR.bits());
    }
}
