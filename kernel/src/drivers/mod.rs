//! Device capabilities
//!
//! The kernel consumes character and block devices through these traits and
//! never touches hardware registers itself. The boot code supplies the
//! implementations: the SBI console, and a [`RamDisk`] in place of a real
//! block driver.

mod ramdisk;

pub use ramdisk::RamDisk;

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Block index past the end of the device
    OutOfRange,
    /// Buffer length is not one block
    BadBuffer,
    /// The device reported a failure
    Io,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OutOfRange => f.write_str("block out of range"),
            DeviceError::BadBuffer => f.write_str("buffer is not one block long"),
            DeviceError::Io => f.write_str("device I/O failure"),
        }
    }
}

/// Byte-at-a-time console device.
pub trait CharDevice: Send + Sync {
    /// Next pending byte, without blocking.
    fn getchar(&self) -> Option<u8>;
    fn putchar(&self, byte: u8);

    fn write_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.putchar(byte);
        }
    }
}

/// Fixed-size block storage.
pub trait BlockDevice: Send + Sync {
    fn block_size(&self) -> usize;
    fn block_count(&self) -> usize;
    fn read_block(&self, block: usize, buf: &mut [u8]) -> Result<(), DeviceError>;
    fn write_block(&self, block: usize, buf: &[u8]) -> Result<(), DeviceError>;

    fn capacity(&self) -> u64 {
        (self.block_size() * self.block_count()) as u64
    }
}

impl From<DeviceError> for kairos_abi::Errno {
    fn from(_: DeviceError) -> Self {
        kairos_abi::Errno::EIO
    }
}
