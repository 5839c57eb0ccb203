//! Heap-backed block device

use super::{BlockDevice, DeviceError};
use alloc::vec;
use alloc::vec::Vec;
use spin::Mutex;

pub struct RamDisk {
    block_size: usize,
    blocks: usize,
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new(block_size: usize, blocks: usize) -> Self {
        Self {
            block_size,
            blocks,
            data: Mutex::new(vec![0; block_size * blocks]),
        }
    }

    fn span(&self, block: usize, len: usize) -> Result<core::ops::Range<usize>, DeviceError> {
        if block >= self.blocks {
            return Err(DeviceError::OutOfRange);
        }
        if len != self.block_size {
            return Err(DeviceError::BadBuffer);
        }
        let start = block * self.block_size;
        Ok(start..start + self.block_size)
    }
}

impl BlockDevice for RamDisk {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn block_count(&self) -> usize {
        self.blocks
    }

    fn read_block(&self, block: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let span = self.span(block, buf.len())?;
        buf.copy_from_slice(&self.data.lock()[span]);
        Ok(())
    }

    fn write_block(&self, block: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let span = self.span(block, buf.len())?;
        self.data.lock()[span].copy_from_slice(buf);
        Ok(())
    }
}
