//! Backing objects behind inodes

use super::FsError;
use crate::drivers::{BlockDevice, CharDevice};
use alloc::sync::Arc;
use alloc::vec;
use kairos_abi::StatMode;

/// Direction of a transfer, carrying the buffer it moves through.
pub enum Transfer<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

impl Transfer<'_> {
    pub fn len(&self) -> usize {
        match self {
            Transfer::Read(buf) => buf.len(),
            Transfer::Write(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A storage object an inode can stand for.
pub trait FileNode: Send + Sync {
    fn mode(&self) -> StatMode;

    fn size(&self) -> u64 {
        0
    }

    fn block_size(&self) -> u32 {
        512
    }

    /// Moves bytes at `offset`; returns how many moved.
    fn request(&self, transfer: Transfer<'_>, offset: u64) -> Result<usize, FsError>;
}

const DEVICE_RW: StatMode = StatMode::IRUSR
    .union(StatMode::IWUSR)
    .union(StatMode::IRGRP)
    .union(StatMode::IWGRP)
    .union(StatMode::IROTH)
    .union(StatMode::IWOTH);

/// `/dev/null`: reads return nothing, writes are discarded.
pub struct NullNode;

impl FileNode for NullNode {
    fn mode(&self) -> StatMode {
        StatMode::IFCHR | DEVICE_RW
    }

    fn request(&self, transfer: Transfer<'_>, _offset: u64) -> Result<usize, FsError> {
        match transfer {
            Transfer::Read(_) => Ok(0),
            Transfer::Write(buf) => Ok(buf.len()),
        }
    }
}

/// `/dev/zero`: reads fill with zeros, writes are discarded.
pub struct ZeroNode;

impl FileNode for ZeroNode {
    fn mode(&self) -> StatMode {
        StatMode::IFCHR | DEVICE_RW
    }

    fn request(&self, transfer: Transfer<'_>, _offset: u64) -> Result<usize, FsError> {
        match transfer {
            Transfer::Read(buf) => {
                buf.fill(0);
                Ok(buf.len())
            }
            Transfer::Write(buf) => Ok(buf.len()),
        }
    }
}

/// `/dev/console`: the character device; reads take what is already pending.
pub struct ConsoleNode {
    device: Arc<dyn CharDevice>,
}

impl ConsoleNode {
    pub fn new(device: Arc<dyn CharDevice>) -> Self {
        Self { device }
    }
}

impl FileNode for ConsoleNode {
    fn mode(&self) -> StatMode {
        StatMode::IFCHR | DEVICE_RW
    }

    fn block_size(&self) -> u32 {
        1
    }

    fn request(&self, transfer: Transfer<'_>, _offset: u64) -> Result<usize, FsError> {
        match transfer {
            Transfer::Read(buf) => {
                let mut count = 0;
                for slot in buf.iter_mut() {
                    match self.device.getchar() {
                        Some(byte) => *slot = byte,
                        None => break,
                    }
                    count += 1;
                }
                Ok(count)
            }
            Transfer::Write(buf) => {
                self.device.write_bytes(buf);
                Ok(buf.len())
            }
        }
    }
}

/// A whole block device addressed by byte offset.
pub struct DiskNode {
    device: Arc<dyn BlockDevice>,
}

impl DiskNode {
    pub fn new(device: Arc<dyn BlockDevice>) -> Self {
        Self { device }
    }
}

impl FileNode for DiskNode {
    fn mode(&self) -> StatMode {
        StatMode::IFBLK | StatMode::IRUSR | StatMode::IWUSR
    }

    fn size(&self) -> u64 {
        self.device.capacity()
    }

    fn block_size(&self) -> u32 {
        self.device.block_size() as u32
    }

    fn request(&self, transfer: Transfer<'_>, offset: u64) -> Result<usize, FsError> {
        let capacity = self.device.capacity();
        if offset >= capacity {
            return Ok(0);
        }
        let block_size = self.device.block_size();
        let len = core::cmp::min(transfer.len() as u64, capacity - offset) as usize;
        let mut scratch = vec![0u8; block_size];
        let mut done = 0;

        match transfer {
            Transfer::Read(buf) => {
                while done < len {
                    let pos = offset as usize + done;
                    let (block, within) = (pos / block_size, pos % block_size);
                    let chunk = core::cmp::min(block_size - within, len - done);
                    self.device.read_block(block, &mut scratch)?;
                    buf[done..done + chunk].copy_from_slice(&scratch[within..within + chunk]);
                    done += chunk;
                }
            }
            Transfer::Write(buf) => {
                while done < len {
                    let pos = offset as usize + done;
                    let (block, within) = (pos / block_size, pos % block_size);
                    let chunk = core::cmp::min(block_size - within, len - done);
                    // partial blocks need read-modify-write
                    if chunk != block_size {
                        self.device.read_block(block, &mut scratch)?;
                    }
                    scratch[within..within + chunk].copy_from_slice(&buf[done..done + chunk]);
                    self.device.write_block(block, &scratch)?;
                    done += chunk;
                }
            }
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::RamDisk;

    #[test]
    fn null_reads_nothing() {
        let mut buf = [7u8; 4];
        assert_eq!(NullNode.request(Transfer::Read(&mut buf), 0), Ok(0));
        assert_eq!(buf, [7; 4]);
    }

    #[test]
    fn zero_fills() {
        let mut buf = [7u8; 4];
        assert_eq!(ZeroNode.request(Transfer::Read(&mut buf), 0), Ok(4));
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn disk_reads_across_block_boundaries() {
        let disk = Arc::new(RamDisk::new(8, 4));
        disk.write_block(0, &[1; 8]).unwrap();
        disk.write_block(1, &[2; 8]).unwrap();
        let node = DiskNode::new(disk);

        let mut buf = [0u8; 6];
        assert_eq!(node.request(Transfer::Read(&mut buf), 5), Ok(6));
        assert_eq!(buf, [1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn disk_write_preserves_neighbours() {
        let disk = Arc::new(RamDisk::new(8, 2));
        let node = DiskNode::new(disk.clone());
        assert_eq!(node.request(Transfer::Write(&[9, 9]), 7), Ok(2));

        let mut block = [0u8; 8];
        disk.read_block(0, &mut block).unwrap();
        assert_eq!(block, [0, 0, 0, 0, 0, 0, 0, 9]);
        disk.read_block(1, &mut block).unwrap();
        assert_eq!(block, [9, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn disk_transfers_stop_at_capacity() {
        let node = DiskNode::new(Arc::new(RamDisk::new(8, 2)));
        let mut buf = [0u8; 8];
        assert_eq!(node.request(Transfer::Read(&mut buf), 12), Ok(4));
        assert_eq!(node.request(Transfer::Read(&mut buf), 16), Ok(0));
    }
}
