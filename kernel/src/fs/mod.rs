//! File system layer
//!
//! There is no namespace beyond a flat registry of device paths. Opening a
//! path resolves it to an inode in the [`InodeTable`]; descriptor tables then
//! hold [`InodeId`]s and account for references through [`Vfs::ref_inode`] and
//! [`Vfs::free_inode`].

mod inode;
mod node;

pub use inode::{Inode, InodeId, InodeTable};
pub use node::{ConsoleNode, DiskNode, FileNode, NullNode, Transfer, ZeroNode};

use crate::drivers::DeviceError;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::fmt;
use kairos_abi::{Errno, Stat};
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// No object is registered under the path
    NotFound,
    /// Every inode slot is referenced
    NoSpace,
    /// The inode id names no live inode
    StaleHandle,
    /// Release of an inode nobody holds
    NotReferenced,
    Device(DeviceError),
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::NotFound => f.write_str("no such path"),
            FsError::NoSpace => f.write_str("inode table full"),
            FsError::StaleHandle => f.write_str("stale inode handle"),
            FsError::NotReferenced => f.write_str("inode has no references"),
            FsError::Device(err) => write!(f, "device: {}", err),
        }
    }
}

impl From<DeviceError> for FsError {
    fn from(err: DeviceError) -> Self {
        FsError::Device(err)
    }
}

impl From<FsError> for Errno {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound => Errno::ENOENT,
            FsError::NoSpace => Errno::EAGAIN,
            FsError::StaleHandle | FsError::NotReferenced => Errno::EBADF,
            FsError::Device(_) => Errno::EIO,
        }
    }
}

pub struct Vfs {
    registry: BTreeMap<&'static str, Arc<dyn FileNode>>,
    inodes: InodeTable,
}

impl Vfs {
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: BTreeMap::new(),
            inodes: InodeTable::new(capacity),
        }
    }

    /// Makes `node` reachable under `path`.
    pub fn register(&mut self, path: &'static str, node: Arc<dyn FileNode>) {
        debug!("[fs] register {}", path);
        self.registry.insert(path, node);
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.keys().copied()
    }

    /// Resolves `path` to an inode without taking a reference.
    ///
    /// A path that already has a live inode resolves to it, so every holder
    /// of the same path shares one reference count.
    pub fn get_inode(&mut self, path: &str) -> Result<InodeId, FsError> {
        if let Some(id) = self.inodes.find(path) {
            return Ok(id);
        }
        let node = self.registry.get(path).ok_or(FsError::NotFound)?.clone();
        self.inodes.insert(path, node)
    }

    pub fn ref_inode(&mut self, id: InodeId) -> Result<usize, FsError> {
        let refs = self.inodes.acquire(id)?;
        debug!("[fs] ref inode {} -> {}", id.index(), refs);
        Ok(refs)
    }

    /// Drops one reference, destroying the inode when none are left.
    pub fn free_inode(&mut self, id: InodeId) -> Result<usize, FsError> {
        match self.inodes.release(id) {
            Ok(0) => {
                debug!("[fs] inode {} destroyed", id.index());
                Ok(0)
            }
            Ok(refs) => {
                debug!("[fs] unref inode {} -> {}", id.index(), refs);
                Ok(refs)
            }
            Err(err) => {
                warn!("[fs] free of inode {}: {}", id.index(), err);
                Err(err)
            }
        }
    }

    /// Current reference count; 0 for a destroyed inode.
    pub fn refs(&self, id: InodeId) -> usize {
        self.inodes.get(id).map_or(0, Inode::refs)
    }

    pub fn inode(&self, id: InodeId) -> Option<&Inode> {
        self.inodes.get(id)
    }

    pub fn live_inodes(&self) -> usize {
        self.inodes.live()
    }

    pub fn stat(&self, id: InodeId) -> Result<Stat, FsError> {
        self.inodes
            .get(id)
            .map(Inode::stat)
            .ok_or(FsError::StaleHandle)
    }

    pub fn request(&self, id: InodeId, transfer: Transfer<'_>, offset: u64) -> Result<usize, FsError> {
        let inode = self.inodes.get(id).ok_or(FsError::StaleHandle)?;
        inode.node().request(transfer, offset)
    }
}
