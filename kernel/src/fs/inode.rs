//! Reference-counted inode arena
//!
//! Descriptors hold an [`InodeId`], never the inode itself. Every descriptor
//! slot that names an inode accounts for exactly one reference, in whichever
//! process it lives, and the inode is destroyed when the last one goes.

use super::node::FileNode;
use super::FsError;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use kairos_abi::Stat;

/// Stable index of a live inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InodeId(pub(crate) usize);

impl InodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub struct Inode {
    ino: u64,
    path: String,
    node: Arc<dyn FileNode>,
    refs: usize,
}

impl Inode {
    pub fn ino(&self) -> u64 {
        self.ino
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn refs(&self) -> usize {
        self.refs
    }

    pub fn node(&self) -> &Arc<dyn FileNode> {
        &self.node
    }

    pub fn stat(&self) -> Stat {
        let size = self.node.size();
        let blksize = self.node.block_size();
        Stat {
            ino: self.ino,
            mode: self.node.mode().bits(),
            nlink: self.refs as u32,
            size,
            blksize,
            _pad: 0,
            blocks: size.div_ceil(512),
        }
    }
}

pub struct InodeTable {
    slots: Vec<Option<Inode>>,
    next_ino: u64,
}

impl InodeTable {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, next_ino: 1 }
    }

    pub fn get(&self, id: InodeId) -> Option<&Inode> {
        self.slots.get(id.0)?.as_ref()
    }

    /// Live inode already standing for `path`.
    pub fn find(&self, path: &str) -> Option<InodeId> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|inode| inode.path == path))
            .map(InodeId)
    }

    /// Creates an unreferenced inode, evicting another unreferenced one if full.
    pub fn insert(&mut self, path: &str, node: Arc<dyn FileNode>) -> Result<InodeId, FsError> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .or_else(|| {
                self.slots
                    .iter()
                    .position(|slot| slot.as_ref().is_some_and(|inode| inode.refs == 0))
            })
            .ok_or(FsError::NoSpace)?;

        let ino = self.next_ino;
        self.next_ino += 1;
        self.slots[index] = Some(Inode {
            ino,
            path: String::from(path),
            node,
            refs: 0,
        });
        Ok(InodeId(index))
    }

    pub fn acquire(&mut self, id: InodeId) -> Result<usize, FsError> {
        let inode = self.get_mut(id)?;
        inode.refs += 1;
        Ok(inode.refs)
    }

    /// Drops one reference; returns the count left, destroying the inode at zero.
    pub fn release(&mut self, id: InodeId) -> Result<usize, FsError> {
        let inode = self.get_mut(id)?;
        if inode.refs == 0 {
            return Err(FsError::NotReferenced);
        }
        inode.refs -= 1;
        let left = inode.refs;
        if left == 0 {
            self.slots[id.0] = None;
        }
        Ok(left)
    }

    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn get_mut(&mut self, id: InodeId) -> Result<&mut Inode, FsError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(FsError::StaleHandle)
    }
}
