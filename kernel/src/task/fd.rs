//! Per-process descriptor table

use crate::config::MAX_FDS;
use crate::fs::InodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FdTable {
    slots: [Option<InodeId>; MAX_FDS],
}

impl FdTable {
    pub const fn new() -> Self {
        Self {
            slots: [None; MAX_FDS],
        }
    }

    /// Lowest empty slot.
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Inode behind `fd`; `None` when out of range or empty.
    pub fn get(&self, fd: usize) -> Option<InodeId> {
        self.slots.get(fd).copied().flatten()
    }

    pub fn install(&mut self, fd: usize, id: InodeId) {
        self.slots[fd] = Some(id);
    }

    /// Empties `fd`, handing back what it held.
    pub fn take(&mut self, fd: usize) -> Option<InodeId> {
        self.slots.get_mut(fd).and_then(Option::take)
    }

    /// Live entries with their descriptor numbers.
    pub fn iter(&self) -> impl Iterator<Item = (usize, InodeId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(fd, slot)| slot.map(|id| (fd, id)))
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_free_slot_first() {
        let mut fds = FdTable::new();
        assert_eq!(fds.first_free(), Some(0));
        fds.install(0, InodeId(5));
        fds.install(2, InodeId(6));
        assert_eq!(fds.first_free(), Some(1));
        fds.install(1, InodeId(5));
        fds.install(3, InodeId(7));
        assert_eq!(fds.first_free(), None);
        assert_eq!(fds.open_count(), MAX_FDS);
    }

    #[test]
    fn take_empties_once() {
        let mut fds = FdTable::new();
        fds.install(1, InodeId(2));
        assert_eq!(fds.take(1), Some(InodeId(2)));
        assert_eq!(fds.take(1), None);
        assert_eq!(fds.take(MAX_FDS), None);
        assert_eq!(fds.get(MAX_FDS + 10), None);
    }
}
