//! Process Control Block
//!
//! Defines the per-process state the syscall layer operates on

use super::fd::FdTable;
use super::Pid;
use crate::config::{USER_BASE, USER_STACK_SIZE, USER_STACK_TOP};
use crate::signal::SignalState;
use crate::trap::TrapFrame;

/// Process State
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    Ready,
    Running,
    Zombie,
}

/// Heap and stack boundaries of a process's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBounds {
    /// First byte past the loaded image
    pub end_data: usize,
    /// Current program break
    pub brk: usize,
    pub stack_top: usize,
    pub stack_size: usize,
}

impl Default for MemoryBounds {
    fn default() -> Self {
        Self {
            end_data: USER_BASE,
            brk: USER_BASE,
            stack_top: USER_STACK_TOP,
            stack_size: USER_STACK_SIZE,
        }
    }
}

impl MemoryBounds {
    /// Lowest stack address; the heap must stay below it.
    pub fn heap_limit(&self) -> usize {
        self.stack_top - self.stack_size
    }

    /// Moves the break if `new` lies in `[end_data, heap_limit)`; returns the break either way.
    pub fn set_brk(&mut self, new: usize) -> usize {
        if new >= self.end_data && new < self.heap_limit() {
            self.brk = new;
        }
        self.brk
    }

    /// Resets the heap to start at `end_data`.
    pub fn reset_data(&mut self, end_data: usize) {
        self.end_data = end_data;
        self.brk = end_data;
    }
}

pub struct Process {
    pub pid: Pid,
    /// Non-owning; `None` only for the root
    pub parent: Option<Pid>,
    pub status: ProcessStatus,
    pub exit_code: i32,
    /// User registers while the process is not on the hart
    pub context: TrapFrame,
    pub entry: usize,
    pub memory: MemoryBounds,
    pub fds: FdTable,
    pub signals: SignalState,
}

impl Process {
    pub fn new(pid: Pid, parent: Option<Pid>, context: TrapFrame) -> Self {
        Self {
            pid,
            parent,
            status: ProcessStatus::Ready,
            exit_code: 0,
            context,
            entry: context.sepc,
            memory: MemoryBounds::default(),
            fds: FdTable::new(),
            signals: SignalState::new(),
        }
    }

    pub fn is_zombie(&self) -> bool {
        self.status == ProcessStatus::Zombie
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Parent pid as `getppid` reports it.
    pub fn ppid(&self) -> Pid {
        self.parent.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brk_moves_only_inside_the_heap_window() {
        let mut bounds = MemoryBounds {
            end_data: 0x1000,
            brk: 0x1000,
            stack_top: 0x9000,
            stack_size: 0x1000,
        };
        assert_eq!(bounds.set_brk(0x2000), 0x2000);
        assert_eq!(bounds.set_brk(0xfff), 0x2000);
        assert_eq!(bounds.set_brk(0x8000), 0x2000);
        assert_eq!(bounds.set_brk(0x7fff), 0x7fff);
        assert_eq!(bounds.set_brk(0x1000), 0x1000);
    }

    #[test]
    fn fresh_process_is_ready_with_an_empty_fd_table() {
        let process = Process::new(3, Some(0), TrapFrame::user_entry(0x8100_0000, 0x8180_0000));
        assert_eq!(process.status, ProcessStatus::Ready);
        assert_eq!(process.entry, 0x8100_0000);
        assert_eq!(process.fds.open_count(), 0);
        assert_eq!(process.ppid(), 0);
        assert!(!process.is_root());
    }
}
