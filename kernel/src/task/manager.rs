//! Process Table
//!
//! Fixed arena of process slots; a pid is the index of its slot

use super::process::{Process, ProcessStatus};
use super::{Pid, ROOT_PID};
use crate::config::MAX_PROCS;
use crate::trap::TrapFrame;

pub struct ProcessTable {
    slots: [Option<Process>; MAX_PROCS],
    current: Option<Pid>,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            slots: [const { None }; MAX_PROCS],
            current: None,
        }
    }

    /// Places a new process in the lowest free slot; `None` when the table is full.
    pub fn spawn(&mut self, parent: Option<Pid>, context: TrapFrame) -> Option<Pid> {
        let pid = self.slots.iter().position(Option::is_none)?;
        self.slots[pid] = Some(Process::new(pid, parent, context));
        Some(pid)
    }

    /// Frees the slot of a zombie, handing its children to the root.
    pub fn reap(&mut self, pid: Pid) -> Option<Process> {
        if !self.get(pid)?.is_zombie() {
            return None;
        }
        let process = self.slots[pid].take()?;
        for child in self.slots.iter_mut().flatten() {
            if child.parent == Some(pid) {
                child.parent = Some(ROOT_PID);
            }
        }
        if self.current == Some(pid) {
            self.current = None;
        }
        Some(process)
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.slots.get(pid)?.as_ref()
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.slots.get_mut(pid)?.as_mut()
    }

    /// Process that a signal or `kill` may still target.
    pub fn get_live_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.get_mut(pid).filter(|p| !p.is_zombie())
    }

    pub fn current_pid(&self) -> Option<Pid> {
        self.current
    }

    pub fn set_current(&mut self, pid: Option<Pid>) {
        self.current = pid;
    }

    pub fn current(&self) -> Option<&Process> {
        self.get(self.current?)
    }

    pub fn current_mut(&mut self) -> Option<&mut Process> {
        let pid = self.current?;
        self.get_mut(pid)
    }

    /// Next `Ready` process after `start`, wrapping around to `start` itself last.
    pub fn find_next_ready(&self, start: Pid) -> Option<Pid> {
        let len = self.slots.len();
        (0..len)
            .map(|i| (start + i + 1) % len)
            .find(|&idx| matches!(&self.slots[idx], Some(p) if p.status == ProcessStatus::Ready))
    }

    pub fn mark_zombie(&mut self, pid: Pid, exit_code: i32) {
        if let Some(process) = self.get_mut(pid) {
            process.status = ProcessStatus::Zombie;
            process.exit_code = exit_code;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.slots.iter().flatten()
    }

    pub fn children(&self, pid: Pid) -> impl Iterator<Item = &Process> {
        self.iter().filter(move |p| p.parent == Some(pid))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn has_runnable(&self) -> bool {
        self.iter().any(|p| p.status != ProcessStatus::Zombie)
    }
}
