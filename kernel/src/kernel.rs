//! Kernel context
//!
//! Everything a syscall handler may touch, gathered in one value that is
//! passed down by `&mut`. The boot code keeps the only instance behind a lock
//! and takes it once per trap.

use crate::config::{CLOCK_FREQ, INODE_CAPACITY, TICKS_PER_SEC};
use crate::drivers::{BlockDevice, CharDevice};
use crate::firmware::Firmware;
use crate::fs::{ConsoleNode, DiskNode, NullNode, Vfs, ZeroNode};
use crate::loader::UserImage;
use crate::syscall;
use crate::task::{FdTable, Pid, Process, ProcessStatus, ProcessTable, Scheduler};
use crate::trap::TrapFrame;
use alloc::sync::Arc;
use kairos_abi::{Errno, SIGCHLD};
use log::{info, warn};

/// Device capabilities the kernel is built over.
#[derive(Clone)]
pub struct Devices {
    pub console: Arc<dyn CharDevice>,
    pub disk: Arc<dyn BlockDevice>,
    pub firmware: Arc<dyn Firmware>,
}

/// Why the hart left user mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    /// `ecall` from user mode
    Syscall,
    /// Supervisor timer interrupt; `now` is the current `time` CSR value
    Timer { now: u64 },
    /// Any exception the kernel cannot service
    Fault { scause: usize, stval: usize },
}

/// What the trap vector does once the kernel is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Return to the frame that was handed in
    User,
    /// No process is left to run
    Halt,
}

pub struct Kernel {
    pub procs: ProcessTable,
    pub vfs: Vfs,
    pub scheduler: Scheduler,
    pub devices: Devices,
    init_elf: &'static [u8],
    loaded: Option<UserImage>,
}

impl Kernel {
    pub fn new(devices: Devices) -> Self {
        let mut vfs = Vfs::new(INODE_CAPACITY);
        vfs.register("/dev/null", Arc::new(NullNode));
        vfs.register("/dev/zero", Arc::new(ZeroNode));
        vfs.register("/dev/console", Arc::new(ConsoleNode::new(devices.console.clone())));
        vfs.register("/dev/disk0", Arc::new(DiskNode::new(devices.disk.clone())));
        Self {
            procs: ProcessTable::new(),
            vfs,
            scheduler: Scheduler::new(),
            devices,
            init_elf: &[],
            loaded: None,
        }
    }

    /// Registers the ELF the reserved `init` syscall loads.
    pub fn set_init_image(&mut self, elf: &'static [u8]) {
        self.init_elf = elf;
    }

    pub fn init_image(&self) -> &'static [u8] {
        self.init_elf
    }

    /// Hands the last image `init` parsed to the boot code for copying.
    pub fn take_loaded_image(&mut self) -> Option<UserImage> {
        self.loaded.take()
    }

    pub(crate) fn set_loaded_image(&mut self, image: UserImage) {
        self.loaded = Some(image);
    }

    /// Creates the root process and makes it current.
    pub fn spawn_root(&mut self, context: TrapFrame) -> Option<Pid> {
        let pid = self.procs.spawn(None, context)?;
        self.run(pid);
        info!("[task] root process {} created", pid);
        Some(pid)
    }

    fn run(&mut self, pid: Pid) {
        if let Some(process) = self.procs.get_mut(pid) {
            process.status = ProcessStatus::Running;
        }
        self.procs.set_current(Some(pid));
    }

    pub fn current_pid(&self) -> Result<Pid, Errno> {
        self.procs.current_pid().ok_or(Errno::ESRCH)
    }

    pub fn current(&self) -> Result<&Process, Errno> {
        self.procs.current().ok_or(Errno::ESRCH)
    }

    pub fn current_mut(&mut self) -> Result<&mut Process, Errno> {
        self.procs.current_mut().ok_or(Errno::ESRCH)
    }

    /// Duplicates the current process; `tf` is its live frame.
    ///
    /// The child resumes from the same point with `a0 = 0`. Memory is not
    /// copied: every process runs identity-mapped in one address space.
    pub fn fork(&mut self, tf: &TrapFrame) -> Result<Pid, Errno> {
        let parent_pid = self.current_pid()?;
        let parent = self.current()?;
        let (fds, memory, entry, signals) = (
            parent.fds,
            parent.memory,
            parent.entry,
            parent.signals.inherit(),
        );

        let mut taken = FdTable::default();
        for (fd, id) in fds.iter() {
            if let Err(err) = self.vfs.ref_inode(id) {
                self.release_descriptors(&taken);
                return Err(err.into());
            }
            taken.install(fd, id);
        }

        let mut context = *tf;
        context.set_result(0);
        let Some(child_pid) = self.procs.spawn(Some(parent_pid), context) else {
            self.release_descriptors(&taken);
            return Err(Errno::EAGAIN);
        };
        if let Some(child) = self.procs.get_mut(child_pid) {
            child.fds = fds;
            child.memory = memory;
            child.entry = entry;
            child.signals = signals;
        }
        info!("[task] process {} forked child {}", parent_pid, child_pid);
        Ok(child_pid)
    }

    /// Terminates `pid`: drops its descriptors, makes it a zombie and tells
    /// the parent. Zombie children it leaves behind are reaped right away.
    pub fn exit(&mut self, pid: Pid, code: i32) {
        let Some(process) = self.procs.get_mut(pid) else {
            return;
        };
        if process.is_zombie() {
            return;
        }
        let fds = core::mem::take(&mut process.fds);
        process.signals.clear_pending();
        let parent = process.parent;

        self.release_descriptors(&fds);
        self.procs.mark_zombie(pid, code);
        info!("[task] process {} exited with code {}", pid, code);

        let orphans: alloc::vec::Vec<Pid> = self
            .procs
            .children(pid)
            .filter(|child| child.is_zombie())
            .map(|child| child.pid)
            .collect();
        for orphan in orphans {
            self.reap(orphan);
        }
        if let Some(parent) = parent.and_then(|ppid| self.procs.get_live_mut(ppid)) {
            parent.signals.raise(SIGCHLD);
        }
    }

    fn release_descriptors(&mut self, fds: &FdTable) {
        for (fd, id) in fds.iter() {
            if let Err(err) = self.vfs.free_inode(id) {
                warn!("[task] descriptor {} left inode {}: {}", fd, id.index(), err);
            }
        }
    }

    /// Releases a zombie's slot and returns its exit code.
    pub fn reap(&mut self, pid: Pid) -> Option<i32> {
        let process = self.procs.reap(pid)?;
        info!("[task] process {} reaped", pid);
        Some(process.exit_code)
    }

    /// Entry from the trap vector. `tf` is the current process's live frame.
    pub fn handle_trap(&mut self, tf: &mut TrapFrame, cause: TrapCause) -> Resume {
        match cause {
            TrapCause::Syscall => {
                tf.skip_ecall();
                syscall::dispatch(self, tf);
            }
            TrapCause::Timer { now } => {
                self.devices
                    .firmware
                    .set_timer(now + (CLOCK_FREQ / TICKS_PER_SEC) as u64);
                if self.scheduler.tick() {
                    self.yield_current(tf);
                }
            }
            TrapCause::Fault { scause, stval } => {
                if let Ok(pid) = self.current_pid() {
                    warn!(
                        "[task] process {} fault: scause={:#x} stval={:#x} sepc={:#x}",
                        pid, scause, stval, tf.sepc
                    );
                    self.exit(pid, -1);
                }
            }
        }
        self.trap_return(tf)
    }

    /// Runs on every way back to user mode: moves off dead processes and
    /// delivers signals to whichever process ends up current.
    pub fn trap_return(&mut self, tf: &mut TrapFrame) -> Resume {
        loop {
            let current = self.procs.current_pid();
            let runnable = current
                .and_then(|pid| self.procs.get(pid))
                .is_some_and(|p| !p.is_zombie());
            if !runnable {
                let start = current.unwrap_or(0);
                match self.scheduler.schedule_next(start, &self.procs) {
                    Some(next) => self.switch_to(tf, next),
                    None => {
                        info!("[task] no runnable process left");
                        self.procs.set_current(None);
                        return Resume::Halt;
                    }
                }
                continue;
            }

            let Some(pid) = current else {
                return Resume::Halt;
            };
            let Some(process) = self.procs.get_mut(pid) else {
                return Resume::Halt;
            };
            match process.signals.deliver(tf) {
                Some(code) => self.exit(pid, code),
                None => return Resume::User,
            }
        }
    }

    /// Round-robin to the next ready process, if any.
    pub fn yield_current(&mut self, tf: &mut TrapFrame) {
        let Some(pid) = self.procs.current_pid() else {
            return;
        };
        if let Some(next) = self.scheduler.schedule_next(pid, &self.procs) {
            self.switch_to(tf, next);
        }
    }

    /// Parks the current process (unless dead) and loads `next` into `tf`.
    fn switch_to(&mut self, tf: &mut TrapFrame, next: Pid) {
        if let Some(current) = self.procs.current_mut() {
            if !current.is_zombie() {
                current.context = *tf;
                current.status = ProcessStatus::Ready;
            }
        }
        if let Some(process) = self.procs.get(next) {
            *tf = process.context;
        }
        self.run(next);
    }
}
