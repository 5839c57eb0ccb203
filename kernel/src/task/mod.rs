//! Process management module

mod fd;
mod manager;
mod process;
mod scheduler;

pub use fd::FdTable;
pub use manager::ProcessTable;
pub use process::{MemoryBounds, Process, ProcessStatus};
pub use scheduler::Scheduler;

/// Process id: the index of the process's slot in the [`ProcessTable`].
pub type Pid = usize;

/// The root process; it has no parent and adopts orphans.
pub const ROOT_PID: Pid = 0;
