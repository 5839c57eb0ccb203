//! Trap frame shared by the trap vector and the syscall layer
//!
//! The vector itself (register save/restore, `scause` decoding) is part of
//! the boot image; what it hands the kernel is a [`TrapFrame`] and a
//! [`TrapCause`](crate::TrapCause).

pub mod context;

pub use context::{reg, TrapFrame};
