//! Kairos system call ABI
//!
//! Everything the kernel and user programs must agree on bit-for-bit: the
//! syscall numbering, errno values, the `stat` record, the `sigaction` record
//! and the signal numbers. The kernel's dispatcher and the user stub in
//! `user_lib` both build on this crate.

#![cfg_attr(not(test), no_std)]

mod errno;
mod signal;
mod stat;
mod sysno;

pub use errno::{decode_result, Errno};
pub use signal::*;
pub use stat::{Stat, StatMode};
pub use sysno::Sysno;

/// Maximum open descriptors per process.
pub const MAX_FDS: usize = 4;
