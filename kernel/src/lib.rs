//! Kairos kernel core
//!
//! A trap-dispatched syscall layer over a process table, a reference-counted
//! inode layer and per-process signal state. Hardware is reached only through
//! the [`drivers`] and [`firmware`] traits, so the whole core runs under
//! `cargo test` on the host; `main.rs` supplies the RISC-V side.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod drivers;
pub mod firmware;
pub mod fs;
pub mod kernel;
pub mod loader;
pub mod signal;
pub mod syscall;
pub mod task;
#[cfg(any(test, feature = "testing"))]
#[doc(hidden)]
pub mod testing;
pub mod trap;
pub mod uaccess;

pub use kernel::{Devices, Kernel, Resume, TrapCause};
pub use trap::TrapFrame;
