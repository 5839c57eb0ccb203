//! Kairos user library
//!
//! Thin wrappers over the syscall table. Every wrapper returns what
//! [`syscall`] returns: the kernel's value, or -1 with [`errno`] set.

#![no_std]

mod lang_items;
mod syscall;

use core::ffi::CStr;
use kairos_abi::{SaFlags, SigAction, Stat, Sysno};

pub use kairos_abi::{Errno, SIGCHLD, SIGKILL, SIGTERM, SIGUSR1, SIGUSR2, SIG_DFL, SIG_IGN};
pub use syscall::{errno, syscall};

use syscall::call;

pub fn fork() -> isize {
    call(Sysno::Fork, [0; 6])
}

/// Asks the kernel to log `value` as the caller sees it.
pub fn test_fork(value: usize) -> isize {
    call(Sysno::TestFork, [value, 0, 0, 0, 0, 0])
}

pub fn getpid() -> isize {
    call(Sysno::Getpid, [0; 6])
}

pub fn getppid() -> isize {
    call(Sysno::Getppid, [0; 6])
}

/// Writes `ch` to the console.
pub fn putchar(ch: u8) {
    // a zero byte would read instead of write
    if ch != 0 {
        call(Sysno::CharTest, [ch as usize, 0, 0, 0, 0, 0]);
    }
}

/// Reads one pending console byte, if any.
pub fn getchar() -> Option<u8> {
    let ret = call(Sysno::CharTest, [0; 6]);
    (ret >= 0).then_some(ret as u8)
}

pub fn block_test() -> isize {
    call(Sysno::BlockTest, [0; 6])
}

pub fn open(path: &CStr) -> isize {
    call(Sysno::Open, [path.as_ptr() as usize, 0, 0, 0, 0, 0])
}

pub fn close(fd: usize) -> isize {
    call(Sysno::Close, [fd, 0, 0, 0, 0, 0])
}

pub fn stat(fd: usize, out: &mut Stat) -> isize {
    call(Sysno::Stat, [fd, out as *mut Stat as usize, 0, 0, 0, 0])
}

/// Fills `buf` from offset 0 of `fd`. Succeeds with 0 even when the device
/// could not deliver.
pub fn read(fd: usize, buf: &mut [u8]) -> isize {
    call(Sysno::Read, [fd, buf.as_mut_ptr() as usize, buf.len(), 0, 0, 0])
}

/// 0 shuts down, 1 cold-reboots, 2 warm-reboots.
pub fn reset(kind: usize) -> isize {
    call(Sysno::Reset, [kind, 0, 0, 0, 0, 0])
}

/// Moves the program break; returns the break in effect afterwards.
pub fn brk(addr: usize) -> isize {
    call(Sysno::Brk, [addr, 0, 0, 0, 0, 0])
}

pub fn sigaction(signum: usize, new: Option<&SigAction>, old: Option<&mut SigAction>) -> isize {
    let new = new.map_or(0, |action| action as *const SigAction as usize);
    let old = old.map_or(0, |action| action as *mut SigAction as usize);
    call(Sysno::Sigaction, [signum, new, old, 0, 0, 0])
}

/// Installs `handler` for `signum`, returning through [`sigreturn`].
pub fn signal(signum: usize, handler: extern "C" fn(usize)) -> isize {
    let action = SigAction {
        handler: handler as usize,
        flags: SaFlags::RESTORER,
        restorer: restorer as usize,
        mask: 0,
    };
    sigaction(signum, Some(&action), None)
}

pub fn kill(pid: usize, signum: usize) -> isize {
    call(Sysno::Kill, [pid, signum, 0, 0, 0, 0])
}

pub fn exit(code: i32) -> ! {
    call(Sysno::Exit, [code as usize, 0, 0, 0, 0, 0]);
    unreachable!("exit returned")
}

pub fn sigreturn() -> isize {
    call(Sysno::Sigreturn, [0; 6])
}

/// Where signal handlers return to.
extern "C" fn restorer() -> ! {
    sigreturn();
    unreachable!("sigreturn returned")
}

struct Stdout;

impl core::fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        s.bytes().for_each(putchar);
        Ok(())
    }
}

pub fn _print(args: core::fmt::Arguments) {
    use core::fmt::Write;
    let _ = Stdout.write_fmt(args);
}

/// Print macro (like std::print!)
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::_print(core::format_args!($($arg)*))
    };
}

/// Println macro (like std::println!)
#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::print!("{}\n", core::format_args!($($arg)*))
    };
}

#[no_mangle]
#[link_section = ".text.entry"]
pub extern "C" fn _start() -> ! {
    extern "Rust" {
        fn main() -> i32;
    }
    exit(unsafe { main() })
}
