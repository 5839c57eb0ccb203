//! System call handling module
//!
//! A user program puts the call number in `a7` and up to six arguments in
//! `a0..a5`, then executes `ecall`. [`dispatch`] looks the number up in the
//! syscall table, runs the handler against the kernel context, and writes the
//! result back into `a0`: the value itself on success, the negated errno on
//! failure. Nothing else in the frame is touched here.

mod device;
mod fs;
mod process;
mod signal;

use crate::kernel::Kernel;
use crate::trap::TrapFrame;
use kairos_abi::{Errno, Sysno};
use log::{debug, trace};

pub type SyscallResult = Result<usize, Errno>;

/// A syscall handler. It sees the frame read-only; the result goes to `a0`.
pub type Handler = fn(&mut Kernel, &TrapFrame) -> SyscallResult;

/// The syscall table.
pub fn handler_for(sysno: Sysno) -> Handler {
    match sysno {
        Sysno::Init => process::sys_init,
        Sysno::Fork => process::sys_fork,
        Sysno::TestFork => process::sys_test_fork,
        Sysno::Getpid => process::sys_getpid,
        Sysno::Getppid => process::sys_getppid,
        Sysno::CharTest => device::sys_char_test,
        Sysno::BlockTest => device::sys_block_test,
        Sysno::Open => fs::sys_open,
        Sysno::Close => fs::sys_close,
        Sysno::Stat => fs::sys_stat,
        Sysno::Read => fs::sys_read,
        Sysno::Reset => device::sys_reset,
        Sysno::Brk => process::sys_brk,
        Sysno::Sigaction => signal::sys_sigaction,
        Sysno::Kill => signal::sys_kill,
        Sysno::Exit => process::sys_exit,
        Sysno::Sigreturn => signal::sys_sigreturn,
    }
}

/// Register encoding of a handler result.
pub fn encode(result: SyscallResult) -> isize {
    match result {
        Ok(value) => {
            debug_assert!(value as isize >= 0, "syscall returned {:#x}", value);
            value as isize
        }
        Err(errno) => errno.as_return(),
    }
}

fn invoke(kernel: &mut Kernel, tf: &TrapFrame, sysno: Sysno) -> isize {
    trace!("[syscall] {}{:x?}", sysno.name(), tf.args());
    let result = handler_for(sysno)(kernel, tf);
    if let Err(errno) = result {
        debug!("[syscall] {} -> {}", sysno.name(), errno);
    }
    encode(result)
}

/// Runs the syscall named by `tf` and stores its result in `a0`.
///
/// # Panics
///
/// On a number outside the table, and on `init` (0), which user mode may not
/// issue. Either means the caller broke the ABI.
pub fn dispatch(kernel: &mut Kernel, tf: &mut TrapFrame) {
    let number = tf.syscall_number();
    let Some(sysno) = Sysno::from_user(number) else {
        panic!("[syscall] invalid syscall number {}", number);
    };
    let ret = invoke(kernel, tf, sysno);
    tf.set_result(ret);
}

/// Runs the reserved `init` call on behalf of the boot code.
pub fn bootstrap(kernel: &mut Kernel, tf: &mut TrapFrame) {
    let ret = invoke(kernel, tf, Sysno::Init);
    tf.set_result(ret);
}
