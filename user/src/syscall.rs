//! The `ecall` stub and the `errno` side channel

use core::arch::asm;
use core::sync::atomic::{AtomicUsize, Ordering};
use kairos_abi::{decode_result, Sysno};

/// Error code of the last failed syscall. Forked children share it, since
/// they share the parent's memory.
static ERRNO: AtomicUsize = AtomicUsize::new(0);

/// Error code left by the most recent failing syscall.
pub fn errno() -> usize {
    ERRNO.load(Ordering::Relaxed)
}

/// Issues syscall `id`.
///
/// Returns the kernel's value, or -1 with the error code stored in
/// [`errno`].
///
/// # Panics
///
/// If `id` is 0 (reserved for the kernel) or past the end of the table.
pub fn syscall(id: usize, args: [usize; 6]) -> isize {
    if id == 0 || id >= Sysno::COUNT {
        panic!("syscall {} is not in the table", id);
    }
    let ret: isize;
    unsafe {
        asm!(
            "ecall",
            inlateout("a0") args[0] => ret,
            in("a1") args[1],
            in("a2") args[2],
            in("a3") args[3],
            in("a4") args[4],
            in("a5") args[5],
            in("a7") id,
        );
    }
    match decode_result(ret) {
        Ok(value) => value as isize,
        Err(code) => {
            ERRNO.store(code, Ordering::Relaxed);
            -1
        }
    }
}

#[inline(always)]
pub(crate) fn call(sysno: Sysno, args: [usize; 6]) -> isize {
    syscall(sysno.raw(), args)
}
