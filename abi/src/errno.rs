//! Error numbers and the negative-return convention
//!
//! Handlers fail by returning a negated errno in `a0`. Nothing in the kernel
//! reinterprets that value; the user stub is the only place that turns it into
//! `errno` plus a `-1` sentinel.

use core::fmt;

/// Error numbers (Linux values).
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    /// Operation not permitted
    EPERM = 1,
    /// No such file or directory
    ENOENT = 2,
    /// No such process
    ESRCH = 3,
    /// I/O error
    EIO = 5,
    /// Exec format error
    ENOEXEC = 8,
    /// Bad file descriptor
    EBADF = 9,
    /// Try again
    EAGAIN = 11,
    /// Bad address
    EFAULT = 14,
    /// Invalid argument
    EINVAL = 22,
    /// Function not implemented
    ENOSYS = 38,
}

impl Errno {
    pub const fn code(self) -> usize {
        self as usize
    }

    pub fn from_code(code: usize) -> Option<Self> {
        Some(match code {
            1 => Errno::EPERM,
            2 => Errno::ENOENT,
            3 => Errno::ESRCH,
            5 => Errno::EIO,
            8 => Errno::ENOEXEC,
            9 => Errno::EBADF,
            11 => Errno::EAGAIN,
            14 => Errno::EFAULT,
            22 => Errno::EINVAL,
            38 => Errno::ENOSYS,
            _ => return None,
        })
    }

    /// The value a handler leaves in `a0` when it fails with this error.
    pub const fn as_return(self) -> isize {
        -(self as isize)
    }

    const fn description(self) -> &'static str {
        match self {
            Errno::EPERM => "operation not permitted",
            Errno::ENOENT => "no such file or directory",
            Errno::ESRCH => "no such process",
            Errno::EIO => "I/O error",
            Errno::ENOEXEC => "exec format error",
            Errno::EBADF => "bad file descriptor",
            Errno::EAGAIN => "try again",
            Errno::EFAULT => "bad address",
            Errno::EINVAL => "invalid argument",
            Errno::ENOSYS => "function not implemented",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

/// Splits a raw syscall return into a value or a positive error code.
///
/// The error code is kept raw so that codes this crate does not know about
/// still reach the caller's `errno`.
pub const fn decode_result(raw: isize) -> Result<usize, usize> {
    if raw < 0 {
        Err(raw.unsigned_abs())
    } else {
        Ok(raw as usize)
    }
}
