//! Signal numbers and the `sigaction` record

use bitflags::bitflags;

/// Size of the per-process action table. Valid signals are `1..NSIG`.
pub const NSIG: usize = 32;

pub const SIGHUP: usize = 1;
pub const SIGINT: usize = 2;
pub const SIGQUIT: usize = 3;
pub const SIGILL: usize = 4;
pub const SIGTRAP: usize = 5;
pub const SIGABRT: usize = 6;
pub const SIGBUS: usize = 7;
pub const SIGFPE: usize = 8;
pub const SIGKILL: usize = 9;
pub const SIGUSR1: usize = 10;
pub const SIGSEGV: usize = 11;
pub const SIGUSR2: usize = 12;
pub const SIGPIPE: usize = 13;
pub const SIGALRM: usize = 14;
pub const SIGTERM: usize = 15;
pub const SIGCHLD: usize = 17;
pub const SIGSTOP: usize = 19;
pub const SIGURG: usize = 23;
pub const SIGWINCH: usize = 28;

/// Handler value selecting the default disposition.
pub const SIG_DFL: usize = 0;
/// Handler value that discards the signal.
pub const SIG_IGN: usize = 1;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SaFlags: usize {
        const SIGINFO = 0x0000_0004;
        const RESTORER = 0x0400_0000;
        const NODEFER = 0x4000_0000;
        const RESETHAND = 0x8000_0000;
    }
}

/// One entry of a process's signal action table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigAction {
    /// Handler address, or [`SIG_DFL`] / [`SIG_IGN`].
    pub handler: usize,
    pub flags: SaFlags,
    /// Address the handler returns to; it must issue `sigreturn`.
    pub restorer: usize,
    pub mask: u64,
}

impl SigAction {
    pub const DEFAULT: SigAction = SigAction {
        handler: SIG_DFL,
        flags: SaFlags::empty(),
        restorer: 0,
        mask: 0,
    };

    pub const fn is_default(&self) -> bool {
        self.handler == SIG_DFL
    }

    pub const fn is_ignored(&self) -> bool {
        self.handler == SIG_IGN
    }
}

impl Default for SigAction {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether `signum` names a real signal.
pub const fn is_valid_signal(signum: usize) -> bool {
    signum > 0 && signum < NSIG
}

/// Whether a process may install a handler for `signum`.
pub const fn is_catchable(signum: usize) -> bool {
    is_valid_signal(signum) && signum != SIGKILL && signum != SIGSTOP
}

/// Whether the default disposition of `signum` discards it.
pub const fn default_ignores(signum: usize) -> bool {
    matches!(signum, SIGCHLD | SIGURG | SIGWINCH)
}
