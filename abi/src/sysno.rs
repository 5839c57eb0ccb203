//! System call numbers
//!
//! The table is dense: number `n` is the handler at index `n`. Index 0 belongs
//! to `init`, which only the kernel issues while bootstrapping the first
//! process; a user-mode request for it is a protocol violation.

/// A system call number.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sysno {
    Init = 0,
    Fork = 1,
    TestFork = 2,
    Getpid = 3,
    Getppid = 4,
    CharTest = 5,
    BlockTest = 6,
    Open = 7,
    Close = 8,
    Stat = 9,
    Read = 10,
    Reset = 11,
    Brk = 12,
    Sigaction = 13,
    Kill = 14,
    Exit = 15,
    Sigreturn = 16,
}

impl Sysno {
    /// Length of the syscall table.
    pub const COUNT: usize = 17;

    /// Every syscall in table order.
    pub const ALL: [Sysno; Self::COUNT] = [
        Sysno::Init,
        Sysno::Fork,
        Sysno::TestFork,
        Sysno::Getpid,
        Sysno::Getppid,
        Sysno::CharTest,
        Sysno::BlockTest,
        Sysno::Open,
        Sysno::Close,
        Sysno::Stat,
        Sysno::Read,
        Sysno::Reset,
        Sysno::Brk,
        Sysno::Sigaction,
        Sysno::Kill,
        Sysno::Exit,
        Sysno::Sigreturn,
    ];

    /// Looks up a raw number, including the reserved slot 0.
    pub fn from_raw(raw: usize) -> Option<Self> {
        Self::ALL.get(raw).copied()
    }

    /// Looks up a number a user program is allowed to issue.
    pub fn from_user(raw: usize) -> Option<Self> {
        Self::from_raw(raw).filter(|sysno| sysno.is_user_callable())
    }

    pub const fn is_user_callable(self) -> bool {
        !matches!(self, Sysno::Init)
    }

    pub const fn raw(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Sysno::Init => "init",
            Sysno::Fork => "fork",
            Sysno::TestFork => "test_fork",
            Sysno::Getpid => "getpid",
            Sysno::Getppid => "getppid",
            Sysno::CharTest => "char_test",
            Sysno::BlockTest => "block_test",
            Sysno::Open => "open",
            Sysno::Close => "close",
            Sysno::Stat => "stat",
            Sysno::Read => "read",
            Sysno::Reset => "reset",
            Sysno::Brk => "brk",
            Sysno::Sigaction => "sigaction",
            Sysno::Kill => "kill",
            Sysno::Exit => "exit",
            Sysno::Sigreturn => "sigreturn",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_dense_and_ordered() {
        for (index, sysno) in Sysno::ALL.iter().enumerate() {
            assert_eq!(sysno.raw(), index);
            assert_eq!(Sysno::from_raw(index), Some(*sysno));
        }
        assert_eq!(Sysno::from_raw(Sysno::COUNT), None);
    }

    #[test]
    fn abi_numbers_are_stable() {
        assert_eq!(Sysno::Fork.raw(), 1);
        assert_eq!(Sysno::Getpid.raw(), 3);
        assert_eq!(Sysno::Open.raw(), 7);
        assert_eq!(Sysno::Brk.raw(), 12);
        assert_eq!(Sysno::Sigreturn.raw(), 16);
    }

    #[test]
    fn init_is_not_user_callable() {
        assert_eq!(Sysno::from_user(0), None);
        assert_eq!(Sysno::from_user(1), Some(Sysno::Fork));
        assert_eq!(Sysno::from_user(usize::MAX), None);
    }
}
