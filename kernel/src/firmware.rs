//! Privileged-call layer
//!
//! Supervisor code reaches the SBI firmware through the same `ecall`
//! convention user programs use to reach the kernel, one privilege level
//! down: extension id in `a7`, function id in `a6`, `(error, value)` back in
//! `a0`/`a1`. The kernel only needs the handful of services below.

use core::fmt;

/// SBI extension ids the kernel calls.
pub mod eid {
    pub const BASE: usize = 0x10;
    /// "TIME"
    pub const TIMER: usize = 0x5449_4D45;
    /// "SRST"
    pub const SYSTEM_RESET: usize = 0x5352_5354;
}

/// Extension ids no kernel syscall number may coincide with.
pub const RESERVED_EXTENSIONS: [usize; 3] = [eid::BASE, eid::TIMER, eid::SYSTEM_RESET];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Timer,
    SystemReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    Shutdown,
    ColdReboot,
    WarmReboot,
}

impl ResetKind {
    /// Decodes the `reset` syscall argument.
    pub fn from_raw(raw: usize) -> Option<Self> {
        match raw {
            0 => Some(ResetKind::Shutdown),
            1 => Some(ResetKind::ColdReboot),
            2 => Some(ResetKind::WarmReboot),
            _ => None,
        }
    }
}

/// A non-zero SBI error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareError(pub isize);

impl fmt::Display for FirmwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SBI error {}", self.0)
    }
}

pub trait Firmware: Send + Sync {
    fn set_timer(&self, stime_value: u64);

    /// Only returns if the firmware refused or is a test double.
    fn reset(&self, kind: ResetKind) -> Result<(), FirmwareError>;

    fn has_extension(&self, extension: Extension) -> bool;
}
