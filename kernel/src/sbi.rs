//! SBI helpers using `sbi-rt` (RustSBI prototyper friendly)
//!
//! [`SbiConsole`] and [`SbiFirmware`] are the device capabilities the kernel
//! core is built over on real hardware.

use kairos_kernel::drivers::CharDevice;
use kairos_kernel::firmware::{Extension, Firmware, FirmwareError, ResetKind};
use sbi_rt as sbi;

/// Print a single character to console (legacy)
#[allow(deprecated)]
pub fn console_putchar(ch: u8) {
    let _ = sbi::legacy::console_putchar(ch as usize);
}

/// Get a character from console (non-blocking)
#[allow(deprecated)]
pub fn console_getchar() -> Option<u8> {
    let ch = sbi::legacy::console_getchar();
    if ch == usize::MAX {
        None
    } else {
        Some(ch as u8)
    }
}

/// Set timer for next timer event
#[allow(deprecated)]
pub fn set_timer(stime_value: u64) {
    let _ = sbi::legacy::set_timer(stime_value);
}

/// Shutdown the system
pub fn shutdown() -> ! {
    let _ = sbi::system_reset(sbi::Shutdown, sbi::NoReason);

    // sbi-rt's legacy::shutdown() panics if it returns
    #[allow(deprecated)]
    sbi::legacy::shutdown()
}

pub struct SbiConsole;

impl CharDevice for SbiConsole {
    fn getchar(&self) -> Option<u8> {
        console_getchar()
    }

    fn putchar(&self, byte: u8) {
        console_putchar(byte);
    }
}

pub struct SbiFirmware;

impl Firmware for SbiFirmware {
    fn set_timer(&self, stime_value: u64) {
        set_timer(stime_value);
    }

    fn reset(&self, kind: ResetKind) -> Result<(), FirmwareError> {
        let ret = match kind {
            ResetKind::Shutdown => sbi::system_reset(sbi::Shutdown, sbi::NoReason),
            ResetKind::ColdReboot => sbi::system_reset(sbi::ColdReboot, sbi::NoReason),
            ResetKind::WarmReboot => sbi::system_reset(sbi::WarmReboot, sbi::NoReason),
        };
        // only reached when the firmware refused
        Err(FirmwareError(ret.error as isize))
    }

    fn has_extension(&self, extension: Extension) -> bool {
        match extension {
            Extension::Timer => sbi::probe_extension(sbi::Timer).is_available(),
            Extension::SystemReset => sbi::probe_extension(sbi::Reset).is_available(),
        }
    }
}
