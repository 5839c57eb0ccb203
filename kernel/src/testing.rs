//! In-memory stand-ins for the console and the firmware
//!
//! Used by the unit tests and by `tests/`, which link the library the same
//! way the boot image does.

use crate::config::{RAMDISK_BLOCKS, RAMDISK_BLOCK_SIZE, USER_BASE, USER_STACK_TOP};
use crate::drivers::{CharDevice, RamDisk};
use crate::firmware::{Extension, Firmware, FirmwareError, ResetKind};
use crate::kernel::{Devices, Kernel};
use crate::syscall;
use crate::trap::TrapFrame;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use kairos_abi::Sysno;
use spin::Mutex;

/// Console with a scripted input queue and a captured output buffer.
#[derive(Default)]
pub struct MockConsole {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<Vec<u8>>,
}

impl MockConsole {
    pub fn push_input(&self, bytes: &[u8]) {
        self.input.lock().extend(bytes.iter().copied());
    }

    pub fn output(&self) -> Vec<u8> {
        self.output.lock().clone()
    }
}

impl CharDevice for MockConsole {
    fn getchar(&self) -> Option<u8> {
        self.input.lock().pop_front()
    }

    fn putchar(&self, byte: u8) {
        self.output.lock().push(byte);
    }
}

/// Firmware that records requests instead of acting on them.
#[derive(Default)]
pub struct MockFirmware {
    resets: Mutex<Vec<ResetKind>>,
    timer: Mutex<Option<u64>>,
    /// Error code `reset` reports, if any
    pub reset_error: Mutex<Option<isize>>,
}

impl MockFirmware {
    pub fn resets(&self) -> Vec<ResetKind> {
        self.resets.lock().clone()
    }

    pub fn timer(&self) -> Option<u64> {
        *self.timer.lock()
    }
}

impl Firmware for MockFirmware {
    fn set_timer(&self, stime_value: u64) {
        *self.timer.lock() = Some(stime_value);
    }

    fn reset(&self, kind: ResetKind) -> Result<(), FirmwareError> {
        self.resets.lock().push(kind);
        match *self.reset_error.lock() {
            Some(code) => Err(FirmwareError(code)),
            None => Ok(()),
        }
    }

    fn has_extension(&self, _extension: Extension) -> bool {
        true
    }
}

/// A kernel over fresh test doubles, with handles to inspect them.
pub struct TestBed {
    pub kernel: Kernel,
    pub console: Arc<MockConsole>,
    pub disk: Arc<RamDisk>,
    pub firmware: Arc<MockFirmware>,
}

impl TestBed {
    pub fn new() -> Self {
        let console = Arc::new(MockConsole::default());
        let disk = Arc::new(RamDisk::new(RAMDISK_BLOCK_SIZE, RAMDISK_BLOCKS));
        let firmware = Arc::new(MockFirmware::default());
        let kernel = Kernel::new(Devices {
            console: console.clone(),
            disk: disk.clone(),
            firmware: firmware.clone(),
        });
        Self {
            kernel,
            console,
            disk,
            firmware,
        }
    }

    /// Test bed whose root process is already running.
    pub fn booted() -> Self {
        let mut bed = Self::new();
        bed.kernel
            .spawn_root(TrapFrame::user_entry(USER_BASE, USER_STACK_TOP));
        bed
    }
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

pub fn test_kernel() -> Kernel {
    TestBed::new().kernel
}

/// Issues `sysno` as the current process and returns the raw `a0`.
pub fn invoke(kernel: &mut Kernel, sysno: Sysno, args: [usize; 6]) -> isize {
    let mut tf = TrapFrame::syscall(sysno.raw(), args);
    syscall::dispatch(kernel, &mut tf);
    tf.result()
}
