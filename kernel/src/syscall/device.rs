use super::SyscallResult;
use crate::firmware::ResetKind;
use crate::kernel::Kernel;
use crate::trap::TrapFrame;
use alloc::vec;
use alloc::vec::Vec;
use kairos_abi::Errno;
use log::{info, warn};

/// `a0 == 0` reads one pending console byte; anything else writes its low byte.
pub fn sys_char_test(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let console = &kernel.devices.console;
    match tf.arg(0) {
        0 => console.getchar().map(usize::from).ok_or(Errno::EAGAIN),
        ch => {
            console.putchar(ch as u8);
            Ok(0)
        }
    }
}

/// Round-trips a pattern through the last disk block, leaving it as it was.
pub fn sys_block_test(kernel: &mut Kernel, _tf: &TrapFrame) -> SyscallResult {
    let disk = kernel.devices.disk.clone();
    let block = disk.block_count().checked_sub(1).ok_or(Errno::EIO)?;
    let size = disk.block_size();

    let mut saved = vec![0u8; size];
    disk.read_block(block, &mut saved)?;
    let pattern: Vec<u8> = (0..size).map(|i| (i as u8) ^ 0xA5).collect();
    disk.write_block(block, &pattern)?;
    let mut readback = vec![0u8; size];
    let read = disk.read_block(block, &mut readback);
    disk.write_block(block, &saved)?;
    read?;

    if readback == pattern {
        info!("[fs] block test passed on block {}", block);
        Ok(0)
    } else {
        warn!("[fs] block test: block {} read back differs", block);
        Err(Errno::EIO)
    }
}

/// 0 shuts down, 1 cold-reboots, 2 warm-reboots.
pub fn sys_reset(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let kind = ResetKind::from_raw(tf.arg(0)).ok_or(Errno::EINVAL)?;
    info!("[kernel] reset requested: {:?}", kind);
    kernel.devices.firmware.reset(kind).map_err(|err| {
        warn!("[kernel] reset refused: {}", err);
        Errno::EIO
    })?;
    Ok(0)
}
