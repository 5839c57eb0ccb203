use super::SyscallResult;
use crate::kernel::Kernel;
use crate::loader::UserImage;
use crate::trap::TrapFrame;
use log::{info, warn};

/// Loads the registered init image into the calling process.
pub fn sys_init(kernel: &mut Kernel, _tf: &TrapFrame) -> SyscallResult {
    let image = UserImage::parse(kernel.init_image()).map_err(|err| {
        warn!("[task] init image rejected: {}", err);
        err
    })?;
    let process = kernel.current_mut()?;
    process.memory.reset_data(image.end_data);
    process.entry = image.entry;
    process.context = TrapFrame::user_entry(image.entry, process.memory.stack_top);
    info!(
        "[task] process {} loaded init: entry {:#x}, data ends at {:#x}",
        process.pid, image.entry, image.end_data
    );
    kernel.set_loaded_image(image);
    Ok(0)
}

pub fn sys_fork(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    kernel.fork(tf)
}

/// Logs the caller's view of its argument; a forked child must see its own copy.
pub fn sys_test_fork(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let pid = kernel.current_pid()?;
    info!("[task] test_fork: process {} sees {:#x}", pid, tf.arg(0));
    Ok(0)
}

pub fn sys_getpid(kernel: &mut Kernel, _tf: &TrapFrame) -> SyscallResult {
    kernel.current_pid()
}

pub fn sys_getppid(kernel: &mut Kernel, _tf: &TrapFrame) -> SyscallResult {
    Ok(kernel.current()?.ppid())
}

pub fn sys_exit(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let pid = kernel.current_pid()?;
    kernel.exit(pid, tf.arg(0) as i32);
    Ok(0)
}

pub fn sys_brk(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    Ok(kernel.current_mut()?.memory.set_brk(tf.arg(0)))
}

#[cfg(test)]
mod tests {
    use crate::config::{PAGE_SIZE, USER_STACK_SIZE, USER_STACK_TOP};
    use crate::loader::tests::tiny_elf;
    use crate::syscall::bootstrap;
    use crate::task::ProcessStatus;
    use crate::testing::{invoke, TestBed};
    use crate::trap::TrapFrame;
    use alloc::boxed::Box;
    use kairos_abi::{Errno, Sysno, SIGCHLD};

    #[test]
    fn getppid_is_zero_only_for_root() {
        let mut bed = TestBed::booted();
        let k = &mut bed.kernel;
        assert_eq!(invoke(k, Sysno::Getpid, [0; 6]), 0);
        assert_eq!(invoke(k, Sysno::Getppid, [0; 6]), 0);

        let first = invoke(k, Sysno::Fork, [0; 6]) as usize;
        k.procs.set_current(Some(first));
        let second = invoke(k, Sysno::Fork, [0; 6]) as usize;
        k.procs.set_current(Some(second));
        assert_eq!(invoke(k, Sysno::Getpid, [0; 6]), second as isize);
        assert_eq!(invoke(k, Sysno::Getppid, [0; 6]), first as isize);
    }

    #[test]
    fn fork_fails_with_eagain_when_the_table_is_full() {
        let mut bed = TestBed::booted();
        for _ in 1..crate::config::MAX_PROCS {
            assert!(invoke(&mut bed.kernel, Sysno::Fork, [0; 6]) > 0);
        }
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Fork, [0; 6]),
            Errno::EAGAIN.as_return()
        );
    }

    #[test]
    fn exit_makes_a_zombie_and_notifies_the_parent() {
        let mut bed = TestBed::booted();
        let child = invoke(&mut bed.kernel, Sysno::Fork, [0; 6]) as usize;
        bed.kernel.procs.set_current(Some(child));
        invoke(&mut bed.kernel, Sysno::Exit, [42, 0, 0, 0, 0, 0]);

        let zombie = bed.kernel.procs.get(child).unwrap();
        assert_eq!(zombie.status, ProcessStatus::Zombie);
        assert_eq!(zombie.exit_code, 42);
        assert!(bed.kernel.procs.get(0).unwrap().signals.is_pending(SIGCHLD));
    }

    #[test]
    fn brk_in_range_moves_out_of_range_keeps() {
        let mut bed = TestBed::booted();
        let start = bed.kernel.current().unwrap().memory.brk;
        let grown = start + 3 * PAGE_SIZE;
        assert_eq!(invoke(&mut bed.kernel, Sysno::Brk, [grown, 0, 0, 0, 0, 0]), grown as isize);
        let limit = USER_STACK_TOP - USER_STACK_SIZE;
        assert_eq!(invoke(&mut bed.kernel, Sysno::Brk, [limit, 0, 0, 0, 0, 0]), grown as isize);
        assert_eq!(invoke(&mut bed.kernel, Sysno::Brk, [start - 1, 0, 0, 0, 0, 0]), grown as isize);
        assert_eq!(invoke(&mut bed.kernel, Sysno::Brk, [0; 6]), grown as isize);
    }

    #[test]
    fn test_fork_always_succeeds() {
        let mut bed = TestBed::booted();
        assert_eq!(invoke(&mut bed.kernel, Sysno::TestFork, [0xbeef, 0, 0, 0, 0, 0]), 0);
    }

    #[test]
    fn init_resets_bounds_from_the_image() {
        let mut bed = TestBed::booted();
        let elf = tiny_elf(0x8100_0000, &[0x13, 0, 0, 0], 0x2100);
        bed.kernel.set_init_image(Box::leak(elf.into_boxed_slice()));

        let mut tf = TrapFrame::syscall(Sysno::Init.raw(), [0; 6]);
        bootstrap(&mut bed.kernel, &mut tf);
        assert_eq!(tf.result(), 0);

        let root = bed.kernel.current().unwrap();
        assert_eq!(root.memory.end_data, 0x8100_3000);
        assert_eq!(root.memory.brk, 0x8100_3000);
        assert_eq!(root.entry, 0x8100_0000);
        assert_eq!(root.context.sepc, 0x8100_0000);
        assert!(bed.kernel.take_loaded_image().is_some());
    }
}
