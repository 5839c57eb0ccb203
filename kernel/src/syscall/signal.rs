use super::SyscallResult;
use crate::kernel::Kernel;
use crate::trap::TrapFrame;
use crate::uaccess::UserPtr;
use kairos_abi::{is_catchable, is_valid_signal, Errno, SigAction, NSIG};
use log::debug;

/// `sigaction(signum, new, old)`; either pointer may be null. Both are
/// checked before the action table changes.
pub fn sys_sigaction(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let [signum, new_ptr, old_ptr, ..] = tf.args();
    if !is_valid_signal(signum) {
        return Err(Errno::EINVAL);
    }
    let new_ptr = UserPtr::<SigAction>::new(new_ptr);
    let old_ptr = UserPtr::<SigAction>::new(old_ptr);

    if !old_ptr.is_null() {
        old_ptr.check()?;
    }
    let new = if new_ptr.is_null() {
        None
    } else {
        if !is_catchable(signum) {
            return Err(Errno::EINVAL);
        }
        Some(new_ptr.read()?)
    };

    let signals = &mut kernel.current_mut()?.signals;
    let old = match new {
        Some(action) => signals.swap_action(signum, action),
        None => *signals.action(signum).ok_or(Errno::EINVAL)?,
    };
    if !old_ptr.is_null() {
        old_ptr.write(old)?;
    }
    Ok(0)
}

/// `kill(pid, signum)`; signal 0 only checks that `pid` exists.
pub fn sys_kill(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let [pid, signum, ..] = tf.args();
    if signum >= NSIG {
        return Err(Errno::EINVAL);
    }
    let target = kernel.procs.get_live_mut(pid).ok_or(Errno::ESRCH)?;
    if signum != 0 {
        target.signals.raise(signum);
        debug!("[signal] signal {} sent to process {}", signum, pid);
    }
    Ok(0)
}

pub fn sys_sigreturn(kernel: &mut Kernel, _tf: &TrapFrame) -> SyscallResult {
    kernel.current_mut()?.signals.sigreturn()?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use crate::kernel::{Resume, TrapCause};
    use crate::testing::{invoke, TestBed};
    use crate::trap::TrapFrame;
    use kairos_abi::{Errno, SaFlags, SigAction, Sysno, SIGKILL, SIGSTOP, SIGUSR1};

    fn action(handler: usize) -> SigAction {
        SigAction {
            handler,
            flags: SaFlags::RESTORER,
            restorer: 0x8100_0f00,
            mask: 0,
        }
    }

    fn addr<T>(value: &mut T) -> usize {
        value as *mut T as usize
    }

    #[test]
    fn sigaction_round_trip_restores_exactly() {
        let mut bed = TestBed::booted();
        let mut first = action(0x8100_0800);
        let mut old = SigAction::DEFAULT;
        let sig = SIGUSR1;

        let args = [sig, addr(&mut first), addr(&mut old), 0, 0, 0];
        assert_eq!(invoke(&mut bed.kernel, Sysno::Sigaction, args), 0);
        assert_eq!(old, SigAction::DEFAULT);

        let mut second = action(0x8100_0900);
        let mut displaced = SigAction::DEFAULT;
        let args = [sig, addr(&mut second), addr(&mut displaced), 0, 0, 0];
        invoke(&mut bed.kernel, Sysno::Sigaction, args);
        assert_eq!(displaced, first);

        let args = [sig, addr(&mut displaced), 0, 0, 0, 0];
        assert_eq!(invoke(&mut bed.kernel, Sysno::Sigaction, args), 0);
        let installed = *bed.kernel.current().unwrap().signals.action(sig).unwrap();
        assert_eq!(installed, first);
    }

    #[test]
    fn sigaction_rejects_bad_signals_before_touching_state() {
        let mut bed = TestBed::booted();
        let mut new = action(0x8100_0800);
        for signum in [0, 32, SIGKILL, SIGSTOP] {
            let args = [signum, addr(&mut new), 0, 0, 0, 0];
            assert_eq!(
                invoke(&mut bed.kernel, Sysno::Sigaction, args),
                Errno::EINVAL.as_return()
            );
        }
        let misaligned = addr(&mut new) + 1;
        let args = [SIGUSR1, misaligned, 0, 0, 0, 0];
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Sigaction, args),
            Errno::EFAULT.as_return()
        );
        let current = *bed.kernel.current().unwrap().signals.action(SIGUSR1).unwrap();
        assert_eq!(current, SigAction::DEFAULT);
    }

    #[test]
    fn unusable_old_pointer_leaves_the_action_alone() {
        let mut bed = TestBed::booted();
        let mut new = action(0x8100_0800);
        let mut old = SigAction::DEFAULT;
        let misaligned = addr(&mut old) + 1;
        let args = [SIGUSR1, addr(&mut new), misaligned, 0, 0, 0];
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Sigaction, args),
            Errno::EFAULT.as_return()
        );
        let installed = *bed.kernel.current().unwrap().signals.action(SIGUSR1).unwrap();
        assert_eq!(installed, SigAction::DEFAULT);
    }

    #[test]
    fn query_without_install() {
        let mut bed = TestBed::booted();
        let mut old = action(1234);
        let args = [SIGKILL, 0, addr(&mut old), 0, 0, 0];
        assert_eq!(invoke(&mut bed.kernel, Sysno::Sigaction, args), 0);
        assert_eq!(old, SigAction::DEFAULT);
    }

    #[test]
    fn kill_only_marks_pending() {
        let mut bed = TestBed::booted();
        let child = invoke(&mut bed.kernel, Sysno::Fork, [0; 6]) as usize;
        assert_eq!(invoke(&mut bed.kernel, Sysno::Kill, [child, SIGUSR1, 0, 0, 0, 0]), 0);
        let target = bed.kernel.procs.get(child).unwrap();
        assert!(target.signals.is_pending(SIGUSR1));
        assert!(!target.is_zombie());

        assert_eq!(invoke(&mut bed.kernel, Sysno::Kill, [child, 0, 0, 0, 0, 0]), 0);
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Kill, [9, SIGUSR1, 0, 0, 0, 0]),
            Errno::ESRCH.as_return()
        );
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Kill, [child, 40, 0, 0, 0, 0]),
            Errno::EINVAL.as_return()
        );
    }

    #[test]
    fn killing_a_zombie_is_esrch() {
        let mut bed = TestBed::booted();
        let child = invoke(&mut bed.kernel, Sysno::Fork, [0; 6]) as usize;
        bed.kernel.exit(child, 0);
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Kill, [child, 0, 0, 0, 0, 0]),
            Errno::ESRCH.as_return()
        );
    }

    #[test]
    fn handler_runs_and_sigreturn_resumes_the_interrupted_frame() {
        let mut bed = TestBed::booted();
        let mut handler = action(0x8100_0800);
        let args = [SIGUSR1, addr(&mut handler), 0, 0, 0, 0];
        invoke(&mut bed.kernel, Sysno::Sigaction, args);

        // kill(getpid(), SIGUSR1) issued from user mode
        let mut tf = TrapFrame::syscall(Sysno::Kill.raw(), [0, SIGUSR1, 0, 0, 0, 0]);
        tf.sepc = 0x8100_0100;
        tf.set_sp(0x8170_0008);
        let resume = bed.kernel.handle_trap(&mut tf, TrapCause::Syscall);
        assert_eq!(resume, Resume::User);
        assert_eq!(tf.sepc, 0x8100_0800);
        assert_eq!(tf.result(), SIGUSR1 as isize);

        // the restorer issues sigreturn
        tf.x[crate::trap::reg::A7] = Sysno::Sigreturn.raw();
        tf.sepc = 0x8100_0f00;
        bed.kernel.handle_trap(&mut tf, TrapCause::Syscall);
        assert_eq!(tf.sepc, 0x8100_0104);
        assert_eq!(tf.result(), 0);
        assert_eq!(tf.sp(), 0x8170_0008);
        assert_eq!(tf.syscall_number(), Sysno::Kill.raw());

        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Sigreturn, [0; 6]),
            Errno::EINVAL.as_return()
        );
    }

    #[test]
    fn default_action_terminates_on_return_to_user() {
        let mut bed = TestBed::booted();
        let child = invoke(&mut bed.kernel, Sysno::Fork, [0; 6]) as usize;
        let mut tf = TrapFrame::syscall(Sysno::Kill.raw(), [0, SIGKILL, 0, 0, 0, 0]);
        let resume = bed.kernel.handle_trap(&mut tf, TrapCause::Syscall);

        assert_eq!(resume, Resume::User);
        assert_eq!(bed.kernel.procs.get(0).unwrap().exit_code, 128 + SIGKILL as i32);
        assert_eq!(bed.kernel.procs.current_pid(), Some(child));
    }
}
