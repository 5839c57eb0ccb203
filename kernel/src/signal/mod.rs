//! Signal state and delivery
//!
//! Each process carries an action table, a pending set and a delivery phase.
//! Delivery happens on the way back to user mode:
//!
//! ```text
//! Idle --(pending, trap return)--> Delivering --(sigreturn)--> Restoring --(trap return)--> Idle
//! ```
//!
//! While a handler runs, the interrupted frame waits in the phase and no
//! further catchable signal is delivered. SIGKILL and SIGSTOP still
//! terminate it. `sigreturn` only arms the restore; the frame
//! is put back by the next trap return, after the syscall result has been
//! written, so the restored `a0` wins.

use crate::trap::TrapFrame;
use kairos_abi::{
    default_ignores, is_catchable, is_valid_signal, Errno, SaFlags, SigAction, NSIG, SIG_DFL,
};
use log::debug;

/// Where a process is in handling a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPhase {
    Idle,
    /// A handler for `signum` is running; `saved` is the interrupted frame.
    Delivering { signum: usize, saved: TrapFrame },
    /// The handler returned; `saved` goes back on the next trap return.
    Restoring { saved: TrapFrame },
}

/// What delivering a signal does to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ignore,
    Terminate(i32),
    Handle(SigAction),
}

/// Exit code of a process killed by `signum`.
pub const fn termination_code(signum: usize) -> i32 {
    128 + signum as i32
}

pub fn disposition(signum: usize, action: &SigAction) -> Disposition {
    if action.is_ignored() {
        Disposition::Ignore
    } else if action.is_default() {
        if default_ignores(signum) {
            Disposition::Ignore
        } else {
            Disposition::Terminate(termination_code(signum))
        }
    } else {
        Disposition::Handle(*action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalState {
    actions: [SigAction; NSIG],
    /// Bit `n` set means signal `n` is pending.
    pending: u64,
    phase: SignalPhase,
}

impl Default for SignalState {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalState {
    pub const fn new() -> Self {
        Self {
            actions: [SigAction::DEFAULT; NSIG],
            pending: 0,
            phase: SignalPhase::Idle,
        }
    }

    /// State of a forked child: same actions, nothing pending, not delivering.
    pub fn inherit(&self) -> Self {
        Self {
            actions: self.actions,
            ..Self::new()
        }
    }

    pub fn action(&self, signum: usize) -> Option<&SigAction> {
        self.actions.get(signum)
    }

    /// Installs `new` for `signum`, returning the action it replaces.
    pub fn swap_action(&mut self, signum: usize, new: SigAction) -> SigAction {
        core::mem::replace(&mut self.actions[signum], new)
    }

    pub fn raise(&mut self, signum: usize) {
        if is_valid_signal(signum) {
            self.pending |= 1 << signum;
        }
    }

    pub fn is_pending(&self, signum: usize) -> bool {
        signum < NSIG && self.pending & (1 << signum) != 0
    }

    pub fn has_pending(&self) -> bool {
        self.pending != 0
    }

    pub fn clear_pending(&mut self) {
        self.pending = 0;
    }

    pub fn phase(&self) -> &SignalPhase {
        &self.phase
    }

    /// Lowest pending signal, removed from the set.
    fn take_pending(&mut self) -> Option<usize> {
        if self.pending == 0 {
            return None;
        }
        let signum = self.pending.trailing_zeros() as usize;
        self.pending &= !(1 << signum);
        Some(signum)
    }

    /// Ends the running handler; the saved frame comes back on trap return.
    pub fn sigreturn(&mut self) -> Result<(), Errno> {
        match self.phase {
            SignalPhase::Delivering { saved, .. } => {
                self.phase = SignalPhase::Restoring { saved };
                Ok(())
            }
            _ => Err(Errno::EINVAL),
        }
    }

    /// Pending SIGKILL or SIGSTOP, removed from the set.
    fn take_uncatchable(&mut self) -> Option<usize> {
        let signum = (1..NSIG).find(|&signum| !is_catchable(signum) && self.is_pending(signum))?;
        self.pending &= !(1 << signum);
        Some(signum)
    }

    /// Trap-return processing for the current process.
    ///
    /// Restores a frame armed by `sigreturn`, then, unless a handler is
    /// still running, delivers pending signals until one installs a handler
    /// or terminates the process. Returns the exit code in the latter case.
    pub fn deliver(&mut self, tf: &mut TrapFrame) -> Option<i32> {
        if let SignalPhase::Restoring { saved } = self.phase {
            *tf = saved;
            self.phase = SignalPhase::Idle;
        }
        if self.phase != SignalPhase::Idle {
            return self.take_uncatchable().map(|signum| {
                debug!("[signal] signal {} terminates inside a handler", signum);
                termination_code(signum)
            });
        }

        while let Some(signum) = self.take_pending() {
            let action = self.actions[signum];
            match disposition(signum, &action) {
                Disposition::Ignore => {
                    debug!("[signal] signal {} ignored", signum);
                }
                Disposition::Terminate(code) => {
                    debug!("[signal] signal {} terminates", signum);
                    return Some(code);
                }
                Disposition::Handle(action) => {
                    debug!("[signal] signal {} -> handler {:#x}", signum, action.handler);
                    self.phase = SignalPhase::Delivering { signum, saved: *tf };
                    tf.sepc = action.handler;
                    tf.set_result(signum as isize);
                    tf.set_ra(action.restorer);
                    tf.set_sp(tf.sp() & !0xf);
                    if action.flags.contains(SaFlags::RESETHAND) {
                        self.actions[signum] = SigAction {
                            handler: SIG_DFL,
                            ..action
                        };
                    }
                    return None;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kairos_abi::{SIGCHLD, SIGKILL, SIGTERM, SIGUSR1, SIGUSR2, SIG_IGN};

    fn handler(addr: usize) -> SigAction {
        SigAction {
            handler: addr,
            flags: SaFlags::RESTORER,
            restorer: 0x8100_0f00,
            mask: 0,
        }
    }

    fn user_frame() -> TrapFrame {
        let mut tf = TrapFrame::user_entry(0x8100_0000, 0x8170_0008);
        tf.sepc = 0x8100_0040;
        tf.set_result(99);
        tf
    }

    #[test]
    fn default_disposition() {
        assert_eq!(disposition(SIGCHLD, &SigAction::DEFAULT), Disposition::Ignore);
        assert_eq!(
            disposition(SIGKILL, &SigAction::DEFAULT),
            Disposition::Terminate(137)
        );
        let ignore = SigAction {
            handler: SIG_IGN,
            ..SigAction::DEFAULT
        };
        assert_eq!(disposition(SIGUSR1, &ignore), Disposition::Ignore);
    }

    #[test]
    fn handler_frame_and_round_trip() {
        let mut state = SignalState::new();
        state.swap_action(SIGUSR1, handler(0x8100_0800));
        state.raise(SIGUSR1);

        let original = user_frame();
        let mut tf = original;
        assert_eq!(state.deliver(&mut tf), None);
        assert_eq!(tf.sepc, 0x8100_0800);
        assert_eq!(tf.result(), SIGUSR1 as isize);
        assert_eq!(tf.x[crate::trap::reg::RA], 0x8100_0f00);
        assert_eq!(tf.sp(), 0x8170_0000);
        assert!(!state.is_pending(SIGUSR1));

        state.sigreturn().unwrap();
        tf.set_result(0);
        state.deliver(&mut tf);
        assert_eq!(tf, original);
        assert_eq!(*state.phase(), SignalPhase::Idle);
    }

    #[test]
    fn no_nested_delivery() {
        let mut state = SignalState::new();
        state.swap_action(SIGUSR1, handler(0x8100_0800));
        state.swap_action(SIGUSR2, handler(0x8100_0900));
        state.raise(SIGUSR1);
        state.raise(SIGUSR2);

        let mut tf = user_frame();
        state.deliver(&mut tf);
        assert_eq!(tf.sepc, 0x8100_0800);
        state.deliver(&mut tf);
        assert_eq!(tf.sepc, 0x8100_0800);
        assert!(state.is_pending(SIGUSR2));

        state.sigreturn().unwrap();
        state.deliver(&mut tf);
        assert_eq!(tf.sepc, 0x8100_0900);
    }

    #[test]
    fn sigkill_reaches_a_process_inside_its_handler() {
        let mut state = SignalState::new();
        state.swap_action(SIGUSR1, handler(0x8100_0800));
        state.raise(SIGUSR1);
        let mut tf = user_frame();
        state.deliver(&mut tf);
        assert_eq!(tf.sepc, 0x8100_0800);

        state.raise(SIGUSR2);
        state.raise(SIGKILL);
        assert_eq!(state.deliver(&mut tf), Some(termination_code(SIGKILL)));
        assert!(!state.is_pending(SIGKILL));
        assert!(state.is_pending(SIGUSR2));
    }

    #[test]
    fn sigreturn_outside_a_handler_is_invalid() {
        let mut state = SignalState::new();
        assert_eq!(state.sigreturn(), Err(Errno::EINVAL));
    }

    #[test]
    fn reset_hand_restores_default_after_one_delivery() {
        let mut state = SignalState::new();
        let mut action = handler(0x8100_0800);
        action.flags |= SaFlags::RESETHAND;
        state.swap_action(SIGUSR1, action);
        state.raise(SIGUSR1);
        state.deliver(&mut user_frame());
        assert!(state.action(SIGUSR1).unwrap().is_default());
    }

    #[test]
    fn default_action_terminates() {
        let mut state = SignalState::new();
        state.swap_action(
            SIGUSR2,
            SigAction {
                handler: SIG_IGN,
                ..SigAction::DEFAULT
            },
        );
        state.raise(SIGUSR2);
        state.raise(SIGTERM);
        let mut tf = user_frame();
        assert_eq!(state.deliver(&mut tf), Some(128 + SIGTERM as i32));
        assert!(!state.has_pending());
    }

    #[test]
    fn child_inherits_actions_but_not_pending() {
        let mut state = SignalState::new();
        state.swap_action(SIGUSR1, handler(0x8100_0800));
        state.raise(SIGUSR2);
        let child = state.inherit();
        assert_eq!(child.action(SIGUSR1), state.action(SIGUSR1));
        assert!(!child.has_pending());
    }
}
