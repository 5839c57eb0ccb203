//! Trap frame for user-kernel transitions

/// Register indices of the RISC-V calling convention.
pub mod reg {
    pub const RA: usize = 1;
    pub const SP: usize = 2;
    pub const A0: usize = 10;
    pub const A5: usize = 15;
    pub const A7: usize = 17;
}

/// sstatus.SPIE
const SSTATUS_SPIE: usize = 1 << 5;

/// User register state saved on trap entry.
///
/// `trap.S` depends on this layout: 32 general registers, then `sstatus`,
/// then `sepc`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapFrame {
    /// General registers x0..x31
    pub x: [usize; 32],
    /// Supervisor status register (stored as usize for alignment)
    pub sstatus: usize,
    /// Supervisor exception program counter
    pub sepc: usize,
}

impl Default for TrapFrame {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl TrapFrame {
    pub const fn zeroed() -> Self {
        Self {
            x: [0; 32],
            sstatus: 0,
            sepc: 0,
        }
    }

    /// Initial frame for a program entering user mode at `entry` with stack `sp`.
    pub fn user_entry(entry: usize, sp: usize) -> Self {
        // SPP=User (bit 8 clear), SPIE=1 so interrupts come back on after sret
        let mut cx = Self {
            x: [0; 32],
            sstatus: SSTATUS_SPIE,
            sepc: entry,
        };
        cx.set_sp(sp);
        cx
    }

    /// Frame as the dispatcher sees it: a syscall number and six arguments.
    pub fn syscall(number: usize, args: [usize; 6]) -> Self {
        let mut cx = Self::zeroed();
        cx.x[reg::A7] = number;
        cx.x[reg::A0..=reg::A5].copy_from_slice(&args);
        cx
    }

    /// Syscall number (a7)
    pub fn syscall_number(&self) -> usize {
        self.x[reg::A7]
    }

    /// Syscall arguments (a0..a5)
    pub fn args(&self) -> [usize; 6] {
        let mut args = [0; 6];
        args.copy_from_slice(&self.x[reg::A0..=reg::A5]);
        args
    }

    pub fn arg(&self, index: usize) -> usize {
        self.args()[index]
    }

    /// Result slot (a0)
    pub fn result(&self) -> isize {
        self.x[reg::A0] as isize
    }

    pub fn set_result(&mut self, value: isize) {
        self.x[reg::A0] = value as usize;
    }

    /// Set stack pointer (x2)
    pub fn set_sp(&mut self, sp: usize) {
        self.x[reg::SP] = sp;
    }

    pub fn sp(&self) -> usize {
        self.x[reg::SP]
    }

    /// Set return address (x1)
    pub fn set_ra(&mut self, ra: usize) {
        self.x[reg::RA] = ra;
    }

    /// Step past the `ecall` that raised this trap.
    pub fn skip_ecall(&mut self) {
        self.sepc += 4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_trap_asm() {
        assert_eq!(core::mem::size_of::<TrapFrame>(), 34 * 8);
    }

    #[test]
    fn arguments_come_from_a0_through_a5() {
        let tf = TrapFrame::syscall(7, [1, 2, 3, 4, 5, 6]);
        assert_eq!(tf.syscall_number(), 7);
        assert_eq!(tf.args(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(tf.x[16], 0, "a6 is not an argument slot");
    }

    #[test]
    fn negative_results_round_trip_through_a0() {
        let mut tf = TrapFrame::zeroed();
        tf.set_result(-22);
        assert_eq!(tf.result(), -22);
    }

    #[test]
    fn user_entry_returns_to_user_mode() {
        let tf = TrapFrame::user_entry(0x8100_0000, 0x8180_0000);
        assert_eq!(tf.sstatus & (1 << 8), 0);
        assert_eq!(tf.sepc, 0x8100_0000);
        assert_eq!(tf.sp(), 0x8180_0000);
    }
}
