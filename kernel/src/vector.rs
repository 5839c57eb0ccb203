//! Trap vector
//!
//! `trap.S` saves the user registers into a [`TrapFrame`] at the top of the
//! kernel stack and calls [`trap_handler`], which decodes `scause` and hands
//! the frame to the kernel. Whatever frame comes back is what `__restore`
//! returns to, so a context switch is just the kernel rewriting the frame.

use crate::{sbi, KERNEL};
use core::arch::global_asm;
use kairos_kernel::config::{CLOCK_FREQ, KERNEL_STACK_SIZE, TICKS_PER_SEC};
use kairos_kernel::{Resume, TrapCause, TrapFrame};
use log::{error, info};
use riscv::register::mtvec::TrapMode;
use riscv::register::scause::{self, Exception, Interrupt, Trap};
use riscv::register::{sie, stval, stvec, time};

global_asm!(include_str!("trap.S"));

extern "C" {
    fn __alltraps();
    fn __restore(cx: usize) -> !;
}

/// sstatus.SPP
const SSTATUS_SPP: usize = 1 << 8;

#[repr(C, align(4096))]
struct KernelStack {
    data: [u8; KERNEL_STACK_SIZE],
}

static mut KERNEL_STACK: KernelStack = KernelStack {
    data: [0; KERNEL_STACK_SIZE],
};

/// Places `cx` at the top of the kernel stack, where `__alltraps` will
/// save user registers on every later trap.
fn push_context(cx: TrapFrame) -> *mut TrapFrame {
    unsafe {
        let top = core::ptr::addr_of_mut!(KERNEL_STACK) as usize + KERNEL_STACK_SIZE;
        let cx_ptr = (top - core::mem::size_of::<TrapFrame>()) as *mut TrapFrame;
        cx_ptr.write(cx);
        cx_ptr
    }
}

pub fn init() {
    unsafe {
        stvec::write(__alltraps as *const () as usize, TrapMode::Direct);
    }
    info!("[kernel] trap vector at {:#x}", __alltraps as *const () as usize);
}

/// Arms the first timer interrupt; later ones are re-armed on each tick.
pub fn enable_timer_interrupt() {
    unsafe {
        sie::set_stimer();
    }
    sbi::set_timer(time::read64() + (CLOCK_FREQ / TICKS_PER_SEC) as u64);
}

/// Enters user mode with `cx`. Never returns; later entries come back
/// through [`trap_handler`].
pub fn enter_user(cx: TrapFrame) -> ! {
    let cx_ptr = push_context(cx);
    unsafe { __restore(cx_ptr as usize) }
}

#[no_mangle]
pub fn trap_handler(cx: &mut TrapFrame) -> &mut TrapFrame {
    let scause = scause::read();
    let stval = stval::read();
    if cx.sstatus & SSTATUS_SPP != 0 {
        panic!(
            "trap from supervisor mode: scause={:#x} stval={:#x} sepc={:#x}",
            scause.bits(),
            stval,
            cx.sepc
        );
    }

    let cause = match scause.cause() {
        Trap::Exception(Exception::UserEnvCall) => TrapCause::Syscall,
        Trap::Interrupt(Interrupt::SupervisorTimer) => TrapCause::Timer {
            now: time::read64(),
        },
        _ => TrapCause::Fault {
            scause: scause.bits(),
            stval,
        },
    };

    let resume = KERNEL.lock().handle_trap(cx, cause);
    match resume {
        Resume::User => cx,
        Resume::Halt => {
            error!("[kernel] all processes have exited, shutting down");
            sbi::shutdown()
        }
    }
}
