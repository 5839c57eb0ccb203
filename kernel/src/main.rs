//! Kairos kernel boot image
//!
//! Brings up the console, heap and trap vector, builds the [`Kernel`] over
//! the SBI devices, loads the embedded init program and drops to user mode.
//! Only meaningful on `riscv64gc-unknown-none-elf`; other targets get a stub
//! so the workspace still builds and tests on the host.

#![cfg_attr(all(target_arch = "riscv64", target_os = "none"), no_std, no_main)]

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
extern crate alloc;

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
#[macro_use]
mod console;
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod heap;
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod lang_items;
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod sbi;
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod vector;

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
pub use boot::KERNEL;

#[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
fn main() {
    eprintln!("kairos-kernel only runs on riscv64gc-unknown-none-elf");
}

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod boot {
    use crate::{console, heap, println, sbi, vector};
    use alloc::sync::Arc;
    use core::arch::global_asm;
    use kairos_abi::Sysno;
    use kairos_kernel::config::{RAMDISK_BLOCKS, RAMDISK_BLOCK_SIZE, USER_BASE, USER_STACK_TOP};
    use kairos_kernel::drivers::RamDisk;
    use kairos_kernel::firmware::Extension;
    use kairos_kernel::{syscall, Devices, Kernel, TrapFrame};
    use lazy_static::lazy_static;
    use log::{error, info, warn};
    use spin::Mutex;

    global_asm!(include_str!("entry.S"));
    global_asm!(include_str!(concat!(env!("OUT_DIR"), "/link_init.S")));

    /// sstatus.FS = Initial, so user code may use the FPU
    const SSTATUS_FS_INITIAL: usize = 1 << 13;

    lazy_static! {
        pub static ref KERNEL: Mutex<Kernel> = Mutex::new(Kernel::new(Devices {
            console: Arc::new(sbi::SbiConsole),
            disk: Arc::new(RamDisk::new(RAMDISK_BLOCK_SIZE, RAMDISK_BLOCKS)),
            firmware: Arc::new(sbi::SbiFirmware),
        }));
    }

    /// Kernel entry point, jumped to from `entry.S`
    #[no_mangle]
    pub fn kernel_main(hartid: usize, dtb: usize) -> ! {
        clear_bss();
        console::init();
        heap::init();

        println!("=================================");
        println!("Kairos OS Kernel v{}", env!("CARGO_PKG_VERSION"));
        println!("=================================");
        info!("[kernel] hart {}, dtb at {:#x}", hartid, dtb);

        vector::init();
        check_firmware();

        let mut kernel = KERNEL.lock();
        kernel.set_init_image(init_image());
        if kernel
            .spawn_root(TrapFrame::user_entry(USER_BASE, USER_STACK_TOP))
            .is_none()
        {
            panic!("cannot create the root process");
        }

        if kernel.init_image().is_empty() {
            warn!("[kernel] no init image embedded, running the syscall smoke test");
            smoke_test(&mut kernel);
            drop(kernel);
            sbi::shutdown();
        }

        let mut tf = TrapFrame::syscall(Sysno::Init.raw(), [0; 6]);
        syscall::bootstrap(&mut kernel, &mut tf);
        if tf.result() < 0 {
            error!("[kernel] init failed: {}", tf.result());
            drop(kernel);
            sbi::shutdown();
        }
        if let Some(image) = kernel.take_loaded_image() {
            // SAFETY: identity-mapped RAM above the kernel, owned by no one yet
            unsafe { image.install() };
        }
        let mut cx = match kernel.current() {
            Ok(process) => process.context,
            Err(_) => panic!("root process vanished during init"),
        };
        drop(kernel);

        cx.sstatus |= SSTATUS_FS_INITIAL;
        info!("[kernel] entering user mode at {:#x}", cx.sepc);
        vector::enable_timer_interrupt();
        vector::enter_user(cx)
    }

    fn clear_bss() {
        extern "C" {
            fn sbss();
            fn ebss();
        }
        unsafe {
            core::slice::from_raw_parts_mut(
                sbss as *const () as usize as *mut u8,
                ebss as *const () as usize - sbss as *const () as usize,
            )
            .fill(0);
        }
    }

    /// The init ELF that `build.rs` embedded, empty if none was built.
    fn init_image() -> &'static [u8] {
        extern "C" {
            fn _init_start();
            fn _init_end();
        }
        let start = _init_start as *const () as usize;
        let end = _init_end as *const () as usize;
        unsafe { core::slice::from_raw_parts(start as *const u8, end - start) }
    }

    fn check_firmware() {
        let kernel = KERNEL.lock();
        let firmware = &kernel.devices.firmware;
        for extension in [Extension::Timer, Extension::SystemReset] {
            if !firmware.has_extension(extension) {
                warn!("[kernel] SBI extension {:?} not available", extension);
            }
        }
    }

    /// Drives a few syscalls through the dispatcher as the root process.
    fn smoke_test(kernel: &mut Kernel) {
        let calls: [(Sysno, [usize; 6]); 4] = [
            (Sysno::Getpid, [0; 6]),
            (Sysno::BlockTest, [0; 6]),
            (Sysno::Open, [b"/dev/null\0".as_ptr() as usize, 0, 0, 0, 0, 0]),
            (Sysno::Close, [0; 6]),
        ];
        for (sysno, args) in calls {
            let mut tf = TrapFrame::syscall(sysno.raw(), args);
            syscall::dispatch(kernel, &mut tf);
            info!("[kernel] smoke test: {} -> {}", sysno.name(), tf.result());
        }
    }
}
