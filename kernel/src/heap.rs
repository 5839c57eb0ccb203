//! Kernel heap
//!
//! A buddy allocator over a static arena in `.bss`.

use buddy_system_allocator::LockedHeap;
use kairos_kernel::config::KERNEL_HEAP_SIZE;

#[global_allocator]
static HEAP_ALLOCATOR: LockedHeap<32> = LockedHeap::empty();

static mut HEAP_SPACE: [u8; KERNEL_HEAP_SIZE] = [0; KERNEL_HEAP_SIZE];

/// Hands the arena to the allocator. Call once, before anything allocates.
pub fn init() {
    unsafe {
        let start = core::ptr::addr_of_mut!(HEAP_SPACE) as usize;
        HEAP_ALLOCATOR.lock().init(start, KERNEL_HEAP_SIZE);
    }
    log::debug!("[kernel] heap: {:#x} bytes", KERNEL_HEAP_SIZE);
}
