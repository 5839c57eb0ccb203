//! Kernel configuration constants

use log::LevelFilter;

/// Process table capacity; pids are slot indices below this.
pub const MAX_PROCS: usize = 16;

/// Descriptor slots per process.
pub const MAX_FDS: usize = kairos_abi::MAX_FDS;

/// Inode arena capacity
pub const INODE_CAPACITY: usize = 32;

/// Longest path `open` accepts, terminator included
pub const PATH_MAX: usize = 128;

/// Page size (4KB)
pub const PAGE_SIZE: usize = 0x1000;

/// Lowest address a user image may occupy
pub const USER_BASE: usize = 0x8100_0000;

/// Initial user stack pointer
pub const USER_STACK_TOP: usize = 0x8180_0000;

/// User stack size (8KB)
pub const USER_STACK_SIZE: usize = 4096 * 2;

/// Kernel stack size (16KB)
pub const KERNEL_STACK_SIZE: usize = 4096 * 4;

/// Kernel heap size (8MB)
pub const KERNEL_HEAP_SIZE: usize = 0x80_0000;

/// Physical memory end (128MB for QEMU virt)
pub const MEMORY_END: usize = 0x8800_0000;

/// Clock frequency (10MHz for QEMU)
pub const CLOCK_FREQ: usize = 10_000_000;

/// Timer interrupts per second
pub const TICKS_PER_SEC: usize = 100;

/// Ticks a process runs before the scheduler rotates
pub const TIME_SLICE: usize = 10;

/// RAM disk geometry
pub const RAMDISK_BLOCK_SIZE: usize = 512;
pub const RAMDISK_BLOCKS: usize = 64;

/// Log level, taken from `LOG` at build time (`error`, `warn`, `info`, `debug`, `trace`).
pub fn log_level() -> LevelFilter {
    parse_level(option_env!("LOG"))
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Info)
}
