#![no_std]
#![no_main]

#[macro_use]
extern crate user_lib;

use core::hint::spin_loop;
use core::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use kairos_abi::{Errno, Stat, StatMode};
use user_lib::*;

static GOT_USR1: AtomicBool = AtomicBool::new(false);
static CHILD_EXITED: AtomicBool = AtomicBool::new(false);
static CHILD_FD: AtomicIsize = AtomicIsize::new(-1);

extern "C" fn on_usr1(signum: usize) {
    GOT_USR1.store(signum == SIGUSR1, Ordering::Release);
}

extern "C" fn on_chld(_signum: usize) {
    CHILD_EXITED.store(true, Ordering::Release);
}

fn check(what: &str, ok: bool) {
    if ok {
        println!("init: {} ok", what);
    } else {
        println!("init: {} FAILED (errno {})", what, errno());
    }
}

fn devices() {
    let console = open(c"/dev/console");
    check("open /dev/console", console == 0);
    let disk = open(c"/dev/disk0");
    let mut st = Stat::default();
    check("stat /dev/disk0", stat(disk as usize, &mut st) == 0);
    check("disk is a block device", st.mode().file_type() == StatMode::IFBLK.bits());

    let zero = open(c"/dev/zero");
    let mut buf = [0xffu8; 16];
    check("read /dev/zero", read(zero as usize, &mut buf) == 0 && buf == [0; 16]);

    let null = open(c"/dev/null");
    check("table is full", open(c"/dev/null") == -1 && errno() == Errno::EAGAIN.code());
    check("unknown path", {
        close(null as usize);
        open(c"/dev/tty7") == -1 && errno() == Errno::EINVAL.code()
    });

    for fd in 0..4 {
        close(fd);
    }
    check("close of an empty slot", close(0) == -1 && errno() == Errno::EINVAL.code());
    check("close out of range", close(4) == -1 && errno() == Errno::EINVAL.code());
}

fn memory() {
    let base = brk(0);
    let grown = brk(base as usize + 0x1000);
    check("brk grows", grown == base + 0x1000);
    check("brk refuses the stack", brk(usize::MAX) == grown);
}

fn signals() {
    check("install SIGUSR1 handler", signal(SIGUSR1, on_usr1) == 0);
    check("SIGKILL cannot be caught", signal(SIGKILL, on_usr1) == -1);
    kill(getpid() as usize, SIGUSR1);
    check("SIGUSR1 handled", GOT_USR1.load(Ordering::Acquire));
}

/// Runs in the forked child. The child shares memory with the parent, so
/// it reports through statics.
fn child() -> ! {
    test_fork(0xc41d);
    CHILD_FD.store(open(c"/dev/null"), Ordering::Release);
    exit(7)
}

fn process() {
    signal(SIGCHLD, on_chld);
    let pid = fork();
    if pid == 0 {
        child();
    }
    // the child runs on this stack once we are preempted; make no calls
    while !CHILD_EXITED.load(Ordering::Acquire) {
        spin_loop();
    }
    check("fork returned a child pid", pid > 0);
    check("child opened fd 0", CHILD_FD.load(Ordering::Acquire) == 0);
    check("parent's fd 0 is still empty", close(0) == -1 && errno() == Errno::EINVAL.code());
}

#[no_mangle]
fn main() -> i32 {
    println!("init: pid {} ppid {}", getpid(), getppid());
    devices();
    memory();
    check("block device self test", block_test() == 0);
    signals();
    process();
    println!("init: done");
    0
}
