use super::SyscallResult;
use crate::config::{MAX_FDS, PATH_MAX};
use crate::fs::{InodeId, Transfer};
use crate::kernel::Kernel;
use crate::trap::TrapFrame;
use crate::uaccess::{read_path, UserBuffer, UserPtr};
use kairos_abi::{Errno, Stat};
use log::{debug, warn};

/// Inode behind `fd` in the caller's table.
fn lookup(kernel: &Kernel, fd: usize) -> Result<InodeId, Errno> {
    kernel.current()?.fds.get(fd).ok_or(Errno::EINVAL)
}

pub fn sys_open(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let fd = kernel.current()?.fds.first_free().ok_or(Errno::EAGAIN)?;
    let mut buf = [0u8; PATH_MAX];
    let path = read_path(tf.arg(0), &mut buf)?;
    let id = kernel.vfs.get_inode(path).map_err(|err| {
        debug!("[fs] open {}: {}", path, err);
        Errno::EINVAL
    })?;
    kernel.vfs.ref_inode(id)?;
    let process = kernel.current_mut()?;
    process.fds.install(fd, id);
    debug!("[fs] process {} opened {} as fd {}", process.pid, path, fd);
    Ok(fd)
}

pub fn sys_close(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let fd = tf.arg(0);
    if fd >= MAX_FDS {
        return Err(Errno::EINVAL);
    }
    let id = kernel.current_mut()?.fds.take(fd).ok_or(Errno::EINVAL)?;
    kernel.vfs.free_inode(id)?;
    Ok(0)
}

pub fn sys_stat(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let id = lookup(kernel, tf.arg(0))?;
    let stat = kernel.vfs.stat(id)?;
    UserPtr::<Stat>::new(tf.arg(1)).write(stat)?;
    Ok(0)
}

/// Reads from offset 0 into the caller's buffer. Reports 0 whatever happens;
/// transfer failures only reach the log.
pub fn sys_read(kernel: &mut Kernel, tf: &TrapFrame) -> SyscallResult {
    let fd = tf.arg(0);
    let id = lookup(kernel, fd)?;
    let mut buffer = UserBuffer::new(tf.arg(1), tf.arg(2));
    match buffer.as_mut_slice() {
        Ok(buf) => match kernel.vfs.request(id, Transfer::Read(buf), 0) {
            Ok(count) => debug!("[fs] read fd {}: {} bytes", fd, count),
            Err(err) => warn!("[fs] read fd {} failed: {}", fd, err),
        },
        Err(errno) => warn!("[fs] read fd {}: bad buffer ({})", fd, errno),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use crate::testing::{invoke, TestBed};
    use kairos_abi::{Errno, Stat, StatMode, Sysno};

    fn open(bed: &mut TestBed, path: &[u8]) -> isize {
        invoke(&mut bed.kernel, Sysno::Open, [path.as_ptr() as usize, 0, 0, 0, 0, 0])
    }

    fn close(bed: &mut TestBed, fd: usize) -> isize {
        invoke(&mut bed.kernel, Sysno::Close, [fd, 0, 0, 0, 0, 0])
    }

    #[test]
    fn open_fills_the_lowest_slot_and_takes_a_reference() {
        let mut bed = TestBed::booted();
        assert_eq!(open(&mut bed, b"/dev/null\0"), 0);
        assert_eq!(open(&mut bed, b"/dev/zero\0"), 1);
        assert_eq!(open(&mut bed, b"/dev/null\0"), 2);

        let id = bed.kernel.current().unwrap().fds.get(0).unwrap();
        assert_eq!(bed.kernel.vfs.refs(id), 2);
    }

    #[test]
    fn open_on_a_full_table_is_eagain() {
        let mut bed = TestBed::booted();
        for fd in 0..4 {
            assert_eq!(open(&mut bed, b"/dev/zero\0"), fd);
        }
        assert_eq!(open(&mut bed, b"/dev/zero\0"), Errno::EAGAIN.as_return());
        // a full table fails before the path is looked at
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Open, [0; 6]),
            Errno::EAGAIN.as_return()
        );
        let id = bed.kernel.current().unwrap().fds.get(0).unwrap();
        assert_eq!(bed.kernel.vfs.refs(id), 4);
    }

    #[test]
    fn unknown_path_leaves_the_slot_empty() {
        let mut bed = TestBed::booted();
        assert_eq!(open(&mut bed, b"/dev/tty9\0"), Errno::EINVAL.as_return());
        assert_eq!(bed.kernel.current().unwrap().fds.open_count(), 0);
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Open, [0; 6]),
            Errno::EFAULT.as_return()
        );
    }

    #[test]
    fn close_releases_and_destroys_at_zero() {
        let mut bed = TestBed::booted();
        open(&mut bed, b"/dev/null\0");
        open(&mut bed, b"/dev/null\0");
        let id = bed.kernel.current().unwrap().fds.get(0).unwrap();

        assert_eq!(close(&mut bed, 0), 0);
        assert_eq!(bed.kernel.vfs.refs(id), 1);
        assert_eq!(close(&mut bed, 1), 0);
        assert_eq!(bed.kernel.vfs.refs(id), 0);
        assert_eq!(bed.kernel.vfs.live_inodes(), 0);
    }

    #[test]
    fn close_out_of_range_or_empty_is_einval_without_side_effects() {
        let mut bed = TestBed::booted();
        open(&mut bed, b"/dev/null\0");
        let id = bed.kernel.current().unwrap().fds.get(0).unwrap();

        assert_eq!(close(&mut bed, 4), Errno::EINVAL.as_return());
        assert_eq!(close(&mut bed, usize::MAX), Errno::EINVAL.as_return());
        assert_eq!(close(&mut bed, 3), Errno::EINVAL.as_return());
        assert_eq!(bed.kernel.vfs.refs(id), 1);
        assert_eq!(close(&mut bed, 0), 0);
        assert_eq!(close(&mut bed, 0), Errno::EINVAL.as_return());
    }

    #[test]
    fn stat_copies_the_record() {
        let mut bed = TestBed::booted();
        open(&mut bed, b"/dev/disk0\0");
        let mut stat = Stat::default();
        let out = &mut stat as *mut Stat as usize;
        assert_eq!(invoke(&mut bed.kernel, Sysno::Stat, [0, out, 0, 0, 0, 0]), 0);
        assert_eq!(stat.nlink, 1);
        assert_eq!(stat.size, 64 * 512);
        assert_eq!(stat.blksize, 512);
        assert_eq!(stat.mode().file_type(), StatMode::IFBLK.bits());

        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Stat, [1, out, 0, 0, 0, 0]),
            Errno::EINVAL.as_return()
        );
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Stat, [0, 0, 0, 0, 0, 0]),
            Errno::EFAULT.as_return()
        );
    }

    #[test]
    fn read_fills_the_buffer_but_reports_zero() {
        let mut bed = TestBed::booted();
        open(&mut bed, b"/dev/zero\0");
        let mut buf = [0xffu8; 8];
        let args = [0, buf.as_mut_ptr() as usize, buf.len(), 0, 0, 0];
        assert_eq!(invoke(&mut bed.kernel, Sysno::Read, args), 0);
        assert_eq!(buf, [0; 8]);
    }

    #[test]
    fn read_from_the_console_takes_pending_input() {
        let mut bed = TestBed::booted();
        bed.console.push_input(b"hi");
        open(&mut bed, b"/dev/console\0");
        let mut buf = [0u8; 4];
        let args = [0, buf.as_mut_ptr() as usize, buf.len(), 0, 0, 0];
        assert_eq!(invoke(&mut bed.kernel, Sysno::Read, args), 0);
        assert_eq!(&buf[..2], b"hi");
    }

    #[test]
    fn read_swallows_transfer_failures() {
        let mut bed = TestBed::booted();
        open(&mut bed, b"/dev/zero\0");
        assert_eq!(invoke(&mut bed.kernel, Sysno::Read, [0, 0, 16, 0, 0, 0]), 0);
        assert_eq!(
            invoke(&mut bed.kernel, Sysno::Read, [2, 0, 16, 0, 0, 0]),
            Errno::EINVAL.as_return()
        );
    }
}
