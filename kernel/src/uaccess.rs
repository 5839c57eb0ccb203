//! Access to user memory from syscall handlers
//!
//! User programs run identity-mapped in the same physical memory as the
//! kernel, so a user address is directly dereferenceable once it passes the
//! shape checks here (non-null, aligned, no wrap-around). Whether the range
//! belongs to the caller is the memory layer's business, not this module's.

use core::marker::PhantomData;
use core::mem::{align_of, size_of};
use kairos_abi::Errno;

/// A typed pointer into user memory.
pub struct UserPtr<T> {
    addr: usize,
    _marker: PhantomData<*mut T>,
}

impl<T> Clone for UserPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for UserPtr<T> {}

impl<T: Copy> UserPtr<T> {
    pub fn new(addr: usize) -> Self {
        Self {
            addr,
            _marker: PhantomData,
        }
    }

    pub fn is_null(&self) -> bool {
        self.addr == 0
    }

    /// Checks the pointer the way `read` and `write` will, without touching memory.
    pub fn check(&self) -> Result<(), Errno> {
        if self.addr == 0 || self.addr % align_of::<T>() != 0 {
            return Err(Errno::EFAULT);
        }
        self.addr
            .checked_add(size_of::<T>())
            .map(|_| ())
            .ok_or(Errno::EFAULT)
    }

    pub fn read(&self) -> Result<T, Errno> {
        self.check()?;
        // SAFETY: non-null, aligned and in an identity-mapped address space
        Ok(unsafe { core::ptr::read(self.addr as *const T) })
    }

    pub fn write(&self, value: T) -> Result<(), Errno> {
        self.check()?;
        // SAFETY: same as `read`
        unsafe { core::ptr::write(self.addr as *mut T, value) };
        Ok(())
    }
}

/// A byte range in user memory.
#[derive(Debug, Clone, Copy)]
pub struct UserBuffer {
    addr: usize,
    len: usize,
}

impl UserBuffer {
    pub fn new(addr: usize, len: usize) -> Self {
        Self { addr, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrows the range for writing.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8], Errno> {
        if self.len == 0 {
            return Ok(&mut []);
        }
        if self.addr == 0 || self.addr.checked_add(self.len).is_none() {
            return Err(Errno::EFAULT);
        }
        // SAFETY: non-null, does not wrap, identity-mapped
        Ok(unsafe { core::slice::from_raw_parts_mut(self.addr as *mut u8, self.len) })
    }
}

/// Copies a NUL-terminated path out of user memory into `buf`.
///
/// Fails with `EFAULT` if the pointer is null or no terminator appears within
/// `buf.len()` bytes, and with `EINVAL` if the path is not UTF-8.
pub fn read_path(addr: usize, buf: &mut [u8]) -> Result<&str, Errno> {
    if addr == 0 {
        return Err(Errno::EFAULT);
    }
    for i in 0..buf.len() {
        let byte = UserPtr::<u8>::new(addr.checked_add(i).ok_or(Errno::EFAULT)?).read()?;
        if byte == 0 {
            return core::str::from_utf8(&buf[..i]).map_err(|_| Errno::EINVAL);
        }
        buf[i] = byte;
    }
    Err(Errno::EFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_misaligned_pointers_fault() {
        assert_eq!(UserPtr::<u64>::new(0).read(), Err(Errno::EFAULT));
        let value = [0u64; 2];
        let misaligned = value.as_ptr() as usize + 1;
        assert_eq!(UserPtr::<u64>::new(misaligned).read(), Err(Errno::EFAULT));
    }

    #[test]
    fn check_matches_access() {
        let mut value = 0u64;
        let addr = &mut value as *mut u64 as usize;
        assert_eq!(UserPtr::<u64>::new(addr).check(), Ok(()));
        assert_eq!(UserPtr::<u64>::new(addr + 4).check(), Err(Errno::EFAULT));
        assert_eq!(UserPtr::<u64>::new(0).check(), Err(Errno::EFAULT));
    }

    #[test]
    fn reads_and_writes_through_user_pointer() {
        let mut value = 41u64;
        let ptr = UserPtr::<u64>::new(&mut value as *mut u64 as usize);
        assert_eq!(ptr.read(), Ok(41));
        ptr.write(42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn path_stops_at_terminator() {
        let raw = b"/dev/null\0garbage";
        let mut buf = [0u8; 32];
        assert_eq!(read_path(raw.as_ptr() as usize, &mut buf), Ok("/dev/null"));
    }

    #[test]
    fn unterminated_path_faults() {
        let raw = [b'a'; 8];
        let mut buf = [0u8; 8];
        assert_eq!(read_path(raw.as_ptr() as usize, &mut buf), Err(Errno::EFAULT));
        assert_eq!(read_path(0, &mut buf), Err(Errno::EFAULT));
    }

    #[test]
    fn empty_buffer_needs_no_address() {
        let mut buffer = UserBuffer::new(0, 0);
        assert_eq!(buffer.as_mut_slice().map(|s| s.len()), Ok(0));
        let mut bad = UserBuffer::new(0, 4);
        assert!(bad.as_mut_slice().is_err());
    }
}
