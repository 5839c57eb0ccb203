//! ELF loader for the init program

use crate::config::PAGE_SIZE;
use alloc::vec;
use alloc::vec::Vec;
use bitflags::bitflags;
use core::fmt;
use kairos_abi::Errno;
use xmas_elf::program::Type;
use xmas_elf::ElfFile;

/// e_machine for RISC-V
const EM_RISCV: u16 = 0xF3;
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
/// Size of an Elf64_Phdr
const PHDR_SIZE: usize = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// No image was registered
    Missing,
    /// xmas-elf rejected the headers
    Malformed(&'static str),
    /// Not a little-endian 64-bit RISC-V image
    WrongArch,
    /// A header or segment points past the end of the file
    Truncated,
    NoLoadSegment,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Missing => f.write_str("no init image"),
            LoadError::Malformed(reason) => write!(f, "malformed ELF: {}", reason),
            LoadError::WrongArch => f.write_str("not a 64-bit RISC-V ELF"),
            LoadError::Truncated => f.write_str("ELF truncated"),
            LoadError::NoLoadSegment => f.write_str("no loadable segment"),
        }
    }
}

impl From<LoadError> for Errno {
    fn from(_: LoadError) -> Self {
        Errno::ENOEXEC
    }
}

bitflags! {
    /// Segment permissions (ELF p_flags)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentFlags: u32 {
        const X = 1;
        const W = 2;
        const R = 4;
    }
}

/// Represents a loadable ELF segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub vaddr: usize,
    pub memsz: usize,
    pub data: Vec<u8>,
    pub flags: SegmentFlags,
}

impl Segment {
    pub fn end(&self) -> usize {
        self.vaddr + self.memsz
    }

    pub fn is_writable(&self) -> bool {
        self.flags.contains(SegmentFlags::W)
    }

    pub fn is_executable(&self) -> bool {
        self.flags.contains(SegmentFlags::X)
    }
}

/// A parsed user program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserImage {
    pub entry: usize,
    /// Page-aligned end of the highest loadable segment; the heap starts here.
    pub end_data: usize,
    pub segments: Vec<Segment>,
}

pub fn align_up(addr: usize) -> usize {
    (addr + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

impl UserImage {
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::Missing);
        }
        // xmas-elf reads headers in place and needs them 8-byte aligned
        let mut words = vec![0u64; bytes.len().div_ceil(8)];
        // SAFETY: the u64 buffer spans at least `bytes.len()` bytes
        let aligned = unsafe {
            core::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, bytes.len())
        };
        aligned.copy_from_slice(bytes);
        let data: &[u8] = aligned;

        let elf = ElfFile::new(data).map_err(LoadError::Malformed)?;
        // e_ident[EI_CLASS], e_ident[EI_DATA], e_machine
        if data[4] != ELFCLASS64
            || data[5] != ELFDATA2LSB
            || data.len() < 20
            || u16::from_le_bytes([data[18], data[19]]) != EM_RISCV
        {
            return Err(LoadError::WrongArch);
        }

        let pt2 = &elf.header.pt2;
        let ph_count = pt2.ph_count() as usize;
        let table_end = (pt2.ph_offset() as usize)
            .checked_add(ph_count * PHDR_SIZE)
            .ok_or(LoadError::Truncated)?;
        if ph_count > 0 && (pt2.ph_entry_size() as usize != PHDR_SIZE || table_end > data.len()) {
            return Err(LoadError::Truncated);
        }

        let mut segments = Vec::new();
        for ph in elf.program_iter() {
            if ph.get_type() != Ok(Type::Load) {
                continue;
            }
            let offset = ph.offset() as usize;
            let file_size = ph.file_size() as usize;
            let file_end = offset.checked_add(file_size).ok_or(LoadError::Truncated)?;
            if file_end > data.len() {
                return Err(LoadError::Truncated);
            }
            let vaddr = ph.virtual_addr() as usize;
            let memsz = ph.mem_size() as usize;
            vaddr.checked_add(memsz).ok_or(LoadError::Truncated)?;
            segments.push(Segment {
                vaddr,
                memsz,
                data: data[offset..file_end].to_vec(),
                flags: SegmentFlags::from_bits_truncate(ph.flags().0),
            });
        }

        let end = segments
            .iter()
            .map(Segment::end)
            .max()
            .ok_or(LoadError::NoLoadSegment)?;

        Ok(Self {
            entry: pt2.entry_point() as usize,
            end_data: align_up(end),
            segments,
        })
    }

    /// Copies every segment to its link address and zeroes the rest of it.
    ///
    /// # Safety
    ///
    /// Segment addresses must be identity-mapped, writable and not in use by
    /// the kernel.
    pub unsafe fn install(&self) {
        for segment in &self.segments {
            let dst = segment.vaddr as *mut u8;
            core::ptr::copy_nonoverlapping(segment.data.as_ptr(), dst, segment.data.len());
            core::ptr::write_bytes(
                dst.add(segment.data.len()),
                0,
                segment.memsz.saturating_sub(segment.data.len()),
            );
        }
    }
}
