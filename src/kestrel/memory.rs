//! Byte-addressable segmented memory.
//!
//! Four segments back the address space: text, static data, heap and stack
//! (see [`crate::kestrel::arch`] for the layout). Multi-byte accesses are
//! little-endian, must fit inside one segment and must be naturally aligned;
//! unaligned halves/words are rejected rather than emulated.

use crate::kestrel::arch;
use crate::kestrel::errors::MemError;

pub struct Memory {
    text: Vec<u8>,
    data: Vec<u8>,
    heap: Vec<u8>,
    stack: Vec<u8>,
}

const STATIC_SIZE: u32 = arch::HEAP_BEGIN - arch::STATIC_BEGIN;
const HEAP_SIZE: u32 = arch::HEAP_END - arch::HEAP_BEGIN;
const STACK_BASE: u32 = arch::STACK_END - arch::STACK_SIZE;

fn offset_in(addr: u32, len: u32, base: u32, size: u32) -> Option<usize> {
    let off = addr.checked_sub(base)?;
    if off as u64 + len as u64 <= size as u64 {
        Some(off as usize)
    } else {
        None
    }
}

impl Memory {
    /// Builds memory with `text` (little-endian words) and `data` copied to
    /// the start of their segments. `data` must fit the static segment; the
    /// linker guarantees that for linked programs.
    pub fn new(text: &[u32], data: &[u8]) -> Self {
        let text: Vec<u8> = text.iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut static_bytes = vec![0u8; STATIC_SIZE as usize];
        static_bytes[..data.len()].copy_from_slice(data);
        Memory {
            text,
            data: static_bytes,
            heap: vec![0u8; HEAP_SIZE as usize],
            stack: vec![0u8; arch::STACK_SIZE as usize],
        }
    }

    fn seg(&self, addr: u32, len: u32) -> Result<(&[u8], usize), MemError> {
        if let Some(off) = offset_in(addr, len, arch::TEXT_BEGIN, self.text.len() as u32) {
            return Ok((&self.text, off));
        }
        if let Some(off) = offset_in(addr, len, arch::STATIC_BEGIN, STATIC_SIZE) {
            return Ok((&self.data, off));
        }
        if let Some(off) = offset_in(addr, len, arch::HEAP_BEGIN, HEAP_SIZE) {
            return Ok((&self.heap, off));
        }
        if let Some(off) = offset_in(addr, len, STACK_BASE, arch::STACK_SIZE) {
            return Ok((&self.stack, off));
        }
        Err(MemError::OutOfSegment(addr))
    }

    fn seg_mut(&mut self, addr: u32, len: u32) -> Result<(&mut [u8], usize), MemError> {
        if let Some(off) = offset_in(addr, len, arch::TEXT_BEGIN, self.text.len() as u32) {
            return Ok((&mut self.text, off));
        }
        if let Some(off) = offset_in(addr, len, arch::STATIC_BEGIN, STATIC_SIZE) {
            return Ok((&mut self.data, off));
        }
        if let Some(off) = offset_in(addr, len, arch::HEAP_BEGIN, HEAP_SIZE) {
            return Ok((&mut self.heap, off));
        }
        if let Some(off) = offset_in(addr, len, STACK_BASE, arch::STACK_SIZE) {
            return Ok((&mut self.stack, off));
        }
        Err(MemError::OutOfSegment(addr))
    }

    fn check_aligned(addr: u32, width: u32) -> Result<(), MemError> {
        if addr % width != 0 {
            Err(MemError::Unaligned { addr, width })
        } else {
            Ok(())
        }
    }

    pub fn load8(&self, addr: u32) -> Result<u8, MemError> {
        let (seg, off) = self.seg(addr, 1)?;
        Ok(seg[off])
    }

    pub fn load16(&self, addr: u32) -> Result<u16, MemError> {
        Self::check_aligned(addr, 2)?;
        let (seg, off) = self.seg(addr, 2)?;
        Ok(u16::from_le_bytes([seg[off], seg[off + 1]]))
    }

    pub fn load32(&self, addr: u32) -> Result<u32, MemError> {
        Self::check_aligned(addr, 4)?;
        let (seg, off) = self.seg(addr, 4)?;
        Ok(u32::from_le_bytes([
            seg[off],
            seg[off + 1],
            seg[off + 2],
            seg[off + 3],
        ]))
    }

    pub fn store8(&mut self, addr: u32, value: u8) -> Result<(), MemError> {
        let (seg, off) = self.seg_mut(addr, 1)?;
        seg[off] = value;
        Ok(())
    }

    pub fn store16(&mut self, addr: u32, value: u16) -> Result<(), MemError> {
        Self::check_aligned(addr, 2)?;
        let (seg, off) = self.seg_mut(addr, 2)?;
        seg[off..off + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn store32(&mut self, addr: u32, value: u32) -> Result<(), MemError> {
        Self::check_aligned(addr, 4)?;
        let (seg, off) = self.seg_mut(addr, 4)?;
        seg[off..off + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem() -> Memory {
        Memory::new(&[0x0000_0013], &[1, 2, 3, 4])
    }

    #[test]
    fn data_lands_in_static_segment() {
        let m = mem();
        assert_eq!(m.load8(arch::STATIC_BEGIN).unwrap(), 1);
        assert_eq!(m.load8(arch::STATIC_BEGIN + 3).unwrap(), 4);
        assert_eq!(m.load32(arch::STATIC_BEGIN).unwrap(), 0x0403_0201);
    }

    #[test]
    fn word_access_is_little_endian() {
        let mut m = mem();
        m.store32(arch::HEAP_BEGIN, 0xDEAD_BEEF).unwrap();
        assert_eq!(m.load8(arch::HEAP_BEGIN).unwrap(), 0xEF);
        assert_eq!(m.load8(arch::HEAP_BEGIN + 3).unwrap(), 0xDE);
    }

    #[test]
    fn stack_is_writable_below_stack_end() {
        let mut m = mem();
        m.store32(arch::STACK_BEGIN - 4, 7).unwrap();
        assert_eq!(m.load32(arch::STACK_BEGIN - 4).unwrap(), 7);
    }

    #[test]
    fn unmapped_access_errors() {
        let m = mem();
        assert_eq!(m.load8(0x0800_0000), Err(MemError::OutOfSegment(0x0800_0000)));
        assert_eq!(m.load8(4), Err(MemError::OutOfSegment(4)));
    }

    #[test]
    fn unaligned_word_rejected() {
        let m = mem();
        assert_eq!(
            m.load32(arch::STATIC_BEGIN + 2),
            Err(MemError::Unaligned { addr: arch::STATIC_BEGIN + 2, width: 4 })
        );
    }

    #[test]
    fn access_may_not_straddle_a_segment_end() {
        let m = mem();
        let last = arch::HEAP_END - 2;
        assert!(m.load16(last).is_ok());
        assert!(m.load32(arch::HEAP_END - 4).is_ok());
        assert_eq!(m.load8(arch::HEAP_END), Err(MemError::OutOfSegment(arch::HEAP_END)));
    }
}
