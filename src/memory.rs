use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Size of the full 24-bit address space.
pub const ADDRESS_SPACE: usize = 1 << 24;

/// Mask for a 24-bit machine word.
pub const WORD_MASK: u32 = 0x00FF_FFFF;

/// Interpret the low 24 bits of `v` as a two's-complement value.
pub fn to_signed(v: u32) -> i32 {
    ((v << 8) as i32) >> 8
}

/// Truncate a signed value to its 24-bit two's-complement form.
pub fn from_signed(v: i32) -> u32 {
    (v as u32) & WORD_MASK
}

pub trait Bus {
    fn size(&self) -> usize;
    fn read_u8(&mut self, addr: u32) -> Result<u8>;
    fn read_u16(&mut self, addr: u32) -> Result<u16>;
    fn read_u24(&mut self, addr: u32) -> Result<u32>;
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()>;
    fn write_u16(&mut self, addr: u32, val: u16) -> Result<()>;
    fn write_u24(&mut self, addr: u32, val: u32) -> Result<()>;
    fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<()>;
}

/// Flat byte-addressable memory image.
#[derive(Clone, Serialize, Deserialize)]
pub struct LinearMemory {
    pub mem: Vec<u8>,
}

impl LinearMemory {
    pub fn new(size: usize) -> Self {
        Self { mem: vec![0; size] }
    }

    fn span(&self, addr: u32, len: usize) -> Result<std::ops::Range<usize>> {
        let start = addr as usize;
        let end = start + len;
        if end > self.mem.len() {
            bail!(
                "access of {len} byte(s) at {addr:#08x} exceeds memory size {:#08x}",
                self.mem.len()
            );
        }
        Ok(start..end)
    }
}

impl Default for LinearMemory {
    fn default() -> Self {
        Self::new(ADDRESS_SPACE)
    }
}

impl Bus for LinearMemory {
    fn size(&self) -> usize {
        self.mem.len()
    }
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        let r = self.span(addr, 1)?;
        Ok(self.mem[r.start])
    }
    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        let r = self.span(addr, 2)?;
        Ok(u16::from_le_bytes([self.mem[r.start], self.mem[r.start + 1]]))
    }
    fn read_u24(&mut self, addr: u32) -> Result<u32> {
        let r = self.span(addr, 3)?;
        let b = &self.mem[r];
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()> {
        let r = self.span(addr, 1)?;
        self.mem[r.start] = val;
        Ok(())
    }
    fn write_u16(&mut self, addr: u32, val: u16) -> Result<()> {
        let r = self.span(addr, 2)?;
        self.mem[r].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
    fn write_u24(&mut self, addr: u32, val: u32) -> Result<()> {
        let r = self.span(addr, 3)?;
        self.mem[r].copy_from_slice(&val.to_le_bytes()[..3]);
        Ok(())
    }
    fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<()> {
        let r = self.span(addr, bytes.len())?;
        self.mem[r].copy_from_slice(bytes);
        Ok(())
    }
}
