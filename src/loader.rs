use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decoder::{ADDR_FIELD_LEN, INDEXED_BIT, MAX_DIRECT_ADDR};
use crate::memory::Bus;
use crate::record::{Record, RecordReader};

/// Where a program ended up after loading.
///
/// All addresses are absolute memory addresses: the load base has already
/// been added, so `exec_address` can be handed to `Cpu::reset` directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedProgram {
    pub name: String,
    pub base: u32,
    /// First byte of the program image (`base + start`).
    pub origin: u32,
    pub exec_address: u32,
    /// One past the last byte of the image (`base + start + length`).
    pub terminal_address: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("{kind} record appears before the header record")]
    MissingHeader { kind: &'static str },
    #[error("object program has more than one header record")]
    DuplicateHeader,
    #[error("object program has no end record")]
    MissingEnd,
    #[error("program {name} ends at {end:#08x}, beyond memory size {size:#08x}")]
    TooLarge { name: String, end: u64, size: usize },
    #[error("relocated value {value:#x} at {addr:#08x} does not fit in field limit {limit:#x}")]
    RelocationOverflow { addr: u32, value: u64, limit: u64 },
    #[error("write of {len} byte(s) at {addr:#08x} is outside memory")]
    OutOfBounds { addr: u32, len: usize, #[source] source: anyhow::Error },
}

fn kind(rec: &Record) -> &'static str {
    match rec {
        Record::Header { .. } => "header",
        Record::Text { .. } => "text",
        Record::Modification { .. } => "modification",
        Record::End { .. } => "end",
    }
}

/// Replay `records` into `bus`, relocating the program by `base`.
///
/// Stops at the first end record; anything after it is ignored.
pub fn load<'r, B, I>(bus: &mut B, records: I, base: u32) -> Result<LoadedProgram, LoadError>
where
    B: Bus,
    I: IntoIterator<Item = &'r Record>,
{
    let mut loaded: Option<LoadedProgram> = None;

    for rec in records {
        if !matches!(rec, Record::Header { .. }) && loaded.is_none() {
            return Err(LoadError::MissingHeader { kind: kind(rec) });
        }
        match rec {
            Record::Header { name, start, length } => {
                if loaded.is_some() {
                    return Err(LoadError::DuplicateHeader);
                }
                let end = base as u64 + *start as u64 + *length as u64;
                if end > bus.size() as u64 {
                    return Err(LoadError::TooLarge { name: name.clone(), end, size: bus.size() });
                }
                debug!("loading {name} (start {start:#08x}, length {length:#08x}) at base {base:#08x}");
                loaded = Some(LoadedProgram {
                    name: name.clone(),
                    base,
                    origin: base + start,
                    exec_address: 0,
                    terminal_address: end as u32,
                });
            }
            Record::Text { start, payload } => {
                let addr = base.wrapping_add(*start);
                debug!("text {addr:#08x} ({} bytes)", payload.len());
                bus.write_bytes(addr, payload).map_err(|source| LoadError::OutOfBounds {
                    addr,
                    len: payload.len(),
                    source,
                })?;
            }
            Record::Modification { address, length } => {
                let addr = base.wrapping_add(*address);
                relocate(bus, addr, *length as usize, base)?;
            }
            Record::End { exec } => {
                if let Some(mut prog) = loaded.take() {
                    prog.exec_address = base.wrapping_add(*exec);
                    debug!(
                        "loaded {}: exec {:#08x}, terminal {:#08x}",
                        prog.name, prog.exec_address, prog.terminal_address
                    );
                    return Ok(prog);
                }
            }
        }
    }

    Err(LoadError::MissingEnd)
}

/// Add `delta` to the little-endian field of `len` bytes at `addr`.
///
/// An instruction address field keeps its indexed bit and may only grow up
/// to `MAX_DIRECT_ADDR`; any other field may use all of its bits.
fn relocate<B: Bus>(bus: &mut B, addr: u32, len: usize, delta: u32) -> Result<(), LoadError> {
    let len = len.min(8);
    let oob = |source| LoadError::OutOfBounds { addr, len, source };
    let mut value: u64 = 0;
    for i in (0..len).rev() {
        let b = bus.read_u8(addr.wrapping_add(i as u32)).map_err(oob)?;
        value = (value << 8) | b as u64;
    }
    let (limit, flags) = if len == ADDR_FIELD_LEN as usize {
        (MAX_DIRECT_ADDR as u64, value & INDEXED_BIT as u64)
    } else {
        (u64::MAX.checked_shr(64 - 8 * len as u32).unwrap_or(0), 0)
    };
    let target = (value & limit)
        .checked_add(delta as u64)
        .filter(|&v| v <= limit)
        .ok_or(LoadError::RelocationOverflow {
            addr,
            value: (value & limit).wrapping_add(delta as u64),
            limit,
        })?;
    let patched = flags | target;
    bus.write_bytes(addr, &patched.to_le_bytes()[..len]).map_err(oob)?;
    debug!("modification {addr:#08x}: {value:#x} -> {patched:#x}");
    Ok(())
}

/// Decode a raw object file image and load it.
pub fn load_bytes<B: Bus>(bus: &mut B, image: &[u8], base: u32) -> Result<LoadedProgram, LoadError> {
    let records: Vec<Record> = RecordReader::new(image).collect();
    load(bus, &records, base)
}
