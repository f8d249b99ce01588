use crate::decoder::{Decoded, Decoder};
use crate::isa::sic::SicDecoder;
use crate::record::Record;

pub fn fmt_decoded(d: &Decoded) -> String {
    if !d.desc.needs_operand && d.address == 0 && !d.indexed {
        return d.desc.mnemonic.to_string();
    }
    let x = if d.indexed { ",X" } else { "" };
    format!("{:<5} {:#06x}{x}", d.desc.mnemonic, d.address)
}

pub fn fmt_record(r: &Record) -> String {
    match r {
        Record::Header { name, start, length } => format!("H {name:<6} {start:06X} {length:06X}"),
        Record::Text { start, payload } => {
            let hex: Vec<String> = payload.iter().map(|b| format!("{b:02x}")).collect();
            format!("T {start:06X} {:02X} {}", payload.len(), hex.join(" "))
        }
        Record::Modification { address, length } => format!("M {address:06X} {length:02X}"),
        Record::End { exec } => format!("E {exec:06X}"),
    }
}

/// One listing line of a disassembled text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub addr: u32,
    pub bytes: Vec<u8>,
    pub text: String,
}

/// Walk a text payload, decoding 3-byte words whose opcode is known and
/// falling back to single data bytes otherwise.
pub fn disasm_text(start: u32, payload: &[u8]) -> Vec<Line> {
    let dec = SicDecoder::new();
    let mut out = Vec::new();
    let mut off = 0;
    while off < payload.len() {
        let addr = start + off as u32;
        let decoded = payload
            .get(off..off + 3)
            .and_then(|w| dec.decode([w[0], w[1], w[2]]));
        match decoded {
            Some(d) => {
                out.push(Line { addr, bytes: payload[off..off + 3].to_vec(), text: fmt_decoded(&d) });
                off += 3;
            }
            None => {
                let b = payload[off];
                out.push(Line { addr, bytes: vec![b], text: format!("BYTE  {b:#04x}") });
                off += 1;
            }
        }
    }
    out
}
