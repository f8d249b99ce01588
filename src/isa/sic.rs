use crate::decoder::{Decoded, Decoder, INDEXED_BIT};
use crate::instructions;

/// Decoder for the single 3-byte SIC instruction format.
pub struct SicDecoder;

impl SicDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SicDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SicDecoder {
    fn decode(&self, raw: [u8; 3]) -> Option<Decoded> {
        let desc = instructions::by_opcode(raw[0])?;
        let field = u16::from_le_bytes([raw[1], raw[2]]);
        Some(Decoded {
            desc,
            indexed: field & INDEXED_BIT != 0,
            address: field & !INDEXED_BIT,
        })
    }
}
