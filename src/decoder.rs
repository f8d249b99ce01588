use crate::instructions::InstrDesc;

/// High bit of the 16-bit operand field.
pub const INDEXED_BIT: u16 = 0x8000;

/// Largest address expressible in an instruction word.
pub const MAX_DIRECT_ADDR: u32 = 0x7FFF;

/// Bytes of the address field that follows the opcode byte. Modification
/// records of this length patch an instruction's address.
pub const ADDR_FIELD_LEN: u8 = 2;

#[derive(Debug, Clone, Copy)]
pub struct Decoded {
    pub desc: &'static InstrDesc,
    pub indexed: bool,
    pub address: u16, // 15 bits
}

impl Decoded {
    pub fn encode(&self) -> [u8; 3] {
        encode_word(self.desc.opcode, self.address, self.indexed)
    }
}

/// Pack an instruction word: opcode byte, then the little-endian
/// `indexed:1 | address:15` field.
pub fn encode_word(opcode: u8, address: u16, indexed: bool) -> [u8; 3] {
    let mut field = address & 0x7FFF;
    if indexed {
        field |= INDEXED_BIT;
    }
    let [lo, hi] = field.to_le_bytes();
    [opcode, lo, hi]
}

pub trait Decoder {
    fn decode(&self, raw: [u8; 3]) -> Option<Decoded>;
}
