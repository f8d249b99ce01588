use crate::cpu::Reg;

/// Size in bytes of every encoded instruction.
pub const INSTR_SIZE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 8-bit opcode, 1 indexed bit, 15-bit address.
    Sic = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Word,
    Byte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Always,
    Eq,
    Lt,
    Gt,
}

/// What an opcode does when executed. Interpreted by `exec::IntExecutor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Load { reg: Reg, width: Width },
    Store { reg: Reg, width: Width },
    Compare { reg: Reg },
    Tix,
    Add,
    Sub,
    Jump(Cond),
    Jsub,
    Rsub,
    Rd,
    Wd,
    Halt,
    Nop,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub opcode: u8,
    pub format: Format,
    pub needs_operand: bool,
    pub effect: Effect,
}

const fn op(mnemonic: &'static str, opcode: u8, needs_operand: bool, effect: Effect) -> InstrDesc {
    InstrDesc {
        mnemonic,
        opcode,
        format: Format::Sic,
        needs_operand,
        effect,
    }
}

pub const TABLE: &[InstrDesc] = &[
    op("LDA", 0x00, true, Effect::Load { reg: Reg::A, width: Width::Word }),
    op("LDCH", 0x01, true, Effect::Load { reg: Reg::A, width: Width::Byte }),
    op("LDX", 0x02, true, Effect::Load { reg: Reg::X, width: Width::Word }),
    op("LDL", 0x03, true, Effect::Load { reg: Reg::L, width: Width::Word }),
    op("LDS", 0x04, true, Effect::Load { reg: Reg::S, width: Width::Word }),
    op("STA", 0x05, true, Effect::Store { reg: Reg::A, width: Width::Word }),
    op("STCH", 0x06, true, Effect::Store { reg: Reg::A, width: Width::Byte }),
    op("STX", 0x07, true, Effect::Store { reg: Reg::X, width: Width::Word }),
    op("STL", 0x08, true, Effect::Store { reg: Reg::L, width: Width::Word }),
    op("STS", 0x09, true, Effect::Store { reg: Reg::S, width: Width::Word }),
    op("COMP", 0x0A, true, Effect::Compare { reg: Reg::A }),
    op("TIX", 0x0B, true, Effect::Tix),
    op("ADD", 0x0C, true, Effect::Add),
    op("SUB", 0x0D, true, Effect::Sub),
    op("J", 0x0E, true, Effect::Jump(Cond::Always)),
    op("JEQ", 0x0F, true, Effect::Jump(Cond::Eq)),
    op("JLT", 0x10, true, Effect::Jump(Cond::Lt)),
    op("JGT", 0x11, true, Effect::Jump(Cond::Gt)),
    op("JSUB", 0x12, true, Effect::Jsub),
    op("RSUB", 0x13, false, Effect::Rsub),
    op("RD", 0x14, false, Effect::Rd),
    op("WD", 0x15, false, Effect::Wd),
    op("HLT", 0x16, false, Effect::Halt),
    op("NOP", 0x17, false, Effect::Nop),
];

pub fn by_mnemonic(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == mnemonic)
}

pub fn by_opcode(opcode: u8) -> Option<&'static InstrDesc> {
    // Codes are dense and assigned in table order.
    TABLE.get(opcode as usize).filter(|d| d.opcode == opcode)
}
