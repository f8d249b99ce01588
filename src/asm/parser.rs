use std::collections::HashMap;

use tracing::debug;

use super::lexer::SourceLine;
use super::AsmError;
use crate::instructions::{self, InstrDesc, INSTR_SIZE};
use crate::memory::{from_signed, WORD_MASK};
use crate::record::MAX_TEXT_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Start,
    End,
    Byte,
    Word,
    Resb,
    Resw,
}

impl Directive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "START" => Self::Start,
            "END" => Self::End,
            "BYTE" => Self::Byte,
            "WORD" => Self::Word,
            "RESB" => Self::Resb,
            "RESW" => Self::Resw,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Operation {
    Opcode(&'static InstrDesc),
    Directive(Directive),
}

impl Operation {
    pub fn resolve(name: &str) -> Option<Self> {
        instructions::by_mnemonic(name)
            .map(Self::Opcode)
            .or_else(|| Directive::from_name(name).map(Self::Directive))
    }
}

/// Facts derived from the operand while sizing an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Opcode { symbol: Option<String>, indexed: bool },
    Word(u32),
    Byte(Vec<u8>),
    Start { name: String, address: u32 },
    /// `END` operand: a label, a literal address, or both readings when
    /// the text is ambiguous (e.g. `BEEF`). Resolved in the second pass.
    End { symbol: Option<String>, address: Option<u32> },
    Reserve { count: u32, unit: u32 },
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub mnemonic: String,
    pub op: Operation,
    pub location: u32,
    pub line: usize,
    pub label: Option<String>,
    pub operand: Option<String>,
    pub payload: Payload,
}

impl Instruction {
    /// Bytes this instruction occupies in the program image.
    pub fn size(&self) -> u32 {
        match &self.payload {
            Payload::Opcode { .. } | Payload::Word(_) => INSTR_SIZE,
            Payload::Byte(bytes) => bytes.len() as u32,
            Payload::Start { .. } | Payload::End { .. } => 0,
            Payload::Reserve { count, unit } => count * unit,
        }
    }

    /// Whether the instruction produces object bytes.
    pub fn has_code(&self) -> bool {
        matches!(
            self.payload,
            Payload::Opcode { .. } | Payload::Word(_) | Payload::Byte(_)
        )
    }

    pub fn is_directive(&self, dir: Directive) -> bool {
        matches!(self.op, Operation::Directive(d) if d == dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub address: u32,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Define `name`; a label may only be defined once.
    pub fn define(&mut self, name: &str, address: u32, line: usize) -> Result<(), AsmError> {
        if let Some(prev) = self.entries.get(name) {
            return Err(AsmError::DuplicateLabel {
                line,
                label: name.to_string(),
                first: prev.line,
            });
        }
        debug!("symbol {name} = {address:#06x} (line {line})");
        self.entries.insert(name.to_string(), Symbol { address, line });
        Ok(())
    }

    pub fn address(&self, name: &str) -> Option<u32> {
        self.entries.get(name).map(|s| s.address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols sorted by address.
    pub fn sorted(&self) -> Vec<(&str, u32)> {
        let mut v: Vec<_> = self
            .entries
            .iter()
            .map(|(k, s)| (k.as_str(), s.address))
            .collect();
        v.sort_by_key(|&(name, addr)| (addr, name));
        v
    }
}

/// Output of the location pass.
#[derive(Debug, Clone)]
pub struct FirstPass {
    pub symtab: SymbolTable,
    pub instructions: Vec<Instruction>,
    pub start: u32,
    pub length: u32,
}

/// An upper-case letter followed by up to five upper-case letters or digits.
pub fn is_label(s: &str) -> bool {
    s.len() <= 6 && is_symbol(s)
}

/// Shape of a symbolic operand. Longer than a label is allowed here; such
/// a name can never be defined and fails resolution in the second pass.
pub fn is_symbol(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_uppercase())
        && bytes.all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn is_hex4(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Build an instruction from one line's tokens, assigning it `locctr`.
pub fn parse_instruction(tokens: &[&str], locctr: u32, line: usize) -> Result<Instruction, AsmError> {
    let unknown = |name: &str| AsmError::UnknownOperation {
        line,
        mnemonic: name.to_string(),
    };
    let (label, name, operand, op) = match *tokens {
        [name] => (None, name, None, Operation::resolve(name).ok_or_else(|| unknown(name))?),
        [first, second] => match Operation::resolve(first) {
            Some(op) => (None, first, Some(second), op),
            None => {
                let op = Operation::resolve(second).ok_or_else(|| unknown(second))?;
                (Some(first), second, None, op)
            }
        },
        [label, name, operand] => (
            Some(label),
            name,
            Some(operand),
            Operation::resolve(name).ok_or_else(|| unknown(name))?,
        ),
        _ => {
            return Err(AsmError::Shape {
                line,
                tokens: tokens.iter().map(|t| t.to_string()).collect(),
            })
        }
    };

    if let Some(label) = label {
        if !is_label(label) {
            return Err(AsmError::InvalidLabel {
                line,
                label: label.to_string(),
            });
        }
    }

    let bad = |msg: String| AsmError::Operand {
        line,
        mnemonic: name.to_string(),
        msg,
    };
    let require = || operand.ok_or_else(|| bad("an operand is required".into()));

    let payload = match op {
        Operation::Opcode(desc) => match operand {
            None if desc.needs_operand => return Err(bad("an operand is required".into())),
            None => Payload::Opcode { symbol: None, indexed: false },
            Some(text) => {
                let (symbol, indexed) = match text.strip_suffix(",X") {
                    Some(sym) => (sym, true),
                    None => (text, false),
                };
                if !is_symbol(symbol) {
                    return Err(bad(format!("invalid operand {text:?}, expected LABEL or LABEL,X")));
                }
                Payload::Opcode {
                    symbol: Some(symbol.to_string()),
                    indexed,
                }
            }
        },
        Operation::Directive(Directive::Start) => {
            let Some(program) = label else {
                return Err(bad("START requires a program name label".into()));
            };
            let text = require()?;
            if !is_hex4(text) {
                return Err(bad(format!("invalid start address {text:?}, expected 4 hex digits")));
            }
            Payload::Start {
                name: program.to_string(),
                address: parse_hex(text),
            }
        }
        Operation::Directive(Directive::End) => match operand {
            None => Payload::End { symbol: None, address: Some(0) },
            Some(text) => {
                let symbol = is_symbol(text).then(|| text.to_string());
                let address = is_hex4(text).then(|| parse_hex(text));
                if symbol.is_none() && address.is_none() {
                    return Err(bad(format!("invalid execution address {text:?}")));
                }
                Payload::End { symbol, address }
            }
        },
        Operation::Directive(dir @ (Directive::Resb | Directive::Resw)) => {
            let text = require()?;
            let count: u32 = text
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| text.parse::<u32>().ok())
                .flatten()
                .ok_or_else(|| bad(format!("invalid count {text:?}, expected a decimal number")))?;
            let unit = if dir == Directive::Resb { 1 } else { INSTR_SIZE };
            if count as u64 * unit as u64 > WORD_MASK as u64 {
                return Err(bad(format!("reservation of {count} exceeds the address space")));
            }
            Payload::Reserve { count, unit }
        }
        Operation::Directive(Directive::Word) => {
            let text = require()?;
            Payload::Word(parse_word(text).map_err(bad)?)
        }
        Operation::Directive(Directive::Byte) => {
            let text = require()?;
            let bytes = parse_byte(text).map_err(bad)?;
            if !(1..=MAX_TEXT_LEN).contains(&bytes.len()) {
                return Err(bad(format!(
                    "BYTE literal is {} bytes, expected 1 to {MAX_TEXT_LEN}",
                    bytes.len()
                )));
            }
            Payload::Byte(bytes)
        }
    };

    Ok(Instruction {
        mnemonic: name.to_string(),
        op,
        location: locctr,
        line,
        label: label.map(str::to_string),
        operand: operand.map(str::to_string),
        payload,
    })
}

fn parse_hex(s: &str) -> u32 {
    // Callers validate the digits first.
    u32::from_str_radix(s, 16).unwrap_or(0)
}

/// `0xHHHHHH`, `<digits>U` or a signed decimal in 24-bit range.
pub fn parse_word(text: &str) -> Result<u32, String> {
    let invalid = || format!("invalid WORD operand {text:?}");
    if let Some(hex) = text.strip_prefix("0x") {
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        return u32::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    if let Some(digits) = text.strip_suffix('U') {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let v: u64 = digits.parse().map_err(|_| invalid())?;
        if v > WORD_MASK as u64 {
            return Err(format!("{v} does not fit in an unsigned 24-bit word"));
        }
        return Ok(v as u32);
    }
    let v: i64 = text.parse().map_err(|_| invalid())?;
    if !(-0x80_0000..=0x7F_FFFF).contains(&v) {
        return Err(format!("{v} does not fit in a signed 24-bit word"));
    }
    Ok(from_signed(v as i32))
}

/// `0xHH` or `c'<text>'` with `\n \t \r \0 \\ \'` escapes.
pub fn parse_byte(text: &str) -> Result<Vec<u8>, String> {
    let invalid = || format!("invalid BYTE operand {text:?}");
    if let Some(hex) = text.strip_prefix("0x") {
        if hex.len() != 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        return u8::from_str_radix(hex, 16).map(|b| vec![b]).map_err(|_| invalid());
    }
    let body = text
        .strip_prefix("c'")
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(invalid)?;
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        let ch = if ch == '\\' {
            match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some(c @ ('\\' | '\'')) => c,
                Some(c) => return Err(format!("unknown escape \\{c} in {text:?}")),
                None => return Err(invalid()),
            }
        } else {
            ch
        };
        if !ch.is_ascii() {
            return Err(format!("non-ASCII character {ch:?} in {text:?}"));
        }
        out.push(ch as u8);
    }
    Ok(out)
}

/// Location pass: assign addresses, size every instruction and collect
/// the symbol table.
pub fn first_pass<'a, I>(lines: I) -> Result<FirstPass, AsmError>
where
    I: IntoIterator<Item = SourceLine<'a>>,
{
    let mut symtab = SymbolTable::default();
    let mut instructions = Vec::new();
    let mut start = 0u32;
    let mut locctr = 0u32;

    for src in lines {
        let ins = parse_instruction(&src.tokens, locctr, src.line)?;

        if let Payload::Start { address, .. } = ins.payload {
            start = address;
            locctr = address;
        } else {
            let next = locctr as u64 + ins.size() as u64;
            if next > WORD_MASK as u64 {
                return Err(AsmError::Operand {
                    line: ins.line,
                    mnemonic: ins.mnemonic.clone(),
                    msg: format!("location counter {next:#x} overflows 24 bits"),
                });
            }
            locctr = next as u32;
        }

        if let Some(label) = &ins.label {
            symtab.define(label, ins.location, ins.line)?;
        }
        instructions.push(ins);
    }

    debug!("location pass: {} statement(s), {} symbol(s)", instructions.len(), symtab.len());
    Ok(FirstPass {
        symtab,
        instructions,
        start,
        length: locctr.wrapping_sub(start) & WORD_MASK,
    })
}
