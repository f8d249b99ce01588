use tracing::debug;

use super::parser::{Directive, FirstPass, Instruction, Operation, Payload, SymbolTable};
use super::AsmError;
use crate::decoder::{encode_word, ADDR_FIELD_LEN, MAX_DIRECT_ADDR};
use crate::instructions::INSTR_SIZE;
use crate::record::{Record, MAX_TEXT_LEN};

/// Group the instructions between `START` and `END` into text-record runs.
///
/// A run is a contiguous slice of instructions with object code. Reserve
/// directives end the current run, and a run is also cut before any
/// instruction that would push it past `MAX_TEXT_LEN` bytes.
pub fn chunk_text(body: &[Instruction]) -> Vec<&[Instruction]> {
    let mut chunks = Vec::new();
    let mut begin = 0;
    let mut len = 0usize;
    for (i, ins) in body.iter().enumerate() {
        if !ins.has_code() {
            if i > begin {
                chunks.push(&body[begin..i]);
            }
            begin = i + 1;
            len = 0;
            continue;
        }
        let size = ins.size() as usize;
        if len + size > MAX_TEXT_LEN && i > begin {
            chunks.push(&body[begin..i]);
            begin = i;
            len = 0;
        }
        len += size;
    }
    if begin < body.len() {
        chunks.push(&body[begin..]);
    }
    chunks
}

/// Encode one instruction's object bytes, recording a relocation entry
/// for every symbolic address.
fn encode(
    ins: &Instruction,
    symtab: &SymbolTable,
    out: &mut Vec<u8>,
    mods: &mut Vec<Record>,
) -> Result<(), AsmError> {
    match (&ins.op, &ins.payload) {
        (Operation::Opcode(desc), Payload::Opcode { symbol, indexed }) => {
            let address = match symbol {
                None => 0,
                Some(sym) => {
                    let addr = symtab.address(sym).ok_or_else(|| AsmError::UndefinedSymbol {
                        line: ins.line,
                        symbol: sym.clone(),
                    })?;
                    if addr > MAX_DIRECT_ADDR {
                        return Err(AsmError::Operand {
                            line: ins.line,
                            mnemonic: ins.mnemonic.clone(),
                            msg: format!("address {addr:#x} of {sym} does not fit in 15 bits"),
                        });
                    }
                    mods.push(Record::Modification {
                        address: ins.location + 1,
                        length: ADDR_FIELD_LEN,
                    });
                    addr
                }
            };
            out.extend_from_slice(&encode_word(desc.opcode, address as u16, *indexed));
        }
        (_, Payload::Word(v)) => out.extend_from_slice(&v.to_le_bytes()[..INSTR_SIZE as usize]),
        (_, Payload::Byte(bytes)) => out.extend_from_slice(bytes),
        _ => {
            return Err(AsmError::Structure {
                line: Some(ins.line),
                msg: format!("{} produces no object code", ins.mnemonic),
            })
        }
    }
    Ok(())
}

fn exec_address(end: &Instruction, symtab: &SymbolTable) -> Result<u32, AsmError> {
    let Payload::End { symbol, address } = &end.payload else {
        return Ok(0);
    };
    if let Some(addr) = symbol.as_deref().and_then(|s| symtab.address(s)) {
        return Ok(addr);
    }
    match (address, symbol) {
        (Some(addr), _) => Ok(*addr),
        (None, Some(sym)) => Err(AsmError::UndefinedSymbol {
            line: end.line,
            symbol: sym.clone(),
        }),
        (None, None) => Ok(0),
    }
}

/// Object-code pass: resolve symbols and emit the record sequence.
pub fn second_pass(fp: &FirstPass) -> Result<Vec<Record>, AsmError> {
    let ins = &fp.instructions;
    if ins.len() < 3 {
        return Err(AsmError::Structure {
            line: None,
            msg: format!("program has {} statement(s); START, END and at least one more are required", ins.len()),
        });
    }
    let (first, last) = (&ins[0], &ins[ins.len() - 1]);
    let Payload::Start { name, address: start } = &first.payload else {
        return Err(AsmError::Structure {
            line: Some(first.line),
            msg: "the first statement must be START".into(),
        });
    };
    if !last.is_directive(Directive::End) {
        return Err(AsmError::Structure {
            line: Some(last.line),
            msg: "the last statement must be END".into(),
        });
    }
    let body = &ins[1..ins.len() - 1];
    if let Some(stray) = body
        .iter()
        .find(|i| i.is_directive(Directive::Start) || i.is_directive(Directive::End))
    {
        return Err(AsmError::Structure {
            line: Some(stray.line),
            msg: format!("{} may only appear at the program boundary", stray.mnemonic),
        });
    }

    let mut records = vec![Record::Header {
        name: name.clone(),
        start: *start,
        length: fp.length,
    }];
    let mut mods = Vec::new();

    for chunk in chunk_text(body) {
        let mut payload = Vec::with_capacity(MAX_TEXT_LEN);
        for i in chunk {
            encode(i, &fp.symtab, &mut payload, &mut mods)?;
        }
        debug!("text {:#06x}: {} bytes", chunk[0].location, payload.len());
        records.push(Record::Text {
            start: chunk[0].location,
            payload,
        });
    }

    debug!("{} modification record(s)", mods.len());
    records.extend(mods);
    records.push(Record::End {
        exec: exec_address(last, &fp.symtab)?,
    });
    Ok(records)
}
