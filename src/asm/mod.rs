//! Two-pass assembler producing relocatable object records.

pub mod emit;
pub mod lexer;
pub mod parser;

pub use emit::{chunk_text, second_pass};
pub use lexer::{tokenize, tokenize_line, SourceLine};
pub use parser::{first_pass, parse_instruction, FirstPass, Instruction, Payload, SymbolTable};

use crate::record::Record;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: unrecognized statement {tokens:?}")]
    Shape { line: usize, tokens: Vec<String> },
    #[error("line {line}: unknown operation {mnemonic:?}")]
    UnknownOperation { line: usize, mnemonic: String },
    #[error("line {line}: invalid label {label:?}, expected a letter followed by up to 5 letters or digits")]
    InvalidLabel { line: usize, label: String },
    #[error("line {line}: label {label} already defined on line {first}")]
    DuplicateLabel { line: usize, label: String, first: usize },
    #[error("line {line}: {mnemonic}: {msg}")]
    Operand { line: usize, mnemonic: String, msg: String },
    #[error("line {line}: undefined symbol {symbol}")]
    UndefinedSymbol { line: usize, symbol: String },
    #[error("{}{msg}", .line.map(|l| format!("line {l}: ")).unwrap_or_default())]
    Structure { line: Option<usize>, msg: String },
}

impl AsmError {
    /// Source line the error refers to, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::Shape { line, .. }
            | AsmError::UnknownOperation { line, .. }
            | AsmError::InvalidLabel { line, .. }
            | AsmError::DuplicateLabel { line, .. }
            | AsmError::Operand { line, .. }
            | AsmError::UndefinedSymbol { line, .. } => Some(*line),
            AsmError::Structure { line, .. } => *line,
        }
    }
}

/// Assemble source text into an ordered object record sequence.
pub fn assemble(src: &str) -> Result<Vec<Record>, AsmError> {
    let fp = first_pass(tokenize(src))?;
    second_pass(&fp)
}
