pub mod asm;
pub mod console;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod loader;
pub mod memory;
pub mod record;

pub mod isa {
    pub mod sic; // 3-byte SIC format
}

pub use asm::{assemble, AsmError};
pub use console::{BufferConsole, Console, StdConsole};
pub use cpu::{Cpu, CpuConfig, Halt, Trap};
pub use loader::{load, load_bytes, LoadError, LoadedProgram};
pub use memory::{Bus, LinearMemory};
pub use record::{decode_program, encode_program, Record, RecordReader};
