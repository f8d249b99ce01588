use pretty_assertions::assert_eq;

use wsic_rs::cpu::Flow;
use wsic_rs::decoder::encode_word;
use wsic_rs::exec::IntExecutor;
use wsic_rs::isa::sic::SicDecoder;
use wsic_rs::{Bus, BufferConsole, Cpu, CpuConfig, Halt, LinearMemory, Trap};

const LDA: u8 = 0x00;
const LDCH: u8 = 0x01;
const LDX: u8 = 0x02;
const LDL: u8 = 0x03;
const STA: u8 = 0x05;
const STCH: u8 = 0x06;
const STX: u8 = 0x07;
const COMP: u8 = 0x0A;
const TIX: u8 = 0x0B;
const ADD: u8 = 0x0C;
const SUB: u8 = 0x0D;
const J: u8 = 0x0E;
const JEQ: u8 = 0x0F;
const JLT: u8 = 0x10;
const JSUB: u8 = 0x12;
const RSUB: u8 = 0x13;
const RD: u8 = 0x14;
const WD: u8 = 0x15;
const HLT: u8 = 0x16;
const NOP: u8 = 0x17;

struct Machine {
    cpu: Cpu,
    mem: LinearMemory,
    console: BufferConsole,
}

impl Machine {
    fn new(code: &[(u8, u16)]) -> Self {
        let mut mem = LinearMemory::new(0x1000);
        for (i, &(opcode, addr)) in code.iter().enumerate() {
            mem.write_bytes(3 * i as u32, &encode_word(opcode, addr, false)).unwrap();
        }
        let mut cpu = Cpu::new(CpuConfig::default());
        cpu.reset(0);
        Self { cpu, mem, console: BufferConsole::new() }
    }

    fn step(&mut self) -> Result<Flow, Trap> {
        self.cpu.step(&mut self.mem, &SicDecoder::new(), &IntExecutor, &mut self.console)
    }

    fn run(&mut self, terminal: u32) -> Result<Halt, Trap> {
        self.cpu.run(&mut self.mem, &SicDecoder::new(), &IntExecutor, &mut self.console, terminal)
    }
}

#[test]
fn word_load_and_store() {
    let mut m = Machine::new(&[(LDA, 0x100), (STA, 0x103), (LDX, 0x100), (STX, 0x106), (HLT, 0)]);
    m.mem.write_u24(0x100, 0xABCDEF).unwrap();
    assert_eq!(m.run(0x1000).unwrap(), Halt::Halted);
    assert_eq!(m.cpu.a, 0xABCDEF);
    assert_eq!(m.cpu.x, 0xABCDEF);
    assert_eq!(&m.mem.mem[0x103..0x109], &[0xEF, 0xCD, 0xAB, 0xEF, 0xCD, 0xAB]);
}

#[test]
fn byte_load_clears_upper_bits_and_store_writes_low_byte() {
    let mut m = Machine::new(&[(LDCH, 0x100), (STCH, 0x101), (HLT, 0)]);
    m.mem.write_u8(0x100, 0x5A).unwrap();
    m.mem.write_u8(0x102, 0x77).unwrap();
    m.cpu.a = 0xFFFFFF;
    m.run(0x1000).unwrap();
    assert_eq!(m.cpu.a, 0x5A);
    assert_eq!(&m.mem.mem[0x100..0x103], &[0x5A, 0x5A, 0x77]);
}

#[test]
fn arithmetic_wraps_at_24_bits() {
    let mut m = Machine::new(&[(LDA, 0x100), (ADD, 0x103), (STA, 0x106), (SUB, 0x109), (HLT, 0)]);
    m.mem.write_u24(0x100, 0x7FFFFF).unwrap();
    m.mem.write_u24(0x103, 1).unwrap();
    m.mem.write_u24(0x109, 0x800001).unwrap(); // -0x7FFFFF
    m.run(0x1000).unwrap();
    assert_eq!(m.mem.read_u24(0x106).unwrap(), 0x800000);
    assert_eq!(m.cpu.a, 0xFFFFFF);
}

#[test]
fn compare_is_signed() {
    let mut m = Machine::new(&[(COMP, 0x100), (COMP, 0x103), (COMP, 0x106)]);
    m.mem.write_u24(0x100, 0xFFFFFF).unwrap(); // -1
    m.mem.write_u24(0x103, 5).unwrap();
    m.mem.write_u24(0x106, 0x800000).unwrap(); // most negative
    m.cpu.a = 5;

    m.step().unwrap();
    assert_eq!(m.cpu.sw, 2);
    m.step().unwrap();
    assert_eq!(m.cpu.sw, 0);
    m.cpu.a = 0xFFFFFF;
    m.step().unwrap();
    assert_eq!(m.cpu.sw, 2);
}

#[test]
fn conditional_jumps_follow_the_status_word() {
    // 0x00 COMP, 0x03 JEQ, 0x06 HLT, 0x09 JLT, 0x0C J, 0x0F NOP, 0x12 HLT
    let mut m = Machine::new(&[(COMP, 0x100), (JEQ, 0x09), (HLT, 0), (JLT, 0x06), (J, 0x12), (NOP, 0), (HLT, 0)]);
    m.mem.write_u24(0x100, 0).unwrap();

    assert_eq!(m.step().unwrap(), Flow::Next);
    assert_eq!(m.step().unwrap(), Flow::Jump(0x09));
    // JLT not taken: execution falls through to J.
    assert_eq!(m.step().unwrap(), Flow::Next);
    assert_eq!(m.cpu.pc, 0x0C);
    assert_eq!(m.step().unwrap(), Flow::Jump(0x12));
    assert_eq!(m.step().unwrap(), Flow::Halt(Halt::Halted));
    assert_eq!(m.cpu.pc, 0x12);
}

#[test]
fn subroutine_call_and_return() {
    // 0x00 JSUB 0x09, 0x03 HLT, 0x06 NOP, 0x09 LDA 0x100, 0x0C RSUB
    let mut m = Machine::new(&[(JSUB, 0x09), (HLT, 0), (NOP, 0), (LDA, 0x100), (RSUB, 0)]);
    m.mem.write_u24(0x100, 42).unwrap();
    m.step().unwrap();
    assert_eq!(m.cpu.l, 3);
    assert_eq!(m.cpu.pc, 9);
    assert_eq!(m.run(0x1000).unwrap(), Halt::Halted);
    assert_eq!(m.cpu.a, 42);
    assert_eq!(m.cpu.pc, 3);
}

#[test]
fn return_without_caller_halts() {
    let mut m = Machine::new(&[(NOP, 0), (RSUB, 0)]);
    assert_eq!(m.run(0x1000).unwrap(), Halt::Returned);
    assert_eq!(m.cpu.pc, 3);

    let mut m = Machine::new(&[(LDL, 0x100), (RSUB, 0), (HLT, 0), (HLT, 0)]);
    m.mem.write_u24(0x100, 9).unwrap();
    assert_eq!(m.run(0x1000).unwrap(), Halt::Halted);
    assert_eq!(m.cpu.pc, 9);
}

#[test]
fn tix_counts_and_compares() {
    // 0x00 TIX 0x100, 0x03 JLT 0x00, 0x06 HLT
    let mut m = Machine::new(&[(TIX, 0x100), (JLT, 0x00), (HLT, 0)]);
    m.mem.write_u24(0x100, 4).unwrap();
    assert_eq!(m.run(0x1000).unwrap(), Halt::Halted);
    assert_eq!(m.cpu.x, 4);
    assert_eq!(m.cpu.sw, 0);
}

#[test]
fn indexed_addressing_adds_x() {
    let mut m = Machine::new(&[]);
    m.mem.write_bytes(0, &encode_word(LDCH, 0x100, true)).unwrap();
    m.mem.write_bytes(0x100, b"ABC").unwrap();
    m.cpu.x = 2;
    m.step().unwrap();
    assert_eq!(m.cpu.a, b'C' as u32);
}

#[test]
fn console_echo() {
    let mut m = Machine::new(&[(RD, 0), (WD, 0), (RD, 0), (WD, 0), (HLT, 0)]);
    m.console = BufferConsole::with_input("hi");
    m.run(0x1000).unwrap();
    assert_eq!(m.console.output, b"hi");
}

#[test]
fn write_sends_low_byte() {
    let mut m = Machine::new(&[(WD, 0)]);
    m.cpu.a = 0x123441;
    m.step().unwrap();
    assert_eq!(m.console.output, b"A");
}

#[test]
fn read_without_input_traps() {
    let mut m = Machine::new(&[(NOP, 0), (RD, 0)]);
    let err = m.run(0x1000).unwrap_err();
    assert!(matches!(err, Trap::NoInput { pc: 3 }), "{err}");
}

#[test]
fn unknown_opcode_traps() {
    let mut m = Machine::new(&[(NOP, 0)]);
    m.mem.write_bytes(3, &[0xFF, 0, 0]).unwrap();
    let err = m.run(0x1000).unwrap_err();
    assert!(matches!(err, Trap::UnknownOpcode { pc: 3, opcode: 0xFF }), "{err}");
}

#[test]
fn operand_outside_memory_traps() {
    let mut m = Machine::new(&[(LDA, 0x7FFF)]);
    let err = m.step().unwrap_err();
    assert!(matches!(err, Trap::Bus { addr: 0x7FFF, .. }), "{err}");
}

#[test]
fn sequential_run_stops_at_terminal_address() {
    let mut m = Machine::new(&[(NOP, 0), (NOP, 0), (NOP, 0)]);
    assert_eq!(m.run(6).unwrap(), Halt::Terminal);
    assert_eq!(m.cpu.pc, 6);
}

#[test]
fn step_limit_bounds_infinite_loops() {
    let mut m = Machine::new(&[(J, 0)]);
    m.cpu.cfg.max_steps = Some(100);
    let err = m.run(0x1000).unwrap_err();
    assert!(matches!(err, Trap::StepLimit { steps: 100 }), "{err}");
}
