use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::console::Console;
use crate::decoder::Decoder;
use crate::exec::Executor;
use crate::instructions::INSTR_SIZE;
use crate::memory::{Bus, ADDRESS_SPACE, WORD_MASK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuConfig {
    pub memory_size: usize,
    pub max_steps: Option<u64>, // None runs until halt
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            memory_size: ADDRESS_SPACE,
            max_steps: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reg {
    A,  // Accumulator
    X,  // Index
    L,  // Linkage
    Pc, // Program counter
    Sw, // Status word
    S,  // General purpose
}

/// Values held by `SW` after a compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cc {
    Eq = 0,
    Lt = 1,
    Gt = 2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub a: u32,
    pub x: u32,
    pub l: u32,
    pub pc: u32,
    pub sw: u32,
    pub s: u32,
    pub cfg: CpuConfig,
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Unknown opcode {opcode:#04x} at {pc:#08x}")]
    UnknownOpcode { pc: u32, opcode: u8 },
    #[error("No console input available at {pc:#08x}")]
    NoInput { pc: u32 },
    #[error("Bus error at {addr:#08x}: {source}")]
    Bus { addr: u32, #[source] source: Error },
    #[error("Console error at {pc:#08x}: {source}")]
    Device { pc: u32, #[source] source: Error },
    #[error("Step limit of {steps} instructions reached")]
    StepLimit { steps: u64 },
}

/// Control flow requested by an executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Jump(u32),
    Halt(Halt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// `HLT` executed.
    Halted,
    /// `RSUB` with an unset linkage register.
    Returned,
    /// Sequential execution reached the terminal address.
    Terminal,
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            a: 0,
            x: 0,
            l: 0,
            pc: 0,
            sw: 0,
            s: 0,
            cfg,
        }
    }

    /// Clear every register and point the program counter at `reset_pc`.
    pub fn reset(&mut self, reset_pc: u32) {
        *self = Self::new(self.cfg);
        self.pc = reset_pc & WORD_MASK;
    }

    pub fn reg(&self, r: Reg) -> u32 {
        match r {
            Reg::A => self.a,
            Reg::X => self.x,
            Reg::L => self.l,
            Reg::Pc => self.pc,
            Reg::Sw => self.sw,
            Reg::S => self.s,
        }
    }

    pub fn set_reg(&mut self, r: Reg, val: u32) {
        let val = val & WORD_MASK;
        match r {
            Reg::A => self.a = val,
            Reg::X => self.x = val,
            Reg::L => self.l = val,
            Reg::Pc => self.pc = val,
            Reg::Sw => self.sw = val,
            Reg::S => self.s = val,
        }
    }

    pub fn cc(&self) -> Option<Cc> {
        match self.sw {
            0 => Some(Cc::Eq),
            1 => Some(Cc::Lt),
            2 => Some(Cc::Gt),
            _ => None,
        }
    }

    /// Execute one instruction. On return the program counter already
    /// points at the next instruction to run.
    pub fn step<B: Bus, D: Decoder, X: Executor, C: Console>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
        console: &mut C,
    ) -> Result<Flow, Trap> {
        let pc = self.pc;
        let mut raw = [0u8; 3];
        for (i, b) in raw.iter_mut().enumerate() {
            let addr = pc + i as u32;
            *b = bus
                .read_u8(addr)
                .map_err(|source| Trap::Bus { addr, source })?;
        }
        let d = dec.decode(raw).ok_or(Trap::UnknownOpcode { pc, opcode: raw[0] })?;
        let mut ea = d.address as u32;
        if d.indexed {
            ea = ea.wrapping_add(self.x) & WORD_MASK;
        }
        trace!("{pc:#08x}: {} ea={ea:#08x} indexed={}", d.desc.mnemonic, d.indexed);

        let flow = exec.exec(self, bus, console, &d, ea)?;
        match flow {
            Flow::Next => self.pc = (pc + INSTR_SIZE) & WORD_MASK,
            Flow::Jump(target) => self.pc = target & WORD_MASK,
            Flow::Halt(_) => {}
        }
        Ok(flow)
    }

    /// Run from the current program counter until the program halts.
    pub fn run<B: Bus, D: Decoder, X: Executor, C: Console>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
        console: &mut C,
        terminal: u32,
    ) -> Result<Halt, Trap> {
        let mut steps = 0u64;
        loop {
            if let Some(max) = self.cfg.max_steps {
                if steps >= max {
                    return Err(Trap::StepLimit { steps });
                }
            }
            steps += 1;
            let halt = match self.step(bus, dec, exec, console)? {
                Flow::Halt(h) => Some(h),
                Flow::Next if self.pc >= terminal => Some(Halt::Terminal),
                _ => None,
            };
            if let Some(h) = halt {
                debug!("halted ({h:?}) after {steps} steps at {:#08x}", self.pc);
                return Ok(h);
            }
        }
    }
}
