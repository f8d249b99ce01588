use std::cmp::Ordering;

use crate::console::Console;
use crate::cpu::{Cc, Cpu, Flow, Halt, Reg, Trap};
use crate::decoder::Decoded;
use crate::instructions::{Cond, Effect, Width, INSTR_SIZE};
use crate::memory::{from_signed, to_signed, Bus, WORD_MASK};

pub trait Executor {
    fn exec<B: Bus, C: Console>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        console: &mut C,
        d: &Decoded,
        ea: u32,
    ) -> Result<Flow, Trap>;
}

fn read_word<B: Bus>(bus: &mut B, addr: u32) -> Result<u32, Trap> {
    bus.read_u24(addr).map_err(|source| Trap::Bus { addr, source })
}

fn compare(cpu: &mut Cpu, lhs: u32, rhs: u32) {
    let cc = match to_signed(lhs).cmp(&to_signed(rhs)) {
        Ordering::Equal => Cc::Eq,
        Ordering::Less => Cc::Lt,
        Ordering::Greater => Cc::Gt,
    };
    cpu.sw = cc as u32;
}

pub struct IntExecutor;
impl Executor for IntExecutor {
    fn exec<B: Bus, C: Console>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        console: &mut C,
        d: &Decoded,
        ea: u32,
    ) -> Result<Flow, Trap> {
        let pc = cpu.pc;
        match d.desc.effect {
            Effect::Load { reg, width } => {
                let val = match width {
                    Width::Word => read_word(bus, ea)?,
                    Width::Byte => bus
                        .read_u8(ea)
                        .map_err(|source| Trap::Bus { addr: ea, source })?
                        as u32,
                };
                cpu.set_reg(reg, val);
            }
            Effect::Store { reg, width } => {
                let val = cpu.reg(reg);
                match width {
                    Width::Word => bus.write_u24(ea, val),
                    Width::Byte => bus.write_u8(ea, (val & 0xFF) as u8),
                }
                .map_err(|source| Trap::Bus { addr: ea, source })?;
            }
            Effect::Compare { reg } => {
                let lhs = cpu.reg(reg);
                let rhs = read_word(bus, ea)?;
                compare(cpu, lhs, rhs);
            }
            Effect::Tix => {
                cpu.set_reg(Reg::X, cpu.x.wrapping_add(1));
                let lhs = cpu.x;
                let rhs = read_word(bus, ea)?;
                compare(cpu, lhs, rhs);
            }
            Effect::Add => {
                let rhs = to_signed(read_word(bus, ea)?);
                cpu.a = from_signed(to_signed(cpu.a).wrapping_add(rhs));
            }
            Effect::Sub => {
                let rhs = to_signed(read_word(bus, ea)?);
                cpu.a = from_signed(to_signed(cpu.a).wrapping_sub(rhs));
            }
            Effect::Jump(cond) => {
                let taken = match cond {
                    Cond::Always => true,
                    Cond::Eq => cpu.cc() == Some(Cc::Eq),
                    Cond::Lt => cpu.cc() == Some(Cc::Lt),
                    Cond::Gt => cpu.cc() == Some(Cc::Gt),
                };
                if taken {
                    return Ok(Flow::Jump(ea));
                }
            }
            Effect::Jsub => {
                cpu.l = (pc + INSTR_SIZE) & WORD_MASK;
                return Ok(Flow::Jump(ea));
            }
            Effect::Rsub => {
                // A zero linkage register means nothing called us.
                if cpu.l == 0 {
                    return Ok(Flow::Halt(Halt::Returned));
                }
                return Ok(Flow::Jump(cpu.l));
            }
            Effect::Rd => {
                let byte = console
                    .read_byte()
                    .map_err(|source| Trap::Device { pc, source })?
                    .ok_or(Trap::NoInput { pc })?;
                cpu.a = byte as u32;
            }
            Effect::Wd => {
                console
                    .write_byte((cpu.a & 0xFF) as u8)
                    .map_err(|source| Trap::Device { pc, source })?;
            }
            Effect::Halt => return Ok(Flow::Halt(Halt::Halted)),
            Effect::Nop => {}
        }
        Ok(Flow::Next)
    }
}
