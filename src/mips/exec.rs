// mips/exec.rs
use log::{debug, trace, warn};

use crate::mips::arch::INSTR_BYTES;
use crate::mips::config::MachineConfig;
use crate::mips::decoder::decode;
use crate::mips::errors::Fault;
use crate::mips::instruction::Instruction;
use crate::mips::memory::{Bus, Ram};
use crate::mips::registers::{Cpu, RA, ZERO};
use crate::mips::syscall::handle_syscall;

/// What the machine looks like after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
}

/// Fetches the big-endian word at `pc`.
fn fetch(code: &[u8], pc: u32) -> Result<u32, Fault> {
    if pc % INSTR_BYTES != 0 {
        return Err(Fault::MisalignedPc(pc));
    }
    let at = pc as usize;
    match code.get(at..at + INSTR_BYTES as usize) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(Fault::PcOutOfBounds(pc)),
    }
}

fn checked(op: &'static str, lhs: i32, rhs: i32, v: Option<i32>) -> Result<i32, Fault> {
    v.ok_or(Fault::IntegerOverflow { op, lhs, rhs })
}

#[inline]
fn branch_target(pc: u32, offset: i16) -> u32 {
    pc.wrapping_add(((offset as i32) << 2) as u32)
}

#[inline]
fn effective(cpu: &Cpu, base: u8, offset: i16) -> u32 {
    cpu.read(base).wrapping_add(offset as i32) as u32
}

/// Executes one instruction. `pc` moves past the fetched word before the
/// instruction runs, so a faulting instruction leaves it pointing at the
/// next one.
pub fn step<B: Bus>(cpu: &mut Cpu, code: &[u8], mem: &mut B) -> Result<Status, Fault> {
    if cpu.halted {
        return Ok(Status::Halted);
    }
    let pc = cpu.pc;
    let word = fetch(code, pc)?;
    cpu.pc = pc.wrapping_add(INSTR_BYTES);
    let inst = decode(word)
        .map_err(|cause| Fault::UnsupportedInstruction { pc, word, cause })?;
    trace!("0x{pc:08x}: {inst:?}");

    match inst {
        // Shifts
        Instruction::Sll { rd, rt, shamt } => cpu.write(rd, (cpu.read_u(rt) << shamt) as i32),
        Instruction::Srl { rd, rt, shamt } => cpu.write(rd, (cpu.read_u(rt) >> shamt) as i32),
        Instruction::Sra { rd, rt, shamt } => cpu.write(rd, cpu.read(rt) >> shamt),
        Instruction::Sllv { rd, rt, rs } => {
            let s = cpu.read_u(rs) & 0x1F;
            cpu.write(rd, (cpu.read_u(rt) << s) as i32);
        }
        Instruction::Srlv { rd, rt, rs } => {
            let s = cpu.read_u(rs) & 0x1F;
            cpu.write(rd, (cpu.read_u(rt) >> s) as i32);
        }
        Instruction::Srav { rd, rt, rs } => {
            let s = cpu.read_u(rs) & 0x1F;
            cpu.write(rd, cpu.read(rt) >> s);
        }

        // Register jumps
        Instruction::Jr { rs } => cpu.pc = cpu.read_u(rs),
        Instruction::Jalr { rd, rs } => {
            let target = cpu.read_u(rs);
            let link = if rd == ZERO { RA } else { rd };
            cpu.write(link, cpu.pc as i32);
            cpu.pc = target;
        }
        Instruction::Syscall => handle_syscall(cpu)?,

        // hi/lo
        Instruction::Mfhi { rd } => cpu.write(rd, cpu.hi),
        Instruction::Mthi { rs } => cpu.hi = cpu.read(rs),
        Instruction::Mflo { rd } => cpu.write(rd, cpu.lo),
        Instruction::Mtlo { rs } => cpu.lo = cpu.read(rs),
        Instruction::Mult { rs, rt } => {
            let p = (cpu.read(rs) as i64).wrapping_mul(cpu.read(rt) as i64);
            cpu.hi = (p >> 32) as i32;
            cpu.lo = p as i32;
        }
        Instruction::Multu { rs, rt } => {
            let p = (cpu.read_u(rs) as u64).wrapping_mul(cpu.read_u(rt) as u64);
            cpu.hi = (p >> 32) as i32;
            cpu.lo = p as i32;
        }
        // division by zero leaves hi/lo untouched
        Instruction::Div { rs, rt } => {
            let (n, d) = (cpu.read(rs), cpu.read(rt));
            if d != 0 {
                cpu.lo = n.wrapping_div(d);
                cpu.hi = n.wrapping_rem(d);
            }
        }
        Instruction::Divu { rs, rt } => {
            let (n, d) = (cpu.read_u(rs), cpu.read_u(rt));
            if d != 0 {
                cpu.lo = (n / d) as i32;
                cpu.hi = (n % d) as i32;
            }
        }

        // ALU
        Instruction::Add { rd, rs, rt } => {
            let (a, b) = (cpu.read(rs), cpu.read(rt));
            cpu.write(rd, checked("add", a, b, a.checked_add(b))?);
        }
        Instruction::Sub { rd, rs, rt } => {
            let (a, b) = (cpu.read(rs), cpu.read(rt));
            cpu.write(rd, checked("sub", a, b, a.checked_sub(b))?);
        }
        Instruction::Addu { rd, rs, rt } => cpu.write(rd, cpu.read(rs).wrapping_add(cpu.read(rt))),
        Instruction::Subu { rd, rs, rt } => cpu.write(rd, cpu.read(rs).wrapping_sub(cpu.read(rt))),
        Instruction::And { rd, rs, rt } => cpu.write(rd, cpu.read(rs) & cpu.read(rt)),
        Instruction::Or { rd, rs, rt } => cpu.write(rd, cpu.read(rs) | cpu.read(rt)),
        Instruction::Xor { rd, rs, rt } => cpu.write(rd, cpu.read(rs) ^ cpu.read(rt)),
        Instruction::Nor { rd, rs, rt } => cpu.write(rd, !(cpu.read(rs) | cpu.read(rt))),
        Instruction::Slt { rd, rs, rt } => cpu.write(rd, (cpu.read(rs) < cpu.read(rt)) as i32),
        Instruction::Sltu { rd, rs, rt } => {
            cpu.write(rd, (cpu.read_u(rs) < cpu.read_u(rt)) as i32)
        }

        // Branches
        Instruction::Beq { rs, rt, offset } => {
            if cpu.read(rs) == cpu.read(rt) {
                cpu.pc = branch_target(cpu.pc, offset);
            }
        }
        Instruction::Bne { rs, rt, offset } => {
            if cpu.read(rs) != cpu.read(rt) {
                cpu.pc = branch_target(cpu.pc, offset);
            }
        }
        Instruction::Blez { rs, offset } => {
            if cpu.read(rs) <= 0 {
                cpu.pc = branch_target(cpu.pc, offset);
            }
        }
        Instruction::Bgtz { rs, offset } => {
            if cpu.read(rs) > 0 {
                cpu.pc = branch_target(cpu.pc, offset);
            }
        }

        // Immediate ALU
        Instruction::Addi { rt, rs, imm } => {
            let (a, b) = (cpu.read(rs), imm as i32);
            cpu.write(rt, checked("addi", a, b, a.checked_add(b))?);
        }
        Instruction::Addiu { rt, rs, imm } => {
            cpu.write(rt, cpu.read(rs).wrapping_add(imm as i32))
        }
        Instruction::Slti { rt, rs, imm } => cpu.write(rt, (cpu.read(rs) < imm as i32) as i32),
        Instruction::Sltiu { rt, rs, imm } => {
            cpu.write(rt, (cpu.read_u(rs) < imm as u32) as i32)
        }
        Instruction::Andi { rt, rs, imm } => cpu.write(rt, cpu.read(rs) & imm as i32),
        Instruction::Ori { rt, rs, imm } => cpu.write(rt, cpu.read(rs) | imm as i32),
        Instruction::Xori { rt, rs, imm } => cpu.write(rt, cpu.read(rs) ^ imm as i32),
        Instruction::Lui { rt, imm } => cpu.write(rt, ((imm as u32) << 16) as i32),

        // Memory
        Instruction::Lb { rt, base, offset } => {
            let v = mem.load8(effective(cpu, base, offset))?;
            cpu.write(rt, v as i8 as i32);
        }
        Instruction::Lbu { rt, base, offset } => {
            let v = mem.load8(effective(cpu, base, offset))?;
            cpu.write(rt, v as i32);
        }
        Instruction::Lh { rt, base, offset } => {
            let v = mem.load16(effective(cpu, base, offset))?;
            cpu.write(rt, v as i16 as i32);
        }
        Instruction::Lhu { rt, base, offset } => {
            let v = mem.load16(effective(cpu, base, offset))?;
            cpu.write(rt, v as i32);
        }
        Instruction::Lw { rt, base, offset } => {
            let v = mem.load32(effective(cpu, base, offset))?;
            cpu.write(rt, v as i32);
        }
        Instruction::Sb { rt, base, offset } => {
            mem.store8(effective(cpu, base, offset), cpu.read(rt) as u8)?
        }
        Instruction::Sh { rt, base, offset } => {
            mem.store16(effective(cpu, base, offset), cpu.read(rt) as u16)?
        }
        Instruction::Sw { rt, base, offset } => {
            mem.store32(effective(cpu, base, offset), cpu.read_u(rt))?
        }

        // Absolute jumps
        Instruction::J { target } => cpu.pc = target << 2,
        Instruction::Jal { target } => {
            cpu.write(RA, cpu.pc as i32);
            cpu.pc = target << 2;
        }
    }

    Ok(if cpu.halted { Status::Halted } else { Status::Running })
}

/// One run of a code buffer: owns the register file and data memory,
/// borrows the code for its whole lifetime.
pub struct Machine<'a> {
    code: &'a [u8],
    cpu: Cpu,
    mem: Ram,
    steps: u64,
}

impl<'a> Machine<'a> {
    /// Fails with [`Fault::EmptyProgram`] before any state is built.
    pub fn new(code: &'a [u8], config: MachineConfig) -> Result<Self, Fault> {
        if code.is_empty() {
            return Err(Fault::EmptyProgram);
        }
        Ok(Self {
            code,
            cpu: Cpu::new(config.stack_size, config.entry),
            mem: Ram::new(config.data_size as usize),
            steps: 0,
        })
    }

    /// Places an initialised data section at address 0 of data memory.
    pub fn load_data(&mut self, data: &[u8]) -> Result<(), Fault> {
        self.mem.load(0, data)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn memory(&self) -> &Ram {
        &self.mem
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn into_cpu(self) -> Cpu {
        self.cpu
    }

    pub fn step(&mut self) -> Result<Status, Fault> {
        if self.cpu.halted {
            return Ok(Status::Halted);
        }
        self.steps += 1;
        step(&mut self.cpu, self.code, &mut self.mem)
    }

    /// Runs until the program exits or faults.
    pub fn run(&mut self) -> Result<(), Fault> {
        self.run_while(|_| true)
    }

    /// Like [`run`](Self::run), but gives up with [`Fault::StepLimit`] once
    /// `max_steps` instructions have executed without an exit.
    pub fn run_bounded(&mut self, max_steps: u64) -> Result<(), Fault> {
        let limit = self.steps.saturating_add(max_steps);
        self.run_while(|steps| steps < limit)?;
        if self.cpu.halted {
            Ok(())
        } else {
            warn!("step limit {max_steps} reached at pc 0x{:08x}", self.cpu.pc);
            Err(Fault::StepLimit(max_steps))
        }
    }

    fn run_while(&mut self, mut keep_going: impl FnMut(u64) -> bool) -> Result<(), Fault> {
        while !self.cpu.halted && keep_going(self.steps) {
            if let Err(fault) = self.step() {
                warn!("run stopped after {} steps: {fault}", self.steps);
                return Err(fault);
            }
        }
        if self.cpu.halted {
            debug!("halted after {} steps", self.steps);
        }
        Ok(())
    }
}

/// Executes `code` from pc 0 with the default configuration until it exits,
/// returning the final register state.
pub fn run(code: &[u8]) -> Result<Cpu, Fault> {
    let mut machine = Machine::new(code, MachineConfig::default())?;
    machine.run()?;
    Ok(machine.into_cpu())
}
