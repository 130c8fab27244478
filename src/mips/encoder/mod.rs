// mips/encoder/mod.rs
use crate::mips::arch::*;
use crate::mips::instruction::Instruction;

#[inline]
fn r(rs: u8, rt: u8, rd: u8, shamt: u8, funct: Funct) -> u32 {
    ((Opcode::Special as u32) << OPCODE_SHIFT)
        | ((rs as u32 & REG_MASK) << RS_SHIFT)
        | ((rt as u32 & REG_MASK) << RT_SHIFT)
        | ((rd as u32 & REG_MASK) << RD_SHIFT)
        | ((shamt as u32 & SHAMT_MASK) << SHAMT_SHIFT)
        | (funct as u32)
}

#[inline]
fn i(op: Opcode, rs: u8, rt: u8, imm: u16) -> u32 {
    ((op as u32) << OPCODE_SHIFT)
        | ((rs as u32 & REG_MASK) << RS_SHIFT)
        | ((rt as u32 & REG_MASK) << RT_SHIFT)
        | (imm as u32)
}

#[inline]
fn j(op: Opcode, target: u32) -> u32 {
    ((op as u32) << OPCODE_SHIFT) | (target & TARGET_MASK)
}

/// Packs an instruction into its 32-bit machine word.
pub fn encode(inst: Instruction) -> u32 {
    use Instruction::*;
    match inst {
        Sll { rd, rt, shamt } => r(0, rt, rd, shamt, Funct::Sll),
        Srl { rd, rt, shamt } => r(0, rt, rd, shamt, Funct::Srl),
        Sra { rd, rt, shamt } => r(0, rt, rd, shamt, Funct::Sra),
        Sllv { rd, rt, rs } => r(rs, rt, rd, 0, Funct::Sllv),
        Srlv { rd, rt, rs } => r(rs, rt, rd, 0, Funct::Srlv),
        Srav { rd, rt, rs } => r(rs, rt, rd, 0, Funct::Srav),

        Jr { rs } => r(rs, 0, 0, 0, Funct::Jr),
        Jalr { rd, rs } => r(rs, 0, rd, 0, Funct::Jalr),
        Syscall => r(0, 0, 0, 0, Funct::Syscall),

        Mfhi { rd } => r(0, 0, rd, 0, Funct::Mfhi),
        Mthi { rs } => r(rs, 0, 0, 0, Funct::Mthi),
        Mflo { rd } => r(0, 0, rd, 0, Funct::Mflo),
        Mtlo { rs } => r(rs, 0, 0, 0, Funct::Mtlo),
        Mult { rs, rt } => r(rs, rt, 0, 0, Funct::Mult),
        Multu { rs, rt } => r(rs, rt, 0, 0, Funct::Multu),
        Div { rs, rt } => r(rs, rt, 0, 0, Funct::Div),
        Divu { rs, rt } => r(rs, rt, 0, 0, Funct::Divu),

        Add { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Add),
        Addu { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Addu),
        Sub { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Sub),
        Subu { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Subu),
        And { rd, rs, rt } => r(rs, rt, rd, 0, Funct::And),
        Or { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Or),
        Xor { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Xor),
        Nor { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Nor),
        Slt { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Slt),
        Sltu { rd, rs, rt } => r(rs, rt, rd, 0, Funct::Sltu),

        Beq { rs, rt, offset } => i(Opcode::Beq, rs, rt, offset as u16),
        Bne { rs, rt, offset } => i(Opcode::Bne, rs, rt, offset as u16),
        Blez { rs, offset } => i(Opcode::Blez, rs, 0, offset as u16),
        Bgtz { rs, offset } => i(Opcode::Bgtz, rs, 0, offset as u16),

        Addi { rt, rs, imm } => i(Opcode::Addi, rs, rt, imm as u16),
        Addiu { rt, rs, imm } => i(Opcode::Addiu, rs, rt, imm),
        Slti { rt, rs, imm } => i(Opcode::Slti, rs, rt, imm as u16),
        Sltiu { rt, rs, imm } => i(Opcode::Sltiu, rs, rt, imm),
        Andi { rt, rs, imm } => i(Opcode::Andi, rs, rt, imm),
        Ori { rt, rs, imm } => i(Opcode::Ori, rs, rt, imm),
        Xori { rt, rs, imm } => i(Opcode::Xori, rs, rt, imm),
        Lui { rt, imm } => i(Opcode::Lui, 0, rt, imm),

        Lb { rt, base, offset } => i(Opcode::Lb, base, rt, offset as u16),
        Lh { rt, base, offset } => i(Opcode::Lh, base, rt, offset as u16),
        Lw { rt, base, offset } => i(Opcode::Lw, base, rt, offset as u16),
        Lbu { rt, base, offset } => i(Opcode::Lbu, base, rt, offset as u16),
        Lhu { rt, base, offset } => i(Opcode::Lhu, base, rt, offset as u16),
        Sb { rt, base, offset } => i(Opcode::Sb, base, rt, offset as u16),
        Sh { rt, base, offset } => i(Opcode::Sh, base, rt, offset as u16),
        Sw { rt, base, offset } => i(Opcode::Sw, base, rt, offset as u16),

        J { target } => j(Opcode::J, target),
        Jal { target } => j(Opcode::Jal, target),
    }
}
