use crate::mips::arch::*;
use crate::mips::errors::DecodeError;
use crate::mips::instruction::Instruction;

pub(super) fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let rs = rs_of(word);
    let rt = rt_of(word);
    let rd = rd_of(word);
    let shamt = shamt_of(word);
    let funct = Funct::try_from(funct_of(word)).map_err(DecodeError::Funct)?;

    Ok(match funct {
        Funct::Sll => Instruction::Sll { rd, rt, shamt },
        Funct::Srl => Instruction::Srl { rd, rt, shamt },
        Funct::Sra => Instruction::Sra { rd, rt, shamt },
        Funct::Sllv => Instruction::Sllv { rd, rt, rs },
        Funct::Srlv => Instruction::Srlv { rd, rt, rs },
        Funct::Srav => Instruction::Srav { rd, rt, rs },
        Funct::Jr => Instruction::Jr { rs },
        Funct::Jalr => Instruction::Jalr { rd, rs },
        Funct::Syscall => Instruction::Syscall,
        Funct::Mfhi => Instruction::Mfhi { rd },
        Funct::Mthi => Instruction::Mthi { rs },
        Funct::Mflo => Instruction::Mflo { rd },
        Funct::Mtlo => Instruction::Mtlo { rs },
        Funct::Mult => Instruction::Mult { rs, rt },
        Funct::Multu => Instruction::Multu { rs, rt },
        Funct::Div => Instruction::Div { rs, rt },
        Funct::Divu => Instruction::Divu { rs, rt },
        Funct::Add => Instruction::Add { rd, rs, rt },
        Funct::Addu => Instruction::Addu { rd, rs, rt },
        Funct::Sub => Instruction::Sub { rd, rs, rt },
        Funct::Subu => Instruction::Subu { rd, rs, rt },
        Funct::And => Instruction::And { rd, rs, rt },
        Funct::Or => Instruction::Or { rd, rs, rt },
        Funct::Xor => Instruction::Xor { rd, rs, rt },
        Funct::Nor => Instruction::Nor { rd, rs, rt },
        Funct::Slt => Instruction::Slt { rd, rs, rt },
        Funct::Sltu => Instruction::Sltu { rd, rs, rt },
    })
}
