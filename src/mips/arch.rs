// mips/arch.rs
//! Instruction word layout and the opcode/function table shared by the
//! encoder and the decoder.
//!
//! ```text
//! R: | opcode:6 | rs:5 | rt:5 | rd:5 | shamt:5 | funct:6 |
//! I: | opcode:6 | rs:5 | rt:5 |        immediate:16      |
//! J: | opcode:6 |               target:26                |
//! ```

/// Initial `$sp` and default size of the data memory, in bytes.
pub const STACK_SIZE: u32 = 0x10000;

/// `$v0` value selecting the exit syscall.
pub const SYS_EXIT: i32 = 10;

pub const INSTR_BYTES: u32 = 4;

// Field positions
pub const OPCODE_SHIFT: u32 = 26;
pub const RS_SHIFT: u32 = 21;
pub const RT_SHIFT: u32 = 16;
pub const RD_SHIFT: u32 = 11;
pub const SHAMT_SHIFT: u32 = 6;

// Field masks (applied after shifting)
pub const OPCODE_MASK: u32 = 0x3F;
pub const REG_MASK: u32 = 0x1F;
pub const SHAMT_MASK: u32 = 0x1F;
pub const FUNCT_MASK: u32 = 0x3F;
pub const IMM_MASK: u32 = 0xFFFF;
pub const TARGET_MASK: u32 = 0x03FF_FFFF;

/// Primary opcode (top 6 bits).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[rustfmt::skip]
#[repr(u8)]
pub enum Opcode {
    Special = 0x00,
    J       = 0x02,
    Jal     = 0x03,
    Beq     = 0x04,
    Bne     = 0x05,
    Blez    = 0x06,
    Bgtz    = 0x07,
    Addi    = 0x08,
    Addiu   = 0x09,
    Slti    = 0x0A,
    Sltiu   = 0x0B,
    Andi    = 0x0C,
    Ori     = 0x0D,
    Xori    = 0x0E,
    Lui     = 0x0F,
    Lb      = 0x20,
    Lh      = 0x21,
    Lw      = 0x23,
    Lbu     = 0x24,
    Lhu     = 0x25,
    Sb      = 0x28,
    Sh      = 0x29,
    Sw      = 0x2B,
}

/// Function code selecting the operation of an opcode-0 instruction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[rustfmt::skip]
#[repr(u8)]
pub enum Funct {
    Sll     = 0x00,
    Srl     = 0x02,
    Sra     = 0x03,
    Sllv    = 0x04,
    Srlv    = 0x06,
    Srav    = 0x07,
    Jr      = 0x08,
    Jalr    = 0x09,
    Syscall = 0x0C,
    Mfhi    = 0x10,
    Mthi    = 0x11,
    Mflo    = 0x12,
    Mtlo    = 0x13,
    Mult    = 0x18,
    Multu   = 0x19,
    Div     = 0x1A,
    Divu    = 0x1B,
    Add     = 0x20,
    Addu    = 0x21,
    Sub     = 0x22,
    Subu    = 0x23,
    And     = 0x24,
    Or      = 0x25,
    Xor     = 0x26,
    Nor     = 0x27,
    Slt     = 0x2A,
    Sltu    = 0x2B,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        use Opcode::*;
        Ok(match value {
            0x00 => Special,
            0x02 => J,
            0x03 => Jal,
            0x04 => Beq,
            0x05 => Bne,
            0x06 => Blez,
            0x07 => Bgtz,
            0x08 => Addi,
            0x09 => Addiu,
            0x0A => Slti,
            0x0B => Sltiu,
            0x0C => Andi,
            0x0D => Ori,
            0x0E => Xori,
            0x0F => Lui,
            0x20 => Lb,
            0x21 => Lh,
            0x23 => Lw,
            0x24 => Lbu,
            0x25 => Lhu,
            0x28 => Sb,
            0x29 => Sh,
            0x2B => Sw,
            other => return Err(other),
        })
    }
}

impl TryFrom<u8> for Funct {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        use Funct::*;
        Ok(match value {
            0x00 => Sll,
            0x02 => Srl,
            0x03 => Sra,
            0x04 => Sllv,
            0x06 => Srlv,
            0x07 => Srav,
            0x08 => Jr,
            0x09 => Jalr,
            0x0C => Syscall,
            0x10 => Mfhi,
            0x11 => Mthi,
            0x12 => Mflo,
            0x13 => Mtlo,
            0x18 => Mult,
            0x19 => Multu,
            0x1A => Div,
            0x1B => Divu,
            0x20 => Add,
            0x21 => Addu,
            0x22 => Sub,
            0x23 => Subu,
            0x24 => And,
            0x25 => Or,
            0x26 => Xor,
            0x27 => Nor,
            0x2A => Slt,
            0x2B => Sltu,
            other => return Err(other),
        })
    }
}

#[inline]
pub fn opcode_of(word: u32) -> u8 {
    ((word >> OPCODE_SHIFT) & OPCODE_MASK) as u8
}
#[inline]
pub fn rs_of(word: u32) -> u8 {
    ((word >> RS_SHIFT) & REG_MASK) as u8
}
#[inline]
pub fn rt_of(word: u32) -> u8 {
    ((word >> RT_SHIFT) & REG_MASK) as u8
}
#[inline]
pub fn rd_of(word: u32) -> u8 {
    ((word >> RD_SHIFT) & REG_MASK) as u8
}
#[inline]
pub fn shamt_of(word: u32) -> u8 {
    ((word >> SHAMT_SHIFT) & SHAMT_MASK) as u8
}
#[inline]
pub fn funct_of(word: u32) -> u8 {
    (word & FUNCT_MASK) as u8
}
#[inline]
pub fn imm_of(word: u32) -> u16 {
    (word & IMM_MASK) as u16
}
#[inline]
pub fn target_of(word: u32) -> u32 {
    word & TARGET_MASK
}
