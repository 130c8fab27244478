// mips/instruction.rs
/// One decoded machine instruction.
///
/// Immediates keep their raw 16-bit width; the sign- or zero-extension
/// belongs to the operation and happens at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // R-type: shifts
    Sll { rd: u8, rt: u8, shamt: u8 },
    Srl { rd: u8, rt: u8, shamt: u8 },
    Sra { rd: u8, rt: u8, shamt: u8 },
    Sllv { rd: u8, rt: u8, rs: u8 },
    Srlv { rd: u8, rt: u8, rs: u8 },
    Srav { rd: u8, rt: u8, rs: u8 },

    // R-type: register jumps and system
    Jr { rs: u8 },
    Jalr { rd: u8, rs: u8 },
    Syscall,

    // R-type: hi/lo
    Mfhi { rd: u8 },
    Mthi { rs: u8 },
    Mflo { rd: u8 },
    Mtlo { rs: u8 },
    Mult { rs: u8, rt: u8 },
    Multu { rs: u8, rt: u8 },
    Div { rs: u8, rt: u8 },
    Divu { rs: u8, rt: u8 },

    // R-type: ALU
    Add { rd: u8, rs: u8, rt: u8 },
    Addu { rd: u8, rs: u8, rt: u8 },
    Sub { rd: u8, rs: u8, rt: u8 },
    Subu { rd: u8, rs: u8, rt: u8 },
    And { rd: u8, rs: u8, rt: u8 },
    Or { rd: u8, rs: u8, rt: u8 },
    Xor { rd: u8, rs: u8, rt: u8 },
    Nor { rd: u8, rs: u8, rt: u8 },
    Slt { rd: u8, rs: u8, rt: u8 },
    Sltu { rd: u8, rs: u8, rt: u8 },

    // I-type: branches (offset in instruction words, relative to pc + 4)
    Beq { rs: u8, rt: u8, offset: i16 },
    Bne { rs: u8, rt: u8, offset: i16 },
    Blez { rs: u8, offset: i16 },
    Bgtz { rs: u8, offset: i16 },

    // I-type: ALU
    Addi { rt: u8, rs: u8, imm: i16 },
    Addiu { rt: u8, rs: u8, imm: u16 },
    Slti { rt: u8, rs: u8, imm: i16 },
    Sltiu { rt: u8, rs: u8, imm: u16 },
    Andi { rt: u8, rs: u8, imm: u16 },
    Ori { rt: u8, rs: u8, imm: u16 },
    Xori { rt: u8, rs: u8, imm: u16 },
    Lui { rt: u8, imm: u16 },

    // I-type: memory, `offset(base)`
    Lb { rt: u8, base: u8, offset: i16 },
    Lh { rt: u8, base: u8, offset: i16 },
    Lw { rt: u8, base: u8, offset: i16 },
    Lbu { rt: u8, base: u8, offset: i16 },
    Lhu { rt: u8, base: u8, offset: i16 },
    Sb { rt: u8, base: u8, offset: i16 },
    Sh { rt: u8, base: u8, offset: i16 },
    Sw { rt: u8, base: u8, offset: i16 },

    // J-type (26-bit word index)
    J { target: u32 },
    Jal { target: u32 },
}

impl Instruction {
    /// `sll $zero, $zero, 0`, the all-zero word.
    pub const NOP: Instruction = Instruction::Sll { rd: 0, rt: 0, shamt: 0 };
}
