mod itype;
mod jtype;
mod rtype;

use crate::mips::arch::*;
use crate::mips::errors::DecodeError;
use crate::mips::instruction::Instruction;

/// Splits a machine word into its typed instruction.
pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let op = Opcode::try_from(opcode_of(word)).map_err(DecodeError::Opcode)?;
    match op {
        Opcode::Special => rtype::decode(word),
        Opcode::J | Opcode::Jal => Ok(jtype::decode(op, word)),
        _ => itype::decode(op, word),
    }
}
