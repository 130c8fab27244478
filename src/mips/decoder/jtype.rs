use crate::mips::arch::{target_of, Opcode};
use crate::mips::instruction::Instruction;

pub(super) fn decode(op: Opcode, word: u32) -> Instruction {
    let target = target_of(word);
    if op == Opcode::Jal {
        Instruction::Jal { target }
    } else {
        Instruction::J { target }
    }
}
