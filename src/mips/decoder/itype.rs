use crate::mips::arch::*;
use crate::mips::errors::DecodeError;
use crate::mips::instruction::Instruction;

/// Decodes the immediate-format opcodes. `Special`, `J` and `Jal` have
/// their own decoders and are refused here.
pub(super) fn decode(op: Opcode, word: u32) -> Result<Instruction, DecodeError> {
    let rs = rs_of(word);
    let rt = rt_of(word);
    let imm = imm_of(word);
    let simm = imm as i16;

    let inst = match op {
        Opcode::Beq => Instruction::Beq { rs, rt, offset: simm },
        Opcode::Bne => Instruction::Bne { rs, rt, offset: simm },
        Opcode::Blez => Instruction::Blez { rs, offset: simm },
        Opcode::Bgtz => Instruction::Bgtz { rs, offset: simm },

        Opcode::Addi => Instruction::Addi { rt, rs, imm: simm },
        Opcode::Addiu => Instruction::Addiu { rt, rs, imm },
        Opcode::Slti => Instruction::Slti { rt, rs, imm: simm },
        Opcode::Sltiu => Instruction::Sltiu { rt, rs, imm },
        Opcode::Andi => Instruction::Andi { rt, rs, imm },
        Opcode::Ori => Instruction::Ori { rt, rs, imm },
        Opcode::Xori => Instruction::Xori { rt, rs, imm },
        Opcode::Lui => Instruction::Lui { rt, imm },

        Opcode::Lb => Instruction::Lb { rt, base: rs, offset: simm },
        Opcode::Lh => Instruction::Lh { rt, base: rs, offset: simm },
        Opcode::Lw => Instruction::Lw { rt, base: rs, offset: simm },
        Opcode::Lbu => Instruction::Lbu { rt, base: rs, offset: simm },
        Opcode::Lhu => Instruction::Lhu { rt, base: rs, offset: simm },
        Opcode::Sb => Instruction::Sb { rt, base: rs, offset: simm },
        Opcode::Sh => Instruction::Sh { rt, base: rs, offset: simm },
        Opcode::Sw => Instruction::Sw { rt, base: rs, offset: simm },

        Opcode::Special | Opcode::J | Opcode::Jal => return Err(DecodeError::Opcode(op as u8)),
    };
    Ok(inst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_formats_are_refused() {
        for op in [Opcode::Special, Opcode::J, Opcode::Jal] {
            assert_eq!(decode(op, 0), Err(DecodeError::Opcode(op as u8)));
        }
    }

    #[test]
    fn immediate_is_split_by_signedness() {
        let word = 0x2108_FFFF; // addi $t0, $t0, -1
        assert_eq!(decode(Opcode::Addi, word), Ok(Instruction::Addi { rt: 8, rs: 8, imm: -1 }));
        assert_eq!(
            decode(Opcode::Addiu, word),
            Ok(Instruction::Addiu { rt: 8, rs: 8, imm: 0xFFFF })
        );
    }
}
