use crate::mips::instruction::Instruction;
use crate::mips::registers::{REG_COUNT, ZERO};

use super::errors::AsmErrorKind;
use super::pseudo::Target;
use super::source::{Operand, SourceInstruction};

pub(crate) fn expect_operands(inst: &SourceInstruction, n: usize) -> Result<(), AsmErrorKind> {
    if inst.operands.len() != n {
        return Err(AsmErrorKind::OperandCount {
            mnemonic: inst.mnemonic.clone(),
            expected: match n {
                0 => "0",
                1 => "1",
                2 => "2",
                _ => "3",
            },
            found: inst.operands.len(),
        });
    }
    Ok(())
}

fn kind_error(inst: &SourceInstruction, index: usize, expected: &'static str) -> AsmErrorKind {
    AsmErrorKind::OperandKind {
        mnemonic: inst.mnemonic.clone(),
        index,
        expected,
    }
}

pub(crate) fn check_reg(r: u8) -> Result<u8, AsmErrorKind> {
    if (r as usize) < REG_COUNT {
        Ok(r)
    } else {
        Err(AsmErrorKind::InvalidRegister(r))
    }
}

pub(crate) fn reg_at(inst: &SourceInstruction, index: usize) -> Result<u8, AsmErrorKind> {
    match inst.operands.get(index) {
        Some(Operand::Reg(r)) => check_reg(*r),
        _ => Err(kind_error(inst, index, "a register")),
    }
}

pub(crate) fn imm_at(inst: &SourceInstruction, index: usize) -> Result<i64, AsmErrorKind> {
    match inst.operands.get(index) {
        Some(Operand::Imm(v)) => Ok(*v),
        _ => Err(kind_error(inst, index, "an immediate")),
    }
}

/// `offset(base)` with the offset checked against the signed 16-bit field.
pub(crate) fn mem_at(inst: &SourceInstruction, index: usize) -> Result<(i16, u8), AsmErrorKind> {
    match inst.operands.get(index) {
        Some(Operand::Mem { offset, base }) => {
            let offset = signed16(&inst.mnemonic, *offset)?;
            Ok((offset, check_reg(*base)?))
        }
        _ => Err(kind_error(inst, index, "offset(base)")),
    }
}

/// A label or a literal byte address.
pub(crate) fn target_at(inst: &SourceInstruction, index: usize) -> Result<Target, AsmErrorKind> {
    match inst.operands.get(index) {
        Some(Operand::Label(name)) => Ok(Target::Label(name.clone())),
        Some(Operand::Imm(v)) => u32::try_from(*v)
            .map(Target::Address)
            .map_err(|_| AsmErrorKind::ImmediateOutOfRange {
                mnemonic: inst.mnemonic.clone(),
                value: *v,
            }),
        _ => Err(kind_error(inst, index, "a label or address")),
    }
}

pub(crate) fn signed16(mnemonic: &str, v: i64) -> Result<i16, AsmErrorKind> {
    i16::try_from(v).map_err(|_| AsmErrorKind::ImmediateOutOfRange {
        mnemonic: mnemonic.to_string(),
        value: v,
    })
}

pub(crate) fn unsigned16(mnemonic: &str, v: i64) -> Result<u16, AsmErrorKind> {
    u16::try_from(v).map_err(|_| AsmErrorKind::ImmediateOutOfRange {
        mnemonic: mnemonic.to_string(),
        value: v,
    })
}

/// Puts a literal into `rt`. Values in `0..=0xFFFF` take a single `addiu`
/// from `$zero` (its immediate is zero-extended) and values in
/// `-32768..0` a single sign-extending `addi`. Anything else that fits
/// 32 bits, signed or unsigned, takes `lui` then `ori`.
pub(crate) fn materialize(mnemonic: &str, rt: u8, value: i64) -> Result<Vec<Instruction>, AsmErrorKind> {
    if let Ok(imm) = u16::try_from(value) {
        return Ok(vec![Instruction::Addiu { rt, rs: ZERO, imm }]);
    }
    if let Ok(imm) = i16::try_from(value) {
        return Ok(vec![Instruction::Addi { rt, rs: ZERO, imm }]);
    }
    if value < i32::MIN as i64 || value > u32::MAX as i64 {
        return Err(AsmErrorKind::ImmediateOutOfRange {
            mnemonic: mnemonic.to_string(),
            value,
        });
    }
    let bits = value as u32;
    let hi = (bits >> 16) as u16;
    let lo = bits as u16;
    let mut out = vec![Instruction::Lui { rt, imm: hi }];
    if lo != 0 {
        out.push(Instruction::Ori { rt, rs: rt, imm: lo });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::registers::{AT, T0};

    #[test]
    fn small_literal_is_one_addiu() {
        assert_eq!(
            materialize("li", T0, 0xFFFF).unwrap(),
            vec![Instruction::Addiu { rt: T0, rs: ZERO, imm: 0xFFFF }]
        );
    }

    #[test]
    fn small_negative_literal_is_one_addi() {
        assert_eq!(
            materialize("li", AT, -4).unwrap(),
            vec![Instruction::Addi { rt: AT, rs: ZERO, imm: -4 }]
        );
        assert_eq!(
            materialize("li", T0, -32768).unwrap(),
            vec![Instruction::Addi { rt: T0, rs: ZERO, imm: i16::MIN }]
        );
    }

    #[test]
    fn wide_negative_literal_uses_lui_ori() {
        // -70000 is 0xFFFE_EE90
        assert_eq!(
            materialize("li", AT, -70000).unwrap(),
            vec![
                Instruction::Lui { rt: AT, imm: 0xFFFE },
                Instruction::Ori { rt: AT, rs: AT, imm: 0xEE90 },
            ]
        );
        assert_eq!(materialize("li", T0, -32769).unwrap().len(), 2);
    }

    #[test]
    fn round_upper_half_is_just_lui() {
        assert_eq!(
            materialize("li", T0, 0x0001_0000).unwrap(),
            vec![Instruction::Lui { rt: T0, imm: 1 }]
        );
    }

    #[test]
    fn literal_beyond_32_bits_is_rejected() {
        assert!(matches!(
            materialize("li", T0, 1 << 32),
            Err(AsmErrorKind::ImmediateOutOfRange { value, .. }) if value == 1 << 32
        ));
    }
}
