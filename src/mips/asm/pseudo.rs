//! Lowering table: every accepted mnemonic, real or pseudo, to the machine
//! instructions it becomes.
//!
//! Lowering never looks at label addresses. Anything that needs one comes
//! out as a [`Lowered`] placeholder that still occupies exactly one word,
//! so the length of the returned list is the final expansion count.

use crate::mips::instruction::Instruction;
use crate::mips::registers::{AT, RA, ZERO};

use super::errors::{AsmError, AsmErrorKind};
use super::source::{Operand, SourceInstruction};
use super::utils::{
    expect_operands, imm_at, materialize, mem_at, reg_at, signed16, target_at, unsigned16,
};

/// Where a branch, jump or `la` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Label(String),
    /// Byte address in the segment the instruction expects (code for
    /// branches and jumps, data for `la`).
    Address(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Beq { rs: u8, rt: u8 },
    Bne { rs: u8, rt: u8 },
    Blez { rs: u8 },
    Bgtz { rs: u8 },
}

impl BranchKind {
    pub fn with_offset(self, offset: i16) -> Instruction {
        match self {
            BranchKind::Beq { rs, rt } => Instruction::Beq { rs, rt, offset },
            BranchKind::Bne { rs, rt } => Instruction::Bne { rs, rt, offset },
            BranchKind::Blez { rs } => Instruction::Blez { rs, offset },
            BranchKind::Bgtz { rs } => Instruction::Bgtz { rs, offset },
        }
    }
}

/// One machine word of lowered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lowered {
    Ready(Instruction),
    /// PC-relative branch, displacement filled in at emission.
    Branch { kind: BranchKind, target: Target },
    /// `j`/`jal`, absolute word index filled in at emission.
    Jump { link: bool, target: Target },
    /// `la rt, label` as `addiu rt, $gp, address`.
    LoadAddress { rt: u8, target: Target },
}

/// Lowers one symbolic instruction.
pub fn lower(inst: &SourceInstruction) -> Result<Vec<Lowered>, AsmError> {
    lower_inst(inst).map_err(AsmError::from)
}

fn ready(v: Vec<Instruction>) -> Vec<Lowered> {
    v.into_iter().map(Lowered::Ready).collect()
}

fn scratch_conflict(inst: &SourceInstruction) -> AsmErrorKind {
    AsmErrorKind::ScratchConflict { mnemonic: inst.mnemonic.clone() }
}

/// Register operand at `index`, or a literal moved into `$at` first.
/// Only one operand per instruction may take the scratch register, and
/// none of the `sources` the expansion reads may name `$at` itself.
fn reg_or_scratch(
    inst: &SourceInstruction,
    index: usize,
    sources: &[usize],
    pre: &mut Vec<Instruction>,
) -> Result<u8, AsmErrorKind> {
    match inst.operands.get(index) {
        Some(Operand::Imm(v)) if pre.is_empty() => {
            let clobbered = sources
                .iter()
                .any(|&i| matches!(inst.operands.get(i), Some(Operand::Reg(AT))));
            if clobbered {
                return Err(scratch_conflict(inst));
            }
            pre.extend(materialize(&inst.mnemonic, AT, *v)?);
            Ok(AT)
        }
        _ => reg_at(inst, index),
    }
}

fn alu(m: &str, rd: u8, rs: u8, rt: u8) -> Option<Instruction> {
    Some(match m {
        "add" => Instruction::Add { rd, rs, rt },
        "addu" => Instruction::Addu { rd, rs, rt },
        "sub" => Instruction::Sub { rd, rs, rt },
        "subu" => Instruction::Subu { rd, rs, rt },
        "and" => Instruction::And { rd, rs, rt },
        "or" => Instruction::Or { rd, rs, rt },
        "xor" => Instruction::Xor { rd, rs, rt },
        "nor" => Instruction::Nor { rd, rs, rt },
        "slt" => Instruction::Slt { rd, rs, rt },
        "sltu" => Instruction::Sltu { rd, rs, rt },
        _ => return None,
    })
}

/// The immediate form, if the literal fits its field.
fn alu_imm(m: &str, rt: u8, rs: u8, v: i64) -> Option<Instruction> {
    let s = i16::try_from(v).ok();
    let u = u16::try_from(v).ok();
    match m {
        "addi" => s.map(|imm| Instruction::Addi { rt, rs, imm }),
        "slti" => s.map(|imm| Instruction::Slti { rt, rs, imm }),
        "addiu" => u.map(|imm| Instruction::Addiu { rt, rs, imm }),
        "sltiu" => u.map(|imm| Instruction::Sltiu { rt, rs, imm }),
        "andi" => u.map(|imm| Instruction::Andi { rt, rs, imm }),
        "ori" => u.map(|imm| Instruction::Ori { rt, rs, imm }),
        "xori" => u.map(|imm| Instruction::Xori { rt, rs, imm }),
        _ => None,
    }
}

fn register_form(m: &str) -> &'static str {
    match m {
        "addi" => "add",
        "addiu" => "addu",
        "slti" => "slt",
        "sltiu" => "sltu",
        "andi" => "and",
        "ori" => "or",
        _ => "xor",
    }
}

fn mem_op(m: &str, rt: u8, base: u8, offset: i16) -> Option<Instruction> {
    Some(match m {
        "lb" => Instruction::Lb { rt, base, offset },
        "lbu" => Instruction::Lbu { rt, base, offset },
        "lh" => Instruction::Lh { rt, base, offset },
        "lhu" => Instruction::Lhu { rt, base, offset },
        "lw" => Instruction::Lw { rt, base, offset },
        "sb" => Instruction::Sb { rt, base, offset },
        "sh" => Instruction::Sh { rt, base, offset },
        "sw" => Instruction::Sw { rt, base, offset },
        _ => return None,
    })
}

fn unsupported(inst: &SourceInstruction) -> AsmErrorKind {
    AsmErrorKind::UnsupportedInstruction(inst.mnemonic.clone())
}

pub(crate) fn lower_inst(inst: &SourceInstruction) -> Result<Vec<Lowered>, AsmErrorKind> {
    let m = inst.mnemonic.as_str();
    let n = inst.operands.len();
    let mut pre = Vec::new();

    let out = match m {
        "add" | "addu" | "sub" | "subu" | "and" | "or" | "xor" | "nor" | "slt" | "sltu" => {
            expect_operands(inst, 3)?;
            let rd = reg_at(inst, 0)?;
            let rs = reg_or_scratch(inst, 1, &[2], &mut pre)?;
            let rt = reg_or_scratch(inst, 2, &[1], &mut pre)?;
            pre.extend(alu(m, rd, rs, rt));
            ready(pre)
        }

        "addi" | "addiu" | "slti" | "sltiu" | "andi" | "ori" | "xori" => {
            expect_operands(inst, 3)?;
            let rt = reg_at(inst, 0)?;
            let rs = reg_at(inst, 1)?;
            let v = imm_at(inst, 2)?;
            match alu_imm(m, rt, rs, v) {
                Some(i) => ready(vec![i]),
                // $at would be overwritten before it is read
                None if rs == AT => return Err(scratch_conflict(inst)),
                None => {
                    pre.extend(materialize(m, AT, v)?);
                    pre.extend(alu(register_form(m), rt, rs, AT));
                    ready(pre)
                }
            }
        }

        "lui" => {
            expect_operands(inst, 2)?;
            let rt = reg_at(inst, 0)?;
            let imm = unsigned16(m, imm_at(inst, 1)?)?;
            ready(vec![Instruction::Lui { rt, imm }])
        }

        "sll" | "srl" | "sra" => {
            expect_operands(inst, 3)?;
            let rd = reg_at(inst, 0)?;
            let rt = reg_at(inst, 1)?;
            let i = match inst.operands.get(2) {
                Some(Operand::Imm(v)) => {
                    let shamt = u8::try_from(*v)
                        .ok()
                        .filter(|s| *s < 32)
                        .ok_or(AsmErrorKind::ShiftAmountOutOfRange(*v))?;
                    match m {
                        "sll" => Instruction::Sll { rd, rt, shamt },
                        "srl" => Instruction::Srl { rd, rt, shamt },
                        _ => Instruction::Sra { rd, rt, shamt },
                    }
                }
                _ => {
                    let rs = reg_at(inst, 2)?;
                    match m {
                        "sll" => Instruction::Sllv { rd, rt, rs },
                        "srl" => Instruction::Srlv { rd, rt, rs },
                        _ => Instruction::Srav { rd, rt, rs },
                    }
                }
            };
            ready(vec![i])
        }

        "sllv" | "srlv" | "srav" => {
            expect_operands(inst, 3)?;
            let (rd, rt, rs) = (reg_at(inst, 0)?, reg_at(inst, 1)?, reg_at(inst, 2)?);
            ready(vec![match m {
                "sllv" => Instruction::Sllv { rd, rt, rs },
                "srlv" => Instruction::Srlv { rd, rt, rs },
                _ => Instruction::Srav { rd, rt, rs },
            }])
        }

        "mult" | "multu" | "div" | "divu" if n == 2 => {
            let rs = reg_at(inst, 0)?;
            let rt = reg_or_scratch(inst, 1, &[0], &mut pre)?;
            pre.push(match m {
                "mult" => Instruction::Mult { rs, rt },
                "multu" => Instruction::Multu { rs, rt },
                "div" => Instruction::Div { rs, rt },
                _ => Instruction::Divu { rs, rt },
            });
            ready(pre)
        }

        // three-operand forms: the hi/lo operation, then a move into rd
        "mul" | "div" | "divu" | "rem" | "remu" => {
            if n != 3 {
                return Err(AsmErrorKind::OperandCount {
                    mnemonic: m.to_string(),
                    expected: if m.starts_with("div") { "2 or 3" } else { "3" },
                    found: n,
                });
            }
            let rd = reg_at(inst, 0)?;
            let rs = reg_at(inst, 1)?;
            let rt = reg_or_scratch(inst, 2, &[1], &mut pre)?;
            pre.push(match m {
                "mul" => Instruction::Mult { rs, rt },
                "div" | "rem" => Instruction::Div { rs, rt },
                _ => Instruction::Divu { rs, rt },
            });
            pre.push(if m.starts_with("rem") {
                Instruction::Mfhi { rd }
            } else {
                Instruction::Mflo { rd }
            });
            ready(pre)
        }

        "mult" | "multu" => {
            return Err(AsmErrorKind::OperandCount {
                mnemonic: m.to_string(),
                expected: "2",
                found: n,
            });
        }

        "move" | "neg" | "negu" | "not" => {
            expect_operands(inst, 2)?;
            let rd = reg_at(inst, 0)?;
            let rs = reg_at(inst, 1)?;
            ready(vec![match m {
                "move" => Instruction::Add { rd, rs: ZERO, rt: rs },
                "neg" => Instruction::Sub { rd, rs: ZERO, rt: rs },
                "negu" => Instruction::Subu { rd, rs: ZERO, rt: rs },
                _ => Instruction::Nor { rd, rs, rt: ZERO },
            }])
        }

        "li" => {
            expect_operands(inst, 2)?;
            let rd = reg_at(inst, 0)?;
            ready(materialize(m, rd, imm_at(inst, 1)?)?)
        }

        "la" => {
            expect_operands(inst, 2)?;
            let rt = reg_at(inst, 0)?;
            vec![Lowered::LoadAddress { rt, target: target_at(inst, 1)? }]
        }

        "mfhi" | "mflo" => {
            expect_operands(inst, 1)?;
            let rd = reg_at(inst, 0)?;
            ready(vec![if m == "mfhi" {
                Instruction::Mfhi { rd }
            } else {
                Instruction::Mflo { rd }
            }])
        }

        "mthi" | "mtlo" | "jr" => {
            expect_operands(inst, 1)?;
            let rs = reg_at(inst, 0)?;
            ready(vec![match m {
                "mthi" => Instruction::Mthi { rs },
                "mtlo" => Instruction::Mtlo { rs },
                _ => Instruction::Jr { rs },
            }])
        }

        "jalr" => {
            let (rd, rs) = match n {
                1 => (RA, reg_at(inst, 0)?),
                2 => (reg_at(inst, 0)?, reg_at(inst, 1)?),
                _ => {
                    return Err(AsmErrorKind::OperandCount {
                        mnemonic: m.to_string(),
                        expected: "1 or 2",
                        found: n,
                    });
                }
            };
            ready(vec![Instruction::Jalr { rd, rs }])
        }

        "syscall" | "nop" => {
            expect_operands(inst, 0)?;
            ready(vec![if m == "nop" {
                Instruction::NOP
            } else {
                Instruction::Syscall
            }])
        }

        "lb" | "lbu" | "lh" | "lhu" | "lw" | "sb" | "sh" | "sw" => {
            expect_operands(inst, 2)?;
            let rt = reg_at(inst, 0)?;
            let (offset, base) = mem_at(inst, 1)?;
            ready(mem_op(m, rt, base, offset).into_iter().collect())
        }

        "beq" | "bne" => {
            expect_operands(inst, 3)?;
            let rs = reg_at(inst, 0)?;
            let rt = reg_or_scratch(inst, 1, &[0], &mut pre)?;
            let target = target_at(inst, 2)?;
            let kind = if m == "beq" {
                BranchKind::Beq { rs, rt }
            } else {
                BranchKind::Bne { rs, rt }
            };
            let mut out = ready(pre);
            out.push(Lowered::Branch { kind, target });
            out
        }

        "blez" | "bgtz" => {
            expect_operands(inst, 2)?;
            let rs = reg_at(inst, 0)?;
            let kind = if m == "blez" {
                BranchKind::Blez { rs }
            } else {
                BranchKind::Bgtz { rs }
            };
            vec![Lowered::Branch { kind, target: target_at(inst, 1)? }]
        }

        // compare into $at, then branch on it against $zero
        "blt" | "bge" | "bgt" | "ble" => {
            expect_operands(inst, 3)?;
            let rs = reg_at(inst, 0)?;
            let rt = reg_or_scratch(inst, 1, &[0], &mut pre)?;
            let target = target_at(inst, 2)?;
            let (lhs, rhs) = if matches!(m, "blt" | "bge") { (rs, rt) } else { (rt, rs) };
            pre.push(Instruction::Slt { rd: AT, rs: lhs, rt: rhs });
            let kind = if matches!(m, "blt" | "bgt") {
                BranchKind::Bne { rs: AT, rt: ZERO }
            } else {
                BranchKind::Beq { rs: AT, rt: ZERO }
            };
            let mut out = ready(pre);
            out.push(Lowered::Branch { kind, target });
            out
        }

        "b" | "j" | "jal" => {
            expect_operands(inst, 1)?;
            vec![Lowered::Jump {
                link: m == "jal",
                target: target_at(inst, 0)?,
            }]
        }

        _ => return Err(unsupported(inst)),
    };

    if out.is_empty() {
        return Err(unsupported(inst));
    }
    Ok(out)
}

/// Fills in a branch displacement: words from `pc + 4` to `target`.
pub(crate) fn branch_offset(pc: u32, target: u32) -> Result<i16, AsmErrorKind> {
    if target % 4 != 0 {
        return Err(AsmErrorKind::MisalignedTarget(target));
    }
    let delta = (target as i64 - (pc as i64 + 4)) / 4;
    signed16("branch", delta).map_err(|_| AsmErrorKind::BranchOutOfRange { pc, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::asm::source::{imm, label, mem, reg};
    use crate::mips::registers::{GP, SP, T0, T1, T2, T9};

    fn lower_ok(m: &str, ops: Vec<Operand>) -> Vec<Lowered> {
        lower(&SourceInstruction::new(m, &ops)).unwrap()
    }

    fn lower_err(m: &str, ops: Vec<Operand>) -> AsmErrorKind {
        lower(&SourceInstruction::new(m, &ops)).unwrap_err().kind
    }

    #[test]
    fn li_is_one_addiu() {
        assert_eq!(
            lower_ok("li", vec![reg(T0), imm(42)]),
            vec![Lowered::Ready(Instruction::Addiu { rt: T0, rs: ZERO, imm: 42 })]
        );
    }

    #[test]
    fn rem_is_div_then_mfhi() {
        assert_eq!(
            lower_ok("rem", vec![reg(T0), reg(T1), reg(T2)]),
            vec![
                Lowered::Ready(Instruction::Div { rs: T1, rt: T2 }),
                Lowered::Ready(Instruction::Mfhi { rd: T0 }),
            ]
        );
    }

    #[test]
    fn move_is_add_from_zero() {
        assert_eq!(
            lower_ok("move", vec![reg(T0), reg(T1)]),
            vec![Lowered::Ready(Instruction::Add { rd: T0, rs: ZERO, rt: T1 })]
        );
    }

    #[test]
    fn literal_operand_goes_through_at() {
        assert_eq!(
            lower_ok("add", vec![reg(T0), reg(T1), imm(7)]),
            vec![
                Lowered::Ready(Instruction::Addiu { rt: AT, rs: ZERO, imm: 7 }),
                Lowered::Ready(Instruction::Add { rd: T0, rs: T1, rt: AT }),
            ]
        );
    }

    #[test]
    fn two_literal_operands_are_rejected() {
        assert!(matches!(
            lower_err("add", vec![reg(T0), imm(1), imm(2)]),
            AsmErrorKind::OperandKind { index: 2, .. }
        ));
    }

    #[test]
    fn immediate_form_falls_back_to_register_form() {
        assert_eq!(
            lower_ok("addiu", vec![reg(SP), reg(SP), imm(-4)]),
            vec![
                Lowered::Ready(Instruction::Addi { rt: AT, rs: ZERO, imm: -4 }),
                Lowered::Ready(Instruction::Addu { rd: SP, rs: SP, rt: AT }),
            ]
        );
        assert_eq!(
            lower_ok("addi", vec![reg(SP), reg(SP), imm(-4)]),
            vec![Lowered::Ready(Instruction::Addi { rt: SP, rs: SP, imm: -4 })]
        );
    }

    #[test]
    fn literal_cannot_share_an_instruction_with_at() {
        let conflict = |m: &str| AsmErrorKind::ScratchConflict { mnemonic: m.into() };
        assert_eq!(lower_err("add", vec![reg(T0), reg(AT), imm(7)]), conflict("add"));
        assert_eq!(lower_err("sub", vec![reg(T0), imm(7), reg(AT)]), conflict("sub"));
        assert_eq!(lower_err("beq", vec![reg(AT), imm(3), label("x")]), conflict("beq"));
        assert_eq!(lower_err("blt", vec![reg(AT), imm(3), label("x")]), conflict("blt"));
        assert_eq!(lower_err("mult", vec![reg(AT), imm(3)]), conflict("mult"));
        assert_eq!(lower_err("rem", vec![reg(T0), reg(AT), imm(3)]), conflict("rem"));
        assert_eq!(lower_err("addiu", vec![reg(T0), reg(AT), imm(-4)]), conflict("addiu"));
    }

    #[test]
    fn at_as_destination_still_takes_a_literal() {
        assert_eq!(
            lower_ok("add", vec![reg(AT), reg(T1), imm(7)]),
            vec![
                Lowered::Ready(Instruction::Addiu { rt: AT, rs: ZERO, imm: 7 }),
                Lowered::Ready(Instruction::Add { rd: AT, rs: T1, rt: AT }),
            ]
        );
        // fits the immediate field, so $at is never touched
        assert_eq!(
            lower_ok("addi", vec![reg(T0), reg(AT), imm(-4)]),
            vec![Lowered::Ready(Instruction::Addi { rt: T0, rs: AT, imm: -4 })]
        );
    }

    #[test]
    fn blt_is_slt_then_bne() {
        assert_eq!(
            lower_ok("blt", vec![reg(T0), reg(T1), label("done")]),
            vec![
                Lowered::Ready(Instruction::Slt { rd: AT, rs: T0, rt: T1 }),
                Lowered::Branch {
                    kind: BranchKind::Bne { rs: AT, rt: ZERO },
                    target: Target::Label("done".into()),
                },
            ]
        );
    }

    #[test]
    fn bge_swaps_branch_sense_and_bgt_swaps_operands() {
        let bge = lower_ok("bge", vec![reg(T0), reg(T1), label("x")]);
        assert_eq!(bge[0], Lowered::Ready(Instruction::Slt { rd: AT, rs: T0, rt: T1 }));
        assert!(matches!(bge[1], Lowered::Branch { kind: BranchKind::Beq { .. }, .. }));

        let bgt = lower_ok("bgt", vec![reg(T0), reg(T1), label("x")]);
        assert_eq!(bgt[0], Lowered::Ready(Instruction::Slt { rd: AT, rs: T1, rt: T0 }));
        assert!(matches!(bgt[1], Lowered::Branch { kind: BranchKind::Bne { .. }, .. }));
    }

    #[test]
    fn branch_against_literal_materializes_first() {
        let out = lower_ok("beq", vec![reg(T0), imm(3), label("x")]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Lowered::Ready(Instruction::Addiu { rt: AT, rs: ZERO, imm: 3 }));
        assert!(matches!(
            out[1],
            Lowered::Branch { kind: BranchKind::Beq { rs: T0, rt: AT }, .. }
        ));
    }

    #[test]
    fn shift_by_register_picks_variable_form() {
        assert_eq!(
            lower_ok("sll", vec![reg(T0), reg(T1), reg(T2)]),
            vec![Lowered::Ready(Instruction::Sllv { rd: T0, rt: T1, rs: T2 })]
        );
        assert_eq!(
            lower_err("sra", vec![reg(T0), reg(T1), imm(32)]),
            AsmErrorKind::ShiftAmountOutOfRange(32)
        );
    }

    #[test]
    fn mul_and_three_operand_div() {
        assert_eq!(
            lower_ok("mul", vec![reg(T0), reg(T1), reg(T2)]),
            vec![
                Lowered::Ready(Instruction::Mult { rs: T1, rt: T2 }),
                Lowered::Ready(Instruction::Mflo { rd: T0 }),
            ]
        );
        assert_eq!(
            lower_ok("div", vec![reg(T1), reg(T2)]),
            vec![Lowered::Ready(Instruction::Div { rs: T1, rt: T2 })]
        );
        assert_eq!(lower_ok("divu", vec![reg(T0), reg(T1), reg(T2)]).len(), 2);
    }

    #[test]
    fn loads_take_offset_and_base() {
        assert_eq!(
            lower_ok("lw", vec![reg(T0), mem(-8, SP)]),
            vec![Lowered::Ready(Instruction::Lw { rt: T0, base: SP, offset: -8 })]
        );
        assert!(matches!(
            lower_err("sw", vec![reg(T0), mem(40000, GP)]),
            AsmErrorKind::ImmediateOutOfRange { value: 40000, .. }
        ));
    }

    #[test]
    fn jalr_defaults_to_ra() {
        assert_eq!(
            lower_ok("jalr", vec![reg(T9)]),
            vec![Lowered::Ready(Instruction::Jalr { rd: RA, rs: T9 })]
        );
    }

    #[test]
    fn unknown_mnemonic_is_unsupported() {
        assert_eq!(
            lower_err("frobnicate", vec![]),
            AsmErrorKind::UnsupportedInstruction("frobnicate".into())
        );
    }

    #[test]
    fn operand_count_is_checked() {
        assert!(matches!(
            lower_err("add", vec![reg(T0), reg(T1)]),
            AsmErrorKind::OperandCount { found: 2, .. }
        ));
        assert!(matches!(
            lower_err("rem", vec![reg(T0), reg(T1)]),
            AsmErrorKind::OperandCount { found: 2, .. }
        ));
    }

    #[test]
    fn out_of_range_register_is_rejected() {
        assert_eq!(
            lower_err("jr", vec![reg(32)]),
            AsmErrorKind::InvalidRegister(32)
        );
    }

    #[test]
    fn branch_offset_counts_from_next_instruction() {
        assert_eq!(branch_offset(0, 12), Ok(2));
        assert_eq!(branch_offset(8, 0), Ok(-3));
        assert_eq!(branch_offset(0, 4), Ok(0));
        assert_eq!(branch_offset(0, 6), Err(AsmErrorKind::MisalignedTarget(6)));
        assert!(matches!(
            branch_offset(0, 0x40000),
            Err(AsmErrorKind::BranchOutOfRange { .. })
        ));
    }
}
