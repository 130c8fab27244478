use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::mips::arch::INSTR_BYTES;
use crate::mips::encoder::encode;
use crate::mips::instruction::Instruction;
use crate::mips::registers::GP;

use super::errors::{AsmError, AsmErrorKind};
use super::program::Program;
use super::pseudo::{Lowered, Target, branch_offset, lower_inst};
use super::source::{DataValue, Directive, DirectiveKind, Label, Segment, SourceProgram};

const ENTRY_LABEL: &str = "main";

/// Largest data section the assembler will emit.
pub const MAX_DATA_BYTES: u64 = 1 << 24;

/// Assembles `src` into a container byte buffer.
pub fn assemble(src: &SourceProgram) -> Result<Vec<u8>, AsmError> {
    assemble_program(src).map(|p| p.to_object())
}

/// Assembles `src` into encoded words and data bytes.
///
/// Runs in two passes. The first lowers every instruction, which fixes how
/// many words each one occupies; code labels are then mapped from
/// instruction indices to the byte offsets those counts imply. The second
/// pass resolves branch, jump and `la` targets and encodes.
pub fn assemble_program(src: &SourceProgram) -> Result<Program, AsmError> {
    let mut lowered = Vec::with_capacity(src.instructions.len());
    // first word of each symbolic instruction, plus one past the end
    let mut first_word = Vec::with_capacity(src.instructions.len() + 1);
    let mut words = 0u32;
    for (i, inst) in src.instructions.iter().enumerate() {
        let l = lower_inst(inst).map_err(|k| AsmError::at_instruction(i, k))?;
        first_word.push(words);
        words += l.len() as u32;
        lowered.push(l);
    }
    first_word.push(words);

    let symbols = resolve_labels(&src.labels, &first_word)?;

    let entry = match src.labels.get(ENTRY_LABEL) {
        Some(Label { segment: Segment::Code, .. }) => {
            symbols.get(ENTRY_LABEL).copied().unwrap_or(0)
        }
        Some(_) => {
            warn!("`{ENTRY_LABEL}` is a data label; starting at the first instruction");
            0
        }
        None => 0,
    };

    let mut text = Vec::with_capacity(words as usize);
    for (i, group) in lowered.iter().enumerate() {
        for item in group {
            let pc = text.len() as u32 * INSTR_BYTES;
            let inst = finish(item, pc, &symbols).map_err(|k| AsmError::at_instruction(i, k))?;
            trace!("0x{pc:04x}: {inst:?}");
            text.push(encode(inst));
        }
    }

    let data = emit_data(&src.directives)?;

    debug!(
        "assembled {} instructions into {} words, {} data bytes, entry 0x{:x}",
        src.instructions.len(),
        text.len(),
        data.len(),
        entry
    );

    Ok(Program { text, data, entry, symbols })
}

/// Final byte address of every label.
fn resolve_labels(
    labels: &HashMap<String, Label>,
    first_word: &[u32],
) -> Result<HashMap<String, u32>, AsmError> {
    labels
        .iter()
        .map(|(name, label)| -> Result<(String, u32), AsmError> {
            let address = match label.segment {
                Segment::Data => label.address,
                Segment::Code => first_word
                    .get(label.address as usize)
                    .map(|w| w * INSTR_BYTES)
                    .ok_or_else(|| AsmErrorKind::LabelOutOfRange {
                        name: name.clone(),
                        index: label.address,
                    })?,
            };
            Ok((name.clone(), address))
        })
        .collect()
}

fn address_of(target: &Target, symbols: &HashMap<String, u32>) -> Result<u32, AsmErrorKind> {
    match target {
        Target::Address(a) => Ok(*a),
        Target::Label(name) => symbols
            .get(name)
            .copied()
            .ok_or_else(|| AsmErrorKind::UndefinedLabel(name.clone())),
    }
}

/// Turns one lowered word into a concrete instruction at byte offset `pc`.
fn finish(
    item: &Lowered,
    pc: u32,
    symbols: &HashMap<String, u32>,
) -> Result<Instruction, AsmErrorKind> {
    Ok(match item {
        Lowered::Ready(inst) => *inst,
        Lowered::Branch { kind, target } => {
            let target = address_of(target, symbols)?;
            kind.with_offset(branch_offset(pc, target)?)
        }
        Lowered::Jump { link, target } => {
            let target = address_of(target, symbols)?;
            if target % INSTR_BYTES != 0 {
                return Err(AsmErrorKind::MisalignedTarget(target));
            }
            // the encoder keeps the low 26 bits of the word index
            let target = target >> 2;
            if *link {
                Instruction::Jal { target }
            } else {
                Instruction::J { target }
            }
        }
        Lowered::LoadAddress { rt, target } => {
            let address = address_of(target, symbols)?;
            let imm = u16::try_from(address).map_err(|_| AsmErrorKind::AddressOutOfRange {
                mnemonic: "la".to_string(),
                address,
            })?;
            Instruction::Addiu { rt: *rt, rs: GP, imm }
        }
    })
}

fn emit_data(directives: &[Directive]) -> Result<Vec<u8>, AsmError> {
    let mut total = 0u64;
    for (i, d) in directives.iter().enumerate() {
        total = total.saturating_add(d.size());
        if total > MAX_DATA_BYTES {
            return Err(AsmError::at_directive(
                i,
                AsmErrorKind::Directive {
                    directive: d.kind.name(),
                    reason: format!("data section would exceed {MAX_DATA_BYTES} bytes"),
                },
            ));
        }
    }

    let mut out = Vec::with_capacity(total as usize);
    for (i, d) in directives.iter().enumerate() {
        emit_directive(d, &mut out).map_err(|k| AsmError::at_directive(i, k))?;
    }
    Ok(out)
}

/// Numbers are truncated to the directive's width; strings are copied
/// byte for byte.
fn emit_directive(d: &Directive, out: &mut Vec<u8>) -> Result<(), AsmErrorKind> {
    let mismatch = |reason: &str| AsmErrorKind::Directive {
        directive: d.kind.name(),
        reason: reason.to_string(),
    };
    for v in &d.values {
        match (d.kind, v) {
            (DirectiveKind::Byte, DataValue::Int(n)) => out.push(*n as u8),
            (DirectiveKind::Half, DataValue::Int(n)) => out.extend((*n as u16).to_be_bytes()),
            (DirectiveKind::Word, DataValue::Int(n)) => out.extend((*n as u32).to_be_bytes()),
            (DirectiveKind::Ascii, DataValue::Str(s)) => out.extend(s.as_bytes()),
            (DirectiveKind::Asciiz, DataValue::Str(s)) => {
                out.extend(s.as_bytes());
                out.push(0);
            }
            (DirectiveKind::Space, DataValue::Int(n)) => {
                let n = usize::try_from(*n).map_err(|_| mismatch("negative size"))?;
                out.resize(out.len() + n, 0);
            }
            (DirectiveKind::Ascii | DirectiveKind::Asciiz, DataValue::Int(_)) => {
                return Err(mismatch("expects a string"));
            }
            (_, DataValue::Str(_)) => return Err(mismatch("expects numeric values")),
        }
    }
    Ok(())
}
