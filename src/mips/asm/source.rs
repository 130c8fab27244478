//! The symbolic program handed to the assembler by a front end.
//!
//! Nothing here parses text: a front end (or a test) builds the model
//! directly, in source order.

use std::collections::HashMap;

/// Segment a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Code,
    Data,
}

/// A named address. Code labels hold the index of the symbolic instruction
/// they precede; data labels hold a byte offset into the data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub segment: Segment,
    pub address: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(u8),
    Imm(i64),
    Label(String),
    /// `offset(base)`
    Mem { offset: i64, base: u8 },
}

pub fn reg(r: u8) -> Operand {
    Operand::Reg(r)
}

pub fn imm(v: i64) -> Operand {
    Operand::Imm(v)
}

pub fn label(name: &str) -> Operand {
    Operand::Label(name.to_string())
}

pub fn mem(offset: i64, base: u8) -> Operand {
    Operand::Mem { offset, base }
}

/// A mnemonic and its operands, written in assembly order
/// (`add rd, rs, rt`, `lw rt, offset(base)`, `beq rs, rt, label`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInstruction {
    pub mnemonic: String,
    pub operands: Vec<Operand>,
}

impl SourceInstruction {
    pub fn new(mnemonic: &str, operands: &[Operand]) -> Self {
        Self {
            mnemonic: mnemonic.to_ascii_lowercase(),
            operands: operands.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Byte,
    Half,
    Word,
    Ascii,
    Asciiz,
    /// `.space n`: `n` zero bytes
    Space,
}

impl DirectiveKind {
    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Byte => ".byte",
            DirectiveKind::Half => ".half",
            DirectiveKind::Word => ".word",
            DirectiveKind::Ascii => ".ascii",
            DirectiveKind::Asciiz => ".asciiz",
            DirectiveKind::Space => ".space",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub values: Vec<DataValue>,
}

impl Directive {
    pub fn new(kind: DirectiveKind, values: impl IntoIterator<Item = DataValue>) -> Self {
        Self {
            kind,
            values: values.into_iter().collect(),
        }
    }

    pub fn ints(kind: DirectiveKind, values: &[i64]) -> Self {
        Self::new(kind, values.iter().map(|v| DataValue::Int(*v)))
    }

    pub fn string(kind: DirectiveKind, s: &str) -> Self {
        Self::new(kind, [DataValue::Str(s.to_string())])
    }

    /// Bytes this directive occupies once emitted. Malformed operands count
    /// as zero; emission reports them.
    /// Bytes this directive occupies, saturating instead of wrapping.
    /// Malformed values count as zero; emission reports them.
    pub fn size(&self) -> u64 {
        self.values.iter().fold(0u64, |total, v| {
            let n = match (self.kind, v) {
                (DirectiveKind::Byte, DataValue::Int(_)) => 1,
                (DirectiveKind::Half, DataValue::Int(_)) => 2,
                (DirectiveKind::Word, DataValue::Int(_)) => 4,
                (DirectiveKind::Ascii, DataValue::Str(s)) => s.len() as u64,
                (DirectiveKind::Asciiz, DataValue::Str(s)) => (s.len() as u64).saturating_add(1),
                (DirectiveKind::Space, DataValue::Int(n)) => u64::try_from(*n).unwrap_or(0),
                _ => 0,
            };
            total.saturating_add(n)
        })
    }
}

/// Everything the assembler consumes.
#[derive(Debug, Clone, Default)]
pub struct SourceProgram {
    pub instructions: Vec<SourceInstruction>,
    pub directives: Vec<Directive>,
    pub labels: HashMap<String, Label>,
}

impl SourceProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, inst: SourceInstruction) -> &mut Self {
        self.instructions.push(inst);
        self
    }

    pub fn instr(&mut self, mnemonic: &str, operands: &[Operand]) -> &mut Self {
        self.push(SourceInstruction::new(mnemonic, operands))
    }

    /// Binds `name` to the next instruction to be pushed.
    pub fn code_label(&mut self, name: &str) -> &mut Self {
        let address = self.instructions.len() as u32;
        self.labels.insert(name.to_string(), Label { segment: Segment::Code, address });
        self
    }

    /// Binds `name` to the data byte offset the next directive will start at.
    pub fn data_label(&mut self, name: &str) -> &mut Self {
        let total = self
            .directives
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.size()));
        // an oversized data section is refused at assembly
        let address = u32::try_from(total).unwrap_or(u32::MAX);
        self.labels.insert(name.to_string(), Label { segment: Segment::Data, address });
        self
    }

    pub fn directive(&mut self, directive: Directive) -> &mut Self {
        self.directives.push(directive);
        self
    }
}
