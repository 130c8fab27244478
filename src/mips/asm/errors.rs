use std::fmt;

use thiserror::Error;

/// What went wrong while assembling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmErrorKind {
    #[error("undefined label: {0}")]
    UndefinedLabel(String),

    #[error("unsupported instruction: {0}")]
    UnsupportedInstruction(String),

    #[error("{mnemonic}: expected {expected} operands, found {found}")]
    OperandCount {
        mnemonic: String,
        expected: &'static str,
        found: usize,
    },

    #[error("{mnemonic}: operand {index} must be {expected}")]
    OperandKind {
        mnemonic: String,
        index: usize,
        expected: &'static str,
    },

    #[error("invalid register ${0}")]
    InvalidRegister(u8),

    #[error("{mnemonic}: immediate {value} out of range")]
    ImmediateOutOfRange { mnemonic: String, value: i64 },

    #[error("{mnemonic}: a literal operand goes through $at, which is also a source")]
    ScratchConflict { mnemonic: String },

    #[error("shift amount {0} outside 0..=31")]
    ShiftAmountOutOfRange(i64),

    #[error("branch at 0x{pc:08x} cannot reach 0x{target:08x}")]
    BranchOutOfRange { pc: u32, target: u32 },

    #[error("{mnemonic}: address 0x{address:x} does not fit the immediate field")]
    AddressOutOfRange { mnemonic: String, address: u32 },

    #[error("jump target 0x{0:08x} is not word aligned")]
    MisalignedTarget(u32),

    #[error("code label {name} refers to instruction {index}, past the end of the program")]
    LabelOutOfRange { name: String, index: u32 },

    #[error("{directive}: {reason}")]
    Directive {
        directive: &'static str,
        reason: String,
    },
}

/// Where in the symbolic program an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Instruction(usize),
    Directive(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmError {
    pub at: Option<Location>,
    pub kind: AsmErrorKind,
}

impl AsmError {
    pub fn at_instruction(index: usize, kind: AsmErrorKind) -> Self {
        Self { at: Some(Location::Instruction(index)), kind }
    }

    pub fn at_directive(index: usize, kind: AsmErrorKind) -> Self {
        Self { at: Some(Location::Directive(index)), kind }
    }
}

impl From<AsmErrorKind> for AsmError {
    fn from(kind: AsmErrorKind) -> Self {
        Self { at: None, kind }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.at {
            Some(Location::Instruction(i)) => write!(f, "instruction {i}: {}", self.kind),
            Some(Location::Directive(i)) => write!(f, "directive {i}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AsmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
