// src/mips/asm/mod.rs
//! Symbolic program in, container bytes out.

mod assembler;
mod errors;
mod program;
mod pseudo;
mod source;
mod utils;

pub use assembler::{MAX_DATA_BYTES, assemble, assemble_program};
pub use errors::{AsmError, AsmErrorKind, Location};
pub use program::Program;
pub use pseudo::{BranchKind, Lowered, Target, lower};
pub use source::{
    DataValue, Directive, DirectiveKind, Label, Operand, Segment, SourceInstruction,
    SourceProgram, imm, label, mem, reg,
};

#[cfg(test)]
mod tests;
