//! A small MIPS-style toolchain: an assembler that lowers a symbolic
//! program into a sectioned object container, and an interpreter that
//! executes the container's code section.

pub mod mips;

pub use mips::asm::{AsmError, SourceProgram, assemble};
pub use mips::exec::run;
pub use mips::program::load;
pub use mips::{Cpu, Fault, Machine, MachineConfig};
