pub mod arch;
pub mod config;
pub mod errors;
pub mod exec;
pub mod instruction;
pub mod memory;
pub mod registers;
pub mod syscall;

pub mod decoder;
pub mod encoder;

pub mod asm;
pub mod object;
pub mod program;

pub use config::MachineConfig;
pub use errors::{DecodeError, Fault, ObjectError};
pub use exec::{Machine, Status};
pub use instruction::Instruction;
pub use memory::{Bus, Ram};
pub use registers::Cpu;
