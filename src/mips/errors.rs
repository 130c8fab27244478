use thiserror::Error;

/// A word whose opcode/function pair is outside the instruction table.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown opcode 0x{0:02x}")]
    Opcode(u8),

    #[error("unknown function code 0x{0:02x}")]
    Funct(u8),
}

/// Conditions that stop a run. None of them is recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Signed `add`/`sub`/`addi` result left the 32-bit range.
    #[error("integer overflow: {op} {lhs}, {rhs}")]
    IntegerOverflow {
        op: &'static str,
        lhs: i32,
        rhs: i32,
    },

    /// The fetched word does not decode.
    #[error("unsupported instruction 0x{word:08x} at 0x{pc:08x}: {cause}")]
    UnsupportedInstruction {
        pc: u32,
        word: u32,
        cause: DecodeError,
    },

    /// `$v0` held a syscall number other than exit.
    #[error("unsupported syscall {0}")]
    UnsupportedSyscall(i32),

    #[error("empty program")]
    EmptyProgram,

    #[error("pc 0x{0:08x} outside the code region")]
    PcOutOfBounds(u32),

    #[error("pc 0x{0:08x} is not word aligned")]
    MisalignedPc(u32),

    #[error("{width}-byte access at 0x{addr:08x} outside data memory")]
    MemoryOutOfBounds { addr: u32, width: u32 },

    #[error("{width}-byte access at 0x{addr:08x} is not aligned")]
    UnalignedAccess { addr: u32, width: u32 },

    /// The host-imposed step budget ran out before the program halted.
    #[error("step limit of {0} reached")]
    StepLimit(u64),
}

/// Problems reading a container produced by the assembler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    #[error("container truncated: need {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("not an object container (bad marker or magic)")]
    BadMagic,

    #[error("unsupported container version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("unknown section type tag {0}")]
    UnknownSectionKind(u8),

    #[error("section at 0x{offset:x} (+{size}) runs past the end of the container")]
    SectionOutOfBounds { offset: u32, size: u32 },

    #[error("container has no {0} section")]
    MissingSection(&'static str),

    #[error("entry point 0x{0:x} is outside the code section")]
    EntryOutOfBounds(u32),
}
