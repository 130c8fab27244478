use crate::mips::arch::STACK_SIZE;

/// Start-up parameters for a [`Machine`](crate::mips::exec::Machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Initial value of `$sp`.
    pub stack_size: u32,
    /// Bytes of data memory; the data section is loaded at 0.
    pub data_size: u32,
    /// Initial `pc`, a byte offset into the code.
    pub entry: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            stack_size: STACK_SIZE,
            data_size: STACK_SIZE,
            entry: 0,
        }
    }
}

impl MachineConfig {
    pub fn with_stack_size(mut self, stack_size: u32) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn with_data_size(mut self, data_size: u32) -> Self {
        self.data_size = data_size;
        self
    }

    pub fn with_entry(mut self, entry: u32) -> Self {
        self.entry = entry;
        self
    }
}
