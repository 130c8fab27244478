use crate::mips::arch::SYS_EXIT;
use crate::mips::errors::Fault;
use crate::mips::registers::{Cpu, V0};

/// Services a `syscall` using the number in `$v0`. Only exit is known.
pub fn handle_syscall(cpu: &mut Cpu) -> Result<(), Fault> {
    match cpu.read(V0) {
        SYS_EXIT => {
            cpu.halted = true;
            Ok(())
        }
        other => Err(Fault::UnsupportedSyscall(other)),
    }
}
