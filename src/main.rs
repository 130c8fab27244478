use std::error::Error;

use log::info;
use toymips::mips::asm::{Directive, DirectiveKind, imm, label, mem, reg};
use toymips::mips::registers::*;
use toymips::{MachineConfig, SourceProgram, assemble, load};

/// Sums a word table and stores the total after it.
fn demo_program() -> SourceProgram {
    let mut src = SourceProgram::new();
    src.data_label("table")
        .directive(Directive::ints(DirectiveKind::Word, &[5, 7, -2, 30]))
        .data_label("total")
        .directive(Directive::ints(DirectiveKind::Space, &[4]));

    src.code_label("main")
        .instr("la", &[reg(T0), label("table")])
        .instr("li", &[reg(T1), imm(4)])
        .instr("move", &[reg(S0), reg(ZERO)])
        .code_label("loop")
        .instr("lw", &[reg(T2), mem(0, T0)])
        .instr("add", &[reg(S0), reg(S0), reg(T2)])
        .instr("addiu", &[reg(T0), reg(T0), imm(4)])
        .instr("addi", &[reg(T1), reg(T1), imm(-1)])
        .instr("bgtz", &[reg(T1), label("loop")])
        .instr("la", &[reg(T3), label("total")])
        .instr("sw", &[reg(S0), mem(0, T3)])
        .instr("li", &[reg(V0), imm(10)])
        .instr("syscall", &[]);
    src
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let object = assemble(&demo_program())?;
    info!("container is {} bytes", object.len());

    let program = load(&object)?;
    let mut machine = program.machine(MachineConfig::default())?;
    machine.run_bounded(1_000)?;

    let cpu = machine.cpu();
    for r in 0..REG_COUNT as u8 {
        let v = cpu.read(r);
        if v != 0 {
            println!("${:<4} = {v} (0x{:08x})", reg_name(r), v as u32);
        }
    }
    println!("pc = 0x{:08x}, steps = {}", cpu.pc, machine.steps());
    Ok(())
}
