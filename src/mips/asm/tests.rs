use rand::Rng;

use super::*;
use crate::mips::encoder::encode;
use crate::mips::instruction::Instruction;
use crate::mips::object::{HEADER_LEN, ObjectFile, SectionKind};
use crate::mips::registers::{A0, AT, GP, T0, T1, T2, ZERO};

fn words(src: &SourceProgram) -> Vec<u32> {
    assemble_program(src).expect("assemble").text
}

fn enc(insts: &[Instruction]) -> Vec<u32> {
    insts.iter().map(|i| encode(*i)).collect()
}

#[test]
fn li_assembles_to_single_addiu() {
    let mut src = SourceProgram::new();
    src.instr("li", &[reg(T0), imm(42)]);
    assert_eq!(
        words(&src),
        enc(&[Instruction::Addiu { rt: T0, rs: ZERO, imm: 42 }])
    );
}

#[test]
fn rem_assembles_to_div_and_mfhi() {
    let mut src = SourceProgram::new();
    src.instr("rem", &[reg(T0), reg(T1), reg(T2)]);
    assert_eq!(
        words(&src),
        enc(&[Instruction::Div { rs: T1, rt: T2 }, Instruction::Mfhi { rd: T0 }])
    );
}

#[test]
fn beq_over_two_nops_has_displacement_two() {
    let mut src = SourceProgram::new();
    src.instr("beq", &[reg(T0), reg(T1), label("skip")])
        .instr("nop", &[])
        .instr("nop", &[])
        .code_label("skip")
        .instr("syscall", &[]);
    let text = words(&src);
    assert_eq!(text.len(), 4);
    assert_eq!(text[0], encode(Instruction::Beq { rs: T0, rt: T1, offset: 2 }));
}

#[test]
fn backward_branch_is_negative() {
    let mut src = SourceProgram::new();
    src.code_label("loop")
        .instr("addiu", &[reg(T0), reg(T0), imm(1)])
        .instr("bne", &[reg(T0), reg(T1), label("loop")]);
    assert_eq!(
        words(&src)[1],
        encode(Instruction::Bne { rs: T0, rt: T1, offset: -2 })
    );
}

#[test]
fn labels_count_expanded_words() {
    // li of a wide literal takes two words, blt takes two
    let mut src = SourceProgram::new();
    src.instr("li", &[reg(T0), imm(0x12345)])
        .instr("blt", &[reg(T0), reg(T1), label("end")])
        .instr("j", &[label("end")])
        .code_label("end")
        .instr("syscall", &[]);
    let prog = assemble_program(&src).unwrap();

    assert_eq!(prog.symbols["end"], 20);
    assert_eq!(
        prog.text,
        enc(&[
            Instruction::Lui { rt: T0, imm: 1 },
            Instruction::Ori { rt: T0, rs: T0, imm: 0x2345 },
            Instruction::Slt { rd: AT, rs: T0, rt: T1 },
            Instruction::Bne { rs: AT, rt: ZERO, offset: 1 },
            Instruction::J { target: 5 },
            Instruction::Syscall,
        ])
    );
}

#[test]
fn random_expansions_keep_labels_consistent() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let mut src = SourceProgram::new();
        let len = rng.gen_range(0..20);
        for _ in 0..len {
            match rng.gen_range(0..5) {
                0 => src.instr("li", &[reg(T0), imm(rng.gen_range(-70000..70000))]),
                1 => src.instr("rem", &[reg(T0), reg(T1), reg(T2)]),
                2 => src.instr("blt", &[reg(T0), imm(rng.gen_range(0..10)), label("end")]),
                3 => src.instr("addi", &[reg(T0), reg(T1), imm(rng.gen_range(-40000..40000))]),
                _ => src.instr("nop", &[]),
            };
        }
        src.code_label("end").instr("syscall", &[]);

        let prog = assemble_program(&src).unwrap();
        let end = prog.symbols["end"];
        assert_eq!(end as usize, (prog.text.len() - 1) * 4);
        assert_eq!(*prog.text.last().unwrap(), encode(Instruction::Syscall));
    }
}

#[test]
fn undefined_label_names_the_label() {
    let mut src = SourceProgram::new();
    src.instr("nop", &[]).instr("j", &[label("nowhere")]);
    let err = assemble(&src).unwrap_err();
    assert_eq!(err.kind, AsmErrorKind::UndefinedLabel("nowhere".into()));
    assert_eq!(err.at, Some(Location::Instruction(1)));
}

#[test]
fn unsupported_mnemonic_is_reported() {
    let mut src = SourceProgram::new();
    src.instr("eret", &[]);
    let err = assemble(&src).unwrap_err();
    assert_eq!(err.kind, AsmErrorKind::UnsupportedInstruction("eret".into()));
    assert_eq!(err.to_string(), "instruction 0: unsupported instruction: eret");
}

#[test]
fn code_label_past_the_end_is_rejected() {
    let mut src = SourceProgram::new();
    src.instr("nop", &[]);
    src.labels.insert(
        "far".into(),
        Label { segment: Segment::Code, address: 5 },
    );
    assert!(matches!(
        assemble(&src).unwrap_err().kind,
        AsmErrorKind::LabelOutOfRange { index: 5, .. }
    ));
}

#[test]
fn la_is_gp_relative() {
    let mut src = SourceProgram::new();
    src.data_label("n")
        .directive(Directive::ints(DirectiveKind::Word, &[7]))
        .data_label("msg")
        .directive(Directive::string(DirectiveKind::Asciiz, "hi"));
    src.instr("la", &[reg(A0), label("msg")]);
    assert_eq!(
        words(&src),
        enc(&[Instruction::Addiu { rt: A0, rs: GP, imm: 4 }])
    );
}

#[test]
fn la_beyond_immediate_range_fails() {
    let mut src = SourceProgram::new();
    src.labels.insert(
        "big".into(),
        Label { segment: Segment::Data, address: 0x1_0000 },
    );
    src.instr("la", &[reg(A0), label("big")]);
    assert!(matches!(
        assemble(&src).unwrap_err().kind,
        AsmErrorKind::AddressOutOfRange { address: 0x1_0000, .. }
    ));
}

#[test]
fn data_directives_emit_big_endian_in_order() {
    let mut src = SourceProgram::new();
    src.directive(Directive::ints(DirectiveKind::Byte, &[1, 0x1FF]))
        .directive(Directive::ints(DirectiveKind::Half, &[0x1234]))
        .directive(Directive::ints(DirectiveKind::Word, &[-1]))
        .directive(Directive::string(DirectiveKind::Ascii, "ab"))
        .directive(Directive::string(DirectiveKind::Asciiz, "c"))
        .directive(Directive::ints(DirectiveKind::Space, &[2]));
    let prog = assemble_program(&src).unwrap();
    assert_eq!(
        prog.data,
        vec![1, 0xFF, 0x12, 0x34, 0xFF, 0xFF, 0xFF, 0xFF, b'a', b'b', b'c', 0, 0, 0]
    );
}

#[test]
fn string_in_numeric_directive_is_rejected() {
    let mut src = SourceProgram::new();
    src.directive(Directive::ints(DirectiveKind::Byte, &[1]))
        .directive(Directive::string(DirectiveKind::Word, "oops"));
    let err = assemble(&src).unwrap_err();
    assert_eq!(err.at, Some(Location::Directive(1)));
    assert!(matches!(err.kind, AsmErrorKind::Directive { directive: ".word", .. }));
}

#[test]
fn oversized_space_is_refused_before_allocating() {
    let mut src = SourceProgram::new();
    src.directive(Directive::ints(DirectiveKind::Word, &[7]))
        .directive(Directive::ints(DirectiveKind::Space, &[i64::MAX, i64::MAX]))
        .data_label("after")
        .directive(Directive::ints(DirectiveKind::Byte, &[1]));
    assert_eq!(src.labels["after"].address, u32::MAX);

    let err = assemble(&src).unwrap_err();
    assert_eq!(err.at, Some(Location::Directive(1)));
    assert!(matches!(err.kind, AsmErrorKind::Directive { directive: ".space", .. }));
}

#[test]
fn data_section_is_capped() {
    let mut src = SourceProgram::new();
    src.directive(Directive::ints(DirectiveKind::Space, &[MAX_DATA_BYTES as i64]));
    assert_eq!(assemble_program(&src).unwrap().data.len() as u64, MAX_DATA_BYTES);

    src.directive(Directive::ints(DirectiveKind::Byte, &[0]));
    assert_eq!(assemble(&src).unwrap_err().at, Some(Location::Directive(1)));
}

#[test]
fn entry_points_at_main() {
    let mut src = SourceProgram::new();
    src.code_label("helper")
        .instr("li", &[reg(T0), imm(-1)])
        .instr("jr", &[reg(31)])
        .code_label("main")
        .instr("jal", &[label("helper")]);
    let prog = assemble_program(&src).unwrap();
    // li -1 is a single addi
    assert_eq!(prog.text[0], encode(Instruction::Addi { rt: T0, rs: ZERO, imm: -1 }));
    assert_eq!(prog.entry, 8);
    assert_eq!(prog.text[2], encode(Instruction::Jal { target: 0 }));

    let bytes = prog.to_object();
    let obj = ObjectFile::parse(&bytes).unwrap();
    assert_eq!(obj.header.entry, HEADER_LEN as u32 + 8);
}

#[test]
fn entry_defaults_to_code_start() {
    let mut src = SourceProgram::new();
    src.instr("syscall", &[]);
    let bytes = assemble(&src).unwrap();
    assert_eq!(&bytes[6..10], &(HEADER_LEN as u32).to_be_bytes());
}

#[test]
fn container_layout_matches_payloads() {
    let mut src = SourceProgram::new();
    src.data_label("x")
        .directive(Directive::ints(DirectiveKind::Half, &[5]));
    src.instr("lh", &[reg(T0), mem(0, GP)]).instr("syscall", &[]);
    let prog = assemble_program(&src).unwrap();
    let bytes = assemble(&src).unwrap();

    assert_eq!(&bytes[..6], &[0x7F, b'M', b'P', b'S', 1, 0]);
    // header | 8 code | 0 pool | 2 data | 3 entries
    assert_eq!(bytes.len(), HEADER_LEN + 8 + 2 + 3 * 11);
    assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 8], &prog.code_bytes()[..]);

    let obj = ObjectFile::parse(&bytes).unwrap();
    let kinds: Vec<_> = obj.sections.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![SectionKind::Code, SectionKind::StringPool, SectionKind::Data]
    );
    assert_eq!(obj.section(SectionKind::StringPool), Some(&[0u8; 0][..]));
    assert_eq!(obj.section(SectionKind::Data), Some(&[0u8, 5][..]));
    assert_eq!(obj.header.section_table, (HEADER_LEN + 10) as u32);
}
