//! End-to-end: source text in, a `.SAV` object file out, round-tripped
//! through `BinaryBuffer`'s own reader.

use merlin6502::binary_buffer::BinaryBuffer;
use merlin6502::Assembler;

#[test]
fn small_program_assembles_and_round_trips_through_sav() {
    let _ = env_logger::try_init();
    let source = " ORG $0800\n LDA #$01\n STA $C010\n RTS\n";
    let result = Assembler::new().assemble(source, "program.s");
    assert_eq!(result.error_count, 0);

    let sav = result.binary.write_object_file();
    let (load_addr, bytes) = BinaryBuffer::read_object_file(&sav).unwrap();
    assert_eq!(load_addr, 0x0800);
    assert_eq!(bytes, vec![0xA9, 0x01, 0x8D, 0x10, 0xC0, 0x60]);
}

#[test]
fn include_depth_limit_is_enforced() {
    // PUT/USE is resolved relative to the assembled file's own directory;
    // with no filesystem backing a chain of includes here, a PUT of a
    // nonexistent file surfaces as a line-scoped I/O diagnostic rather than
    // aborting the whole run.
    let result = Assembler::new().assemble(" PUT missing-include.s\n", "program.s");
    assert_eq!(result.error_count, 1);
}

#[test]
fn listing_renders_every_line_including_equ_rows() {
    let source = "LABEL EQU $2000\n ORG $0800\n LDA LABEL\n";
    let result = Assembler::new().assemble(source, "program.s");
    assert_eq!(result.error_count, 0);

    let mut rendered = Vec::new();
    for line in &result.lines {
        rendered.extend(merlin6502::listing::format_line(line));
    }
    assert!(rendered.iter().any(|row| row.contains("=2000")));
    assert!(rendered.iter().any(|row| row.starts_with("0800:")));
}

#[test]
fn a_program_spanning_all_three_instruction_sets_assembles_once_gated() {
    let source = " XC\n XC\n STP\n PHX\n LDA #$00\n";
    let result = Assembler::new().assemble(source, "program.s");
    assert_eq!(result.error_count, 0);
    assert!(result.binary.bytes().contains(&0xDB)); // STP
}
