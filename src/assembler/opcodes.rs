//! Opcode tables for the MOS 6502, 65C02, and 65816 instruction sets, and
//! the addressing-mode/operand-byte-width mapping used by the driver to
//! size and emit each instruction.

use phf::phf_set;

use crate::line_info::InstructionSet;

/// Addressing-mode families. The driver builds an ordered list of
/// candidates from operand syntax and picks the first that both has a table
/// entry for the mnemonic and is legal given the operand's value range and
/// forward-reference status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    AbsoluteLong,
    Indirect,
    IndirectX,
    IndirectY,
    IndirectZp,
    IndirectAbsoluteX,
    Relative,
    RelativeLong,
    BlockMove,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode byte itself (excluding
    /// the opcode). `Implied`/`Accumulator` take none.
    pub fn operand_len(self) -> usize {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectX
            | AddressingMode::IndirectY
            | AddressingMode::IndirectZp
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect
            | AddressingMode::IndirectAbsoluteX
            | AddressingMode::RelativeLong
            | AddressingMode::BlockMove => 2,
            AddressingMode::AbsoluteLong => 3,
        }
    }

    /// `true` for the zero-page family, used by the driver's forward-
    /// reference zero-page ban (`DISALLOW_FORWARD`).
    pub fn is_zero_page(self) -> bool {
        matches!(
            self,
            AddressingMode::ZeroPage | AddressingMode::ZeroPageX | AddressingMode::ZeroPageY
        )
    }
}

/// One legal `(mnemonic, mode)` encoding.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    pub opcode: u8,
    pub min_set: InstructionSet,
}

macro_rules! op {
    ($mnemonic:literal, $mode:ident, $opcode:literal, $set:ident) => {
        OpcodeEntry {
            mnemonic: $mnemonic,
            mode: AddressingMode::$mode,
            opcode: $opcode,
            min_set: InstructionSet::$set,
        }
    };
}

#[rustfmt::skip]
pub static OPCODE_TABLE: &[OpcodeEntry] = &[
    // --- official 6502 ---
    op!("ADC", Immediate, 0x69, Mos6502), op!("ADC", ZeroPage, 0x65, Mos6502), op!("ADC", ZeroPageX, 0x75, Mos6502),
    op!("ADC", Absolute, 0x6D, Mos6502), op!("ADC", AbsoluteX, 0x7D, Mos6502), op!("ADC", AbsoluteY, 0x79, Mos6502),
    op!("ADC", IndirectX, 0x61, Mos6502), op!("ADC", IndirectY, 0x71, Mos6502), op!("ADC", IndirectZp, 0x72, W65C02),

    op!("AND", Immediate, 0x29, Mos6502), op!("AND", ZeroPage, 0x25, Mos6502), op!("AND", ZeroPageX, 0x35, Mos6502),
    op!("AND", Absolute, 0x2D, Mos6502), op!("AND", AbsoluteX, 0x3D, Mos6502), op!("AND", AbsoluteY, 0x39, Mos6502),
    op!("AND", IndirectX, 0x21, Mos6502), op!("AND", IndirectY, 0x31, Mos6502), op!("AND", IndirectZp, 0x32, W65C02),

    op!("ASL", Accumulator, 0x0A, Mos6502), op!("ASL", ZeroPage, 0x06, Mos6502), op!("ASL", ZeroPageX, 0x16, Mos6502),
    op!("ASL", Absolute, 0x0E, Mos6502), op!("ASL", AbsoluteX, 0x1E, Mos6502),

    op!("BCC", Relative, 0x90, Mos6502),
    op!("BCS", Relative, 0xB0, Mos6502),
    op!("BEQ", Relative, 0xF0, Mos6502),

    op!("BIT", ZeroPage, 0x24, Mos6502), op!("BIT", Absolute, 0x2C, Mos6502),
    op!("BIT", Immediate, 0x89, W65C02), op!("BIT", ZeroPageX, 0x34, W65C02), op!("BIT", AbsoluteX, 0x3C, W65C02),

    op!("BMI", Relative, 0x30, Mos6502),
    op!("BNE", Relative, 0xD0, Mos6502),
    op!("BPL", Relative, 0x10, Mos6502),
    op!("BRK", Implied, 0x00, Mos6502),
    op!("BVC", Relative, 0x50, Mos6502),
    op!("BVS", Relative, 0x70, Mos6502),

    op!("CLC", Implied, 0x18, Mos6502),
    op!("CLD", Implied, 0xD8, Mos6502),
    op!("CLI", Implied, 0x58, Mos6502),
    op!("CLV", Implied, 0xB8, Mos6502),

    op!("CMP", Immediate, 0xC9, Mos6502), op!("CMP", ZeroPage, 0xC5, Mos6502), op!("CMP", ZeroPageX, 0xD5, Mos6502),
    op!("CMP", Absolute, 0xCD, Mos6502), op!("CMP", AbsoluteX, 0xDD, Mos6502), op!("CMP", AbsoluteY, 0xD9, Mos6502),
    op!("CMP", IndirectX, 0xC1, Mos6502), op!("CMP", IndirectY, 0xD1, Mos6502), op!("CMP", IndirectZp, 0xD2, W65C02),

    op!("CPX", Immediate, 0xE0, Mos6502), op!("CPX", ZeroPage, 0xE4, Mos6502), op!("CPX", Absolute, 0xEC, Mos6502),
    op!("CPY", Immediate, 0xC0, Mos6502), op!("CPY", ZeroPage, 0xC4, Mos6502), op!("CPY", Absolute, 0xCC, Mos6502),

    op!("DEC", ZeroPage, 0xC6, Mos6502), op!("DEC", ZeroPageX, 0xD6, Mos6502),
    op!("DEC", Absolute, 0xCE, Mos6502), op!("DEC", AbsoluteX, 0xDE, Mos6502), op!("DEC", Accumulator, 0x3A, W65C02),

    op!("DEX", Implied, 0xCA, Mos6502),
    op!("DEY", Implied, 0x88, Mos6502),

    op!("EOR", Immediate, 0x49, Mos6502), op!("EOR", ZeroPage, 0x45, Mos6502), op!("EOR", ZeroPageX, 0x55, Mos6502),
    op!("EOR", Absolute, 0x4D, Mos6502), op!("EOR", AbsoluteX, 0x5D, Mos6502), op!("EOR", AbsoluteY, 0x59, Mos6502),
    op!("EOR", IndirectX, 0x41, Mos6502), op!("EOR", IndirectY, 0x51, Mos6502), op!("EOR", IndirectZp, 0x52, W65C02),

    op!("INC", ZeroPage, 0xE6, Mos6502), op!("INC", ZeroPageX, 0xF6, Mos6502),
    op!("INC", Absolute, 0xEE, Mos6502), op!("INC", AbsoluteX, 0xFE, Mos6502), op!("INC", Accumulator, 0x1A, W65C02),

    op!("INX", Implied, 0xE8, Mos6502),
    op!("INY", Implied, 0xC8, Mos6502),

    op!("JMP", Absolute, 0x4C, Mos6502), op!("JMP", Indirect, 0x6C, Mos6502),
    op!("JMP", IndirectAbsoluteX, 0x7C, W65C02),
    op!("JSR", Absolute, 0x20, Mos6502),

    op!("LDA", Immediate, 0xA9, Mos6502), op!("LDA", ZeroPage, 0xA5, Mos6502), op!("LDA", ZeroPageX, 0xB5, Mos6502),
    op!("LDA", Absolute, 0xAD, Mos6502), op!("LDA", AbsoluteX, 0xBD, Mos6502), op!("LDA", AbsoluteY, 0xB9, Mos6502),
    op!("LDA", IndirectX, 0xA1, Mos6502), op!("LDA", IndirectY, 0xB1, Mos6502), op!("LDA", IndirectZp, 0xB2, W65C02),

    op!("LDX", Immediate, 0xA2, Mos6502), op!("LDX", ZeroPage, 0xA6, Mos6502), op!("LDX", ZeroPageY, 0xB6, Mos6502),
    op!("LDX", Absolute, 0xAE, Mos6502), op!("LDX", AbsoluteY, 0xBE, Mos6502),

    op!("LDY", Immediate, 0xA0, Mos6502), op!("LDY", ZeroPage, 0xA4, Mos6502), op!("LDY", ZeroPageX, 0xB4, Mos6502),
    op!("LDY", Absolute, 0xAC, Mos6502), op!("LDY", AbsoluteX, 0xBC, Mos6502),

    op!("LSR", Accumulator, 0x4A, Mos6502), op!("LSR", ZeroPage, 0x46, Mos6502), op!("LSR", ZeroPageX, 0x56, Mos6502),
    op!("LSR", Absolute, 0x4E, Mos6502), op!("LSR", AbsoluteX, 0x5E, Mos6502),

    op!("NOP", Implied, 0xEA, Mos6502),

    op!("ORA", Immediate, 0x09, Mos6502), op!("ORA", ZeroPage, 0x05, Mos6502), op!("ORA", ZeroPageX, 0x15, Mos6502),
    op!("ORA", Absolute, 0x0D, Mos6502), op!("ORA", AbsoluteX, 0x1D, Mos6502), op!("ORA", AbsoluteY, 0x19, Mos6502),
    op!("ORA", IndirectX, 0x01, Mos6502), op!("ORA", IndirectY, 0x11, Mos6502), op!("ORA", IndirectZp, 0x12, W65C02),

    op!("PHA", Implied, 0x48, Mos6502),
    op!("PHP", Implied, 0x08, Mos6502),
    op!("PLA", Implied, 0x68, Mos6502),
    op!("PLP", Implied, 0x28, Mos6502),

    op!("ROL", Accumulator, 0x2A, Mos6502), op!("ROL", ZeroPage, 0x26, Mos6502), op!("ROL", ZeroPageX, 0x36, Mos6502),
    op!("ROL", Absolute, 0x2E, Mos6502), op!("ROL", AbsoluteX, 0x3E, Mos6502),

    op!("ROR", Accumulator, 0x6A, Mos6502), op!("ROR", ZeroPage, 0x66, Mos6502), op!("ROR", ZeroPageX, 0x76, Mos6502),
    op!("ROR", Absolute, 0x6E, Mos6502), op!("ROR", AbsoluteX, 0x7E, Mos6502),

    op!("RTI", Implied, 0x40, Mos6502),
    op!("RTS", Implied, 0x60, Mos6502),

    op!("SBC", Immediate, 0xE9, Mos6502), op!("SBC", ZeroPage, 0xE5, Mos6502), op!("SBC", ZeroPageX, 0xF5, Mos6502),
    op!("SBC", Absolute, 0xED, Mos6502), op!("SBC", AbsoluteX, 0xFD, Mos6502), op!("SBC", AbsoluteY, 0xF9, Mos6502),
    op!("SBC", IndirectX, 0xE1, Mos6502), op!("SBC", IndirectY, 0xF1, Mos6502), op!("SBC", IndirectZp, 0xF2, W65C02),

    op!("SEC", Implied, 0x38, Mos6502),
    op!("SED", Implied, 0xF8, Mos6502),
    op!("SEI", Implied, 0x78, Mos6502),

    op!("STA", ZeroPage, 0x85, Mos6502), op!("STA", ZeroPageX, 0x95, Mos6502),
    op!("STA", Absolute, 0x8D, Mos6502), op!("STA", AbsoluteX, 0x9D, Mos6502), op!("STA", AbsoluteY, 0x99, Mos6502),
    op!("STA", IndirectX, 0x81, Mos6502), op!("STA", IndirectY, 0x91, Mos6502), op!("STA", IndirectZp, 0x92, W65C02),

    op!("STX", ZeroPage, 0x86, Mos6502), op!("STX", ZeroPageY, 0x96, Mos6502), op!("STX", Absolute, 0x8E, Mos6502),
    op!("STY", ZeroPage, 0x84, Mos6502), op!("STY", ZeroPageX, 0x94, Mos6502), op!("STY", Absolute, 0x8C, Mos6502),

    op!("TAX", Implied, 0xAA, Mos6502),
    op!("TAY", Implied, 0xA8, Mos6502),
    op!("TSX", Implied, 0xBA, Mos6502),
    op!("TXA", Implied, 0x8A, Mos6502),
    op!("TXS", Implied, 0x9A, Mos6502),
    op!("TYA", Implied, 0x98, Mos6502),

    // --- 65C02 additions ---
    op!("BRA", Relative, 0x80, W65C02),
    op!("PHX", Implied, 0xDA, W65C02),
    op!("PHY", Implied, 0x5A, W65C02),
    op!("PLX", Implied, 0xFA, W65C02),
    op!("PLY", Implied, 0x7A, W65C02),
    op!("STZ", ZeroPage, 0x64, W65C02), op!("STZ", ZeroPageX, 0x74, W65C02),
    op!("STZ", Absolute, 0x9C, W65C02), op!("STZ", AbsoluteX, 0x9E, W65C02),
    op!("TRB", ZeroPage, 0x14, W65C02), op!("TRB", Absolute, 0x1C, W65C02),
    op!("TSB", ZeroPage, 0x04, W65C02), op!("TSB", Absolute, 0x0C, W65C02),
    op!("STP", Implied, 0xDB, W65C02),
    op!("WAI", Implied, 0xCB, W65C02),

    // --- 65816 additions ---
    op!("PHB", Implied, 0x8B, W65816),
    op!("PHD", Implied, 0x0B, W65816),
    op!("PHK", Implied, 0x4B, W65816),
    op!("PLB", Implied, 0xAB, W65816),
    op!("PLD", Implied, 0x2B, W65816),
    op!("TCS", Implied, 0x1B, W65816),
    op!("TSC", Implied, 0x3B, W65816),
    op!("TCD", Implied, 0x5B, W65816),
    op!("TDC", Implied, 0x7B, W65816),
    op!("TXY", Implied, 0x9B, W65816),
    op!("TYX", Implied, 0xBB, W65816),
    op!("XBA", Implied, 0xEB, W65816),
    op!("XCE", Implied, 0xFB, W65816),
    op!("RTL", Implied, 0x6B, W65816),
    op!("JML", AbsoluteLong, 0x5C, W65816),
    op!("JSL", AbsoluteLong, 0x22, W65816),
    op!("BRL", RelativeLong, 0x82, W65816),
    op!("MVN", BlockMove, 0x54, W65816),
    op!("MVP", BlockMove, 0x44, W65816),
    op!("PEA", Absolute, 0xF4, W65816),
    op!("PEI", IndirectZp, 0xD4, W65816),
    op!("PER", RelativeLong, 0x62, W65816),
    op!("REP", Immediate, 0xC2, W65816),
    op!("SEP", Immediate, 0xE2, W65816),
    op!("COP", Immediate, 0x02, W65816),
    op!("WDM", Immediate, 0x42, W65816),
];

/// Every mnemonic the table knows, for an O(1) existence check ahead of the
/// linear `(mnemonic, mode)` scan in [`lookup`].
static MNEMONICS: phf::Set<&'static str> = phf_set! {
    "ADC", "AND", "ASL", "BCC", "BCS", "BEQ", "BIT", "BMI", "BNE", "BPL", "BRK", "BVC", "BVS",
    "CLC", "CLD", "CLI", "CLV", "CMP", "CPX", "CPY", "DEC", "DEX", "DEY", "EOR", "INC", "INX",
    "INY", "JMP", "JSR", "LDA", "LDX", "LDY", "LSR", "NOP", "ORA", "PHA", "PHP", "PLA", "PLP",
    "ROL", "ROR", "RTI", "RTS", "SBC", "SEC", "SED", "SEI", "STA", "STX", "STY", "TAX", "TAY",
    "TSX", "TXA", "TXS", "TYA", "BRA", "PHX", "PHY", "PLX", "PLY", "STZ", "TRB", "TSB", "STP",
    "WAI", "PHB", "PHD", "PHK", "PLB", "PLD", "TCS", "TSC", "TCD", "TDC", "TXY", "TYX", "XBA",
    "XCE", "RTL", "JML", "JSL", "BRL", "MVN", "MVP", "PEA", "PEI", "PER", "REP", "SEP", "COP",
    "WDM",
};

/// Looks up the opcode byte for an exact `(mnemonic, mode)` pair, if the
/// mnemonic is known at all in that mode.
pub fn lookup(mnemonic: &str, mode: AddressingMode) -> Option<&'static OpcodeEntry> {
    OPCODE_TABLE
        .iter()
        .find(|e| e.mnemonic.eq_ignore_ascii_case(mnemonic) && e.mode == mode)
}

/// `true` if the mnemonic appears anywhere in the table (used to distinguish
/// "unknown mnemonic" from "no matching addressing mode").
pub fn mnemonic_exists(mnemonic: &str) -> bool {
    MNEMONICS.contains(mnemonic.to_ascii_uppercase().as_str())
}

pub fn is_branch_mnemonic(mnemonic: &str) -> bool {
    matches!(
        mnemonic.to_ascii_uppercase().as_str(),
        "BCC" | "BCS" | "BEQ" | "BMI" | "BNE" | "BPL" | "BVC" | "BVS" | "BRA"
    )
}

pub fn is_long_branch_mnemonic(mnemonic: &str) -> bool {
    matches!(mnemonic.to_ascii_uppercase().as_str(), "BRL" | "PER")
}

pub fn is_long_jump_mnemonic(mnemonic: &str) -> bool {
    matches!(mnemonic.to_ascii_uppercase().as_str(), "JML" | "JSL")
}

pub fn is_block_move_mnemonic(mnemonic: &str) -> bool {
    matches!(mnemonic.to_ascii_uppercase().as_str(), "MVN" | "MVP")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dex_is_implied_single_byte() {
        let entry = lookup("DEX", AddressingMode::Implied).unwrap();
        assert_eq!(entry.opcode, 0xCA);
        assert_eq!(entry.mode.operand_len(), 0);
    }

    #[test]
    fn lda_absolute_matches_scenario_two() {
        let entry = lookup("LDA", AddressingMode::Absolute).unwrap();
        assert_eq!(entry.opcode, 0xAD);
    }

    #[test]
    fn case_insensitive_lookup() {
        assert!(lookup("lda", AddressingMode::Immediate).is_some());
    }

    #[test]
    fn unknown_mnemonic_detected() {
        assert!(!mnemonic_exists("FROB"));
    }

    #[test]
    fn c02_only_mode_absent_from_6502_lookup_by_min_set() {
        let entry = lookup("LDA", AddressingMode::IndirectZp).unwrap();
        assert_eq!(entry.min_set, InstructionSet::W65C02);
    }
}
