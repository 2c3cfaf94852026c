//! Per-line bookkeeping produced by the assembler driver: one [`LineInfo`]
//! per input line, held in a flat arena rather than the original's linked
//! chain (see DESIGN.md for the rationale).

use flagset::{flags, FlagSet};

use crate::symbol::SymbolId;

flags! {
    /// Per-line condition and provenance bits.
    pub enum LineFlag: u8 {
        /// This line is suppressed by an enclosing `DO 0` at its own nesting level.
        ConditionalSkipSource = 0x01,
        /// This line is suppressed because an *enclosing* `DO` is false.
        ConditionalInheritedSkipSource = 0x02,
        /// This line is an `EQU`/`=` directive rather than an instruction.
        WasEqu = 0x04,
        /// This line took a forward reference when first assembled.
        ForwardReference = 0x08,
        /// A zero-page addressing mode is disallowed for this line's operand
        /// because it was forward-referenced and not forced with `<`.
        DisallowForward = 0x10,
    }
}

/// The instruction set active when a line was assembled. Ordered so that
/// `a <= b` means "everything legal on `a` is legal on `b`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstructionSet {
    Mos6502 = 0,
    W65C02 = 1,
    W65816 = 2,
}

/// A stable index into the assembler's line arena. Replaces the original's
/// `LineInfo*` chain pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub usize);

/// One record per source line, whether or not it emitted any bytes.
#[derive(Debug, Clone)]
pub struct LineInfo {
    pub line_number: usize,
    pub source_text: String,
    pub operand_indent: usize,
    pub defines_symbol: Option<SymbolId>,
    pub machine_code: Vec<u8>,
    pub address: Option<u32>,
    pub equ_value: Option<u32>,
    pub instruction_set: InstructionSet,
    pub flags: FlagSet<LineFlag>,
}

impl LineInfo {
    pub fn new(line_number: usize, source_text: &str, instruction_set: InstructionSet) -> Self {
        LineInfo {
            line_number,
            source_text: source_text.to_string(),
            operand_indent: 0,
            defines_symbol: None,
            machine_code: Vec::new(),
            address: None,
            equ_value: None,
            instruction_set,
            flags: FlagSet::default(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.flags.contains(LineFlag::ConditionalSkipSource)
            || self.flags.contains(LineFlag::ConditionalInheritedSkipSource)
    }
}
