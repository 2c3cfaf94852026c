//! The assembler core: directive dispatch, opcode tables, addressing-mode
//! selection, and deferred forward-reference fixup.
//!
//! The design collapses the original's two explicit passes into a single
//! pass with a deferred fix-up list: a forward reference registers the
//! referencing line against the symbol; when the symbol later becomes
//! defined, every referencing line is revisited, its operand re-evaluated
//! against its originally recorded address and local-label scope, and its
//! bytes patched into the [`BinaryBuffer`](crate::binary_buffer::BinaryBuffer)
//! in place.

pub mod opcodes;
pub mod operand;

use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::binary_buffer::BinaryBuffer;
use crate::error::{Diagnostic, ExprError, LineError, OperandError};
use crate::expr::{self, EvalContext, Expression};
use crate::line_info::{InstructionSet, LineFlag, LineId, LineInfo};
use crate::parse_line::{parse_line, ParsedLine};
use crate::sized_string::split_source_lines;
use crate::symbol::{SymbolId, SymbolTable};

use opcodes::AddressingMode;
use operand::SyntaxForm;

const MAX_INCLUDE_DEPTH: usize = 32;

/// The outcome of a complete assembly run.
pub struct AssembleResult {
    pub lines: Vec<LineInfo>,
    pub symbols: SymbolTable,
    pub binary: BinaryBuffer,
    pub error_count: u32,
    pub diagnostics: Vec<Diagnostic>,
}

struct SourceFrame {
    lines: Vec<String>,
    index: usize,
    dir: PathBuf,
}

/// Drives a single assembly run. Owns the symbol table, the line arena, and
/// the output buffer; directive handlers below take `&mut self`.
pub struct Assembler {
    symbols: SymbolTable,
    lines: Vec<LineInfo>,
    binary: BinaryBuffer,
    instruction_set: InstructionSet,
    local_scope: Option<String>,
    error_count: u32,
    diagnostics: Vec<Diagnostic>,
    /// Each entry is `true` while that nesting level's condition holds.
    conditional_stack: Vec<bool>,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler {
            symbols: SymbolTable::new(),
            lines: Vec::new(),
            binary: BinaryBuffer::new(0),
            instruction_set: InstructionSet::Mos6502,
            local_scope: None,
            error_count: 0,
            diagnostics: Vec::new(),
            conditional_stack: Vec::new(),
        }
    }

    /// Assembles `source` (the contents of `main_path`) to completion.
    pub fn assemble(mut self, source: &str, main_path: &str) -> AssembleResult {
        let dir = PathBuf::from(main_path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let owned_lines: Vec<String> = split_source_lines(source).into_iter().map(|l| l.text.to_string()).collect();
        let mut stack = vec![SourceFrame {
            lines: owned_lines,
            index: 0,
            dir,
        }];
        let mut line_number = 0usize;

        info!("assembly started: {main_path}");
        loop {
            let next_line = {
                let depth = stack.len();
                let frame = match stack.last_mut() {
                    Some(f) => f,
                    None => break,
                };
                if frame.index >= frame.lines.len() {
                    stack.pop();
                    if depth == 1 {
                        break;
                    }
                    continue;
                }
                let text = frame.lines[frame.index].clone();
                frame.index += 1;
                text
            };
            line_number += 1;
            debug!("{line_number}: {next_line}");
            self.process_line(&next_line, line_number, &mut stack);
        }

        if !self.conditional_stack.is_empty() {
            self.report_error(line_number, LineError::UnterminatedConditional);
        }
        self.sweep_undefined_symbols();

        info!(
            "assembly finished: {} line(s), {} error(s)",
            self.lines.len(),
            self.error_count
        );

        AssembleResult {
            lines: self.lines,
            symbols: self.symbols,
            binary: self.binary,
            error_count: self.error_count,
            diagnostics: self.diagnostics,
        }
    }

    fn report_error(&mut self, line_number: usize, err: impl Into<LineError>) {
        let message = err.into().to_string();
        error!("{line_number}: {message}");
        self.diagnostics.push(Diagnostic {
            line: line_number,
            message,
        });
        self.error_count += 1;
    }

    fn conditional_flags(&self) -> (bool, bool) {
        match self.conditional_stack.split_last() {
            None => (false, false),
            Some((last, rest)) => (!*last, rest.iter().any(|&c| !c)),
        }
    }

    fn scope_label(&mut self, label: &str) -> String {
        if let Some(rest) = label.strip_prefix(':') {
            format!("{}:{rest}", self.local_scope.as_deref().unwrap_or(""))
        } else {
            self.local_scope = Some(label.to_string());
            label.to_string()
        }
    }

    fn eval(&mut self, text: &str, pc: u32, local_scope: Option<&str>, line_id: LineId) -> Result<Expression, ExprError> {
        let mut ctx = EvalContext {
            pc,
            local_scope,
            symbols: &mut self.symbols,
            current_line: line_id,
        };
        expr::evaluate(text, &mut ctx)
    }

    fn process_line(&mut self, text: &str, line_number: usize, stack: &mut Vec<SourceFrame>) {
        let parsed = parse_line(text);
        let (own_skip, inherited_skip) = self.conditional_flags();
        let mut line_info = LineInfo::new(line_number, text, self.instruction_set);
        if own_skip {
            line_info.flags |= LineFlag::ConditionalSkipSource;
        }
        if inherited_skip {
            line_info.flags |= LineFlag::ConditionalInheritedSkipSource;
        }

        if parsed.is_full_line_comment {
            self.lines.push(line_info);
            return;
        }

        let opcode_upper = parsed.opcode.as_str().to_ascii_uppercase();

        match opcode_upper.as_str() {
            "DO" => {
                self.handle_do(&parsed, line_number);
                self.lines.push(line_info);
                return;
            }
            "ELSE" => {
                self.handle_else(line_number);
                self.lines.push(line_info);
                return;
            }
            "FIN" => {
                self.handle_fin(line_number);
                self.lines.push(line_info);
                return;
            }
            _ => {}
        }

        if own_skip || inherited_skip {
            self.lines.push(line_info);
            return;
        }

        let line_id = LineId(self.lines.len());
        let is_equ = opcode_upper == "EQU" || opcode_upper == "=";

        if !parsed.label.is_empty() {
            self.define_label(parsed.label.as_str(), is_equ, parsed.operand.as_str(), line_id, &mut line_info);
        }

        if !is_equ {
            match opcode_upper.as_str() {
                "" => {}
                "ORG" => self.handle_org(&parsed, line_id, &mut line_info),
                "DS" => self.handle_ds(&parsed, line_id, &mut line_info),
                "DA" | "DW" => self.handle_word_directive(&opcode_upper, &parsed, line_id, &mut line_info),
                "DFB" | "DB" => self.handle_byte_directive(&parsed, line_id, &mut line_info),
                "ASC" => self.handle_string_directive(&parsed, false, &mut line_info),
                "DCI" => self.handle_string_directive(&parsed, true, &mut line_info),
                "HEX" => self.handle_hex(&parsed, &mut line_info),
                "PUT" | "USE" => self.handle_include(&parsed, stack, line_info.line_number),
                "XC" => self.handle_xc(&mut line_info),
                _ => self.handle_instruction(&opcode_upper, &parsed, line_id, &mut line_info),
            }
        }

        self.lines.push(line_info);
    }

    // ---- conditional assembly --------------------------------------------------

    fn handle_do(&mut self, parsed: &ParsedLine, line_number: usize) {
        let pc = self.binary.cursor();
        let line_id = LineId(self.lines.len());
        let local_scope = self.local_scope.clone();
        match self.eval(parsed.operand.as_str(), pc, local_scope.as_deref(), line_id) {
            Ok(value) => self.conditional_stack.push(value.value != 0),
            Err(e) => {
                self.report_error(line_number, e);
                self.conditional_stack.push(false);
            }
        }
    }

    fn handle_else(&mut self, line_number: usize) {
        match self.conditional_stack.last_mut() {
            Some(top) => *top = !*top,
            None => self.report_error(line_number, LineError::UnmatchedConditional),
        }
    }

    fn handle_fin(&mut self, line_number: usize) {
        if self.conditional_stack.pop().is_none() {
            self.report_error(line_number, LineError::UnmatchedConditional);
        }
    }

    // ---- labels & EQU -----------------------------------------------------------

    fn define_label(&mut self, label: &str, is_equ: bool, operand_text: &str, line_id: LineId, line_info: &mut LineInfo) {
        let key = self.scope_label(label);
        let existing = self.symbols.find(&key);
        let already_defined = existing.map(|id| self.symbols.get(id).defined).unwrap_or(false);
        if already_defined {
            self.report_error(line_info.line_number, LineError::DuplicateSymbol(key));
            return;
        }
        let id = existing.unwrap_or_else(|| self.symbols.add(&key));

        let value = if is_equ {
            let pc = self.binary.cursor();
            let local_scope = self.local_scope.clone();
            match self.eval(operand_text, pc, local_scope.as_deref(), line_id) {
                Ok(expr) => expr.value,
                Err(e) => {
                    self.report_error(line_info.line_number, e);
                    return;
                }
            }
        } else {
            self.binary.cursor()
        };

        self.symbols.get_mut(id).expression = Expression::absolute(value);
        self.symbols.get_mut(id).defined = true;
        line_info.defines_symbol = Some(id);
        if is_equ {
            line_info.flags |= LineFlag::WasEqu;
            line_info.equ_value = Some(value & 0xFFFF);
        } else {
            line_info.address = Some(value);
        }
        self.resolve_forward_references(id);
    }

    fn resolve_forward_references(&mut self, id: SymbolId) {
        let line_ids: Vec<LineId> = self.symbols.get(id).line_references().to_vec();
        for line_id in line_ids {
            self.reassemble_line(line_id);
        }
    }

    /// Re-evaluates and re-emits the bytes for a line that previously took a
    /// forward reference, now that (at least one of) its symbols is defined.
    /// Only instruction lines and `DA`/`DW`/`DFB`/`DB` directives register
    /// for fix-up; other directives' operands are required to be already
    /// resolvable when first encountered.
    fn reassemble_line(&mut self, line_id: LineId) {
        let idx = line_id.0;
        let Some(address) = self.lines[idx].address else {
            return;
        };
        let source_text = self.lines[idx].source_text.clone();
        let instruction_set = self.lines[idx].instruction_set;
        let parsed_owned = source_text.clone();
        let parsed = parse_line(&parsed_owned);
        let opcode_upper = parsed.opcode.as_str().to_ascii_uppercase();
        let local_scope = self.line_scope_hint(idx);
        // A line that was marked DISALLOW_FORWARD on its first pass committed
        // the wider (non-zero-page) encoding's byte count to the buffer and
        // advanced every later address past it; now that the symbol is
        // defined, the zero-page candidate must stay excluded even though it
        // would otherwise fit, or re-emitting a shorter encoding here would
        // overwrite only part of those committed bytes and desync the rest.
        let force_wide = self.lines[idx].flags.contains(LineFlag::DisallowForward);

        let result = match opcode_upper.as_str() {
            "DA" | "DW" => self
                .eval(parsed.operand.as_str(), address, local_scope.as_deref(), line_id)
                .map(|e| {
                    let v = e.value & 0xFFFF;
                    vec![(v & 0xFF) as u8, (v >> 8) as u8]
                })
                .map_err(LineError::from),
            "DFB" | "DB" => self
                .eval(parsed.operand.as_str(), address, local_scope.as_deref(), line_id)
                .map(|e| vec![(e.value & 0xFF) as u8])
                .map_err(LineError::from),
            _ => self
                .resolve_instruction_bytes(
                    &opcode_upper,
                    &parsed,
                    address,
                    local_scope.as_deref(),
                    instruction_set,
                    line_id,
                    force_wide,
                )
                .map(|r| r.bytes),
        };

        match result {
            Ok(bytes) => {
                self.binary.write_at(address, &bytes);
                self.lines[idx].machine_code = bytes;
            }
            Err(e) => self.report_error(self.lines[idx].line_number, e),
        }
    }

    /// Best-effort recovery of the local-label scope active when a given
    /// line was first assembled: the most recent global label defined at or
    /// before that line.
    fn line_scope_hint(&self, idx: usize) -> Option<String> {
        self.lines[..=idx].iter().rev().find_map(|l| {
            l.defines_symbol.and_then(|id| {
                let sym = self.symbols.get(id);
                if !sym.key.contains(':') {
                    Some(sym.key.clone())
                } else {
                    None
                }
            })
        })
    }

    // ---- simple directives --------------------------------------------------

    fn handle_org(&mut self, parsed: &ParsedLine, line_id: LineId, line_info: &mut LineInfo) {
        let pc = self.binary.cursor();
        let local_scope = self.local_scope.clone();
        match self.eval(parsed.operand.as_str(), pc, local_scope.as_deref(), line_id) {
            Ok(expr) => self.binary.set_origin(expr.value),
            Err(e) => self.report_error(line_info.line_number, e),
        }
    }

    fn handle_ds(&mut self, parsed: &ParsedLine, line_id: LineId, line_info: &mut LineInfo) {
        let pc = self.binary.cursor();
        let local_scope = self.local_scope.clone();
        match self.eval(parsed.operand.as_str(), pc, local_scope.as_deref(), line_id) {
            Ok(expr) => {
                if expr.forward_referenced {
                    self.report_error(line_info.line_number, OperandError::MalformedOperand(
                        "DS operand cannot be a forward reference".to_string(),
                    ));
                    return;
                }
                let count = expr.value as usize;
                if count == 0 {
                    warn!("{}: DS reserves zero bytes", line_info.line_number);
                }
                let addr = self.binary.emit(&vec![0u8; count]);
                line_info.address = Some(addr);
                line_info.machine_code = vec![0u8; count];
            }
            Err(e) => self.report_error(line_info.line_number, e),
        }
    }

    fn handle_word_directive(&mut self, _mnemonic: &str, parsed: &ParsedLine, line_id: LineId, line_info: &mut LineInfo) {
        let pc = self.binary.cursor();
        let local_scope = self.local_scope.clone();
        match self.eval(parsed.operand.as_str(), pc, local_scope.as_deref(), line_id) {
            Ok(expr) => {
                if expr.forward_referenced {
                    line_info.flags |= LineFlag::ForwardReference;
                }
                let v = expr.value & 0xFFFF;
                let bytes = vec![(v & 0xFF) as u8, (v >> 8) as u8];
                let addr = self.binary.emit(&bytes);
                line_info.address = Some(addr);
                line_info.machine_code = bytes;
            }
            Err(e) => self.report_error(line_info.line_number, e),
        }
    }

    fn handle_byte_directive(&mut self, parsed: &ParsedLine, line_id: LineId, line_info: &mut LineInfo) {
        let pc = self.binary.cursor();
        let local_scope = self.local_scope.clone();
        match self.eval(parsed.operand.as_str(), pc, local_scope.as_deref(), line_id) {
            Ok(expr) => {
                if expr.forward_referenced {
                    line_info.flags |= LineFlag::ForwardReference;
                }
                let bytes = vec![(expr.value & 0xFF) as u8];
                let addr = self.binary.emit(&bytes);
                line_info.address = Some(addr);
                line_info.machine_code = bytes;
            }
            Err(e) => self.report_error(line_info.line_number, e),
        }
    }

    fn handle_hex(&mut self, parsed: &ParsedLine, line_info: &mut LineInfo) {
        let digits: String = parsed.operand.as_str().chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() || digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            self.report_error(
                line_info.line_number,
                OperandError::MalformedOperand(format!("HEX {digits}")),
            );
            return;
        }
        let mut bytes = Vec::with_capacity(digits.len() / 2);
        let chars: Vec<char> = digits.chars().collect();
        for pair in chars.chunks(2) {
            let byte_str: String = pair.iter().collect();
            bytes.push(u8::from_str_radix(&byte_str, 16).unwrap());
        }
        let addr = self.binary.emit(&bytes);
        line_info.address = Some(addr);
        line_info.machine_code = bytes;
    }

    fn handle_string_directive(&mut self, parsed: &ParsedLine, is_dci: bool, line_info: &mut LineInfo) {
        let text = parsed.operand.as_str();
        let mut chars = text.chars();
        let delimiter = match chars.next() {
            Some(c) => c,
            None => {
                self.report_error(line_info.line_number, OperandError::MalformedOperand("empty ASC/DCI operand".to_string()));
                return;
            }
        };
        let rest = chars.as_str();
        let end = match rest.find(delimiter) {
            Some(i) => i,
            None => {
                self.report_error(line_info.line_number, OperandError::MalformedOperand(text.to_string()));
                return;
            }
        };
        let body = &rest[..end];
        let high_bit = delimiter == '"';
        let mut bytes: Vec<u8> = body
            .bytes()
            .map(|b| if high_bit { b | 0x80 } else { b & 0x7F })
            .collect();
        if is_dci {
            if let Some(last) = bytes.last_mut() {
                *last ^= 0x80;
            }
        }
        let addr = self.binary.emit(&bytes);
        line_info.address = Some(addr);
        line_info.machine_code = bytes;
    }

    fn handle_xc(&mut self, line_info: &mut LineInfo) {
        self.instruction_set = match self.instruction_set {
            InstructionSet::Mos6502 => InstructionSet::W65C02,
            InstructionSet::W65C02 => InstructionSet::W65816,
            InstructionSet::W65816 => InstructionSet::W65816,
        };
        line_info.instruction_set = self.instruction_set;
    }

    fn handle_include(&mut self, parsed: &ParsedLine, stack: &mut Vec<SourceFrame>, line_number: usize) {
        if stack.len() >= MAX_INCLUDE_DEPTH {
            self.report_error(line_number, LineError::IncludeNestingTooDeep);
            return;
        }
        let filename = parsed.operand.as_str().trim().trim_matches('"');
        let dir = stack.last().map(|f| f.dir.clone()).unwrap_or_default();
        let path = dir.join(filename);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let lines: Vec<String> = split_source_lines(&contents).into_iter().map(|l| l.text.to_string()).collect();
                let new_dir = path.parent().map(|p| p.to_path_buf()).unwrap_or(dir);
                stack.push(SourceFrame {
                    lines,
                    index: 0,
                    dir: new_dir,
                });
            }
            Err(e) => self.report_error(line_number, LineError::IncludeIo(path.display().to_string(), e.to_string())),
        }
    }

    // ---- CPU instructions --------------------------------------------------

    fn handle_instruction(&mut self, mnemonic: &str, parsed: &ParsedLine, line_id: LineId, line_info: &mut LineInfo) {
        let pc = self.binary.cursor();
        let local_scope = self.local_scope.clone();
        match self.resolve_instruction_bytes(mnemonic, parsed, pc, local_scope.as_deref(), self.instruction_set, line_id, false) {
            Ok(result) => {
                if result.forward_referenced {
                    line_info.flags |= LineFlag::ForwardReference;
                }
                if result.disallow_forward {
                    line_info.flags |= LineFlag::DisallowForward;
                }
                let addr = self.binary.emit(&result.bytes);
                line_info.address = Some(addr);
                line_info.machine_code = result.bytes;
            }
            Err(e) => self.report_error(line_info.line_number, e),
        }
    }

    fn resolve_instruction_bytes(
        &mut self,
        mnemonic: &str,
        parsed: &ParsedLine,
        pc: u32,
        local_scope: Option<&str>,
        instruction_set: InstructionSet,
        line_id: LineId,
        force_wide: bool,
    ) -> Result<InstructionResult, LineError> {
        if !opcodes::mnemonic_exists(mnemonic) {
            return Err(OperandError::UnknownMnemonic(mnemonic.to_string()).into());
        }
        let is_block_move = opcodes::is_block_move_mnemonic(mnemonic);
        let syntax = operand::classify(parsed.operand.as_str(), is_block_move)?;

        if let SyntaxForm::BlockMove(src, dest) = syntax {
            let src_val = self.eval(src, pc, local_scope, line_id)?;
            let dest_val = self.eval(dest, pc, local_scope, line_id)?;
            let entry = opcodes::lookup(mnemonic, AddressingMode::BlockMove)
                .ok_or_else(|| OperandError::NoMatchingMode { mnemonic: mnemonic.to_string() })?;
            if entry.min_set > instruction_set {
                return Err(OperandError::InstructionSetNotActive { mnemonic: mnemonic.to_string() }.into());
            }
            return Ok(InstructionResult {
                bytes: vec![entry.opcode, (dest_val.value & 0xFF) as u8, (src_val.value & 0xFF) as u8],
                forward_referenced: src_val.forward_referenced || dest_val.forward_referenced,
                disallow_forward: false,
            });
        }

        let (candidates, expr_text): (Vec<AddressingMode>, Option<&str>) = match syntax {
            SyntaxForm::Implied => (vec![AddressingMode::Accumulator, AddressingMode::Implied], None),
            SyntaxForm::Accumulator => (vec![AddressingMode::Accumulator], None),
            SyntaxForm::Immediate(t) => (vec![AddressingMode::Immediate], Some(t)),
            SyntaxForm::IndirectXForm(t) => {
                let mode = if mnemonic == "JMP" {
                    AddressingMode::IndirectAbsoluteX
                } else {
                    AddressingMode::IndirectX
                };
                (vec![mode], Some(t))
            }
            SyntaxForm::ParenForm(t) => {
                let mode = if mnemonic == "JMP" {
                    AddressingMode::Indirect
                } else {
                    AddressingMode::IndirectZp
                };
                (vec![mode], Some(t))
            }
            SyntaxForm::IndirectYForm(t) => (vec![AddressingMode::IndirectY], Some(t)),
            SyntaxForm::Direct(t) => {
                let modes = if opcodes::is_branch_mnemonic(mnemonic) {
                    vec![AddressingMode::Relative]
                } else if opcodes::is_long_branch_mnemonic(mnemonic) {
                    vec![AddressingMode::RelativeLong]
                } else if opcodes::is_long_jump_mnemonic(mnemonic) {
                    vec![AddressingMode::AbsoluteLong]
                } else {
                    vec![AddressingMode::ZeroPage, AddressingMode::Absolute]
                };
                (modes, Some(t))
            }
            SyntaxForm::DirectX(t) => (vec![AddressingMode::ZeroPageX, AddressingMode::AbsoluteX], Some(t)),
            SyntaxForm::DirectY(t) => (vec![AddressingMode::ZeroPageY, AddressingMode::AbsoluteY], Some(t)),
            SyntaxForm::BlockMove(..) => unreachable!("handled above"),
        };

        let expr = match expr_text {
            Some(t) => Some(self.eval(t, pc, local_scope, line_id)?),
            None => None,
        };

        let mut chosen = None;
        let mut disallow_forward = false;
        let mut any_mode_in_table = false;
        for candidate in &candidates {
            if opcodes::lookup(mnemonic, *candidate).is_some() {
                any_mode_in_table = true;
            }
            if candidate.is_zero_page() {
                if force_wide {
                    continue;
                }
                if let Some(e) = &expr {
                    let too_big = e.value > 0xFF;
                    let banned_forward = e.forward_referenced && !e.forced_low_byte;
                    if too_big || banned_forward {
                        if banned_forward && !too_big {
                            disallow_forward = true;
                        }
                        continue;
                    }
                }
            }
            if let Some(entry) = opcodes::lookup(mnemonic, *candidate) {
                if entry.min_set > instruction_set {
                    continue;
                }
                chosen = Some(entry);
                break;
            }
        }

        let entry = match chosen {
            Some(e) => e,
            None => {
                if any_mode_in_table {
                    return Err(OperandError::InstructionSetNotActive { mnemonic: mnemonic.to_string() }.into());
                }
                return Err(OperandError::NoMatchingMode { mnemonic: mnemonic.to_string() }.into());
            }
        };

        let forward_referenced = expr.map(|e| e.forward_referenced).unwrap_or(false);
        let bytes = encode_operand_bytes(entry.opcode, entry.mode, expr, pc, forward_referenced)?;

        Ok(InstructionResult {
            bytes,
            forward_referenced,
            disallow_forward,
        })
    }

    fn sweep_undefined_symbols(&mut self) {
        let undefined: Vec<(SymbolId, String, usize)> = self
            .symbols
            .iter()
            .filter(|(_, sym)| !sym.defined)
            .map(|(id, sym)| {
                let first_line = sym.line_references().first().map(|l| self.lines[l.0].line_number).unwrap_or(0);
                (id, sym.key.clone(), first_line)
            })
            .collect();
        for (_, key, line) in undefined {
            self.report_error(line, LineError::UndefinedSymbol(key));
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

struct InstructionResult {
    bytes: Vec<u8>,
    forward_referenced: bool,
    disallow_forward: bool,
}

/// Encodes the operand bytes for a chosen `(opcode, mode)` pair. Range
/// checks on `Relative`/`RelativeLong` targets are skipped while the operand
/// is still forward-referenced: a placeholder is emitted instead, and the
/// real check runs when [`Assembler::reassemble_line`] revisits the line
/// with the now-defined target.
fn encode_operand_bytes(
    opcode: u8,
    mode: AddressingMode,
    expr: Option<Expression>,
    pc: u32,
    forward_referenced: bool,
) -> Result<Vec<u8>, LineError> {
    use AddressingMode::*;
    Ok(match mode {
        Implied | Accumulator => vec![opcode],
        Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | IndirectZp => {
            let v = expr.map(|e| e.value).unwrap_or(0);
            vec![opcode, (v & 0xFF) as u8]
        }
        Relative => {
            if forward_referenced {
                vec![opcode, 0]
            } else {
                let target = expr.map(|e| e.value).unwrap_or(0) as i64;
                let rel = target - (pc as i64 + 2);
                if !(-128..=127).contains(&rel) {
                    return Err(OperandError::BranchOutOfRange(rel as i32).into());
                }
                vec![opcode, rel as i8 as u8]
            }
        }
        Absolute | AbsoluteX | AbsoluteY | Indirect | IndirectAbsoluteX => {
            let v = expr.map(|e| e.value).unwrap_or(0) & 0xFFFF;
            vec![opcode, (v & 0xFF) as u8, (v >> 8) as u8]
        }
        AbsoluteLong => {
            let v = expr.map(|e| e.value).unwrap_or(0) & 0xFF_FFFF;
            vec![opcode, (v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, ((v >> 16) & 0xFF) as u8]
        }
        RelativeLong => {
            if forward_referenced {
                vec![opcode, 0, 0]
            } else {
                let target = expr.map(|e| e.value).unwrap_or(0) as i64;
                let rel = (target - (pc as i64 + 3)) & 0xFFFF;
                vec![opcode, (rel & 0xFF) as u8, ((rel >> 8) & 0xFF) as u8]
            }
        }
        BlockMove => unreachable!("block move is encoded by its own caller"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(src: &str) -> AssembleResult {
        Assembler::new().assemble(src, "test.s")
    }

    #[test]
    fn scenario_dex() {
        let result = assemble("*=$0800\n ORG $0800\n DEX\n");
        let dex_line = result.lines.iter().find(|l| l.source_text.trim() == "DEX").unwrap();
        assert_eq!(dex_line.machine_code, vec![0xCA]);
        assert_eq!(dex_line.address, Some(0x0800));
    }

    #[test]
    fn scenario_lda_absolute() {
        let result = assemble(" ORG $0803\n LDA $C008\n");
        let line = result.lines.iter().find(|l| l.source_text.contains("LDA")).unwrap();
        assert_eq!(line.machine_code, vec![0xAD, 0xC0, 0x08]);
    }

    #[test]
    fn scenario_equ() {
        let result = assemble("LABEL EQU $FFFF\n");
        let line = &result.lines[0];
        assert!(line.flags.contains(LineFlag::WasEqu));
        assert_eq!(line.equ_value, Some(0xFFFF));
        let id = result.symbols.find("LABEL").unwrap();
        assert_eq!(result.symbols.get(id).expression.value, 0xFFFF);
    }

    #[test]
    fn scenario_forward_reference_fixup() {
        let result = assemble(" ORG $0800\n JMP LATER\nLATER EQU $1234\n");
        assert_eq!(result.error_count, 0);
        let jmp_line = result.lines.iter().find(|l| l.source_text.contains("JMP")).unwrap();
        assert_eq!(jmp_line.machine_code, vec![0x4C, 0x34, 0x12]);
    }

    #[test]
    fn duplicate_symbol_is_an_error() {
        let result = assemble("X EQU 1\nX EQU 2\n");
        assert_eq!(result.error_count, 1);
    }

    #[test]
    fn end_of_assembly_reports_undefined_symbols() {
        let result = assemble(" LDA NEVER\n");
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].message.contains("NEVER"));
    }

    #[test]
    fn xc_gates_65c02_opcode() {
        let result = assemble(" BRA LOOP\nLOOP NOP\n");
        assert_eq!(result.error_count, 1);
        let result2 = assemble(" XC\n BRA LOOP\nLOOP NOP\n");
        assert_eq!(result2.error_count, 0);
    }

    #[test]
    fn branch_out_of_range_is_rejected() {
        let mut src = String::from(" ORG $0800\n BEQ TARGET\n");
        for _ in 0..200 {
            src.push_str(" NOP\n");
        }
        src.push_str("TARGET NOP\n");
        let result = assemble(&src);
        assert!(result.error_count >= 1);
    }

    #[test]
    fn conditional_assembly_do_else_fin() {
        let result = assemble(" DO 0\n LDA #1\n ELSE\n LDA #2\n FIN\n");
        let emitted: Vec<&LineInfo> = result.lines.iter().filter(|l| !l.machine_code.is_empty()).collect();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].machine_code, vec![0xA9, 2]);
    }

    #[test]
    fn local_labels_scope_to_last_global() {
        let result = assemble("GLOBAL1 NOP\n:LOOP BNE :LOOP\nGLOBAL2 NOP\n:LOOP BNE :LOOP\n");
        assert_eq!(result.error_count, 0);
        assert!(result.symbols.find("GLOBAL1:LOOP").is_some());
        assert!(result.symbols.find("GLOBAL2:LOOP").is_some());
    }

    #[test]
    fn zero_page_preferred_when_it_fits() {
        let result = assemble(" LDA $10\n");
        let line = &result.lines[0];
        assert_eq!(line.machine_code, vec![0xA5, 0x10]);
    }

    #[test]
    fn forced_zero_page_allowed_for_forward_reference() {
        let result = assemble(" LDA <LATER\nLATER EQU $10\n");
        let line = result.lines.iter().find(|l| l.source_text.contains("LDA")).unwrap();
        assert_eq!(line.machine_code, vec![0xA5, 0x10]);
    }

    #[test]
    fn forward_reference_resolving_to_zero_page_stays_absolute() {
        let result = assemble(" ORG $0800\n LDA DATA\n NOP\nDATA EQU $10\n");
        assert_eq!(result.error_count, 0);
        let lda = result.lines.iter().find(|l| l.source_text.contains("LDA")).unwrap();
        assert_eq!(lda.machine_code, vec![0xAD, 0x10, 0x00]);
        let nop = result.lines.iter().find(|l| l.source_text.contains("NOP")).unwrap();
        assert_eq!(nop.address, Some(0x0803));
    }

    #[test]
    fn ascii_string_directive() {
        let result = assemble(" ASC 'HI'\n");
        assert_eq!(result.binary.bytes(), b"HI");
    }

    #[test]
    fn dci_flips_high_bit_on_last_byte() {
        let result = assemble(" DCI 'HI'\n");
        assert_eq!(result.binary.bytes(), &[b'H', b'I' | 0x80]);
    }

    #[test]
    fn hex_directive_emits_literal_bytes() {
        let result = assemble(" HEX 010203\n");
        assert_eq!(result.binary.bytes(), &[0x01, 0x02, 0x03]);
    }
}
