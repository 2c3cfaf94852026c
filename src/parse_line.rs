//! Tokenizes one logical source line into {label, opcode, operand, comment},
//! preserving the operand column's indentation for the listing formatter.

use crate::sized_string::SizedString;

/// The result of tokenizing one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub label: SizedString<'a>,
    pub opcode: SizedString<'a>,
    pub operand: SizedString<'a>,
    pub comment: SizedString<'a>,
    /// Column (0-based) at which the operand token begins, or the column the
    /// operand would have begun at for an empty operand. Used by the list
    /// formatter to reproduce source indentation.
    pub operand_indent: usize,
    pub is_full_line_comment: bool,
}

fn is_line_ws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn token_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && !is_line_ws(bytes[i]) && bytes[i] != b';' {
        i += 1;
    }
    i
}

/// Tokenizes `line` (one physical source line, without its terminator).
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    let bytes = line.as_bytes();

    let first_non_ws = bytes.iter().position(|&b| !is_line_ws(b));
    match first_non_ws {
        None => {
            return ParsedLine {
                label: SizedString::new(""),
                opcode: SizedString::new(""),
                operand: SizedString::new(""),
                comment: SizedString::new(""),
                operand_indent: 0,
                is_full_line_comment: false,
            };
        }
        Some(pos) if bytes[pos] == b'*' || bytes[pos] == b';' => {
            return ParsedLine {
                label: SizedString::new(""),
                opcode: SizedString::new(""),
                operand: SizedString::new(""),
                comment: SizedString::new(&line[pos..]),
                operand_indent: 0,
                is_full_line_comment: true,
            };
        }
        _ => {}
    }

    let mut i = 0usize;
    let label_range;
    if !is_line_ws(bytes[0]) {
        let end = token_end(bytes, 0);
        label_range = 0..end;
        i = end;
    } else {
        label_range = 0..0;
    }

    while i < bytes.len() && is_line_ws(bytes[i]) {
        i += 1;
    }
    let opcode_start = i;
    let opcode_end = token_end(bytes, opcode_start);
    i = opcode_end;

    while i < bytes.len() && is_line_ws(bytes[i]) {
        i += 1;
    }
    let operand_indent = i;
    let operand_start = i;
    let operand_end = bytes[operand_start..]
        .iter()
        .position(|&b| b == b';')
        .map(|rel| operand_start + rel)
        .unwrap_or(bytes.len());
    // Trim trailing line whitespace from the operand so it doesn't leak into
    // downstream expression parsing.
    let mut operand_trim_end = operand_end;
    while operand_trim_end > operand_start && is_line_ws(bytes[operand_trim_end - 1]) {
        operand_trim_end -= 1;
    }

    let comment_range = if operand_end < bytes.len() {
        operand_end..bytes.len()
    } else {
        bytes.len()..bytes.len()
    };

    ParsedLine {
        label: SizedString::new(&line[label_range]),
        opcode: SizedString::new(&line[opcode_start..opcode_end]),
        operand: SizedString::new(&line[operand_start..operand_trim_end]),
        comment: SizedString::new(&line[comment_range]),
        operand_indent,
        is_full_line_comment: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line() {
        let p = parse_line("");
        assert!(p.label.is_empty() && p.opcode.is_empty() && p.operand.is_empty());
    }

    #[test]
    fn full_line_comment_variants() {
        assert!(parse_line("* a comment").is_full_line_comment);
        assert!(parse_line("; a comment").is_full_line_comment);
        assert!(parse_line("   ; indented comment").is_full_line_comment);
    }

    #[test]
    fn label_opcode_operand_comment() {
        let p = parse_line("LOOP  LDA $C008  ; read keyboard");
        assert_eq!(p.label.as_str(), "LOOP");
        assert_eq!(p.opcode.as_str(), "LDA");
        assert_eq!(p.operand.as_str(), "$C008");
        assert_eq!(p.comment.as_str(), "; read keyboard");
    }

    #[test]
    fn opcode_only_no_label() {
        let p = parse_line(" DEX");
        assert!(p.label.is_empty());
        assert_eq!(p.opcode.as_str(), "DEX");
        assert!(p.operand.is_empty());
    }

    #[test]
    fn local_label_token() {
        let p = parse_line(":LOOP BNE :LOOP");
        assert_eq!(p.label.as_str(), ":LOOP");
        assert_eq!(p.operand.as_str(), ":LOOP");
    }
}
