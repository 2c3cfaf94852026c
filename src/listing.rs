//! Formats one listing record per source line: `AAAA: BB BB BB  LLLL SOURCE-TEXT`,
//! wrapping instructions that emit more than 3 bytes onto continuation rows,
//! and rendering `EQU` lines as `    :    =VVVV`.

use crate::line_info::{LineFlag, LineInfo};

fn address_field(addr: Option<u32>) -> String {
    match addr {
        Some(a) => format!("{:04X}", a & 0xFFFF),
        None => "    ".to_string(),
    }
}

fn bytes_field(chunk: &[u8]) -> String {
    let mut slots = Vec::with_capacity(3);
    for i in 0..3 {
        match chunk.get(i) {
            Some(b) => slots.push(format!("{b:02X}")),
            None => slots.push("  ".to_string()),
        }
    }
    slots.join(" ")
}

/// Renders one [`LineInfo`] as one or more fixed-width text rows. Every row
/// after the first (when machine code spans more than 3 bytes) carries only
/// the address and byte columns.
pub fn format_line(line: &LineInfo) -> Vec<String> {
    if line.flags.contains(LineFlag::WasEqu) {
        let value = line.equ_value.unwrap_or(0);
        let prefix = format!("    :    ={value:04X}");
        return vec![format!("{prefix}  {:>4} {}", line.line_number, line.source_text)];
    }

    let chunks: Vec<&[u8]> = if line.machine_code.is_empty() {
        vec![&[][..]]
    } else {
        line.machine_code.chunks(3).collect()
    };

    let mut rows = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let addr = line.address.map(|a| a + (i * 3) as u32);
        let prefix = format!("{}: {}", address_field(addr), bytes_field(chunk));
        if i == 0 {
            rows.push(format!("{prefix}  {:>4} {}", line.line_number, line.source_text));
        } else {
            rows.push(prefix);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_info::InstructionSet;
    use flagset::FlagSet;

    fn line(number: usize, address: u32, code: &[u8], source: &str) -> LineInfo {
        LineInfo {
            line_number: number,
            source_text: source.to_string(),
            operand_indent: 0,
            defines_symbol: None,
            machine_code: code.to_vec(),
            address: Some(address),
            equ_value: None,
            instruction_set: InstructionSet::Mos6502,
            flags: FlagSet::default(),
        }
    }

    #[test]
    fn single_byte_instruction() {
        let rows = format_line(&line(1, 0x0800, &[0xCA], " DEX"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], "0800: CA           1  DEX");
    }

    #[test]
    fn three_byte_instruction() {
        let rows = format_line(&line(1, 0x0803, &[0xAD, 0xC0, 0x08], " LDA $C008"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], "0803: AD C0 08     1  LDA $C008");
    }

    #[test]
    fn wraps_after_three_bytes() {
        let rows = format_line(&line(5, 0x1000, &[1, 2, 3, 4, 5], " HEX 0102030405"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "1000: 01 02 03     5  HEX 0102030405");
        assert_eq!(rows[1], "1003: 04 05   ");
    }

    #[test]
    fn equ_line_renders_fixed_form() {
        let mut l = line(1, 0, &[], "LABEL EQU $FFFF");
        l.flags |= LineFlag::WasEqu;
        l.equ_value = Some(0xFFFF);
        l.address = None;
        let rows = format_line(&l);
        assert_eq!(rows[0], "    :    =FFFF     1 LABEL EQU $FFFF");
    }
}
