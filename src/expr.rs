//! Recursive-descent evaluator for Merlin operand expressions.
//!
//! Grammar (flat, left-to-right, no operator precedence beyond unary vs.
//! binary — confirmed against the reference implementation's fold-style
//! evaluation; `1+2*3` evaluates to `9`, not `7`):
//!
//! ```text
//! expr       = unary ( ('+'|'-'|'*'|'/'|'&'|'|'|'^') unary )*
//! unary      = ('+'|'-'|'~'|'<'|'>'|'#')? primary
//! primary    = number | char-literal | symbol-ref | '(' expr ')' | '*'
//! number     = '$' hex+ | '%' bin+ | dec+
//! symbol-ref = identifier
//! ```

use crate::error::ExprError;
use crate::line_info::LineId;
use crate::symbol::SymbolTable;

/// What kind of value an [`Expression`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpressionKind {
    #[default]
    Absolute,
    PcRelative,
    Immediate,
}

/// An evaluated operand: a value plus a type tag, not an AST. 16-bit for the
/// 6502/65C02 instruction sets, up to 24-bit under 65816 long addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Expression {
    pub value: u32,
    pub kind: ExpressionKind,
    /// Set when any symbol reference contributing to this value was, at the
    /// moment of evaluation, not yet defined.
    pub forward_referenced: bool,
    /// Set when the top-level unary operator was `<`, meaning the source
    /// explicitly forced an 8-bit (zero-page) value rather than this being
    /// an accident of the symbol's current value.
    pub forced_low_byte: bool,
}

impl Expression {
    pub fn absolute(value: u32) -> Self {
        Expression {
            value,
            kind: ExpressionKind::Absolute,
            forward_referenced: false,
            forced_low_byte: false,
        }
    }
}

/// State threaded through evaluation: the assembling program counter, the
/// active local-label scope (the most recent global label, used to qualify
/// a leading `:`), and mutable access to the symbol table so that an
/// unresolved reference can allocate a placeholder symbol and register the
/// current line against it.
pub struct EvalContext<'a> {
    pub pc: u32,
    pub local_scope: Option<&'a str>,
    pub symbols: &'a mut SymbolTable,
    pub current_line: LineId,
}

fn scoped_key(token: &str, local_scope: Option<&str>) -> String {
    if let Some(rest) = token.strip_prefix(':') {
        format!("{}:{rest}", local_scope.unwrap_or(""))
    } else {
        token.to_string()
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn rest(&self) -> &'a str {
        std::str::from_utf8(&self.bytes[self.pos..]).unwrap_or("")
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("")
    }

    fn parse_expr(&mut self, ctx: &mut EvalContext) -> Result<Expression, ExprError> {
        let mut acc = self.parse_unary(ctx)?;
        loop {
            self.skip_ws();
            let op = match self.peek() {
                Some(op @ (b'+' | b'-' | b'*' | b'/' | b'&' | b'|' | b'^')) => op,
                _ => break,
            };
            self.advance();
            self.skip_ws();
            let rhs = self.parse_unary(ctx)?;
            acc = apply_binary(op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn parse_unary(&mut self, ctx: &mut EvalContext) -> Result<Expression, ExprError> {
        self.skip_ws();
        match self.peek() {
            Some(b'+') => {
                self.advance();
                self.parse_primary(ctx)
            }
            Some(b'-') => {
                self.advance();
                let v = self.parse_primary(ctx)?;
                Ok(Expression {
                    value: 0u32.wrapping_sub(v.value),
                    ..v
                })
            }
            Some(b'~') => {
                self.advance();
                let v = self.parse_primary(ctx)?;
                Ok(Expression {
                    value: !v.value,
                    ..v
                })
            }
            Some(b'<') => {
                self.advance();
                let v = self.parse_primary(ctx)?;
                Ok(Expression {
                    value: v.value & 0xFF,
                    forced_low_byte: true,
                    ..v
                })
            }
            Some(b'>') => {
                self.advance();
                let v = self.parse_primary(ctx)?;
                Ok(Expression {
                    value: (v.value >> 8) & 0xFF,
                    ..v
                })
            }
            Some(b'#') => {
                self.advance();
                let v = self.parse_primary(ctx)?;
                Ok(Expression {
                    kind: ExpressionKind::Immediate,
                    ..v
                })
            }
            _ => self.parse_primary(ctx),
        }
    }

    fn parse_primary(&mut self, ctx: &mut EvalContext) -> Result<Expression, ExprError> {
        self.skip_ws();
        match self.peek() {
            None => Err(ExprError::EmptyExpression),
            Some(b'(') => {
                self.advance();
                let v = self.parse_expr(ctx)?;
                self.skip_ws();
                if self.peek() == Some(b')') {
                    self.advance();
                    Ok(v)
                } else {
                    Err(ExprError::UnbalancedParens)
                }
            }
            Some(b'*') => {
                self.advance();
                Ok(Expression {
                    value: ctx.pc,
                    kind: ExpressionKind::PcRelative,
                    ..Default::default()
                })
            }
            Some(b'$') => {
                self.advance();
                let digits = self.take_while(|b| b.is_ascii_hexdigit());
                if digits.is_empty() {
                    return Err(ExprError::MalformedNumber(format!("${}", self.rest())));
                }
                let value = u32::from_str_radix(digits, 16)
                    .map_err(|_| ExprError::MalformedNumber(digits.to_string()))?;
                Ok(Expression::absolute(value))
            }
            Some(b'%') => {
                self.advance();
                let digits = self.take_while(|b| b == b'0' || b == b'1');
                if digits.is_empty() {
                    return Err(ExprError::MalformedNumber(format!("%{}", self.rest())));
                }
                let value = u32::from_str_radix(digits, 2)
                    .map_err(|_| ExprError::MalformedNumber(digits.to_string()))?;
                Ok(Expression::absolute(value))
            }
            Some(b'\'') => {
                self.advance();
                let c = self.advance().ok_or(ExprError::MalformedNumber("'".to_string()))?;
                Ok(Expression::absolute((c & 0x7F) as u32))
            }
            Some(b'"') => {
                self.advance();
                let c = self.advance().ok_or(ExprError::MalformedNumber("\"".to_string()))?;
                Ok(Expression::absolute((c as u32) | 0x80))
            }
            Some(b) if b.is_ascii_digit() => {
                let digits = self.take_while(|b| b.is_ascii_digit());
                let value = digits
                    .parse::<u32>()
                    .map_err(|_| ExprError::MalformedNumber(digits.to_string()))?;
                Ok(Expression::absolute(value))
            }
            Some(b) if b == b':' || b.is_ascii_alphabetic() || b == b'_' || b == b'.' => {
                let start = self.pos;
                if b == b':' {
                    self.pos += 1;
                }
                self.take_while(is_ident_byte);
                let token = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("");
                Ok(resolve_symbol_ref(token, ctx))
            }
            Some(b) => Err(ExprError::UnknownPrefix(b as char)),
        }
    }
}

fn resolve_symbol_ref(token: &str, ctx: &mut EvalContext) -> Expression {
    let key = scoped_key(token, ctx.local_scope);
    if let Some(id) = ctx.symbols.find(&key) {
        let symbol = ctx.symbols.get(id);
        if symbol.defined {
            return Expression::absolute(symbol.expression.value);
        }
        ctx.symbols.get_mut(id).add_line_reference(ctx.current_line);
    } else {
        let id = ctx.symbols.add(&key);
        ctx.symbols.get_mut(id).add_line_reference(ctx.current_line);
    }
    Expression {
        value: 0,
        kind: ExpressionKind::Absolute,
        forward_referenced: true,
        forced_low_byte: false,
    }
}

fn apply_binary(op: u8, lhs: Expression, rhs: Expression) -> Result<Expression, ExprError> {
    let value = match op {
        b'+' => lhs.value.wrapping_add(rhs.value),
        b'-' => lhs.value.wrapping_sub(rhs.value),
        b'*' => lhs.value.wrapping_mul(rhs.value),
        b'/' => {
            if rhs.value == 0 {
                return Err(ExprError::DivideByZero);
            }
            lhs.value / rhs.value
        }
        b'&' => lhs.value & rhs.value,
        b'|' => lhs.value | rhs.value,
        b'^' => lhs.value ^ rhs.value,
        _ => unreachable!("apply_binary only called with one of the matched operators"),
    };
    Ok(Expression {
        value,
        kind: lhs.kind,
        forward_referenced: lhs.forward_referenced || rhs.forward_referenced,
        forced_low_byte: false,
    })
}

/// Evaluates `text` as a single expression, requiring it to consume the
/// entire (trimmed) input.
pub fn evaluate(text: &str, ctx: &mut EvalContext) -> Result<Expression, ExprError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExprError::EmptyExpression);
    }
    let mut parser = Parser::new(trimmed);
    let value = parser.parse_expr(ctx)?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(ExprError::TrailingText(parser.rest().to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_info::LineId;

    fn eval(text: &str, symbols: &mut SymbolTable, pc: u32) -> Result<Expression, ExprError> {
        let mut ctx = EvalContext {
            pc,
            local_scope: None,
            symbols,
            current_line: LineId(0),
        };
        evaluate(text, &mut ctx)
    }

    #[test]
    fn left_to_right_no_precedence() {
        let mut symbols = SymbolTable::new();
        let result = eval("1+2*3", &mut symbols, 0).unwrap();
        assert_eq!(result.value, 9);
    }

    #[test]
    fn hex_and_binary_literals() {
        let mut symbols = SymbolTable::new();
        assert_eq!(eval("$C008", &mut symbols, 0).unwrap().value, 0xC008);
        assert_eq!(eval("%1010", &mut symbols, 0).unwrap().value, 0b1010);
    }

    #[test]
    fn star_is_program_counter() {
        let mut symbols = SymbolTable::new();
        let result = eval("*", &mut symbols, 0x0900).unwrap();
        assert_eq!(result.value, 0x0900);
    }

    #[test]
    fn low_and_high_byte_prefixes() {
        let mut symbols = SymbolTable::new();
        assert_eq!(eval("<$1234", &mut symbols, 0).unwrap().value, 0x34);
        assert_eq!(eval(">$1234", &mut symbols, 0).unwrap().value, 0x12);
        assert!(eval("<$1234", &mut symbols, 0).unwrap().forced_low_byte);
    }

    #[test]
    fn undefined_symbol_is_forward_referenced_and_tracked() {
        let mut symbols = SymbolTable::new();
        let mut ctx = EvalContext {
            pc: 0,
            local_scope: None,
            symbols: &mut symbols,
            current_line: LineId(7),
        };
        let result = evaluate("LATER", &mut ctx).unwrap();
        assert!(result.forward_referenced);
        assert_eq!(result.value, 0);
        let id = symbols.find("LATER").expect("placeholder symbol created");
        assert_eq!(symbols.get(id).line_references(), &[LineId(7)]);
    }

    #[test]
    fn division_by_zero_errors() {
        let mut symbols = SymbolTable::new();
        assert_eq!(eval("1/0", &mut symbols, 0), Err(ExprError::DivideByZero));
    }

    #[test]
    fn unbalanced_parens_errors() {
        let mut symbols = SymbolTable::new();
        assert_eq!(eval("(1+2", &mut symbols, 0), Err(ExprError::UnbalancedParens));
    }
}
