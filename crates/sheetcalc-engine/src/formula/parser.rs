//! Formula text parser.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := number | cellref | ('min' | 'max') '(' expr ',' expr ')' | '(' expr ')'
//! ```
//!
//! Cell references become [`CellRef`]s relative to the base cell the formula
//! is being entered into. A single leading `=` is accepted and ignored.

use super::ast::{Ast, BinaryOp, CellRef};
use crate::engine::CellId;
use crate::engine::cell_id::letters_to_col;
use crate::error::{EngineError, Result};

/// Deepest nesting of parentheses/negations accepted.
const MAX_NESTING: usize = 256;

/// Tallest syntax tree accepted. Evaluation and rendering recurse over the
/// tree, so long operator chains count as deep as nested parentheses.
const MAX_DEPTH: usize = 512;

/// A subtree together with its height.
type Node = (Ast, usize);

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f64),
    Ref {
        target: CellId,
        col_abs: bool,
        row_abs: bool,
    },
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Num(n) => format!("number {}", n),
            Token::Ref { target, .. } => format!("reference {}", target),
            Token::Ident(name) => format!("'{}'", name),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::End => "end of formula".to_string(),
        }
    }
}

/// Parse `text` into an AST whose references are relative to `base`.
pub fn parse(text: &str, base: &CellId) -> Result<Ast> {
    let tokens = tokenize(text)?;
    if matches!(tokens.first(), Some((Token::End, _))) {
        return Err(EngineError::syntax("empty formula"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        base,
        depth: 0,
    };
    let (ast, _) = parser.expr()?;
    parser.expect(Token::End)?;
    Ok(ast)
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'=' {
        i += 1;
    }

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let token = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b',' => Token::Comma,
            b'0'..=b'9' | b'.' => {
                i = scan_number(bytes, i);
                let lexeme = &text[start..i];
                let n = lexeme.parse::<f64>().map_err(|_| {
                    EngineError::syntax(format!("invalid number '{}' at offset {}", lexeme, start))
                })?;
                tokens.push((Token::Num(n), start));
                continue;
            }
            b'$' | b'a'..=b'z' | b'A'..=b'Z' => {
                let (token, end) = scan_word(text, i)?;
                i = end;
                tokens.push((token, start));
                continue;
            }
            _ => {
                let ch = text[start..].chars().next().unwrap_or('?');
                return Err(EngineError::syntax(format!(
                    "unexpected character '{}' at offset {}",
                    ch, start
                )));
            }
        };
        tokens.push((token, start));
        i += 1;
    }

    tokens.push((Token::End, text.len()));
    Ok(tokens)
}

fn scan_digits(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    i
}

fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut i = scan_digits(bytes, start);
    if i < bytes.len() && bytes[i] == b'.' {
        i = scan_digits(bytes, i + 1);
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = scan_digits(bytes, j);
        }
    }
    i
}

/// Scan a reference (`a1`, `$a$1`) or a function name.
fn scan_word(text: &str, start: usize) -> Result<(Token, usize)> {
    let bytes = text.as_bytes();
    let mut i = start;

    let col_abs = bytes[i] == b'$';
    if col_abs {
        i += 1;
    }
    let letters_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let letters = &text[letters_start..i];

    let row_abs = i < bytes.len() && bytes[i] == b'$';
    if row_abs {
        i += 1;
    }
    let digits_start = i;
    i = scan_digits(bytes, i);
    let digits = &text[digits_start..i];

    if digits.is_empty() {
        if col_abs || row_abs || letters.is_empty() {
            return Err(EngineError::syntax(format!(
                "invalid cell reference '{}' at offset {}",
                &text[start..i],
                start
            )));
        }
        return Ok((Token::Ident(letters.to_ascii_lowercase()), i));
    }

    let target = letters_to_col(letters)
        .zip(digits.parse::<usize>().ok().and_then(|r| r.checked_sub(1)))
        .map(|(col, row)| CellId::new(col, row))
        .ok_or_else(|| {
            EngineError::syntax(format!(
                "invalid cell reference '{}' at offset {}",
                &text[start..i],
                start
            ))
        })?;

    Ok((
        Token::Ref {
            target,
            col_abs,
            row_abs,
        },
        i,
    ))
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    base: &'a CellId,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].0.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> EngineError {
        EngineError::syntax(format!(
            "unexpected {} at offset {}",
            self.peek().describe(),
            self.offset()
        ))
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(EngineError::syntax(format!(
                "expected {} but found {} at offset {}",
                expected.describe(),
                self.peek().describe(),
                self.offset()
            )))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(EngineError::syntax(format!(
                "formula nested too deeply at offset {}",
                self.offset()
            )));
        }
        Ok(())
    }

    /// Join two subtrees, rejecting the result if it is too tall.
    fn join(&self, op: BinaryOp, lhs: Node, rhs: Node, offset: usize) -> Result<Node> {
        let height = 1 + lhs.1.max(rhs.1);
        if height > MAX_DEPTH {
            return Err(EngineError::syntax(format!(
                "formula too long or nested too deeply at offset {}",
                offset
            )));
        }
        Ok((Ast::binary(op, lhs.0, rhs.0), height))
    }

    fn expr(&mut self) -> Result<Node> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let offset = self.offset();
            self.advance();
            let rhs = self.term()?;
            lhs = self.join(op, lhs, rhs, offset)?;
        }
    }

    fn term(&mut self) -> Result<Node> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            let offset = self.offset();
            self.advance();
            let rhs = self.unary()?;
            lhs = self.join(op, lhs, rhs, offset)?;
        }
    }

    fn unary(&mut self) -> Result<Node> {
        if *self.peek() == Token::Minus {
            self.advance();
            self.enter()?;
            let (operand, height) = self.unary()?;
            self.depth -= 1;
            return Ok((Ast::neg(operand), height + 1));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Node> {
        match self.peek().clone() {
            Token::Num(n) => {
                self.advance();
                Ok((Ast::Num(n), 1))
            }
            Token::Ref {
                target,
                col_abs,
                row_abs,
            } => {
                self.advance();
                let r = CellRef::to_target(self.base, &target, col_abs, row_abs);
                Ok((Ast::Ref(r), 1))
            }
            Token::Ident(name) => {
                let offset = self.offset();
                let op = match name.as_str() {
                    "min" => BinaryOp::Min,
                    "max" => BinaryOp::Max,
                    _ => {
                        return Err(EngineError::syntax(format!(
                            "unknown function '{}' at offset {}",
                            name, offset
                        )));
                    }
                };
                self.advance();
                self.expect(Token::LParen)?;
                self.enter()?;
                let lhs = self.expr()?;
                self.expect(Token::Comma)?;
                let rhs = self.expr()?;
                self.expect(Token::RParen)?;
                self.depth -= 1;
                self.join(op, lhs, rhs, offset)
            }
            Token::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::ast::Coord;

    fn a1() -> CellId {
        CellId::new(0, 0)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse("5", &a1()).unwrap(), Ast::Num(5.0));
        assert_eq!(parse(" 2.5e1 ", &a1()).unwrap(), Ast::Num(25.0));
        assert_eq!(parse(".5", &a1()).unwrap(), Ast::Num(0.5));
    }

    #[test]
    fn test_parse_leading_equals() {
        assert_eq!(parse("=5", &a1()).unwrap(), Ast::Num(5.0));
    }

    #[test]
    fn test_parse_reference_is_relative_to_base() {
        let base = CellId::new(1, 0); // b1
        let ast = parse("a1", &base).unwrap();
        assert_eq!(ast, Ast::Ref(CellRef::relative(-1, 0)));

        let ast = parse("C3", &base).unwrap();
        assert_eq!(ast, Ast::Ref(CellRef::relative(1, 2)));
    }

    #[test]
    fn test_parse_absolute_parts() {
        let base = CellId::new(1, 1);
        let Ast::Ref(r) = parse("$a2", &base).unwrap() else {
            panic!("Expected reference");
        };
        assert_eq!(r.col, Coord::Absolute(0));
        assert_eq!(r.row, Coord::Relative(0));

        let Ast::Ref(r) = parse("c$1", &base).unwrap() else {
            panic!("Expected reference");
        };
        assert_eq!(r.col, Coord::Relative(1));
        assert_eq!(r.row, Coord::Absolute(0));
    }

    #[test]
    fn test_precedence_and_associativity() {
        let ast = parse("1 + 2 * 3 - 4", &a1()).unwrap();
        let expected = Ast::binary(
            BinaryOp::Sub,
            Ast::binary(
                BinaryOp::Add,
                Ast::Num(1.0),
                Ast::binary(BinaryOp::Mul, Ast::Num(2.0), Ast::Num(3.0)),
            ),
            Ast::Num(4.0),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_mul() {
        let ast = parse("-2*3", &a1()).unwrap();
        let expected = Ast::binary(BinaryOp::Mul, Ast::neg(Ast::Num(2.0)), Ast::Num(3.0));
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_parse_functions_case_insensitive() {
        let ast = parse("MAX(a1, min(2, 3))", &CellId::new(1, 0)).unwrap();
        let expected = Ast::binary(
            BinaryOp::Max,
            Ast::Ref(CellRef::relative(-1, 0)),
            Ast::binary(BinaryOp::Min, Ast::Num(2.0), Ast::Num(3.0)),
        );
        assert_eq!(ast, expected);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "   ", "1 +", "(1", "1 2", "foo(1, 2)", "max(1)", "a0", "$a", "1 # 2", "*"] {
            let err = parse(bad, &a1()).unwrap_err();
            assert_eq!(err.kind().code(), "SYNTAX", "input {:?}", bad);
        }
    }

    #[test]
    fn test_error_reports_offset() {
        let err = parse("1 + )", &a1()).unwrap_err();
        assert!(err.to_string().contains("offset 4"), "{}", err);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(parse(&deep, &a1()).is_err());

        let ok = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(parse(&ok, &a1()).unwrap(), Ast::Num(1.0));
    }

    #[test]
    fn test_long_operator_chain_is_rejected() {
        let long = format!("1{}", "+1".repeat(10_000));
        let err = parse(&long, &a1()).unwrap_err();
        assert_eq!(err.kind().code(), "SYNTAX");

        let long_product = format!("a2{}", "*a2".repeat(MAX_DEPTH));
        assert!(parse(&long_product, &a1()).is_err());

        // Long chains hidden inside parentheses still count.
        let nested = format!("({}) + 1", format!("1{}", "-1".repeat(MAX_DEPTH)));
        assert!(parse(&nested, &a1()).is_err());
    }

    #[test]
    fn test_chain_within_depth_is_accepted() {
        let sum = format!("1{}", "+1".repeat(MAX_DEPTH - 1));
        let base = a1();
        let ast = parse(&sum, &base).unwrap();
        let value = crate::engine::evaluate(
            &crate::engine::Resolver::default(),
            &base,
            &ast,
            &|_: &CellId| 0.0,
        )
        .unwrap();
        assert_eq!(value, MAX_DEPTH as f64);
    }
}
