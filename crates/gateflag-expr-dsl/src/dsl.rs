// crates/gateflag-expr-dsl/src/dsl.rs
// ============================================================================
// Module: Expression DSL Parser
// Description: Lightweight, author-facing DSL for Expression trees.
// Purpose: Turn human-readable boolean rule text into `gateflag_core::Expression`.
// Dependencies: gateflag_core::{Expression, Scalar}
// ============================================================================

//! ## Overview
//!
//! ### Grammar (informal)
//! - **Property reads**: `property("plan")`
//! - **Literals**: `true`, `false`, `"pro"`, `21`, `21.5`
//! - **Comparisons**: `a == b`, `a != b`, `a > b`, `a >= b`, `a < b`, `a <= b`
//! - **Boolean operators**: `a && b`, `a || b`, `!a`
//! - **Parentheses**: `( ... )` for explicit grouping
//!
//! ### Example
//!
//! ```
//! use gateflag_expr_dsl::parse;
//!
//! let expr = parse(r#"property("plan") == "pro" && property("age") >= 21"#).unwrap();
//! ```

use std::fmt;

use gateflag_core::Expression;
use gateflag_core::Scalar;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum allowed DSL input size in bytes.
const MAX_DSL_INPUT_BYTES: usize = 64 * 1024;
/// Maximum supported nesting depth for DSL expressions.
const MAX_DSL_NESTING: usize = 32;

// ============================================================================
// SECTION: DslError
// ============================================================================

/// Errors raised parsing a DSL expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DslError {
    /// Input was empty or contained only whitespace.
    EmptyInput,
    /// Input exceeded the configured size limit.
    InputTooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual input length in bytes.
        actual_bytes: usize,
    },
    /// Input exceeded the configured nesting depth.
    NestingTooDeep {
        /// Maximum allowed nesting depth.
        max_depth: usize,
        /// Byte offset in the original input.
        position: usize,
    },
    /// An unterminated string literal.
    UnterminatedString {
        /// Byte offset where the string literal began.
        position: usize,
    },
    /// Unexpected character or token encountered during lexing or parsing.
    UnexpectedToken {
        /// Human-friendly expectation summary.
        expected: &'static str,
        /// The token text that was actually seen.
        found: String,
        /// Byte offset in the original input.
        position: usize,
    },
    /// `name(...)` was used where `name` isn't a recognized function.
    UnknownFunction {
        /// The unknown function identifier.
        name: String,
        /// Byte offset in the original input.
        position: usize,
    },
    /// Numeric literal failed to parse.
    InvalidNumber {
        /// The raw numeric text.
        raw: String,
        /// Byte offset in the original input.
        position: usize,
    },
    /// Unexpected trailing input after a complete expression.
    TrailingInput {
        /// Byte offset where unexpected input begins.
        position: usize,
    },
}

impl fmt::Display for DslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input is empty"),
            Self::InputTooLarge { max_bytes, actual_bytes } => {
                write!(f, "input exceeds size limit: {actual_bytes} bytes (max {max_bytes})")
            }
            Self::NestingTooDeep { max_depth, position } => {
                write!(f, "input nesting exceeds limit (max {max_depth}) at {position}")
            }
            Self::UnterminatedString { position } => write!(f, "unterminated string literal at {position}"),
            Self::UnexpectedToken { expected, found, position } => {
                write!(f, "unexpected token `{found}` at {position}, expected {expected}")
            }
            Self::UnknownFunction { name, position } => write!(f, "unknown function `{name}` at {position}"),
            Self::InvalidNumber { raw, position } => write!(f, "invalid number `{raw}` at {position}"),
            Self::TrailingInput { position } => write!(f, "unexpected trailing input at {position}"),
        }
    }
}

impl std::error::Error for DslError {}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Parses a DSL expression into an [`Expression`] tree.
///
/// # Errors
///
/// Returns [`DslError`] for syntax issues, oversized input, excessive
/// nesting, or trailing input after a complete expression.
pub fn parse(input: &str) -> Result<Expression, DslError> {
    if input.len() > MAX_DSL_INPUT_BYTES {
        return Err(DslError::InputTooLarge {
            max_bytes: MAX_DSL_INPUT_BYTES,
            actual_bytes: input.len(),
        });
    }
    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser::new(input, tokens);
    let expr = parser.parse_or(0)?;
    parser.expect_eof()?;
    Ok(expr)
}

// ============================================================================
// SECTION: Lexer
// ============================================================================

/// Lexer token produced from the DSL input.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    String(String),
    Number(String),
    And,
    Or,
    Not,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    LParen,
    RParen,
    Comma,
    Eof,
}

/// Token paired with its byte offset.
#[derive(Debug, Clone)]
struct SpannedToken {
    token: Token,
    position: usize,
}

/// Lexer for the expression DSL.
struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    fn lex(&mut self) -> Result<Vec<SpannedToken>, DslError> {
        let mut tokens = Vec::new();
        let bytes = self.input.as_bytes();

        while self.offset < bytes.len() {
            let ch = bytes[self.offset];
            match ch {
                b' ' | b'\t' | b'\n' | b'\r' => self.offset += 1,
                b'(' => {
                    tokens.push(self.spanned(Token::LParen));
                    self.offset += 1;
                }
                b')' => {
                    tokens.push(self.spanned(Token::RParen));
                    self.offset += 1;
                }
                b',' => {
                    tokens.push(self.spanned(Token::Comma));
                    self.offset += 1;
                }
                b'!' => {
                    if bytes.get(self.offset + 1) == Some(&b'=') {
                        tokens.push(self.spanned(Token::Ne));
                        self.offset += 2;
                    } else {
                        tokens.push(self.spanned(Token::Not));
                        self.offset += 1;
                    }
                }
                b'=' => {
                    if bytes.get(self.offset + 1) == Some(&b'=') {
                        tokens.push(self.spanned(Token::Eq));
                        self.offset += 2;
                    } else {
                        return Err(DslError::UnexpectedToken {
                            expected: "==",
                            found: "=".to_owned(),
                            position: self.offset,
                        });
                    }
                }
                b'>' => {
                    if bytes.get(self.offset + 1) == Some(&b'=') {
                        tokens.push(self.spanned(Token::Ge));
                        self.offset += 2;
                    } else {
                        tokens.push(self.spanned(Token::Gt));
                        self.offset += 1;
                    }
                }
                b'<' => {
                    if bytes.get(self.offset + 1) == Some(&b'=') {
                        tokens.push(self.spanned(Token::Le));
                        self.offset += 2;
                    } else {
                        tokens.push(self.spanned(Token::Lt));
                        self.offset += 1;
                    }
                }
                b'&' => {
                    if bytes.get(self.offset + 1) == Some(&b'&') {
                        tokens.push(self.spanned(Token::And));
                        self.offset += 2;
                    } else {
                        return Err(DslError::UnexpectedToken {
                            expected: "&&",
                            found: "&".to_owned(),
                            position: self.offset,
                        });
                    }
                }
                b'|' => {
                    if bytes.get(self.offset + 1) == Some(&b'|') {
                        tokens.push(self.spanned(Token::Or));
                        self.offset += 2;
                    } else {
                        return Err(DslError::UnexpectedToken {
                            expected: "||",
                            found: "|".to_owned(),
                            position: self.offset,
                        });
                    }
                }
                b'"' => {
                    let start = self.offset;
                    self.offset += 1;
                    let content_start = self.offset;
                    while self.offset < bytes.len() && bytes[self.offset] != b'"' {
                        self.offset += 1;
                    }
                    if self.offset >= bytes.len() {
                        return Err(DslError::UnterminatedString { position: start });
                    }
                    let text = self.input[content_start..self.offset].to_owned();
                    self.offset += 1;
                    tokens.push(SpannedToken {
                        token: Token::String(text),
                        position: start,
                    });
                }
                b'0'..=b'9' => {
                    let start = self.offset;
                    self.consume_while(bytes, |b| b.is_ascii_digit() || b == b'.');
                    let slice = self.input[start..self.offset].to_owned();
                    tokens.push(SpannedToken {
                        token: Token::Number(slice),
                        position: start,
                    });
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                    let start = self.offset;
                    self.consume_while(bytes, |b| b.is_ascii_alphanumeric() || b == b'_');
                    let slice = self.input[start..self.offset].to_owned();
                    tokens.push(SpannedToken {
                        token: Token::Ident(slice),
                        position: start,
                    });
                }
                _ => {
                    return Err(DslError::UnexpectedToken {
                        expected: "identifier, literal, or operator",
                        found: char::from(ch).to_string(),
                        position: self.offset,
                    });
                }
            }
        }

        if tokens.is_empty() {
            return Err(DslError::EmptyInput);
        }

        tokens.push(SpannedToken {
            token: Token::Eof,
            position: self.offset,
        });
        Ok(tokens)
    }

    fn spanned(&self, token: Token) -> SpannedToken {
        SpannedToken { token, position: self.offset }
    }

    fn consume_while<F>(&mut self, bytes: &[u8], condition: F)
    where
        F: Fn(u8) -> bool,
    {
        while let Some(&b) = bytes.get(self.offset) {
            if condition(b) {
                self.offset += 1;
            } else {
                break;
            }
        }
    }
}

// ============================================================================
// SECTION: Parser
// ============================================================================

/// Recursive-descent parser over the token stream.
struct Parser<'a> {
    input: &'a str,
    tokens: Vec<SpannedToken>,
    cursor: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, tokens: Vec<SpannedToken>) -> Self {
        Self { input, tokens, cursor: 0 }
    }

    fn peek(&self) -> &SpannedToken {
        &self.tokens[self.cursor]
    }

    fn advance(&mut self) -> SpannedToken {
        let token = self.tokens[self.cursor].clone();
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn check_depth(&self, depth: usize, position: usize) -> Result<(), DslError> {
        if depth > MAX_DSL_NESTING {
            return Err(DslError::NestingTooDeep {
                max_depth: MAX_DSL_NESTING,
                position,
            });
        }
        Ok(())
    }

    fn expect_eof(&self) -> Result<(), DslError> {
        match &self.peek().token {
            Token::Eof => Ok(()),
            _ => Err(DslError::TrailingInput {
                position: self.peek().position,
            }),
        }
    }

    /// `or_expr := and_expr ( "||" and_expr )*`
    fn parse_or(&mut self, depth: usize) -> Result<Expression, DslError> {
        self.check_depth(depth, self.peek().position)?;
        let mut left = self.parse_and(depth + 1)?;
        let mut children = None;
        while matches!(self.peek().token, Token::Or) {
            self.advance();
            let right = self.parse_and(depth + 1)?;
            children.get_or_insert_with(|| vec![std::mem::replace(&mut left, Expression::Value(Scalar::Boolean(false)))]).push(right);
        }
        if let Some(children) = children {
            Ok(Expression::Any(children))
        } else {
            Ok(left)
        }
    }

    /// `and_expr := unary ( "&&" unary )*`
    fn parse_and(&mut self, depth: usize) -> Result<Expression, DslError> {
        self.check_depth(depth, self.peek().position)?;
        let mut left = self.parse_unary(depth + 1)?;
        let mut children = None;
        while matches!(self.peek().token, Token::And) {
            self.advance();
            let right = self.parse_unary(depth + 1)?;
            children.get_or_insert_with(|| vec![std::mem::replace(&mut left, Expression::Value(Scalar::Boolean(false)))]).push(right);
        }
        if let Some(children) = children {
            Ok(Expression::And(children))
        } else {
            Ok(left)
        }
    }

    /// `unary := "!" unary | comparison`
    fn parse_unary(&mut self, depth: usize) -> Result<Expression, DslError> {
        self.check_depth(depth, self.peek().position)?;
        if matches!(self.peek().token, Token::Not) {
            self.advance();
            let inner = self.parse_unary(depth + 1)?;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.parse_comparison(depth + 1)
    }

    /// `comparison := operand ( cmp_op operand )?`
    fn parse_comparison(&mut self, depth: usize) -> Result<Expression, DslError> {
        self.check_depth(depth, self.peek().position)?;
        let left = self.parse_operand(depth + 1)?;
        let make = |op: fn(Box<Expression>, Box<Expression>) -> Expression, left, right| op(Box::new(left), Box::new(right));
        let expr = match &self.peek().token {
            Token::Eq => {
                self.advance();
                make(Expression::Equal, left, self.parse_operand(depth + 1)?)
            }
            Token::Ne => {
                self.advance();
                make(Expression::NotEqual, left, self.parse_operand(depth + 1)?)
            }
            Token::Gt => {
                self.advance();
                make(Expression::GreaterThan, left, self.parse_operand(depth + 1)?)
            }
            Token::Ge => {
                self.advance();
                make(Expression::GreaterThanOrEqual, left, self.parse_operand(depth + 1)?)
            }
            Token::Lt => {
                self.advance();
                make(Expression::LessThan, left, self.parse_operand(depth + 1)?)
            }
            Token::Le => {
                self.advance();
                make(Expression::LessThanOrEqual, left, self.parse_operand(depth + 1)?)
            }
            _ => left,
        };
        Ok(expr)
    }

    /// `operand := property_call | literal | "(" or_expr ")"`
    fn parse_operand(&mut self, depth: usize) -> Result<Expression, DslError> {
        self.check_depth(depth, self.peek().position)?;
        let spanned = self.advance();
        match spanned.token {
            Token::LParen => {
                let inner = self.parse_or(depth + 1)?;
                match &self.peek().token {
                    Token::RParen => {
                        self.advance();
                        Ok(inner)
                    }
                    other => Err(DslError::UnexpectedToken {
                        expected: ")",
                        found: token_text(other),
                        position: self.peek().position,
                    }),
                }
            }
            Token::Ident(name) if name == "true" => Ok(Expression::Value(Scalar::Boolean(true))),
            Token::Ident(name) if name == "false" => Ok(Expression::Value(Scalar::Boolean(false))),
            Token::Ident(name) if name == "property" => {
                self.expect(Token::LParen)?;
                let name_token = self.advance();
                let Token::String(property_name) = name_token.token else {
                    return Err(DslError::UnexpectedToken {
                        expected: "a quoted property name",
                        found: token_text(&name_token.token),
                        position: name_token.position,
                    });
                };
                self.expect(Token::RParen)?;
                Ok(Expression::Property(property_name))
            }
            Token::Ident(name) => Err(DslError::UnknownFunction {
                name,
                position: spanned.position,
            }),
            Token::String(text) => Ok(Expression::Value(Scalar::String(text))),
            Token::Number(raw) => parse_number(&raw, spanned.position),
            other => Err(DslError::UnexpectedToken {
                expected: "a literal, property(...), or (",
                found: token_text(&other),
                position: spanned.position,
            }),
        }
        .map_err(|err| self.annotate_source(err))
    }

    fn expect(&mut self, expected: Token) -> Result<(), DslError> {
        let spanned = self.advance();
        if spanned.token == expected {
            Ok(())
        } else {
            Err(DslError::UnexpectedToken {
                expected: "a matching token",
                found: token_text(&spanned.token),
                position: spanned.position,
            })
        }
    }

    /// No-op hook kept for parity with error-position conventions; the
    /// input is only used for future diagnostics.
    fn annotate_source(&self, err: DslError) -> DslError {
        let _ = self.input;
        err
    }
}

fn parse_number(raw: &str, position: usize) -> Result<Expression, DslError> {
    if raw.contains('.') {
        raw.parse::<f64>()
            .map(|f| Expression::Value(Scalar::Float(f)))
            .map_err(|_| DslError::InvalidNumber {
                raw: raw.to_owned(),
                position,
            })
    } else {
        raw.parse::<i64>()
            .map(|i| Expression::Value(Scalar::Integer(i)))
            .map_err(|_| DslError::InvalidNumber {
                raw: raw.to_owned(),
                position,
            })
    }
}

fn token_text(token: &Token) -> String {
    match token {
        Token::Ident(s) | Token::String(s) | Token::Number(s) => s.clone(),
        Token::And => "&&".to_owned(),
        Token::Or => "||".to_owned(),
        Token::Not => "!".to_owned(),
        Token::Eq => "==".to_owned(),
        Token::Ne => "!=".to_owned(),
        Token::Gt => ">".to_owned(),
        Token::Ge => ">=".to_owned(),
        Token::Lt => "<".to_owned(),
        Token::Le => "<=".to_owned(),
        Token::LParen => "(".to_owned(),
        Token::RParen => ")".to_owned(),
        Token::Comma => ",".to_owned(),
        Token::Eof => "<eof>".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_property_equality() {
        let expr = parse(r#"property("plan") == "pro""#).expect("parse");
        assert_eq!(
            expr,
            Expression::Equal(
                Box::new(Expression::Property("plan".to_owned())),
                Box::new(Expression::Value(Scalar::String("pro".to_owned()))),
            )
        );
    }

    #[test]
    fn parses_and_of_two_comparisons() {
        let expr = parse(r#"property("plan") == "pro" && property("age") >= 21"#).expect("parse");
        assert!(matches!(expr, Expression::And(children) if children.len() == 2));
    }

    #[test]
    fn parses_or_with_lower_precedence_than_and() {
        let expr = parse("true && false || true").expect("parse");
        assert!(matches!(expr, Expression::Any(children) if children.len() == 2));
    }

    #[test]
    fn parses_negation() {
        let expr = parse("!true").expect("parse");
        assert_eq!(expr, Expression::Not(Box::new(Expression::Value(Scalar::Boolean(true)))));
    }

    #[test]
    fn parses_parenthesized_grouping() {
        let expr = parse("(true || false) && true").expect("parse");
        assert!(matches!(expr, Expression::And(_)));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(parse(""), Err(DslError::EmptyInput));
    }

    #[test]
    fn rejects_unknown_function() {
        assert!(matches!(parse("bogus(1)"), Err(DslError::UnknownFunction { .. })));
    }

    #[test]
    fn rejects_trailing_input() {
        assert!(matches!(parse("true true"), Err(DslError::TrailingInput { .. })));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(matches!(parse(r#"property("plan"#), Err(DslError::UnterminatedString { .. })));
    }

    #[test]
    fn parses_integer_and_float_literals() {
        assert_eq!(parse("21").expect("parse"), Expression::Value(Scalar::Integer(21)));
        assert_eq!(parse("21.5").expect("parse"), Expression::Value(Scalar::Float(21.5)));
    }

    #[test]
    fn rejects_oversized_input() {
        let huge = "true && ".repeat(20_000);
        assert!(matches!(parse(&huge), Err(DslError::InputTooLarge { .. })));
    }
}
