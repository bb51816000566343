// Copyright (c) 2018 Fabian Schuiki

//! A collection of facilities required by tinypg-generated parsers.
//!
//! The code generator emits one recursive-descent routine per nonterminal.
//! These routines drive a [`Scanner`] for lookahead and consumption and
//! record their findings in a [`ParseTree`]. The grammar compiler itself
//! uses the same token, span, and error types for its own front-end.

#![deny(missing_docs)]

use std::fmt;
use std::sync::Arc;

mod scanner;
mod tree;

pub use regex;
pub use scanner::{anchored, Scanner};
pub use tree::{NodeId, ParseNode, ParseTree};

/// Error codes emitted by generated parsers at run time.
pub mod codes {
    /// No alternative of a choice matched the lookahead token.
    pub const NO_ALTERNATIVE: u32 = 0x0002;
    /// The scanned token is not of the expected type.
    pub const UNEXPECTED_TOKEN: u32 = 0x1001;
}

/// The kinds of tokens and tree nodes a scanner and parser deal in.
///
/// Generated parsers implement this for their `TokenType` enum.
pub trait TokenKind: Copy + Eq + fmt::Debug {
    /// The kind assigned to input that no pattern matched.
    fn undetermined() -> Self;
    /// The kind of the parse tree's root node.
    fn root() -> Self;
}

/// A region of source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    /// The file the text was read from.
    pub file: Arc<str>,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// The 1-based line of the first character.
    pub line: usize,
    /// The 1-based column of the first character.
    pub column: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(file: Arc<str>, start: usize, end: usize, line: usize, column: usize) -> Span {
        debug_assert!(end >= start);
        Span {
            file,
            start,
            end,
            line,
            column,
        }
    }

    /// Create an empty span that points nowhere.
    pub fn none() -> Span {
        Span::new(Arc::from(""), 0, 0, 0, 0)
    }

    /// The length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no text.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// The span of `text[range]`, where `text` is the source text starting at
    /// this span. Line and column advance over `text[..range.start]`.
    pub fn within(&self, text: &str, range: std::ops::Range<usize>) -> Span {
        let mut line = self.line;
        let mut column = self.column;
        for c in text[..range.start].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Span::new(
            self.file.clone(),
            self.start + range.start,
            self.start + range.end,
            line,
            column,
        )
    }

    /// Grow the span to also cover `other`.
    ///
    /// A span is only ever widened, never narrowed.
    pub fn widen(&mut self, other: &Span) {
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }
}

/// A token produced by a scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<K> {
    /// The type of the token.
    pub kind: K,
    /// The location of the token in the input.
    pub span: Span,
    /// The matched text.
    pub text: String,
    /// The tokens skipped right before this one, e.g. whitespace.
    pub skipped: Vec<Token<K>>,
    /// An optional value parsed from the text.
    pub value: Option<Value>,
}

impl<K> Token<K> {
    /// Create a new token.
    pub fn new<S: Into<String>>(kind: K, span: Span, text: S) -> Token<K> {
        Token {
            kind,
            span,
            text: text.into(),
            skipped: Vec::new(),
            value: None,
        }
    }
}

impl<K: fmt::Debug> fmt::Display for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} '{}'", self.kind, self.text)
    }
}

/// An error found while parsing.
///
/// The grammar compiler uses the same record for its diagnostics; the code
/// tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError {
    /// The numeric error code.
    pub code: u32,
    /// A human-readable description.
    pub message: String,
    /// The file the error occurred in.
    pub file: String,
    /// The 1-based line.
    pub line: usize,
    /// The 1-based column.
    pub column: usize,
    /// The byte offset into the input.
    pub position: usize,
    /// The length of the offending text in bytes.
    pub length: usize,
}

impl ParseError {
    /// Create an error located at a span.
    pub fn new<S: Into<String>>(code: u32, message: S, span: &Span) -> ParseError {
        ParseError {
            code,
            message: message.into(),
            file: span.file.to_string(),
            line: span.line,
            column: span.column,
            position: span.start,
            length: span.len(),
        }
    }

    /// Create an error that is not tied to any location.
    pub fn unlocated<S: Into<String>>(code: u32, message: S) -> ParseError {
        ParseError::new(code, message, &Span::none())
    }

    /// Create an error for a token that is not what the parser expected.
    pub fn unexpected<K>(code: u32, token: &Token<K>, expected: &str) -> ParseError {
        ParseError::new(
            code,
            format!(
                "Unexpected token '{}' found. Expected {}",
                token.text.replace('\n', ""),
                expected
            ),
            &token.span,
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{}): {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

/// A dynamically typed value produced while evaluating a parse tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
}

impl Value {
    /// Whether this is `Nil`.
    pub fn is_nil(&self) -> bool {
        match *self {
            Value::Nil => true,
            _ => false,
        }
    }

    /// Interpret the value as an integer, parsing strings if necessary.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::Float(v) => Some(v as i64),
            Value::Bool(v) => Some(v as i64),
            Value::Str(ref s) => s.trim().parse().ok(),
            Value::Nil => None,
        }
    }

    /// Interpret the value as a float, parsing strings if necessary.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Int(v) => Some(v as f64),
            Value::Float(v) => Some(v),
            Value::Bool(_) | Value::Nil => None,
            Value::Str(ref s) => s.trim().parse().ok(),
        }
    }

    /// Borrow the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Str(ref s) => Some(s),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Nil
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(ref s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(v: &'a str) -> Value {
        Value::Str(v.to_string())
    }
}

/// A parser produced by the code generator.
///
/// Debug builds of generated parsers implement this so that a host can drive
/// them without knowing the concrete type.
pub trait GeneratedParser {
    /// The token and node kinds of the parser.
    type Kind: TokenKind;

    /// Parse an input text into a tree.
    fn parse(&mut self, input: &str, file: &str) -> ParseTree<Self::Kind>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Span {
        Span::new(Arc::from("test"), start, end, 1, start + 1)
    }

    #[test]
    fn widen_never_narrows() {
        let mut s = span(4, 6);
        s.widen(&span(5, 5));
        assert_eq!((s.start, s.end), (4, 6));
        s.widen(&span(2, 9));
        assert_eq!((s.start, s.end), (2, 9));
    }

    #[test]
    fn sub_spans_track_lines() {
        let s = Span::new(Arc::from("test"), 10, 20, 3, 5);
        let inner = s.within("ab\n  cd", 5..7);
        assert_eq!((inner.start, inner.end), (15, 17));
        assert_eq!((inner.line, inner.column), (4, 3));
        let first = s.within("ab\n  cd", 1..2);
        assert_eq!((first.line, first.column), (3, 6));
    }

    #[test]
    fn unexpected_message() {
        let tok = Token::new("IDENT", span(0, 3), "ab\nc");
        let err = ParseError::unexpected(codes::UNEXPECTED_TOKEN, &tok, "NUMBER");
        assert_eq!(err.message, "Unexpected token 'abc' found. Expected NUMBER");
        assert_eq!(err.code, 0x1001);
        assert_eq!(err.length, 3);
        assert_eq!(format!("{}", err), "(1,1): Unexpected token 'abc' found. Expected NUMBER");
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from("42").as_int(), Some(42));
        assert_eq!(Value::from(2.5).as_float(), Some(2.5));
        assert_eq!(Value::Nil.as_int(), None);
        assert!(Value::default().is_nil());
    }
}
