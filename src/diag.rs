// Copyright (c) 2018 Fabian Schuiki

//! Diagnostics emitted while compiling a grammar.

use std::fmt;

use tinypg_runtime::{ParseError, Span};

/// A diagnostic message.
///
/// Grammar compilation and generated parsers share the same record. The code
/// tells the two apart, see [`is_runtime`].
pub type Diagnostic = ParseError;

/// The stable diagnostic codes.
#[allow(missing_docs)]
pub mod codes {
    pub use tinypg_runtime::codes::{NO_ALTERNATIVE, UNEXPECTED_TOKEN};

    pub const SYNTAX_ERROR: u32 = 0x1010;
    pub const UNTERMINATED: u32 = 0x1011;
    pub const UNMATCHED_VARIABLE: u32 = 0x1016;
    pub const INVALID_REGEX: u32 = 0x1020;
    pub const START_IS_TERMINAL: u32 = 0x1021;
    pub const DUPLICATE_TERMINAL: u32 = 0x1022;
    pub const NAME_CLASH: u32 = 0x1023;
    pub const START_REQUIRED: u32 = 0x0024;
    pub const DUPLICATE_DIRECTIVE: u32 = 0x1030;
    pub const UNSUPPORTED_DIRECTIVE: u32 = 0x1031;
    pub const UNSUPPORTED_KEY: u32 = 0x1034;
    pub const NONTERMINAL_ATTRIBUTE: u32 = 0x1035;
    pub const UNSUPPORTED_ATTRIBUTE: u32 = 0x1036;
    pub const INVALID_PARAMETER: u32 = 0x1037;
    pub const PARAMETER_RANGE: u32 = 0x1038;
    pub const DUPLICATE_ATTRIBUTE: u32 = 0x1039;
    pub const COLOR_PARAMETERS: u32 = 0x103A;
    pub const UNDECLARED_OPERAND: u32 = 0x1042;
    pub const UNDECLARED_SYMBOL: u32 = 0x1043;
    pub const LEFT_RECURSION: u32 = 0x1050;
    pub const TEMPLATE_PATH: u32 = 0x1060;
    pub const OUTPUT_PATH: u32 = 0x1061;
    pub const LANGUAGE: u32 = 0x1062;
    pub const TEMPLATE_DIR_UNRESOLVED: u32 = 0x1063;
    pub const TEMPLATE_UNREADABLE: u32 = 0x1064;
    pub const UNKNOWN_MARKER: u32 = 0x1065;
}

/// Check whether a code belongs to errors raised by generated parsers at run
/// time, as opposed to grammar compilation.
pub fn is_runtime(code: u32) -> bool {
    code == codes::NO_ALTERNATIVE || code == codes::UNEXPECTED_TOKEN
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Diagnostics {
        Diagnostics { list: Vec::new() }
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        debug!("diagnostic 0x{:04X}: {}", diag.code, diag.message);
        self.list.push(diag);
    }

    /// Append a diagnostic located at a span.
    pub fn error<S: Into<String>>(&mut self, code: u32, message: S, span: &Span) {
        self.push(Diagnostic::new(code, message, span));
    }

    /// Append a diagnostic that has no location.
    pub fn unlocated<S: Into<String>>(&mut self, code: u32, message: S) {
        self.push(Diagnostic::unlocated(code, message));
    }

    /// Move all diagnostics of another collection into this one.
    pub fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for d in iter {
            self.push(d);
        }
    }

    /// Whether no diagnostics have been collected.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The number of diagnostics.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether any diagnostic has the given code.
    pub fn contains(&self, code: u32) -> bool {
        self.list.iter().any(|d| d.code == code)
    }

    /// The codes of all diagnostics, in order.
    pub fn codes(&self) -> Vec<u32> {
        self.list.iter().map(|d| d.code).collect()
    }

    /// Get an iterator over the diagnostics.
    pub fn iter(&self) -> std::slice::Iter<Diagnostic> {
        self.list.iter()
    }

    /// Consume the collection.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.list
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;
    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for d in &self.list {
            if d.file.is_empty() {
                writeln!(f, "error 0x{:04X}: {}", d.code, d.message)?;
            } else {
                writeln!(f, "{}{}: error 0x{:04X}", d.file, d, d.code)?;
            }
        }
        Ok(())
    }
}
