// Copyright (c) 2018 Fabian Schuiki

//! A regular expression driven scanner.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::{Span, Token, TokenKind};

/// Compile a terminal pattern such that it only matches at the start of the
/// remaining input.
pub fn anchored(pattern: &str, ignore_case: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{})", pattern))
        .case_insensitive(ignore_case)
        .build()
}

/// A position in the input.
#[derive(Debug, Clone)]
struct Cursor {
    position: usize,
    line: usize,
    column: usize,
    file: Arc<str>,
}

impl Cursor {
    fn start(file: Arc<str>) -> Cursor {
        Cursor {
            position: 0,
            line: 1,
            column: 1,
            file,
        }
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += text.len();
    }

    fn span(&self, len: usize) -> Span {
        Span::new(
            self.file.clone(),
            self.position,
            self.position + len,
            self.line,
            self.column,
        )
    }
}

/// A scanner that splits input text into tokens on demand.
///
/// Patterns are tried in the order they were given. The longest match wins;
/// among equally long matches the earlier pattern wins. Skip tokens are
/// collected into the `skipped` list of the next significant token.
pub struct Scanner<K> {
    patterns: Vec<(K, Regex)>,
    skip: Vec<K>,
    file_and_line: Option<K>,
    line_directive: Regex,
    input: String,
    cursor: Cursor,
    cached: Option<(Token<K>, Cursor)>,
}

impl<K: TokenKind> Scanner<K> {
    /// Create a new scanner from a list of compiled patterns.
    pub fn new(patterns: Vec<(K, Regex)>, skip: Vec<K>, file_and_line: Option<K>) -> Scanner<K> {
        Scanner {
            patterns,
            skip,
            file_and_line,
            line_directive: Regex::new(r#"line (\d+)(?: "([^"]+)")?"#)
                .expect("line directive pattern is valid"),
            input: String::new(),
            cursor: Cursor::start(Arc::from("")),
            cached: None,
        }
    }

    /// Create a new scanner from pattern sources.
    ///
    /// Each entry holds the token kind, the pattern, and whether the pattern
    /// ignores case.
    pub fn compile(
        specs: &[(K, &str, bool)],
        skip: Vec<K>,
        file_and_line: Option<K>,
    ) -> Result<Scanner<K>, regex::Error> {
        let mut patterns = Vec::with_capacity(specs.len());
        for &(kind, pattern, ignore_case) in specs {
            patterns.push((kind, anchored(pattern, ignore_case)?));
        }
        Ok(Scanner::new(patterns, skip, file_and_line))
    }

    /// Reset the scanner to the start of a new input.
    pub fn init(&mut self, input: &str, file: &str) {
        self.input = input.to_string();
        self.cursor = Cursor::start(Arc::from(file));
        self.cached = None;
    }

    /// Create an empty token of the given kind at the current position.
    pub fn here(&self, kind: K) -> Token<K> {
        Token::new(kind, self.cursor.span(0), "")
    }

    /// Peek at the next significant token without consuming it.
    ///
    /// Only the `expected` kinds and the skip kinds are tried; if `expected`
    /// is empty, all kinds are. A determined lookahead is cached until it is
    /// consumed by `scan`.
    pub fn look_ahead(&mut self, expected: &[K]) -> &Token<K> {
        let next = self.take_lookahead(expected);
        &self.cached.insert(next).0
    }

    /// Consume the next significant token.
    pub fn scan(&mut self, expected: &[K]) -> Token<K> {
        let (tok, cursor) = self.take_lookahead(expected);
        self.cursor = cursor;
        tok
    }

    /// Take the cached lookahead if it is determined, else scan afresh.
    fn take_lookahead(&mut self, expected: &[K]) -> (Token<K>, Cursor) {
        match self.cached.take() {
            Some(next) if next.0.kind != K::undetermined() => next,
            _ => self.scan_from(self.cursor.clone(), expected),
        }
    }

    fn scan_from(&self, mut cursor: Cursor, expected: &[K]) -> (Token<K>, Cursor) {
        let mut skipped = Vec::new();
        loop {
            let rest = &self.input[cursor.position..];
            let mut best: Option<(K, usize)> = None;
            for &(kind, ref regex) in &self.patterns {
                let is_skip = self.skip.contains(&kind);
                if !expected.is_empty() && !is_skip && !expected.contains(&kind) {
                    continue;
                }
                if let Some(m) = regex.find(rest) {
                    // An empty skip match would never advance.
                    if is_skip && m.end() == 0 {
                        continue;
                    }
                    if best.map_or(true, |(_, len)| m.end() > len) {
                        best = Some((kind, m.end()));
                    }
                }
            }

            let mut tok = match best {
                Some((kind, len)) => Token::new(kind, cursor.span(len), &rest[..len]),
                None => {
                    let text = match rest.chars().next() {
                        Some(c) => c.to_string(),
                        None => "EOF".to_string(),
                    };
                    Token::new(K::undetermined(), cursor.span(0), text)
                }
            };
            if best.is_some() {
                cursor.advance(&tok.text);
            }

            if best.is_some() && self.skip.contains(&tok.kind) {
                if Some(tok.kind) == self.file_and_line {
                    self.apply_line_directive(&tok.text, &mut cursor);
                }
                skipped.push(tok);
                continue;
            }
            tok.skipped = skipped;
            return (tok, cursor);
        }
    }

    fn apply_line_directive(&self, text: &str, cursor: &mut Cursor) {
        if let Some(caps) = self.line_directive.captures(text) {
            if let Ok(line) = caps[1].parse::<usize>() {
                cursor.line = if text.ends_with('\n') {
                    line
                } else {
                    line.saturating_sub(1)
                };
            }
            if let Some(file) = caps.get(2) {
                cursor.file = Arc::from(file.as_str());
            }
        }
    }
}
