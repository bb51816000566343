// Copyright (c) 2018 Fabian Schuiki

//! A lexer for grammar descriptions.

use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::Arc;

use tinypg_runtime::{self as rt, Span, Value};

use crate::diag::{codes, Diagnostics};

/// A token of a grammar description.
pub type Token = rt::Token<TokenKind>;

/// The tokens that may appear in a grammar description.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Root,
    /// A character that does not start any token.
    Unknown,
    Ident,
    /// A quoted string. The token value holds the unescaped contents.
    Str,
    /// An action code block. The token value holds the trimmed contents.
    Code,
    Integer,
    Hex,
    Double,
    At,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Equals,
    Arrow,
    Pipe,
    Question,
    Star,
    Plus,
    Whitespace,
    Comment,
    Eof,
}

impl rt::TokenKind for TokenKind {
    fn undetermined() -> TokenKind {
        TokenKind::Unknown
    }
    fn root() -> TokenKind {
        TokenKind::Root
    }
}

/// A lexer for tinypg grammar descriptions.
///
/// Whitespace and comments are attached to the following token as skipped
/// tokens. A `{` directly after `@Name` opens a directive block; any other
/// `{` starts a balanced action code block. The last token is always `Eof`.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    file: Arc<str>,
    line: usize,
    column: usize,
    history: [TokenKind; 2],
    done: bool,
    diagnostics: Diagnostics,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    pub fn new(input: &'a str, file: &str) -> Lexer<'a> {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
            file: Arc::from(file),
            line: 1,
            column: 1,
            history: [TokenKind::Root, TokenKind::Root],
            done: false,
            diagnostics: Diagnostics::new(),
        }
    }

    /// The problems found while lexing so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Consume the lexer and return its diagnostics.
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn offset(&mut self) -> usize {
        match self.chars.peek() {
            Some(&(p, _)) => p,
            None => self.input.len(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next().map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat_while<F: Fn(char) -> bool>(&mut self, f: F) {
        while let Some(c) = self.peek() {
            if !f(c) {
                break;
            }
            self.bump();
        }
    }

    /// Lex one token, skipped or not, starting at the current position.
    fn lex_raw(&mut self) -> Token {
        let start = self.offset();
        let (line, column) = (self.line, self.column);
        let mut value = None;
        let kind = match self.bump() {
            None => TokenKind::Eof,
            Some(c) if c.is_whitespace() => {
                self.eat_while(char::is_whitespace);
                TokenKind::Whitespace
            }
            Some('/') if self.peek() == Some('/') => {
                self.eat_while(|c| c != '\n');
                TokenKind::Comment
            }
            Some('/') if self.peek() == Some('*') => {
                self.bump();
                let mut closed = false;
                while let Some(c) = self.bump() {
                    if c == '*' && self.peek() == Some('/') {
                        self.bump();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    self.unterminated("comment", start, line, column);
                }
                TokenKind::Comment
            }
            Some('-') if self.peek() == Some('>') => {
                self.bump();
                TokenKind::Arrow
            }
            Some(q @ '"') | Some(q @ '\'') => {
                value = Some(Value::Str(self.lex_string(q, start, line, column)));
                TokenKind::Str
            }
            Some('{') if self.history == [TokenKind::At, TokenKind::Ident] => TokenKind::LBrace,
            Some('{') => {
                value = Some(Value::Str(self.lex_code(start, line, column)));
                TokenKind::Code
            }
            Some('0') if self.peek() == Some('x') || self.peek() == Some('X') => {
                self.bump();
                self.eat_while(|c| c.is_ascii_hexdigit());
                TokenKind::Hex
            }
            Some(c) if c.is_ascii_digit() => {
                self.eat_while(|c| c.is_ascii_digit());
                if self.peek() == Some('.') && self.peek_second().map_or(false, |c| c.is_ascii_digit()) {
                    self.bump();
                    self.eat_while(|c| c.is_ascii_digit());
                    TokenKind::Double
                } else {
                    TokenKind::Integer
                }
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                self.eat_while(|c| c.is_alphanumeric() || c == '_');
                TokenKind::Ident
            }
            Some('@') => TokenKind::At,
            Some('}') => TokenKind::RBrace,
            Some('[') => TokenKind::LBracket,
            Some(']') => TokenKind::RBracket,
            Some('(') => TokenKind::LParen,
            Some(')') => TokenKind::RParen,
            Some(',') => TokenKind::Comma,
            Some(';') => TokenKind::Semicolon,
            Some('=') => TokenKind::Equals,
            Some('|') => TokenKind::Pipe,
            Some('?') => TokenKind::Question,
            Some('*') => TokenKind::Star,
            Some('+') => TokenKind::Plus,
            Some(_) => TokenKind::Unknown,
        };
        let end = self.offset();
        let span = Span::new(self.file.clone(), start, end, line, column);
        let text = if kind == TokenKind::Eof {
            "EOF"
        } else {
            &self.input[start..end]
        };
        let mut tok = Token::new(kind, span, text);
        tok.value = value;
        tok
    }

    /// Lex the remainder of a string whose opening quote `q` has been
    /// consumed. A backslash only escapes the delimiter; all other
    /// backslashes are kept so regular expressions pass through verbatim.
    fn lex_string(&mut self, q: char, start: usize, line: usize, column: usize) -> String {
        let mut buffer = String::new();
        loop {
            match self.bump() {
                None => {
                    self.unterminated("string", start, line, column);
                    break;
                }
                Some(c) if c == q => break,
                Some('\\') => match self.peek() {
                    Some(c) if c == q => {
                        self.bump();
                        buffer.push(c);
                    }
                    Some('\\') => {
                        self.bump();
                        buffer.push_str("\\\\");
                    }
                    _ => buffer.push('\\'),
                },
                Some(c) => buffer.push(c),
            }
        }
        buffer
    }

    /// Lex the remainder of a code block whose opening brace has been
    /// consumed.
    fn lex_code(&mut self, start: usize, line: usize, column: usize) -> String {
        let body_start = self.offset();
        let mut depth = 1;
        let mut body_end = None;
        while let Some(c) = self.peek() {
            let p = self.offset();
            self.bump();
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        body_end = Some(p);
                        break;
                    }
                }
                _ => (),
            }
        }
        match body_end {
            Some(end) => self.input[body_start..end].trim().to_string(),
            None => {
                self.unterminated("code block", start, line, column);
                self.input[body_start..].trim().to_string()
            }
        }
    }

    fn unterminated(&mut self, what: &str, start: usize, line: usize, column: usize) {
        let span = Span::new(self.file.clone(), start, self.offset(), line, column);
        self.diagnostics
            .error(codes::UNTERMINATED, format!("Unterminated {}", what), &span);
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let mut skipped = Vec::new();
        loop {
            let mut tok = self.lex_raw();
            let kind = tok.kind;
            match kind {
                TokenKind::Whitespace | TokenKind::Comment => skipped.push(tok),
                kind => {
                    self.done = kind == TokenKind::Eof;
                    self.history = [self.history[1], kind];
                    tok.skipped = skipped;
                    return Some(tok);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::TokenKind::*;

    fn lex<S: AsRef<str>>(input: S) -> Vec<TokenKind> {
        Lexer::new(input.as_ref(), "test").map(|t| t.kind).collect()
    }

    fn string_value(input: &str) -> String {
        let tok = Lexer::new(input, "test").next().unwrap();
        assert_eq!(tok.kind, Str);
        tok.value.unwrap().as_str().unwrap().to_string()
    }

    #[test]
    fn productions() {
        assert_eq!(
            lex("NUMBER -> \"[0-9]+\";"),
            vec![Ident, Arrow, Str, Semicolon, Eof]
        );
        assert_eq!(
            lex("Start -> (A | b)* c+ d? {code};"),
            vec![
                Ident, Arrow, LParen, Ident, Pipe, Ident, RParen, Star, Ident, Plus, Ident,
                Question, Code, Semicolon, Eof,
            ]
        );
    }

    #[test]
    fn directives_and_attributes() {
        assert_eq!(
            lex("@TinyPG { Namespace = \"x\"; } [Color(1, 0xff, 2.5)]"),
            vec![
                At, Ident, LBrace, Ident, Equals, Str, Semicolon, RBrace, LBracket, Ident,
                LParen, Integer, Comma, Hex, Comma, Double, RParen, RBracket, Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let toks: Vec<_> = Lexer::new("| // comment\n /* multi \n line */ ;", "t").collect();
        assert_eq!(toks.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![Pipe, Semicolon, Eof]);
        assert_eq!(toks[1].skipped.len(), 5);
        assert_eq!((toks[1].span.line, toks[1].span.column), (3, 10));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(string_value(r#""a\"b""#), "a\"b");
        assert_eq!(string_value(r#"'it\'s'"#), "it's");
        assert_eq!(string_value(r#""\s+\d""#), "\\s+\\d");
        assert_eq!(string_value(r#""\\""#), "\\\\");
    }

    #[test]
    fn code_blocks_nest() {
        let toks: Vec<_> = Lexer::new("A -> b { if x { y } else { z } };", "t").collect();
        assert_eq!(toks[3].kind, Code);
        assert_eq!(toks[3].value, Some(Value::from("if x { y } else { z }")));
        assert_eq!(toks[4].kind, Semicolon);
    }

    #[test]
    fn unterminated_constructs() {
        let mut lexer = Lexer::new("\"abc", "t");
        assert_eq!(lexer.by_ref().map(|t| t.kind).collect::<Vec<_>>(), vec![Str, Eof]);
        assert_eq!(lexer.diagnostics().codes(), vec![codes::UNTERMINATED]);

        let mut lexer = Lexer::new("A -> b { x ;", "t");
        lexer.by_ref().count();
        assert_eq!(lexer.diagnostics().codes(), vec![codes::UNTERMINATED]);
    }

    #[test]
    fn unknown_characters() {
        assert_eq!(lex("A # B"), vec![Ident, Unknown, Ident, Eof]);
    }
}
