// Copyright (c) 2018 Fabian Schuiki

//! A parser for grammar descriptions.

use tinypg_runtime::Value;

use crate::diag::{codes, Diagnostic, Diagnostics};
use crate::lexer::{Lexer, Token, TokenKind};

/// The abstract syntax tree of a grammar description.
pub mod ast {
    use tinypg_runtime::Span;

    /// A node annotated with the region of text it was parsed from.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Spanned<T> {
        /// The node.
        pub value: T,
        /// The region of text.
        pub span: Span,
    }

    impl<T> Spanned<T> {
        /// Wrap a node.
        pub fn new(value: T, span: Span) -> Spanned<T> {
            Spanned { value, span }
        }
    }

    /// The root node of a grammar description.
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Desc {
        /// The directives and productions, in order of appearance.
        pub items: Vec<Item>,
    }

    /// An item in the grammar description.
    #[allow(missing_docs)]
    #[derive(Debug, Clone, PartialEq)]
    pub enum Item {
        Directive(DirectiveDecl),
        Production(ProductionDecl),
    }

    /// A directive block such as `@TinyPG { Namespace = "x"; }`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct DirectiveDecl {
        /// The name after the `@`.
        pub name: Spanned<String>,
        /// The key-value pairs.
        pub values: Vec<NameValue>,
    }

    /// A `key = "value";` pair inside a directive.
    #[derive(Debug, Clone, PartialEq)]
    pub struct NameValue {
        /// The key.
        pub key: Spanned<String>,
        /// The unquoted value.
        pub value: Spanned<String>,
    }

    /// An attribute such as `[Color(255, 0, 0)]`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct AttributeDecl {
        /// The name of the attribute.
        pub name: Spanned<String>,
        /// The parameters.
        pub params: Vec<Spanned<Param>>,
        /// The region of the whole attribute.
        pub span: Span,
    }

    /// An attribute parameter, as written.
    #[allow(missing_docs)]
    #[derive(Debug, Clone, PartialEq)]
    pub enum Param {
        Integer(String),
        Hex(String),
        Double(String),
        Str(String),
    }

    /// A production `Name -> ... ;`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ProductionDecl {
        /// The declared name.
        pub name: Spanned<String>,
        /// The attributes before and after the name.
        pub attributes: Vec<AttributeDecl>,
        /// The right hand side.
        pub rhs: Rhs,
        /// The action code, if any.
        pub code: Option<Spanned<String>>,
    }

    /// The right hand side of a production.
    #[allow(missing_docs)]
    #[derive(Debug, Clone, PartialEq)]
    pub enum Rhs {
        /// A lone string declares a terminal.
        Pattern(Spanned<String>),
        /// Anything else declares a nonterminal.
        Rule(Expr),
    }

    /// A rule expression.
    #[allow(missing_docs)]
    #[derive(Debug, Clone, PartialEq)]
    pub enum Expr {
        Ident(Spanned<String>),
        /// A string inside a rule, matched literally.
        Literal(Spanned<String>),
        Choice(Vec<Expr>),
        Concat(Vec<Expr>),
        Option(Box<Expr>),
        ZeroOrMore(Box<Expr>),
        OneOrMore(Box<Expr>),
    }
}

/// Parse a grammar description.
///
/// Syntax errors are reported and the parser resynchronizes at the next `;`
/// or `}`, such that one pass reports as many errors as possible.
pub fn parse(input: &str, file: &str) -> (ast::Desc, Diagnostics) {
    let mut lexer = Lexer::new(input, file);
    let tokens: Vec<Token> = lexer.by_ref().collect();
    let mut p = Parser {
        tokens,
        pos: 0,
        diagnostics: lexer.into_diagnostics(),
    };
    let desc = p.parse_desc();
    (desc, p.diagnostics)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Diagnostics,
}

type Parsed<T> = Option<T>;

impl Parser {
    fn peek(&self) -> &Token {
        // The lexer always ends the stream with an `Eof` token.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek_kind() == kind {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Parsed<Token> {
        match self.accept(kind) {
            Some(tok) => Some(tok),
            None => {
                self.unexpected(expected);
                None
            }
        }
    }

    fn unexpected(&mut self, expected: &str) {
        let err = Diagnostic::unexpected(codes::SYNTAX_ERROR, self.peek(), expected);
        self.diagnostics.push(err);
    }

    /// Skip tokens up to and including the next `;` or `}`.
    fn recover(&mut self) {
        loop {
            match self.bump().kind {
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => return,
                _ => (),
            }
        }
    }

    fn parse_desc(&mut self) -> ast::Desc {
        let mut desc = ast::Desc::default();
        loop {
            let item = match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::At => self.parse_directive().map(ast::Item::Directive),
                TokenKind::Ident | TokenKind::LBracket => {
                    self.parse_production().map(ast::Item::Production)
                }
                _ => {
                    self.unexpected("a directive or production");
                    None
                }
            };
            match item {
                Some(item) => desc.items.push(item),
                None => self.recover(),
            }
        }
        desc
    }

    fn parse_directive(&mut self) -> Parsed<ast::DirectiveDecl> {
        self.expect(TokenKind::At, "'@'")?;
        let name = spanned_text(self.expect(TokenKind::Ident, "directive name")?);
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut values = Vec::new();
        while self.accept(TokenKind::RBrace).is_none() {
            let key = spanned_text(self.expect(TokenKind::Ident, "directive key or '}'")?);
            self.expect(TokenKind::Equals, "'='")?;
            let value = spanned_string(self.expect(TokenKind::Str, "string")?);
            self.expect(TokenKind::Semicolon, "';'")?;
            values.push(ast::NameValue { key, value });
        }
        Some(ast::DirectiveDecl { name, values })
    }

    fn parse_attributes(&mut self, into: &mut Vec<ast::AttributeDecl>) -> Parsed<()> {
        while self.peek_kind() == TokenKind::LBracket {
            let open = self.bump();
            let name = spanned_text(self.expect(TokenKind::Ident, "attribute name")?);
            let mut params = Vec::new();
            if self.accept(TokenKind::LParen).is_some() {
                if self.peek_kind() != TokenKind::RParen {
                    loop {
                        params.push(self.parse_param()?);
                        if self.accept(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "')'")?;
            }
            let close = self.expect(TokenKind::RBracket, "']'")?;
            let mut span = open.span;
            span.widen(&close.span);
            into.push(ast::AttributeDecl { name, params, span });
        }
        Some(())
    }

    fn parse_param(&mut self) -> Parsed<ast::Spanned<ast::Param>> {
        let param = match self.peek_kind() {
            TokenKind::Integer => ast::Param::Integer(self.peek().text.clone()),
            TokenKind::Hex => ast::Param::Hex(self.peek().text.clone()),
            TokenKind::Double => ast::Param::Double(self.peek().text.clone()),
            TokenKind::Str => ast::Param::Str(string_value(self.peek())),
            _ => {
                self.unexpected("attribute parameter");
                return None;
            }
        };
        Some(ast::Spanned::new(param, self.bump().span))
    }

    fn parse_production(&mut self) -> Parsed<ast::ProductionDecl> {
        let mut attributes = Vec::new();
        self.parse_attributes(&mut attributes)?;
        let name = spanned_text(self.expect(TokenKind::Ident, "production name")?);
        self.parse_attributes(&mut attributes)?;
        self.expect(TokenKind::Arrow, "'->'")?;
        let rhs = if self.peek_kind() == TokenKind::Str
            && self.peek_kind_at(1) == TokenKind::Semicolon
        {
            ast::Rhs::Pattern(spanned_string(self.bump()))
        } else {
            ast::Rhs::Rule(self.parse_subrule()?)
        };
        let code = self.accept(TokenKind::Code).map(spanned_code);
        self.expect(TokenKind::Semicolon, "';'")?;
        Some(ast::ProductionDecl {
            name,
            attributes,
            rhs,
            code,
        })
    }

    fn parse_subrule(&mut self) -> Parsed<ast::Expr> {
        let mut alts = vec![self.parse_concat()?];
        while self.accept(TokenKind::Pipe).is_some() {
            alts.push(self.parse_concat()?);
        }
        Some(if alts.len() == 1 {
            alts.pop()?
        } else {
            ast::Expr::Choice(alts)
        })
    }

    fn parse_concat(&mut self) -> Parsed<ast::Expr> {
        let mut seq = vec![self.parse_symbol()?];
        while starts_symbol(self.peek_kind()) {
            seq.push(self.parse_symbol()?);
        }
        Some(if seq.len() == 1 {
            seq.pop()?
        } else {
            ast::Expr::Concat(seq)
        })
    }

    fn parse_symbol(&mut self) -> Parsed<ast::Expr> {
        let primary = match self.peek_kind() {
            TokenKind::Ident => ast::Expr::Ident(spanned_text(self.bump())),
            TokenKind::Str => ast::Expr::Literal(spanned_string(self.bump())),
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_subrule()?;
                self.expect(TokenKind::RParen, "')'")?;
                inner
            }
            _ => {
                self.unexpected("symbol, string, or '('");
                return None;
            }
        };
        Some(match self.peek_kind() {
            TokenKind::Question => {
                self.bump();
                ast::Expr::Option(Box::new(primary))
            }
            TokenKind::Star => {
                self.bump();
                ast::Expr::ZeroOrMore(Box::new(primary))
            }
            TokenKind::Plus => {
                self.bump();
                ast::Expr::OneOrMore(Box::new(primary))
            }
            _ => primary,
        })
    }
}

fn starts_symbol(kind: TokenKind) -> bool {
    match kind {
        TokenKind::Ident | TokenKind::Str | TokenKind::LParen => true,
        _ => false,
    }
}

fn string_value(tok: &Token) -> String {
    match tok.value {
        Some(Value::Str(ref s)) => s.clone(),
        _ => tok.text.clone(),
    }
}

fn spanned_text(tok: Token) -> ast::Spanned<String> {
    ast::Spanned::new(tok.text, tok.span)
}

fn spanned_string(tok: Token) -> ast::Spanned<String> {
    let value = string_value(&tok);
    ast::Spanned::new(value, tok.span)
}

/// A code block, spanning only the trimmed text between the braces.
fn spanned_code(tok: Token) -> ast::Spanned<String> {
    let body = string_value(&tok);
    let inner = tok.text.get(1..).unwrap_or("");
    let offset = 1 + inner.len() - inner.trim_start().len();
    let span = if offset + body.len() <= tok.text.len() {
        tok.span.within(&tok.text, offset..offset + body.len())
    } else {
        tok.span.clone()
    };
    ast::Spanned::new(body, span)
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;

    fn parse_ok(input: &str) -> Desc {
        let (desc, diag) = parse(input, "test");
        assert!(diag.is_empty(), "unexpected diagnostics:\n{}", diag);
        desc
    }

    fn production(desc: &Desc, idx: usize) -> &ProductionDecl {
        match desc.items[idx] {
            Item::Production(ref p) => p,
            ref other => panic!("item {} is not a production: {:?}", idx, other),
        }
    }

    fn ident(expr: &Expr) -> &str {
        match *expr {
            Expr::Ident(ref s) | Expr::Literal(ref s) => &s.value,
            ref other => panic!("{:?} is not a leaf", other),
        }
    }

    #[test]
    fn terminal_and_rule() {
        let desc2 = parse_ok("NUMBER -> \"[0-9]+\"; Add -> NUMBER '+' NUMBER;");
        assert_eq!(desc2.items.len(), 2);
        match production(&desc2, 0).rhs {
            Rhs::Pattern(ref p) => assert_eq!(p.value, "[0-9]+"),
            ref other => panic!("expected pattern, got {:?}", other),
        }
        match production(&desc2, 1).rhs {
            Rhs::Rule(Expr::Concat(ref seq)) => {
                assert_eq!(seq.iter().map(ident).collect::<Vec<_>>(), vec!["NUMBER", "+", "NUMBER"]);
                assert!(match seq[1] {
                    Expr::Literal(_) => true,
                    _ => false,
                });
            }
            ref other => panic!("expected concat, got {:?}", other),
        }
    }

    #[test]
    fn precedence_of_operators() {
        let desc = parse_ok("Start -> a b | (c | d)* e? f+;");
        let rule = match production(&desc, 0).rhs {
            Rhs::Rule(ref e) => e.clone(),
            _ => unreachable!(),
        };
        let alts = match rule {
            Expr::Choice(alts) => alts,
            other => panic!("expected choice, got {:?}", other),
        };
        assert_eq!(alts.len(), 2);
        match alts[1] {
            Expr::Concat(ref seq) => {
                assert_eq!(seq.len(), 3);
                match seq[0] {
                    Expr::ZeroOrMore(ref inner) => match **inner {
                        Expr::Choice(ref c) => assert_eq!(c.len(), 2),
                        ref other => panic!("{:?}", other),
                    },
                    ref other => panic!("{:?}", other),
                }
                assert!(match seq[1] { Expr::Option(_) => true, _ => false });
                assert!(match seq[2] { Expr::OneOrMore(_) => true, _ => false });
            }
            ref other => panic!("{:?}", other),
        }
    }

    #[test]
    fn directives_attributes_and_code() {
        let desc = parse_ok(
            "@TinyPG { Namespace = \"Calc\"; Language = \"rust\"; }\n\
             [Skip] WS -> \"\\s+\";\n\
             NUM [Color(255, 0x10, 0)] -> \"[0-9]+\";\n\
             Start -> NUM { $NUM[0] };",
        );
        match desc.items[0] {
            Item::Directive(ref d) => {
                assert_eq!(d.name.value, "TinyPG");
                assert_eq!(d.values.len(), 2);
                assert_eq!(d.values[1].key.value, "Language");
                assert_eq!(d.values[1].value.value, "rust");
            }
            ref other => panic!("{:?}", other),
        }
        assert_eq!(production(&desc, 1).attributes[0].name.value, "Skip");
        let color = &production(&desc, 2).attributes[0];
        assert_eq!(
            color.params.iter().map(|p| p.value.clone()).collect::<Vec<_>>(),
            vec![
                Param::Integer("255".into()),
                Param::Hex("0x10".into()),
                Param::Integer("0".into()),
            ]
        );
        assert_eq!(production(&desc, 3).code.as_ref().map(|c| c.value.as_str()), Some("$NUM[0]"));
    }

    #[test]
    fn recovers_after_syntax_errors() {
        let (desc, diag) = parse("A -> ;\nB -> x;\nC -> ( y;\nD -> z;", "test");
        assert_eq!(diag.codes(), vec![codes::SYNTAX_ERROR, codes::SYNTAX_ERROR]);
        let names: Vec<_> = desc
            .items
            .iter()
            .map(|i| match *i {
                Item::Production(ref p) => p.name.value.clone(),
                Item::Directive(ref d) => d.name.value.clone(),
            })
            .collect();
        assert_eq!(names, vec!["B", "D"]);
        assert_eq!(diag.iter().next().map(|d| d.message.clone()),
                   Some("Unexpected token ';' found. Expected symbol, string, or '('".to_string()));
    }
}
