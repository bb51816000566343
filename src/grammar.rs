// Copyright (c) 2018 Fabian Schuiki

//! Data structures representing a grammar.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::iter::Enumerate;
use std::ops::{Index, IndexMut};
use std::slice::Iter;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;
use regex::Regex;
use tinypg_runtime::{anchored, Span};

use crate::directive::Directives;
use crate::first::FirstSets;
use crate::rule::{Rule, RuleKind, RuleNodeId};
use crate::Pretty;

/// An error adding a literal terminal.
#[derive(Debug)]
pub enum LiteralError {
    /// The escaped text does not compile as a regular expression.
    Regex(regex::Error),
    /// No unique name could be assigned to the literal.
    NameTaken(String),
}

impl From<regex::Error> for LiteralError {
    fn from(e: regex::Error) -> LiteralError {
        LiteralError::Regex(e)
    }
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LiteralError::Regex(ref e) => write!(f, "{}", e),
            LiteralError::NameTaken(ref text) => write!(f, "no name is left for literal '{}'", text),
        }
    }
}

impl std::error::Error for LiteralError {}

/// The name of the mandatory start production.
pub const START: &str = "Start";

/// A grammar.
///
/// The grammar owns its symbols and the rule trees of its nonterminals. Rule
/// trees refer to symbols by id. The FIRST sets are derived lazily on first
/// demand and discarded whenever the grammar is modified.
#[derive(Debug, Clone)]
pub struct Grammar {
    terms: Vec<Terminal>,
    nonterms: Vec<Nonterminal>,
    names: HashMap<String, SymbolRef>,
    literals: HashMap<String, TerminalId>,
    skip: IndexSet<TerminalId>,
    file_and_line: Option<TerminalId>,
    directives: Directives,
    next_node: usize,
    first: OnceCell<FirstSets>,
}

impl Grammar {
    /// Create a new empty grammar.
    pub fn new() -> Grammar {
        Grammar {
            terms: Vec::new(),
            nonterms: Vec::new(),
            names: HashMap::new(),
            literals: HashMap::new(),
            skip: IndexSet::new(),
            file_and_line: None,
            directives: Directives::new(),
            next_node: 0,
            first: OnceCell::new(),
        }
    }

    fn invalidate(&mut self) {
        if self.first.get().is_some() {
            trace!("discarding first sets");
            self.first = OnceCell::new();
        }
    }

    /// Add a terminal to the grammar.
    ///
    /// If a symbol with the same name already exists, the grammar is left
    /// unchanged and `None` is returned.
    pub fn add_terminal(&mut self, mut term: Terminal) -> Option<TerminalId> {
        if self.names.contains_key(&term.name) {
            return None;
        }
        self.invalidate();
        let id = TerminalId(self.terms.len());
        term.id = id;
        self.names.insert(term.name.clone(), SymbolRef::Terminal(id));
        self.terms.push(term);
        Some(id)
    }

    /// Add a nonterminal to the grammar.
    ///
    /// If a symbol with the same name already exists, the grammar is left
    /// unchanged and `None` is returned.
    pub fn add_nonterminal(&mut self, mut nonterm: Nonterminal) -> Option<NonterminalId> {
        if self.names.contains_key(&nonterm.name) {
            return None;
        }
        self.invalidate();
        let id = NonterminalId(self.nonterms.len());
        nonterm.id = id;
        self.names.insert(nonterm.name.clone(), SymbolRef::Nonterminal(id));
        self.nonterms.push(nonterm);
        Some(id)
    }

    /// Add a terminal that matches a piece of text literally.
    ///
    /// Each distinct text is added once. The identifier is derived from the
    /// text and made unique against the declared symbols and `reserved`.
    pub fn add_literal(
        &mut self,
        text: &str,
        reserved: &HashSet<String>,
        span: Span,
    ) -> Result<TerminalId, LiteralError> {
        if let Some(&id) = self.literals.get(text) {
            return Ok(id);
        }
        let mut name = literal_name(text, self.literals.len());
        while self.names.contains_key(&name) || reserved.contains(&name) {
            name.push('_');
        }
        let pattern = regex::escape(text);
        let regex = anchored(&pattern, false)?;
        let mut term = Terminal::new(name, pattern, regex, span);
        term.nice_name = Some(text.to_string());
        term.literal = true;
        let id = self
            .add_terminal(term)
            .ok_or_else(|| LiteralError::NameTaken(text.to_string()))?;
        self.literals.insert(text.to_string(), id);
        Ok(id)
    }

    /// Look up a symbol by name.
    pub fn lookup(&self, name: &str) -> Option<SymbolRef> {
        self.names.get(name).cloned()
    }

    /// Look up a terminal by name.
    pub fn terminal(&self, name: &str) -> Option<TerminalId> {
        match self.lookup(name) {
            Some(SymbolRef::Terminal(id)) => Some(id),
            _ => None,
        }
    }

    /// Look up a nonterminal by name.
    pub fn nonterminal(&self, name: &str) -> Option<NonterminalId> {
        match self.lookup(name) {
            Some(SymbolRef::Nonterminal(id)) => Some(id),
            _ => None,
        }
    }

    /// Look up the terminal that matches a piece of text literally.
    pub fn literal(&self, text: &str) -> Option<TerminalId> {
        self.literals.get(text).cloned()
    }

    /// The `Start` nonterminal.
    pub fn start(&self) -> Option<NonterminalId> {
        self.nonterminal(START)
    }

    /// Create a rule node with a fresh id.
    pub fn make_rule(&mut self, kind: RuleKind) -> Rule {
        let id = RuleNodeId(self.next_node);
        self.next_node += 1;
        Rule::new(id, kind)
    }

    /// Add an alternative to a nonterminal.
    pub fn add_alternative(&mut self, id: NonterminalId, rule: Rule) {
        self[id].alternatives.push(rule);
    }

    /// Find a rule node and the nonterminal it belongs to.
    pub fn find_rule(&self, id: RuleNodeId) -> Option<(NonterminalId, &Rule)> {
        for nt in &self.nonterms {
            for alt in &nt.alternatives {
                if let Some(r) = alt.find(id) {
                    return Some((nt.id, r));
                }
            }
        }
        None
    }

    /// Mark a terminal as skipped between significant tokens.
    pub fn add_skip(&mut self, id: TerminalId) {
        self.skip.insert(id);
    }

    /// Check whether a terminal is skipped.
    pub fn is_skip(&self, id: TerminalId) -> bool {
        self.skip.contains(&id)
    }

    /// Get an iterator over the skipped terminals, in declaration order of
    /// their attributes.
    pub fn skip_symbols<'a>(&'a self) -> impl Iterator<Item = TerminalId> + 'a {
        self.skip.iter().cloned()
    }

    /// The terminal that tracks file and line directives, if any.
    pub fn file_and_line(&self) -> Option<TerminalId> {
        self.file_and_line
    }

    /// Designate the terminal that tracks file and line directives.
    pub fn set_file_and_line(&mut self, id: TerminalId) {
        self.file_and_line = Some(id);
    }

    /// The directives of the grammar.
    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// The directives of the grammar, for modification.
    pub fn directives_mut(&mut self) -> &mut Directives {
        &mut self.directives
    }

    /// The FIRST sets of all nonterminals.
    ///
    /// Computed on first access and cached until the grammar changes.
    pub fn first_sets(&self) -> &FirstSets {
        self.first.get_or_init(|| FirstSets::compute(self))
    }

    /// Whether the FIRST sets are currently cached.
    pub fn has_first_sets(&self) -> bool {
        self.first.get().is_some()
    }

    /// The number of terminals.
    pub fn terminal_count(&self) -> usize {
        self.terms.len()
    }

    /// The number of nonterminals.
    pub fn nonterminal_count(&self) -> usize {
        self.nonterms.len()
    }

    /// Get an iterator over the terminals.
    pub fn terminals(&self) -> Terminals {
        Terminals(self.terms.iter().enumerate())
    }

    /// Get an iterator over the nonterminals.
    pub fn nonterminals(&self) -> Nonterminals {
        Nonterminals(self.nonterms.iter().enumerate())
    }
}

impl Default for Grammar {
    fn default() -> Grammar {
        Grammar::new()
    }
}

impl Index<TerminalId> for Grammar {
    type Output = Terminal;
    fn index(&self, idx: TerminalId) -> &Terminal {
        &self.terms[idx.0]
    }
}

impl IndexMut<TerminalId> for Grammar {
    fn index_mut(&mut self, idx: TerminalId) -> &mut Terminal {
        self.invalidate();
        &mut self.terms[idx.0]
    }
}

impl Index<NonterminalId> for Grammar {
    type Output = Nonterminal;
    fn index(&self, idx: NonterminalId) -> &Nonterminal {
        &self.nonterms[idx.0]
    }
}

impl IndexMut<NonterminalId> for Grammar {
    fn index_mut(&mut self, idx: NonterminalId) -> &mut Nonterminal {
        self.invalidate();
        &mut self.nonterms[idx.0]
    }
}

/// An iterator over the terminals of a grammar.
pub struct Terminals<'a>(Enumerate<Iter<'a, Terminal>>);

impl<'a> Iterator for Terminals<'a> {
    type Item = (TerminalId, &'a Terminal);
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(i, t)| (TerminalId(i), t))
    }
}

/// An iterator over the nonterminals of a grammar.
pub struct Nonterminals<'a>(Enumerate<Iter<'a, Nonterminal>>);

impl<'a> Iterator for Nonterminals<'a> {
    type Item = (NonterminalId, &'a Nonterminal);
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(i, t)| (NonterminalId(i), t))
    }
}

/// A parameter of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    /// An integer or hexadecimal number.
    Int(i64),
    /// A string.
    Str(String),
    /// A parameter that could not be evaluated.
    Invalid,
}

/// The attributes attached to a symbol, in order of appearance.
pub type Attributes = IndexMap<String, Vec<Param>>;

/// A terminal within a grammar.
///
/// Terminals are matched directly against the input text by a regular
/// expression.
#[derive(Debug, Clone)]
pub struct Terminal {
    /// The id of this terminal.
    pub id: TerminalId,
    /// The name of the terminal.
    pub name: String,
    /// The human-readable name of the terminal.
    pub nice_name: Option<String>,
    /// The regular expression as written.
    pub pattern: String,
    /// The compiled expression, anchored at the start of the input.
    pub regex: Regex,
    /// Whether the expression ignores case.
    pub ignore_case: bool,
    /// Whether this terminal was introduced by a literal in a rule.
    pub literal: bool,
    /// The attributes of the terminal.
    pub attributes: Attributes,
    /// Where the terminal was declared.
    pub span: Span,
}

impl Terminal {
    /// Create a new terminal.
    pub fn new<S: Into<String>, P: Into<String>>(name: S, pattern: P, regex: Regex, span: Span) -> Terminal {
        Terminal {
            id: ORPHAN_TERMINAL,
            name: name.into(),
            nice_name: None,
            pattern: pattern.into(),
            regex,
            ignore_case: false,
            literal: false,
            attributes: Attributes::new(),
            span,
        }
    }

    /// Get a human-readable name of the terminal.
    ///
    /// If no such name has been explicitly specified, the regular name of the
    /// terminal is returned.
    pub fn nice_name(&self) -> &str {
        self.nice_name.as_ref().unwrap_or(&self.name)
    }
}

/// A unique terminal identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(pub usize);

impl TerminalId {
    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Get a pretty printer for this terminal id.
    pub fn pretty(self, grammar: &Grammar) -> Pretty<&Grammar, Self> {
        Pretty::new(grammar, self)
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Debug for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, TerminalId> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let term = &self.ctx[self.item];
        if term.literal {
            write!(f, "'{}'", term.nice_name())
        } else {
            write!(f, "{}", term.name)
        }
    }
}

/// The id of a terminal that has not been added to a grammar.
pub const ORPHAN_TERMINAL: TerminalId = TerminalId(std::usize::MAX);

/// A nonterminal within a grammar.
///
/// Each declaration of a nonterminal contributes one alternative rule tree.
#[derive(Debug, Clone)]
pub struct Nonterminal {
    /// The id of this nonterminal.
    pub id: NonterminalId,
    /// The name of the nonterminal.
    pub name: String,
    /// The alternatives, one per declaration.
    pub alternatives: Vec<Rule>,
    /// The action code attached to the nonterminal.
    pub code: Option<String>,
    /// The attributes of the nonterminal.
    pub attributes: Attributes,
    /// Where the nonterminal was first declared.
    pub span: Span,
}

impl Nonterminal {
    /// Create a new nonterminal.
    pub fn new<S: Into<String>>(name: S, span: Span) -> Nonterminal {
        Nonterminal {
            id: ORPHAN_NONTERMINAL,
            name: name.into(),
            alternatives: Vec::new(),
            code: None,
            attributes: Attributes::new(),
            span,
        }
    }

    /// Collect the symbols referenced by all alternatives.
    pub fn production_symbols(&self) -> Vec<SymbolRef> {
        let mut symbols = Vec::new();
        for alt in &self.alternatives {
            alt.production_symbols(&mut symbols);
        }
        symbols
    }
}

/// A unique nonterminal identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonterminalId(pub usize);

impl NonterminalId {
    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Get a pretty printer for this nonterminal id.
    pub fn pretty(self, grammar: &Grammar) -> Pretty<&Grammar, Self> {
        Pretty::new(grammar, self)
    }
}

impl fmt::Display for NonterminalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "nt{}", self.0)
    }
}

impl fmt::Debug for NonterminalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, NonterminalId> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ctx[self.item].name)
    }
}

/// The id of a nonterminal that has not been added to a grammar.
pub const ORPHAN_NONTERMINAL: NonterminalId = NonterminalId(std::usize::MAX);

/// A reference to either kind of symbol.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolRef {
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
}

impl SymbolRef {
    /// The name of the symbol.
    pub fn name(self, grammar: &Grammar) -> &str {
        match self {
            SymbolRef::Terminal(id) => &grammar[id].name,
            SymbolRef::Nonterminal(id) => &grammar[id].name,
        }
    }

    /// Get a pretty printer for this symbol.
    pub fn pretty(self, grammar: &Grammar) -> Pretty<&Grammar, Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, SymbolRef> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.item {
            SymbolRef::Terminal(id) => write!(f, "{}", id.pretty(self.ctx)),
            SymbolRef::Nonterminal(id) => write!(f, "{}", id.pretty(self.ctx)),
        }
    }
}

/// Derive an identifier for a literal terminal.
fn literal_name(text: &str, index: usize) -> String {
    let mut chars = text.chars();
    let first = chars.next();
    if first.map_or(false, |c| c.is_alphabetic() || c == '_')
        && text.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return text.to_uppercase();
    }
    if let (Some(c), None) = (first, chars.next()) {
        if let Some(name) = punctuation_name(c) {
            return name.to_string();
        }
    }
    format!("TOKEN{}", index)
}

fn punctuation_name(c: char) -> Option<&'static str> {
    Some(match c {
        '+' => "PLUS",
        '-' => "MINUS",
        '*' => "STAR",
        '/' => "SLASH",
        '%' => "PERCENT",
        '^' => "CARET",
        '~' => "TILDE",
        '!' => "BANG",
        '?' => "QUESTION",
        '=' => "EQUALS",
        '<' => "LT",
        '>' => "GT",
        '&' => "AMP",
        '|' => "PIPE",
        '(' => "LPAREN",
        ')' => "RPAREN",
        '[' => "LBRACKET",
        ']' => "RBRACKET",
        '{' => "LBRACE",
        '}' => "RBRACE",
        ',' => "COMMA",
        ';' => "SEMICOLON",
        ':' => "COLON",
        '.' => "DOT",
        '#' => "HASH",
        '@' => "AT",
        '$' => "DOLLAR",
        _ => return None,
    })
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "//Terminals:")?;
        for term in &self.terms {
            if self.is_skip(term.id) {
                write!(f, "[Skip] ")?;
            }
            writeln!(f, "{} -> \"{}\";", term.name, term.pattern)?;
        }
        writeln!(f)?;
        writeln!(f, "//Production lines:")?;
        for nt in &self.nonterms {
            if nt.alternatives.is_empty() {
                writeln!(f, "{} -> ;", nt.name)?;
            }
            for alt in &nt.alternatives {
                writeln!(f, "{} -> {};", nt.name, alt.pretty(self))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    pub(crate) fn span() -> Span {
        Span::new(Arc::from("test"), 0, 0, 1, 1)
    }

    pub(crate) fn terminal(g: &mut Grammar, name: &str, pattern: &str) -> TerminalId {
        let regex = anchored(pattern, false).unwrap();
        g.add_terminal(Terminal::new(name, pattern, regex, span())).unwrap()
    }

    pub(crate) fn nonterminal(g: &mut Grammar, name: &str) -> NonterminalId {
        g.add_nonterminal(Nonterminal::new(name, span())).unwrap()
    }

    /// A grammar with `A`, `'x'`, `NUMBER`, and the rule `(A | 'x')* NUMBER?`.
    pub(crate) fn sample() -> (Grammar, Rule) {
        let mut g = Grammar::new();
        let a = nonterminal(&mut g, "A");
        let x = g.add_literal("x", &HashSet::new(), span()).unwrap();
        let num = terminal(&mut g, "NUMBER", "[0-9]+");
        let ra = g.make_rule(RuleKind::Nonterminal(a));
        let rx = g.make_rule(RuleKind::Terminal(x));
        let choice = g.make_rule(RuleKind::Choice(vec![ra, rx]));
        let star = g.make_rule(RuleKind::ZeroOrMore(Box::new(choice)));
        let rn = g.make_rule(RuleKind::Terminal(num));
        let opt = g.make_rule(RuleKind::Option(Box::new(rn)));
        let rule = g.make_rule(RuleKind::Concat(vec![star, opt]));
        (g, rule)
    }

    #[test]
    fn symbols_are_unique() {
        let mut g = Grammar::new();
        let t = terminal(&mut g, "A", "a");
        let regex = anchored("b", false).unwrap();
        assert_eq!(g.add_terminal(Terminal::new("A", "b", regex, span())), None);
        assert_eq!(g.add_nonterminal(Nonterminal::new("A", span())), None);
        assert_eq!(g[t].pattern, "a");
        assert_eq!(g.lookup("A"), Some(SymbolRef::Terminal(t)));
        assert_eq!(g.nonterminal("A"), None);
    }

    #[test]
    fn literal_names() {
        let mut g = Grammar::new();
        let mut reserved = HashSet::new();
        reserved.insert("IF".to_string());
        let plus = g.add_literal("+", &reserved, span()).unwrap();
        let kw = g.add_literal("if", &reserved, span()).unwrap();
        let arrow = g.add_literal("->", &reserved, span()).unwrap();
        assert_eq!(g.add_literal("+", &reserved, span()).unwrap(), plus);
        assert_eq!(g[plus].name, "PLUS");
        assert_eq!(g[plus].pattern, "\\+");
        assert_eq!(g[kw].name, "IF_");
        assert_eq!(g[arrow].name, "TOKEN2");
        assert_eq!(g[arrow].nice_name(), "->");
        assert_eq!(format!("{}", plus.pretty(&g)), "'+'");
    }

    #[test]
    fn literal_names_avoid_declared_terminals() {
        let mut g = Grammar::new();
        terminal(&mut g, "PLUS", "plus");
        let plus = g.add_literal("+", &HashSet::new(), span()).unwrap();
        assert_eq!(g[plus].name, "PLUS_");
        assert_eq!(g[plus].pattern, "\\+");
        let err = LiteralError::NameTaken("+".to_string());
        assert_eq!(err.to_string(), "no name is left for literal '+'");
    }

    #[test]
    fn first_sets_are_invalidated() {
        let (mut g, rule) = sample();
        let a = g.nonterminal("A").unwrap();
        g.first_sets();
        assert!(g.has_first_sets());
        g.add_alternative(a, rule);
        assert!(!g.has_first_sets());
    }

    #[test]
    fn printing() {
        let (mut g, rule) = sample();
        let a = g.nonterminal("A").unwrap();
        let ws = terminal(&mut g, "WS", "\\s+");
        g.add_skip(ws);
        g.add_alternative(a, rule);
        assert_eq!(
            format!("{}", g),
            "//Terminals:\n\
             X -> \"x\";\n\
             NUMBER -> \"[0-9]+\";\n\
             [Skip] WS -> \"\\s+\";\n\
             \n\
             //Production lines:\n\
             A -> ((A | 'x'))* (NUMBER)?;\n"
        );
    }
}
