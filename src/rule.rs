// Copyright (c) 2018 Fabian Schuiki

//! Rule trees describing the right hand side of productions.

use std::fmt;

use crate::grammar::{Grammar, NonterminalId, SymbolRef, TerminalId};
use crate::Pretty;

/// A unique identifier of a node in any of a grammar's rule trees.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleNodeId(pub usize);

impl RuleNodeId {
    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleNodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Debug for RuleNodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A node of a rule tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// The id of this node.
    pub id: RuleNodeId,
    /// What this node matches.
    pub kind: RuleKind,
}

/// The different kinds of rule nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// A single terminal.
    Terminal(TerminalId),
    /// A single nonterminal.
    Nonterminal(NonterminalId),
    /// A sequence of rules, e.g. `a b c`.
    Concat(Vec<Rule>),
    /// Alternative rules, e.g. `a | b | c`.
    Choice(Vec<Rule>),
    /// An optional rule, e.g. `a?`.
    Option(Box<Rule>),
    /// A repetition that may be empty, e.g. `a*`.
    ZeroOrMore(Box<Rule>),
    /// A repetition that runs at least once, e.g. `a+`.
    OneOrMore(Box<Rule>),
    /// A reference to a symbol that was never declared.
    Unresolved(String),
}

impl Rule {
    /// Create a new rule node.
    pub fn new(id: RuleNodeId, kind: RuleKind) -> Rule {
        Rule { id, kind }
    }

    /// The direct children of this node.
    pub fn children(&self) -> &[Rule] {
        match self.kind {
            RuleKind::Concat(ref v) | RuleKind::Choice(ref v) => v,
            RuleKind::Option(ref r) | RuleKind::ZeroOrMore(ref r) | RuleKind::OneOrMore(ref r) => {
                std::slice::from_ref(&**r)
            }
            _ => &[],
        }
    }

    /// Find the node with the given id in this tree.
    pub fn find(&self, id: RuleNodeId) -> Option<&Rule> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().filter_map(|c| c.find(id)).next()
    }

    /// Collect the symbols this rule refers to, in order of appearance.
    ///
    /// These are the symbols an action code block may refer to.
    pub fn production_symbols(&self, into: &mut Vec<SymbolRef>) {
        match self.kind {
            RuleKind::Terminal(id) => into.push(SymbolRef::Terminal(id)),
            RuleKind::Nonterminal(id) => into.push(SymbolRef::Nonterminal(id)),
            RuleKind::Unresolved(_) => (),
            _ => {
                for child in self.children() {
                    child.production_symbols(into);
                }
            }
        }
    }

    /// Get a pretty printer for this rule.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Rule> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Rule> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.item.kind {
            RuleKind::Terminal(id) => write!(f, "{}", id.pretty(self.ctx)),
            RuleKind::Nonterminal(id) => write!(f, "{}", id.pretty(self.ctx)),
            RuleKind::Unresolved(ref name) => write!(f, "{}", name),
            RuleKind::Concat(ref rules) => {
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", rule.pretty(self.ctx))?;
                }
                if rules.is_empty() {
                    write!(f, " <- WARNING: ConcatRule contains no subrules")?;
                }
                Ok(())
            }
            RuleKind::Choice(ref rules) => {
                write!(f, "(")?;
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", rule.pretty(self.ctx))?;
                }
                write!(f, ")")?;
                if rules.is_empty() {
                    write!(f, " <- WARNING: ChoiceRule contains no subrules")?;
                }
                Ok(())
            }
            RuleKind::Option(ref rule) => write!(f, "({})?", rule.pretty(self.ctx)),
            RuleKind::ZeroOrMore(ref rule) => write!(f, "({})*", rule.pretty(self.ctx)),
            RuleKind::OneOrMore(ref rule) => write!(f, "({})+", rule.pretty(self.ctx)),
        }
    }
}
