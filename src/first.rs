// Copyright (c) 2018 Fabian Schuiki

//! First set computation.
//!
//! This module implements computation of the first sets for a grammar. The
//! first set of a rule states all terminals that can appear as its first
//! symbol, and whether the rule can match the empty input. Since rules may
//! contain other nonterminals and optional parts, computation is somewhat
//! tricky.
//!
//! Nonterminals are computed lazily and memoized. A nonterminal that is
//! re-entered while its own set is still being computed is left recursive;
//! the recursion is cut off and reported instead of followed.

use std::fmt;

use bit_set::BitSet;
use indexmap::{IndexMap, IndexSet};

use crate::diag::{codes, Diagnostic};
use crate::grammar::{Grammar, NonterminalId, TerminalId};
use crate::rule::{Rule, RuleKind, RuleNodeId};
use crate::Pretty;

/// The first set of a rule or nonterminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    /// The first terminals, in order of discovery.
    pub terminals: IndexSet<TerminalId>,
    /// Whether the rule can match the empty input.
    pub empty: bool,
}

impl FirstSet {
    /// Check whether a terminal is in the set.
    pub fn contains(&self, id: TerminalId) -> bool {
        self.terminals.contains(&id)
    }
}

/// All first sets of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    sets: Vec<FirstSet>,
    origins: IndexMap<TerminalId, RuleNodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl FirstSets {
    /// Compute the first sets of a grammar.
    pub fn compute(grammar: &Grammar) -> FirstSets {
        let mut ctx = Context {
            grammar,
            sets: vec![FirstSet::default(); grammar.nonterminal_count()],
            done: BitSet::with_capacity(grammar.nonterminal_count()),
            active: BitSet::with_capacity(grammar.nonterminal_count()),
            reported: BitSet::with_capacity(grammar.nonterminal_count()),
            origins: IndexMap::new(),
            diagnostics: Vec::new(),
        };
        for (id, _) in grammar.nonterminals() {
            ctx.force(id);
        }
        debug!(
            "computed first sets of {} nonterminals, {} left recursive",
            ctx.sets.len(),
            ctx.reported.len()
        );
        FirstSets {
            sets: ctx.sets,
            origins: ctx.origins,
            diagnostics: ctx.diagnostics,
        }
    }

    /// The first set of a rule, based on the computed nonterminal sets.
    pub fn first_of(&self, rule: &Rule) -> FirstSet {
        self.first_of_from(rule, 0)
    }

    /// The first set of a rule, skipping the first `start` children if the
    /// rule is a sequence.
    pub fn first_of_from(&self, rule: &Rule, start: usize) -> FirstSet {
        let mut set = FirstSet::default();
        set.empty = walk(&mut Lookup(&self.sets), rule, start, &mut set.terminals);
        set
    }

    /// The sequence that last required a terminal during computation.
    pub fn origin(&self, id: TerminalId) -> Option<RuleNodeId> {
        self.origins.get(&id).cloned()
    }

    /// The problems found during computation, such as left recursion.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get a pretty printer for the first set report.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a FirstSets> {
        Pretty::new(grammar, self)
    }
}

impl std::ops::Index<NonterminalId> for FirstSets {
    type Output = FirstSet;
    fn index(&self, idx: NonterminalId) -> &FirstSet {
        &self.sets[idx.as_usize()]
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a FirstSets> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "/*")?;
        writeln!(f, "First symbols:")?;
        for (id, nt) in self.ctx.nonterminals() {
            write!(f, "{}:", nt.name)?;
            for &t in &self.item[id].terminals {
                write!(f, " {}", t.pretty(self.ctx))?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "Skip symbols:")?;
        for t in self.ctx.skip_symbols() {
            write!(f, " {}", t.pretty(self.ctx))?;
        }
        writeln!(f)?;
        if !self.item.origins.is_empty() {
            writeln!(f)?;
            writeln!(f, "Required by:")?;
            for (&t, &node) in &self.item.origins {
                if let Some((nt, rule)) = self.ctx.find_rule(node) {
                    writeln!(
                        f,
                        "{}: {} -> {}",
                        t.pretty(self.ctx),
                        nt.pretty(self.ctx),
                        rule.pretty(self.ctx)
                    )?;
                }
            }
        }
        writeln!(f, "*/")
    }
}

/// How rule walks resolve nonterminal references.
trait Resolve {
    /// Add the first terminals of a nonterminal to `into`. Returns whether
    /// the nonterminal can match the empty input.
    fn nonterminal(&mut self, id: NonterminalId, into: &mut IndexSet<TerminalId>) -> bool;

    /// Called with the terminals a sequence contributes.
    fn sequence(&mut self, _id: RuleNodeId, _found: &IndexSet<TerminalId>) {}
}

/// Add the first terminals of `rule` to `into`.
///
/// Returns whether the rule can match the empty input. For sequences, the
/// scan begins at child `start`.
fn walk<R: Resolve>(
    res: &mut R,
    rule: &Rule,
    start: usize,
    into: &mut IndexSet<TerminalId>,
) -> bool {
    match rule.kind {
        RuleKind::Terminal(id) => {
            into.insert(id);
            false
        }
        RuleKind::Unresolved(_) => true,
        RuleKind::Nonterminal(id) => res.nonterminal(id, into),
        RuleKind::Concat(ref rules) => {
            let mut found = IndexSet::new();
            let mut empty = false;
            for r in rules.iter().skip(start) {
                empty = walk(res, r, 0, &mut found);
                if !empty {
                    break;
                }
            }
            res.sequence(rule.id, &found);
            into.extend(found);
            empty
        }
        RuleKind::Choice(ref rules) => {
            let mut empty = false;
            for r in rules {
                empty |= walk(res, r, 0, into);
            }
            empty
        }
        RuleKind::OneOrMore(ref r) => walk(res, r, 0, into),
        RuleKind::Option(ref r) | RuleKind::ZeroOrMore(ref r) => {
            walk(res, r, 0, into);
            true
        }
    }
}

/// Resolution during the initial computation.
struct Context<'a> {
    grammar: &'a Grammar,
    sets: Vec<FirstSet>,
    done: BitSet,
    active: BitSet,
    reported: BitSet,
    origins: IndexMap<TerminalId, RuleNodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Context<'a> {
    fn force(&mut self, id: NonterminalId) {
        let idx = id.as_usize();
        if self.done.contains(idx) {
            return;
        }
        if self.active.contains(idx) {
            if self.reported.insert(idx) {
                let nt = &self.grammar[id];
                warn!("left recursion through {}", nt.name);
                self.diagnostics.push(Diagnostic::new(
                    codes::LEFT_RECURSION,
                    format!("Left recursion detected for '{}'", nt.name),
                    &nt.span,
                ));
            }
            return;
        }
        self.active.insert(idx);
        let grammar = self.grammar;
        let mut set = FirstSet::default();
        for alt in &grammar[id].alternatives {
            set.empty |= walk(self, alt, 0, &mut set.terminals);
        }
        trace!("first({}) = {} terminals, empty {}", grammar[id].name, set.terminals.len(), set.empty);
        self.active.remove(idx);
        self.done.insert(idx);
        self.sets[idx] = set;
    }
}

impl<'a> Resolve for Context<'a> {
    fn nonterminal(&mut self, id: NonterminalId, into: &mut IndexSet<TerminalId>) -> bool {
        self.force(id);
        let set = &self.sets[id.as_usize()];
        into.extend(set.terminals.iter().cloned());
        // A set still under construction cuts the recursion off.
        self.done.contains(id.as_usize()) && set.empty
    }

    fn sequence(&mut self, id: RuleNodeId, found: &IndexSet<TerminalId>) {
        for &t in found {
            self.origins.insert(t, id);
        }
    }
}

/// Resolution against completed sets.
struct Lookup<'a>(&'a [FirstSet]);

impl<'a> Resolve for Lookup<'a> {
    fn nonterminal(&mut self, id: NonterminalId, into: &mut IndexSet<TerminalId>) -> bool {
        let set = &self.0[id.as_usize()];
        into.extend(set.terminals.iter().cloned());
        set.empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::{nonterminal, terminal};

    fn names(g: &Grammar, set: &FirstSet) -> Vec<String> {
        set.terminals.iter().map(|&t| g[t].name.clone()).collect()
    }

    #[test]
    fn choice_and_concat() {
        // S -> (A | c) d;  A -> a? b;
        let mut g = Grammar::new();
        let s = nonterminal(&mut g, "S");
        let a = nonterminal(&mut g, "A");
        let (ta, tb, tc, td) = (
            terminal(&mut g, "a", "a"),
            terminal(&mut g, "b", "b"),
            terminal(&mut g, "c", "c"),
            terminal(&mut g, "d", "d"),
        );
        let ra = g.make_rule(RuleKind::Terminal(ta));
        let opt = g.make_rule(RuleKind::Option(Box::new(ra)));
        let rb = g.make_rule(RuleKind::Terminal(tb));
        let a_rule = g.make_rule(RuleKind::Concat(vec![opt, rb]));
        g.add_alternative(a, a_rule);
        let na = g.make_rule(RuleKind::Nonterminal(a));
        let rc = g.make_rule(RuleKind::Terminal(tc));
        let choice = g.make_rule(RuleKind::Choice(vec![na, rc]));
        let rd = g.make_rule(RuleKind::Terminal(td));
        let s_rule = g.make_rule(RuleKind::Concat(vec![choice, rd]));
        g.add_alternative(s, s_rule);

        let fs = g.first_sets();
        assert_eq!(names(&g, &fs[a]), vec!["a", "b"]);
        assert!(!fs[a].empty);
        assert_eq!(names(&g, &fs[s]), vec!["a", "b", "c"]);
        assert!(fs.diagnostics().is_empty());
        // `S` forces `A`, so the outer sequence is the last to require `b`.
        let s_rule = &g[s].alternatives[0];
        assert_eq!(fs.origin(tb), Some(s_rule.id));
        assert_eq!(fs.origin(tc), Some(s_rule.id));
        assert_eq!(names(&g, &fs.first_of_from(s_rule, 1)), vec!["d"]);
        assert_eq!(fs.origin(td), None);
    }

    #[test]
    fn optional_parts_are_empty() {
        // S -> a* b?;
        let mut g = Grammar::new();
        let s = nonterminal(&mut g, "S");
        let ta = terminal(&mut g, "a", "a");
        let tb = terminal(&mut g, "b", "b");
        let ra = g.make_rule(RuleKind::Terminal(ta));
        let star = g.make_rule(RuleKind::ZeroOrMore(Box::new(ra)));
        let rb = g.make_rule(RuleKind::Terminal(tb));
        let opt = g.make_rule(RuleKind::Option(Box::new(rb)));
        let rule = g.make_rule(RuleKind::Concat(vec![star, opt]));
        g.add_alternative(s, rule);
        let fs = g.first_sets();
        assert_eq!(names(&g, &fs[s]), vec!["a", "b"]);
        assert!(fs[s].empty);
    }

    #[test]
    fn empty_sequences_are_not_empty() {
        let mut g = Grammar::new();
        let s = nonterminal(&mut g, "S");
        let rule = g.make_rule(RuleKind::Concat(vec![]));
        g.add_alternative(s, rule);
        assert!(!g.first_sets()[s].empty);
    }

    #[test]
    fn left_recursion_is_reported() {
        // A -> B? A x;  B -> b;
        let mut g = Grammar::new();
        let a = nonterminal(&mut g, "A");
        let b = nonterminal(&mut g, "B");
        let tb = terminal(&mut g, "b", "b");
        let tx = terminal(&mut g, "x", "x");
        let rb = g.make_rule(RuleKind::Terminal(tb));
        g.add_alternative(b, rb);
        let nb = g.make_rule(RuleKind::Nonterminal(b));
        let opt = g.make_rule(RuleKind::Option(Box::new(nb)));
        let na = g.make_rule(RuleKind::Nonterminal(a));
        let rx = g.make_rule(RuleKind::Terminal(tx));
        let rule = g.make_rule(RuleKind::Concat(vec![opt, na, rx]));
        g.add_alternative(a, rule);

        let fs = g.first_sets();
        let codes: Vec<_> = fs.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![codes::LEFT_RECURSION]);
        assert_eq!(fs.diagnostics()[0].message, "Left recursion detected for 'A'");
        assert_eq!(names(&g, &fs[a]), vec!["b"]);
    }

    #[test]
    fn report() {
        let mut g = Grammar::new();
        let s = nonterminal(&mut g, "Start");
        let ta = terminal(&mut g, "a", "a");
        let ws = terminal(&mut g, "WS", "\\s+");
        g.add_skip(ws);
        let ra = g.make_rule(RuleKind::Terminal(ta));
        let rule = g.make_rule(RuleKind::Concat(vec![ra]));
        g.add_alternative(s, rule);
        assert_eq!(
            format!("{}", g.first_sets().pretty(&g)),
            "/*\nFirst symbols:\nStart: a\n\nSkip symbols:\n WS\n\nRequired by:\na: Start -> a\n*/\n"
        );
    }
}
