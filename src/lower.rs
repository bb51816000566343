// Copyright (c) 2018 Fabian Schuiki

//! Lowering of rule trees to parsing routines.
//!
//! Each nonterminal becomes one routine. A routine is a list of statements
//! that consume tokens, call other routines, and branch on the lookahead
//! token as dictated by the FIRST sets of the grammar. The emitters render
//! routines into source text, and the interpreter executes them directly.

use std::fmt;

use indexmap::IndexSet;

use crate::first::FirstSets;
use crate::grammar::{Grammar, NonterminalId, TerminalId};
use crate::rule::{Rule, RuleKind};
use crate::Pretty;

/// The lowered routines of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// One routine per nonterminal, in declaration order.
    pub routines: Vec<Routine>,
}

impl Program {
    /// Find the routine of a nonterminal.
    pub fn routine(&self, id: NonterminalId) -> Option<&Routine> {
        self.routines.iter().find(|r| r.nonterminal == id)
    }

    /// Get a pretty printer for this program.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Program> {
        Pretty::new(grammar, self)
    }
}

/// The parsing routine of a single nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    /// The nonterminal this routine parses.
    pub nonterminal: NonterminalId,
    /// The name of the nonterminal.
    pub name: String,
    /// The statements of the routine.
    pub body: Vec<Stmt>,
}

/// A statement within a routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Consume a token and check that it is the given terminal. On mismatch
    /// an unexpected token error is recorded and the routine returns.
    Expect {
        /// The terminal to consume.
        terminal: TerminalId,
        /// The name of the terminal as shown in the error.
        expected: String,
    },
    /// Call the routine of a nonterminal.
    Call(NonterminalId),
    /// Execute the body if the lookahead is one of the given terminals.
    Optional {
        /// The terminals that select the body.
        lookahead: Vec<TerminalId>,
        /// The statements to execute.
        body: Vec<Stmt>,
    },
    /// Execute the body for as long as the lookahead is one of the given
    /// terminals.
    Repeat {
        /// The terminals that continue the loop.
        lookahead: Vec<TerminalId>,
        /// The statements to execute.
        body: Vec<Stmt>,
        /// Whether the body executes once before the lookahead is checked.
        at_least_once: bool,
    },
    /// Execute the arm whose terminals contain the lookahead. If there is
    /// none, an error naming the expected terminals is recorded and the
    /// routine returns.
    Dispatch {
        /// The union of all arms' terminals.
        lookahead: Vec<TerminalId>,
        /// The alternatives.
        arms: Vec<Arm>,
        /// The expected terminals as shown in the error.
        expected: String,
    },
}

/// One alternative of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm {
    /// The terminals that select this arm.
    pub terminals: Vec<TerminalId>,
    /// The statements to execute.
    pub body: Vec<Stmt>,
}

/// Context information for lowering a grammar.
pub struct Context<'a> {
    grammar: &'a Grammar,
    first: &'a FirstSets,
}

impl<'a> Context<'a> {
    /// Create a new lowering context.
    pub fn new(grammar: &'a Grammar) -> Context<'a> {
        Context {
            grammar,
            first: grammar.first_sets(),
        }
    }

    /// Perform the lowering.
    ///
    /// Consumes the context.
    pub fn lower(self) -> Program {
        let routines: Vec<_> = self
            .grammar
            .nonterminals()
            .map(|(id, nt)| {
                let mut body = Vec::new();
                match nt.alternatives.len() {
                    0 => warn!("nonterminal {} has no alternatives", nt.name),
                    1 => self.lower_rule(&nt.alternatives[0], &mut body),
                    _ => self.lower_choice(&nt.alternatives, &mut body),
                }
                Routine {
                    nonterminal: id,
                    name: nt.name.clone(),
                    body,
                }
            })
            .collect();
        debug!("lowered {} routines", routines.len());
        Program { routines }
    }

    fn lookahead(&self, rule: &Rule) -> Vec<TerminalId> {
        self.first.first_of(rule).terminals.into_iter().collect()
    }

    fn lower_rule(&self, rule: &Rule, into: &mut Vec<Stmt>) {
        match rule.kind {
            RuleKind::Terminal(id) => into.push(Stmt::Expect {
                terminal: id,
                expected: self.grammar[id].nice_name().to_string(),
            }),
            RuleKind::Nonterminal(id) => into.push(Stmt::Call(id)),
            RuleKind::Unresolved(_) => (),
            RuleKind::Concat(ref rules) => {
                for r in rules {
                    self.lower_rule(r, into);
                }
            }
            RuleKind::Choice(ref rules) => self.lower_choice(rules, into),
            RuleKind::Option(ref inner) => {
                let lookahead = self.lookahead(inner);
                if lookahead.is_empty() {
                    warn!("optional {} can never be selected", rule.pretty(self.grammar));
                    return;
                }
                let mut body = Vec::new();
                self.lower_rule(inner, &mut body);
                into.push(Stmt::Optional { lookahead, body });
            }
            RuleKind::ZeroOrMore(ref inner) | RuleKind::OneOrMore(ref inner) => {
                let at_least_once = match rule.kind {
                    RuleKind::OneOrMore(_) => true,
                    _ => false,
                };
                let lookahead = self.lookahead(inner);
                let mut body = Vec::new();
                self.lower_rule(inner, &mut body);
                if lookahead.is_empty() {
                    warn!("repetition {} can never be continued", rule.pretty(self.grammar));
                    if at_least_once {
                        into.extend(body);
                    }
                    return;
                }
                into.push(Stmt::Repeat {
                    lookahead,
                    body,
                    at_least_once,
                });
            }
        }
    }

    fn lower_choice(&self, rules: &[Rule], into: &mut Vec<Stmt>) {
        let mut claimed = IndexSet::new();
        let mut arms = Vec::new();
        for rule in rules {
            let mut terminals = Vec::new();
            for t in self.lookahead(rule) {
                if claimed.insert(t) {
                    terminals.push(t);
                } else {
                    warn!(
                        "{} already selects an earlier alternative than {}",
                        t.pretty(self.grammar),
                        rule.pretty(self.grammar)
                    );
                }
            }
            if terminals.is_empty() {
                trace!("alternative {} dropped", rule.pretty(self.grammar));
                continue;
            }
            let mut body = Vec::new();
            self.lower_rule(rule, &mut body);
            arms.push(Arm { terminals, body });
        }
        if arms.is_empty() {
            return;
        }
        let names: Vec<&str> = claimed.iter().map(|&t| self.grammar[t].nice_name()).collect();
        let expected = expected_list(&names);
        into.push(Stmt::Dispatch {
            lookahead: claimed.into_iter().collect(),
            arms,
            expected,
        });
    }
}

/// Lower all nonterminals of a grammar.
pub fn lower(grammar: &Grammar) -> Program {
    Context::new(grammar).lower()
}

/// Format a list of expected names as "A", "A or B", or "A, B, or C".
pub fn expected_list<S: AsRef<str>>(names: &[S]) -> String {
    match names.len() {
        0 => String::new(),
        1 => names[0].as_ref().to_string(),
        2 => format!("{} or {}", names[0].as_ref(), names[1].as_ref()),
        n => {
            let mut s = String::new();
            for name in &names[..n - 1] {
                s.push_str(name.as_ref());
                s.push_str(", ");
            }
            s.push_str("or ");
            s.push_str(names[n - 1].as_ref());
            s
        }
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Program> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for routine in &self.item.routines {
            writeln!(f, "{}:", routine.name)?;
            write_stmts(f, self.ctx, &routine.body, 1)?;
        }
        Ok(())
    }
}

fn write_terminals(f: &mut fmt::Formatter, g: &Grammar, terminals: &[TerminalId]) -> fmt::Result {
    for (i, &t) in terminals.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", t.pretty(g))?;
    }
    Ok(())
}

fn write_stmts(f: &mut fmt::Formatter, g: &Grammar, stmts: &[Stmt], depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);
    for stmt in stmts {
        match *stmt {
            Stmt::Expect { terminal, .. } => writeln!(f, "{}expect {}", indent, terminal.pretty(g))?,
            Stmt::Call(id) => writeln!(f, "{}call {}", indent, id.pretty(g))?,
            Stmt::Optional {
                ref lookahead,
                ref body,
            } => {
                write!(f, "{}if ", indent)?;
                write_terminals(f, g, lookahead)?;
                writeln!(f)?;
                write_stmts(f, g, body, depth + 1)?;
            }
            Stmt::Repeat {
                ref lookahead,
                ref body,
                at_least_once,
            } => {
                write!(f, "{}{} ", indent, if at_least_once { "do-while" } else { "while" })?;
                write_terminals(f, g, lookahead)?;
                writeln!(f)?;
                write_stmts(f, g, body, depth + 1)?;
            }
            Stmt::Dispatch { ref arms, .. } => {
                writeln!(f, "{}switch", indent)?;
                for arm in arms {
                    write!(f, "{}  case ", indent)?;
                    write_terminals(f, g, &arm.terminals)?;
                    writeln!(f)?;
                    write_stmts(f, g, &arm.body, depth + 1)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::parser::parse;
    use crate::sema::analyze;

    fn compile(input: &str) -> Grammar {
        let (desc, mut diag) = parse(input, "test");
        let g = analyze(&desc, &Options::default(), &mut diag).unwrap();
        assert!(diag.is_empty(), "{}", diag);
        g
    }

    #[test]
    fn expected_lists() {
        assert_eq!(expected_list::<&str>(&[]), "");
        assert_eq!(expected_list(&["A"]), "A");
        assert_eq!(expected_list(&["x", "y"]), "x or y");
        assert_eq!(expected_list(&["A", "B", "C"]), "A, B, or C");
    }

    #[test]
    fn choice_becomes_dispatch() {
        let g = compile("Start -> A; A -> 'x' | 'y';");
        let p = lower(&g);
        let a = p.routine(g.nonterminal("A").unwrap()).unwrap();
        match a.body[..] {
            [Stmt::Dispatch {
                ref arms,
                ref expected,
                ..
            }] => {
                assert_eq!(arms.len(), 2);
                assert_eq!(expected, "x or y");
            }
            ref other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn sequence_and_repetition() {
        let g = compile("N -> \"[0-9]+\"; Start -> N ('+' N)* ';'?;");
        let p = lower(&g);
        assert_eq!(
            format!("{}", p.pretty(&g)),
            "Start:\n    expect N\n    while '+'\n        expect '+'\n        expect N\n    if ';'\n        expect ';'\n"
        );
    }

    #[test]
    fn alternatives_merge() {
        let g = compile("Start -> 'a' 'b'; Start -> ('c'); Start -> ('a');");
        let p = lower(&g);
        let start = &p.routines[0];
        match start.body[..] {
            [Stmt::Dispatch {
                ref arms,
                ref lookahead,
                ..
            }] => {
                assert_eq!(arms.len(), 2);
                assert_eq!(lookahead.len(), 2);
            }
            ref other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn one_or_more_runs_once() {
        let g = compile("Start -> ('x')+;");
        let p = lower(&g);
        match p.routines[0].body[..] {
            [Stmt::Repeat { at_least_once, .. }] => assert!(at_least_once),
            ref other => panic!("unexpected body {:?}", other),
        }
    }
}
