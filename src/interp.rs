// Copyright (c) 2018 Fabian Schuiki

//! Direct execution of lowered routines.
//!
//! The interpreter runs a grammar on sample input without generating and
//! compiling code first. It executes the same routines the emitters render,
//! so a parse tree and the errors obtained here match what the generated
//! parser produces for the same input.

use tinypg_runtime::{codes, NodeId, ParseError, ParseTree, Scanner, TokenKind};

use crate::grammar::{Grammar, NonterminalId, TerminalId};
use crate::lower::{Program, Stmt};

/// The kinds of tokens and nodes the interpreter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The root of the parse tree.
    Root,
    /// Input that no terminal matched.
    Undetermined,
    /// A terminal of the grammar.
    Terminal(TerminalId),
    /// A nonterminal of the grammar.
    Nonterminal(NonterminalId),
}

impl TokenKind for Kind {
    fn undetermined() -> Kind {
        Kind::Undetermined
    }

    fn root() -> Kind {
        Kind::Root
    }
}

/// Runs the routines of a grammar on input text.
pub struct Interpreter<'a> {
    grammar: &'a Grammar,
    program: &'a Program,
    scanner: Scanner<Kind>,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter for a grammar and its lowered routines.
    pub fn new(grammar: &'a Grammar, program: &'a Program) -> Interpreter<'a> {
        let patterns = grammar
            .terminals()
            .map(|(id, t)| (Kind::Terminal(id), t.regex.clone()))
            .collect();
        let skip = grammar.skip_symbols().map(Kind::Terminal).collect();
        let file_and_line = grammar.file_and_line().map(Kind::Terminal);
        Interpreter {
            grammar,
            program,
            scanner: Scanner::new(patterns, skip, file_and_line),
        }
    }

    /// Parse input text, starting at the `Start` nonterminal.
    pub fn parse(&mut self, input: &str, file: &str) -> ParseTree<Kind> {
        self.scanner.init(input, file);
        let mut tree = ParseTree::new();
        match self.grammar.start() {
            Some(start) => {
                let root = tree.root();
                self.call(start, root, &mut tree);
            }
            None => tree.error(ParseError::unlocated(
                codes::UNEXPECTED_TOKEN,
                "The grammar has no 'Start' production",
            )),
        }
        debug!("parsed {} into {} nodes, {} errors", file, tree.len(), tree.errors.len());
        tree
    }

    /// The display name of a node kind.
    pub fn kind_name(&self, kind: Kind) -> &'a str {
        let grammar = self.grammar;
        match kind {
            Kind::Root => "ParseTree",
            Kind::Undetermined => "_UNDETERMINED_",
            Kind::Terminal(id) => &grammar[id].name,
            Kind::Nonterminal(id) => &grammar[id].name,
        }
    }

    fn call(&mut self, id: NonterminalId, parent: NodeId, tree: &mut ParseTree<Kind>) {
        let program = self.program;
        let routine = match program.routine(id) {
            Some(routine) => routine,
            None => return,
        };
        trace!("entering {}", routine.name);
        let token = self.scanner.here(Kind::Nonterminal(id));
        let node = tree.create_node(parent, token, routine.name.as_str());
        if self.exec(&routine.body, node, tree) {
            tree.widen(parent, node);
        }
    }

    /// Execute statements. Returns false if the routine returned early.
    fn exec(&mut self, stmts: &[Stmt], node: NodeId, tree: &mut ParseTree<Kind>) -> bool {
        for stmt in stmts {
            let proceed = match *stmt {
                Stmt::Expect {
                    terminal,
                    ref expected,
                } => {
                    let kind = Kind::Terminal(terminal);
                    let tok = self.scanner.scan(&[kind]);
                    let text = format!("{} '{}'", self.kind_name(tok.kind), tok.text);
                    let child = tree.create_node(node, tok.clone(), text);
                    tree.widen(node, child);
                    if tok.kind != kind {
                        tree.error(ParseError::unexpected(codes::UNEXPECTED_TOKEN, &tok, expected));
                        false
                    } else {
                        true
                    }
                }
                Stmt::Call(id) => {
                    self.call(id, node, tree);
                    true
                }
                Stmt::Optional {
                    ref lookahead,
                    ref body,
                } => !self.peek(lookahead) || self.exec(body, node, tree),
                Stmt::Repeat {
                    ref lookahead,
                    ref body,
                    at_least_once,
                } => {
                    let mut proceed = true;
                    let mut first = at_least_once;
                    while first || self.peek(lookahead) {
                        first = false;
                        if !self.exec(body, node, tree) {
                            proceed = false;
                            break;
                        }
                    }
                    proceed
                }
                Stmt::Dispatch {
                    ref lookahead,
                    ref arms,
                    ref expected,
                } => {
                    let kinds: Vec<Kind> = lookahead.iter().cloned().map(Kind::Terminal).collect();
                    let tok = self.scanner.look_ahead(&kinds).clone();
                    let arm = match tok.kind {
                        Kind::Terminal(t) => arms.iter().find(|a| a.terminals.contains(&t)),
                        _ => None,
                    };
                    match arm {
                        Some(arm) => self.exec(&arm.body, node, tree),
                        None => {
                            tree.error(ParseError::unexpected(
                                codes::NO_ALTERNATIVE,
                                &tok,
                                &format!("{}.", expected),
                            ));
                            false
                        }
                    }
                }
            };
            if !proceed {
                return false;
            }
        }
        true
    }

    fn peek(&mut self, lookahead: &[TerminalId]) -> bool {
        let kinds: Vec<Kind> = lookahead.iter().cloned().map(Kind::Terminal).collect();
        match self.scanner.look_ahead(&kinds).kind {
            Kind::Terminal(t) => lookahead.contains(&t),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::lower::lower;
    use crate::parser::parse;
    use crate::sema::analyze;

    fn grammar(input: &str) -> Grammar {
        let (desc, mut diag) = parse(input, "test");
        let g = analyze(&desc, &Options::default(), &mut diag).unwrap();
        assert!(diag.is_empty(), "{}", diag);
        g
    }

    const CALC: &str = "
        [Skip] WS -> \"\\s+\";
        NUMBER -> \"[0-9]+\";
        Start -> Add;
        Add -> Expr '+' Expr;
        Expr -> NUMBER;
    ";

    #[test]
    fn builds_tree() {
        let g = grammar(CALC);
        let p = lower(&g);
        let mut interp = Interpreter::new(&g, &p);
        let tree = interp.parse("1 + 22", "input");
        assert!(tree.errors.is_empty(), "{:?}", tree.errors);
        assert_eq!(
            format!("{}", tree),
            "ParseTree\n  Start\n    Add\n      Expr\n        NUMBER '1'\n      PLUS '+'\n      Expr\n        NUMBER '22'\n"
        );
        let start = tree[tree.root()].children[0];
        assert_eq!((tree[start].token.span.start, tree[start].token.span.end), (0, 6));
    }

    #[test]
    fn missing_operator() {
        let g = grammar(CALC);
        let p = lower(&g);
        let tree = Interpreter::new(&g, &p).parse("1 2", "input");
        assert_eq!(tree.errors.len(), 1);
        let err = &tree.errors[0];
        assert_eq!(err.code, codes::UNEXPECTED_TOKEN);
        assert_eq!(err.message, "Unexpected token '2' found. Expected +");
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn choice_errors() {
        let g = grammar("Start -> 'x' | 'y';");
        let p = lower(&g);
        let tree = Interpreter::new(&g, &p).parse("z", "input");
        assert_eq!(tree.errors.len(), 1);
        assert_eq!(tree.errors[0].code, codes::NO_ALTERNATIVE);
        assert_eq!(tree.errors[0].message, "Unexpected token 'z' found. Expected x or y.");
    }

    #[test]
    fn repetition_stays_within_lookahead() {
        let g = grammar("Start -> ('x')* 'y';");
        let p = lower(&g);
        let mut interp = Interpreter::new(&g, &p);
        for input in &["y", "xy", "xxxxy"] {
            let tree = interp.parse(input, "input");
            assert!(tree.errors.is_empty(), "{}: {:?}", input, tree.errors);
        }
        let tree = interp.parse("xxz", "input");
        assert_eq!(tree.errors.len(), 1);
        assert_eq!(tree.errors[0].position, 2);
    }
}
