// Copyright (c) 2018 Fabian Schuiki

//! Rust code emission.
//!
//! The generated code builds on the `tinypg-runtime` crate: the scanner
//! artifact declares the `TokenType` enum and compiles the patterns, the
//! parser artifact holds one `parse_<Name>` method per nonterminal, and the
//! parse tree artifact holds one `eval_<Name>` function per nonterminal.

use crate::backend::{push_indented, rewrite_code, ArtifactKind, Context, Emitter, GenerateMode};
use crate::directive::Language;
use crate::grammar::{Grammar, TerminalId};
use crate::lower::{Routine, Stmt};
use crate::template::Slot;

/// Emits Rust code.
pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn slot(&self, ctx: &Context, _kind: ArtifactKind, slot: Slot) -> String {
        let g = ctx.grammar;
        match slot {
            Slot::Namespace => match ctx.mode {
                GenerateMode::Release => ctx.namespace().to_string(),
                GenerateMode::Debug => "crate".to_string(),
            },
            Slot::IParser => match ctx.mode {
                GenerateMode::Release => String::new(),
                GenerateMode::Debug => GENERATED_PARSER_IMPL.to_string(),
            },
            Slot::IParseTree => match ctx.mode {
                GenerateMode::Release => "ParseTree<TokenType>".to_string(),
                GenerateMode::Debug => "tinypg_runtime::ParseTree<TokenType>".to_string(),
            },
            Slot::TokenType => {
                let mut out = String::new();
                for (_, nt) in g.nonterminals() {
                    out.push_str(&format!("    {},\n", nt.name));
                }
                for (_, t) in g.terminals() {
                    out.push_str(&format!("    {},\n", t.name));
                }
                out
            }
            Slot::RegExps => {
                let mut out = String::new();
                for (_, t) in g.terminals() {
                    out.push_str(&format!(
                        "            (TokenType::{}, {}, {}),\n",
                        t.name,
                        raw_string(&t.pattern),
                        t.ignore_case
                    ));
                }
                out
            }
            Slot::SkipList => g
                .skip_symbols()
                .map(|t| kind_path(g, t))
                .collect::<Vec<_>>()
                .join(", "),
            Slot::FileAndLine => match g.file_and_line() {
                Some(t) => format!("Some({})", kind_path(g, t)),
                None => "None".to_string(),
            },
            Slot::ParseNonTerminals => {
                let mut out = String::new();
                for (i, routine) in ctx.program.routines.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    emit_routine(g, routine, &mut out);
                }
                out
            }
            Slot::EvalSymbols => {
                let mut out = String::new();
                for (_, nt) in g.nonterminals() {
                    out.push_str(&format!(
                        "        TokenType::{} => eval_{}(tree, node),\n",
                        nt.name, nt.name
                    ));
                }
                out
            }
            Slot::VirtualEvalMethods => {
                let mut out = String::new();
                for (i, (_, nt)) in g.nonterminals().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    out.push_str(&format!(
                        "pub fn eval_{}(tree: &ParseTree<TokenType>, node: NodeId) -> Value {{\n",
                        nt.name
                    ));
                    match nt.code {
                        Some(ref code) => {
                            let body = rewrite_code(code, |var, index| {
                                format!(
                                    "value_of(tree, node, TokenType::{}, {})",
                                    var,
                                    index.unwrap_or("0")
                                )
                            });
                            out.push_str("    Value::from({\n");
                            push_indented(&mut out, 2, &body);
                            out.push_str("    })\n");
                        }
                        None => out.push_str(DEFAULT_EVAL),
                    }
                    out.push_str("}\n");
                }
                out
            }
        }
    }
}

const GENERATED_PARSER_IMPL: &str = "
impl tinypg_runtime::GeneratedParser for Parser {
    type Kind = TokenType;

    fn parse(&mut self, input: &str, file: &str) -> ParseTree<TokenType> {
        Parser::parse(self, input, file)
    }
}
";

const DEFAULT_EVAL: &str = "    match tree[node].children.first() {
        Some(&child) => eval_node(tree, child),
        None => Value::Nil,
    }
";

/// The path of a terminal's variant of the generated `TokenType`.
fn kind_path(g: &Grammar, id: TerminalId) -> String {
    format!("TokenType::{}", g[id].name)
}

/// A bracketed list of terminal kinds, e.g. `&[TokenType::A, TokenType::B]`.
fn kind_slice(g: &Grammar, ids: &[TerminalId]) -> String {
    let kinds: Vec<_> = ids.iter().map(|&t| kind_path(g, t)).collect();
    format!("&[{}]", kinds.join(", "))
}

/// An or-pattern over terminal kinds, e.g. `TokenType::A | TokenType::B`.
fn kind_pattern(g: &Grammar, ids: &[TerminalId]) -> String {
    let kinds: Vec<_> = ids.iter().map(|&t| kind_path(g, t)).collect();
    kinds.join(" | ")
}

/// Quote a pattern as a raw string literal.
fn raw_string(s: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in s.chars() {
        if c == '#' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let hashes = "#".repeat(if s.contains('"') { longest + 1 } else { 0 });
    format!("r{}\"{}\"{}", hashes, s, hashes)
}

fn emit_routine(g: &Grammar, routine: &Routine, out: &mut String) {
    let name = &routine.name;
    out.push_str(&format!("    fn parse_{}(&mut self, parent: NodeId) {{\n", name));
    out.push_str(&format!(
        "        let node = self.tree.create_node(parent, self.scanner.here(TokenType::{}), {:?});\n",
        name, name
    ));
    emit_stmts(g, &routine.body, 2, out);
    out.push_str("        self.tree.widen(parent, node);\n");
    out.push_str("    }\n");
}

fn emit_stmts(g: &Grammar, stmts: &[Stmt], indent: usize, out: &mut String) {
    for stmt in stmts {
        emit_stmt(g, stmt, indent, out);
    }
}

fn emit_stmt(g: &Grammar, stmt: &Stmt, indent: usize, out: &mut String) {
    let pad = "    ".repeat(indent);
    match *stmt {
        Stmt::Expect {
            terminal,
            ref expected,
        } => {
            let kind = kind_path(g, terminal);
            out.push_str(&format!("{}let tok = self.scanner.scan(&[{}]);\n", pad, kind));
            out.push_str(&format!("{}self.tree.add_token(node, &tok);\n", pad));
            out.push_str(&format!("{}if tok.kind != {} {{\n", pad, kind));
            out.push_str(&format!(
                "{}    self.tree.error(ParseError::unexpected(codes::UNEXPECTED_TOKEN, &tok, {:?}));\n",
                pad, expected
            ));
            out.push_str(&format!("{}    return;\n", pad));
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::Call(id) => {
            out.push_str(&format!("{}self.parse_{}(node);\n", pad, g[id].name));
        }
        Stmt::Optional {
            ref lookahead,
            ref body,
        } => {
            out.push_str(&format!(
                "{}if matches!(self.scanner.look_ahead({}).kind, {}) {{\n",
                pad,
                kind_slice(g, lookahead),
                kind_pattern(g, lookahead)
            ));
            emit_stmts(g, body, indent + 1, out);
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::Repeat {
            ref lookahead,
            ref body,
            at_least_once,
        } => {
            let cond = format!(
                "matches!(self.scanner.look_ahead({}).kind, {})",
                kind_slice(g, lookahead),
                kind_pattern(g, lookahead)
            );
            if at_least_once {
                out.push_str(&format!("{}loop {{\n", pad));
                emit_stmts(g, body, indent + 1, out);
                out.push_str(&format!("{}    if !{} {{\n", pad, cond));
                out.push_str(&format!("{}        break;\n", pad));
                out.push_str(&format!("{}    }}\n", pad));
                out.push_str(&format!("{}}}\n", pad));
            } else {
                out.push_str(&format!("{}while {} {{\n", pad, cond));
                emit_stmts(g, body, indent + 1, out);
                out.push_str(&format!("{}}}\n", pad));
            }
        }
        Stmt::Dispatch {
            ref lookahead,
            ref arms,
            ref expected,
        } => {
            let kinds = kind_slice(g, lookahead);
            out.push_str(&format!("{}let kind = self.scanner.look_ahead({}).kind;\n", pad, kinds));
            out.push_str(&format!("{}match kind {{\n", pad));
            for arm in arms {
                out.push_str(&format!("{}    {} => {{\n", pad, kind_pattern(g, &arm.terminals)));
                emit_stmts(g, &arm.body, indent + 2, out);
                out.push_str(&format!("{}    }}\n", pad));
            }
            out.push_str(&format!("{}    _ => {{\n", pad));
            out.push_str(&format!(
                "{}        let tok = self.scanner.look_ahead({}).clone();\n",
                pad, kinds
            ));
            out.push_str(&format!(
                "{}        self.tree.error(ParseError::unexpected(codes::NO_ALTERNATIVE, &tok, {:?}));\n",
                pad,
                format!("{}.", expected)
            ));
            out.push_str(&format!("{}        return;\n", pad));
            out.push_str(&format!("{}    }}\n", pad));
            out.push_str(&format!("{}}}\n", pad));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_strings() {
        assert_eq!(raw_string("[0-9]+"), "r\"[0-9]+\"");
        assert_eq!(raw_string("\"[^\"]*\""), "r#\"\"[^\"]*\"\"#");
        assert_eq!(raw_string("\"#"), "r##\"\"#\"##");
    }
}
