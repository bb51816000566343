// Copyright (c) 2018 Fabian Schuiki

//! C# code emission, compatible with the classic TinyPG templates.

use crate::backend::{push_indented, rewrite_code, ArtifactKind, Context, Emitter, GenerateMode};
use crate::directive::Language;
use crate::grammar::{Grammar, TerminalId};
use crate::lower::{Routine, Stmt};
use crate::template::Slot;

/// Emits C# code.
pub struct CSharpEmitter;

impl Emitter for CSharpEmitter {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn slot(&self, ctx: &Context, _kind: ArtifactKind, slot: Slot) -> String {
        let g = ctx.grammar;
        let debug = ctx.mode == GenerateMode::Debug;
        match slot {
            Slot::Namespace if debug => "TinyPG.Debug".to_string(),
            Slot::Namespace => ctx.namespace().to_string(),
            Slot::IParser if debug => " : TinyPG.Debug.IParser".to_string(),
            Slot::IParser => String::new(),
            Slot::IParseTree if debug => "TinyPG.Debug.IParseTree".to_string(),
            Slot::IParseTree => "ParseTree".to_string(),
            Slot::TokenType => {
                let mut out = String::new();
                out.push_str("            //Non terminal tokens:\n");
                out.push_str("            _NONE_  = 0,\n");
                out.push_str("            _UNDETERMINED_= 1,\n");
                let mut value = 2;
                for (_, nt) in g.nonterminals() {
                    out.push_str(&format!("            {:<20}= {},\n", nt.name, value));
                    value += 1;
                }
                out.push_str("\n            //Terminal tokens:\n");
                for (_, t) in g.terminals() {
                    out.push_str(&format!("            {:<20}= {},\n", t.name, value));
                    value += 1;
                }
                out
            }
            Slot::RegExps => {
                let mut out = String::new();
                for (_, t) in g.terminals() {
                    let options = if t.ignore_case {
                        "RegexOptions.Compiled | RegexOptions.IgnoreCase"
                    } else {
                        "RegexOptions.Compiled"
                    };
                    out.push_str(&format!(
                        "            regex = new Regex(@\"{}\", {});\n",
                        t.pattern.replace('"', "\"\""),
                        options
                    ));
                    out.push_str(&format!("            Patterns.Add(TokenType.{}, regex);\n", t.name));
                    out.push_str(&format!("            Tokens.Add(TokenType.{});\n\n", t.name));
                }
                out
            }
            Slot::SkipList => {
                let mut out = String::new();
                for t in g.skip_symbols() {
                    out.push_str(&format!("            SkipList.Add(TokenType.{});\n", g[t].name));
                }
                out
            }
            Slot::FileAndLine => match g.file_and_line() {
                Some(t) => format!("            FileAndLine = TokenType.{};\n", g[t].name),
                None => String::new(),
            },
            Slot::ParseNonTerminals => {
                let mut out = String::new();
                for routine in &ctx.program.routines {
                    emit_routine(g, routine, &mut out);
                }
                out
            }
            Slot::EvalSymbols => {
                let mut out = String::new();
                for (_, nt) in g.nonterminals() {
                    out.push_str(&format!("                case TokenType.{}:\n", nt.name));
                    out.push_str(&format!("                    Value = Eval{}(tree, paramlist);\n", nt.name));
                    out.push_str("                    break;\n");
                }
                out
            }
            Slot::VirtualEvalMethods => {
                let mut out = String::new();
                for (_, nt) in g.nonterminals() {
                    out.push_str(&format!(
                        "        protected virtual object Eval{}(ParseTree tree, params object[] paramlist)\n",
                        nt.name
                    ));
                    out.push_str("        {\n");
                    match nt.code {
                        Some(ref code) => {
                            let body = rewrite_code(code, |var, index| {
                                format!("this.GetValue(tree, TokenType.{}, {})", var, index.unwrap_or("0"))
                            });
                            push_indented(&mut out, 3, &body);
                        }
                        None => out.push_str("            throw new NotImplementedException();\n"),
                    }
                    out.push_str("        }\n\n");
                }
                out
            }
        }
    }
}

fn lookahead_call(g: &Grammar, ids: &[TerminalId]) -> String {
    let kinds: Vec<_> = ids.iter().map(|&t| format!("TokenType.{}", g[t].name)).collect();
    format!("tok = scanner.LookAhead({});", kinds.join(", "))
}

fn condition(g: &Grammar, ids: &[TerminalId], pad: &str) -> String {
    let tests: Vec<_> = ids
        .iter()
        .map(|&t| format!("tok.Type == TokenType.{}", g[t].name))
        .collect();
    tests.join(&format!("\n{}    || ", pad))
}

fn emit_routine(g: &Grammar, routine: &Routine, out: &mut String) {
    let name = &routine.name;
    out.push_str(&format!(
        "        private void Parse{}(ParseNode parent) // NonTerminalSymbol: {}\n",
        name, name
    ));
    out.push_str("        {\n");
    out.push_str("            Token tok;\n");
    out.push_str("            ParseNode n;\n");
    out.push_str(&format!(
        "            ParseNode node = parent.CreateNode(scanner.GetToken(TokenType.{}), \"{}\");\n",
        name, name
    ));
    out.push_str("            parent.Nodes.Add(node);\n\n");
    emit_stmts(g, &routine.body, 3, out);
    out.push_str("\n            parent.Token.UpdateRange(node.Token);\n");
    out.push_str(&format!("        }} // NonTerminalSymbol: {}\n\n", name));
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
            let name = &g[terminal].name;
            out.push_str(&format!("{}tok = scanner.Scan(TokenType.{}); // Terminal Rule: {}\n", pad, name, name));
            out.push_str(&format!("{}n = node.CreateNode(tok, tok.ToString() );\n", pad));
            out.push_str(&format!("{}node.Token.UpdateRange(tok);\n", pad));
            out.push_str(&format!("{}node.Nodes.Add(n);\n", pad));
            out.push_str(&format!("{}if (tok.Type != TokenType.{}) {{\n", pad, name));
            out.push_str(&format!(
                "{}    tree.Errors.Add(new ParseError(\"Unexpected token '\" + tok.Text.Replace(\"\\n\", \"\") + \"' found. Expected {}\", 0x1001, tok));\n",
                pad,
                escape(expected)
            ));
            out.push_str(&format!("{}    return;\n", pad));
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::Call(id) => {
            let name = &g[id].name;
            out.push_str(&format!("{}Parse{}(node); // NonTerminal Rule: {}\n", pad, name, name));
        }
        Stmt::Optional {
            ref lookahead,
            ref body,
        } => {
            out.push_str(&format!("{}{} // Option Rule\n", pad, lookahead_call(g, lookahead)));
            out.push_str(&format!("{}if ({})\n", pad, condition(g, lookahead, &pad)));
            out.push_str(&format!("{}{{\n", pad));
            emit_stmts(g, body, indent + 1, out);
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::Repeat {
            ref lookahead,
            ref body,
            at_least_once: false,
        } => {
            out.push_str(&format!("{}{} // ZeroOrMore Rule\n", pad, lookahead_call(g, lookahead)));
            out.push_str(&format!("{}while ({})\n", pad, condition(g, lookahead, &pad)));
            out.push_str(&format!("{}{{\n", pad));
            emit_stmts(g, body, indent + 1, out);
            out.push_str(&format!("{}{} // ZeroOrMore Rule\n", pad, lookahead_call(g, lookahead)));
            out.push_str(&format!("{}}}\n", pad));
        }
        Stmt::Repeat {
            ref lookahead,
            ref body,
            at_least_once: true,
        } => {
            out.push_str(&format!("{}do {{ // OneOrMore Rule\n", pad));
            emit_stmts(g, body, indent + 1, out);
            out.push_str(&format!("{}    {} // OneOrMore Rule\n", pad, lookahead_call(g, lookahead)));
            out.push_str(&format!("{}}} while ({}); // OneOrMore Rule\n", pad, condition(g, lookahead, &pad)));
        }
        Stmt::Dispatch {
            ref lookahead,
            ref arms,
            ref expected,
        } => {
            out.push_str(&format!("{}{} // Choice Rule\n", pad, lookahead_call(g, lookahead)));
            out.push_str(&format!("{}switch (tok.Type)\n", pad));
            out.push_str(&format!("{}{{ // Choice Rule\n", pad));
            for arm in arms {
                for &t in &arm.terminals {
                    out.push_str(&format!("{}    case TokenType.{}:\n", pad, g[t].name));
                }
                emit_stmts(g, &arm.body, indent + 2, out);
                out.push_str(&format!("{}        break;\n", pad));
            }
            out.push_str(&format!("{}    default:\n", pad));
            out.push_str(&format!(
                "{}        tree.Errors.Add(new ParseError(\"Unexpected token '\" + tok.Text.Replace(\"\\n\", \"\") + \"' found. Expected {}.\", 0x0002, tok));\n",
                pad,
                escape(expected)
            ));
            out.push_str(&format!("{}        return;\n", pad));
            out.push_str(&format!("{}}} // Choice Rule\n", pad));
        }
    }
}

/// Escape text for inclusion in a regular C# string literal.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(escape("\"a\\b\""), "\\\"a\\\\b\\\"");
    }
}
