// Copyright (c) 2018 Fabian Schuiki

//! Compiling grammar descriptions end to end.

extern crate rstest;
extern crate tinypg;

use rstest::rstest;
use tinypg::config::Options;
use tinypg::diag::codes;
use tinypg::directive::DirectiveKind;
use tinypg::{compile, Compilation};

fn options() -> Options {
    let root = env!("CARGO_MANIFEST_DIR");
    Options::new(root, root)
}

fn run(text: &str) -> Compilation {
    compile(text, "test.tpg", &options())
}

#[rstest]
#[case("A -> 'a' 'b';", vec![codes::START_REQUIRED])]
#[case("Start -> \"a\";", vec![codes::START_IS_TERMINAL, codes::START_REQUIRED])]
#[case("", vec![codes::START_REQUIRED])]
fn start_is_required(#[case] text: &str, #[case] expected: Vec<u32>) {
    let c = run(text);
    assert!(c.grammar.is_none());
    assert!(c.program.is_none());
    assert_eq!(c.diagnostics.codes(), expected);
}

#[test]
fn first_terminal_declaration_wins() {
    let c = run("A -> \"a\"; A -> \"b\"; Start -> A;");
    assert_eq!(c.diagnostics.codes(), vec![codes::DUPLICATE_TERMINAL]);
    let g = c.grammar.as_ref().unwrap();
    let a = g.terminal("A").unwrap();
    assert_eq!(g[a].pattern, "a");
    assert!(!c.is_ok());
}

#[rstest]
#[case("Start -> 'x' | 'y';", &["x", "y"], false)]
#[case("Start -> ('x')? 'y';", &["x", "y"], false)]
#[case("Start -> ('x')* ('y')*;", &["x", "y"], true)]
#[case("Start -> A 'z'; A -> ('x')+ | 'y';", &["x", "y"], false)]
fn first_sets(#[case] text: &str, #[case] expected: &[&str], #[case] empty: bool) {
    let c = run(text);
    assert!(c.is_ok(), "{}", c.diagnostics);
    let g = c.grammar.as_ref().unwrap();
    let start = g.start().unwrap();
    let first = &g.first_sets()[start];
    let names: Vec<_> = first.terminals.iter().map(|&t| g[t].nice_name()).collect();
    assert_eq!(names, expected);
    assert_eq!(first.empty, empty);
}

#[test]
fn unsupported_directives_are_reported_and_skipped() {
    let c = run("@Lexer { Generate = \"True\"; } Start -> 'a' 'b';");
    assert_eq!(c.diagnostics.codes(), vec![codes::UNSUPPORTED_DIRECTIVE]);
    let g = c.grammar.as_ref().unwrap();
    let kinds: Vec<_> = g.directives().iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DirectiveKind::TinyPG,
            DirectiveKind::Scanner,
            DirectiveKind::Parser,
            DirectiveKind::ParseTree,
            DirectiveKind::TextHighlighter,
        ]
    );
    assert!(c.program.is_some());
}

#[test]
fn syntax_errors_stop_compilation() {
    let c = run("Start -> ('a' ;");
    assert!(!c.diagnostics.is_empty());
    assert!(c.diagnostics.iter().all(|d| d.code == codes::SYNTAX_ERROR || d.code == codes::UNTERMINATED));
    assert!(c.grammar.is_none());
}

#[test]
fn every_problem_is_reported() {
    let c = run(
        "[Frobnicate] A -> \"a\";\n\
         A -> \"b\";\n\
         Start -> A B { $C };",
    );
    assert_eq!(
        c.diagnostics.codes(),
        vec![
            codes::UNSUPPORTED_ATTRIBUTE,
            codes::DUPLICATE_TERMINAL,
            codes::UNDECLARED_SYMBOL,
            codes::UNMATCHED_VARIABLE,
        ]
    );
    assert!(c.generate(tinypg::backend::GenerateMode::Release).is_err());
}

#[test]
fn left_recursion_is_an_error() {
    let c = run("Start -> Start 'a' | 'b';");
    assert!(c.diagnostics.contains(codes::LEFT_RECURSION));
}

#[test]
fn output_defaults_to_grammar_directory() {
    let c = run("Start -> 'a' 'b';");
    assert_eq!(c.output_dir(), Some(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("./")));
}
