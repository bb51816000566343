// Copyright (c) 2018 Fabian Schuiki

//! Rendering grammars through the shipped templates.

extern crate rstest;
extern crate tinypg;

use rstest::rstest;
use tinypg::backend::{Artifact, ArtifactKind, GenerateMode};
use tinypg::config::Options;
use tinypg::diag::codes;
use tinypg::compile;

const CALC: &str = "
    [Skip] WS -> \"\\s+\";
    NUMBER -> \"[0-9]+\";
    Start -> Add;
    Add -> Expr ('+' Expr)* { $Expr[0] };
    Expr -> NUMBER | '(' Add ')';
";

fn options() -> Options {
    let root = env!("CARGO_MANIFEST_DIR");
    Options::new(root, root)
}

fn generate(text: &str, mode: GenerateMode) -> Vec<Artifact> {
    let c = compile(text, "calc.tpg", &options());
    assert!(c.is_ok(), "{}", c.diagnostics);
    match c.generate(mode) {
        Ok(artifacts) => artifacts,
        Err(diag) => panic!("{}", diag),
    }
}

fn artifact(artifacts: &[Artifact], kind: ArtifactKind) -> &str {
    &artifacts.iter().find(|a| a.kind == kind).unwrap().text
}

#[test]
fn generation_is_deterministic() {
    let first = generate(CALC, GenerateMode::Release);
    let second = generate(CALC, GenerateMode::Release);
    assert_eq!(first, second);
}

#[rstest]
#[case("", &["scanner.rs", "parser.rs", "parse_tree.rs"])]
#[case("@TinyPG { Language = \"C#\"; }", &["Scanner.cs", "Parser.cs", "ParseTree.cs"])]
#[case("@Parser { FileName = \"calc_parser.rs\"; }", &["scanner.rs", "calc_parser.rs", "parse_tree.rs"])]
#[case("@ParseTree { Generate = \"False\"; }", &["scanner.rs", "parser.rs"])]
fn artifact_names(#[case] directives: &str, #[case] expected: &[&str]) {
    let artifacts = generate(&format!("{}{}", directives, CALC), GenerateMode::Release);
    let names: Vec<_> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, expected);
}

#[test]
fn rust_routines() {
    let artifacts = generate(CALC, GenerateMode::Release);
    let parser = artifact(&artifacts, ArtifactKind::Parser);
    assert!(parser.contains("use crate::scanner::TokenType;"));
    assert!(parser.contains("    fn parse_Start(&mut self, parent: NodeId) {\n"));
    assert!(parser.contains("        self.parse_Add(node);\n"));
    assert!(parser.contains("        while matches!(self.scanner.look_ahead(&[TokenType::PLUS]).kind, TokenType::PLUS) {\n"));
    assert!(parser.contains("codes::NO_ALTERNATIVE, &tok, \"NUMBER or (.\""));
    assert!(!parser.contains("<%"));

    let scanner = artifact(&artifacts, ArtifactKind::Scanner);
    assert!(scanner.contains("    Start,\n    Add,\n    Expr,\n"));
    assert!(scanner.contains("            (TokenType::NUMBER, r\"[0-9]+\", false),\n"));
    assert!(scanner.contains("vec![TokenType::WS]"));
    assert!(scanner.contains("        None,\n"));

    let tree = artifact(&artifacts, ArtifactKind::ParseTree);
    assert!(tree.contains("        TokenType::Add => eval_Add(tree, node),\n"));
    assert!(tree.contains("value_of(tree, node, TokenType::Expr, 0)"));
}

#[rstest]
#[case(GenerateMode::Release, false, "-> ParseTree<TokenType> {")]
#[case(GenerateMode::Debug, true, "-> tinypg_runtime::ParseTree<TokenType> {")]
fn rust_modes(#[case] mode: GenerateMode, #[case] host_impl: bool, #[case] signature: &str) {
    let artifacts = generate(CALC, mode);
    let parser = artifact(&artifacts, ArtifactKind::Parser);
    assert_eq!(parser.contains("impl tinypg_runtime::GeneratedParser for Parser"), host_impl);
    assert!(parser.contains(signature));
}

#[rstest]
#[case(GenerateMode::Release, "namespace Calc", "public partial class Parser\n")]
#[case(GenerateMode::Debug, "namespace TinyPG.Debug", "public partial class Parser : TinyPG.Debug.IParser\n")]
fn csharp_modes(#[case] mode: GenerateMode, #[case] namespace: &str, #[case] class: &str) {
    let text = format!("@TinyPG {{ Language = \"C#\"; Namespace = \"Calc\"; }}{}", CALC);
    let artifacts = generate(&text, mode);
    let parser = artifact(&artifacts, ArtifactKind::Parser);
    assert!(parser.contains(namespace));
    assert!(parser.contains(class));
    assert!(parser.contains("private void ParseExpr(ParseNode parent)"));
    let tree = artifact(&artifacts, ArtifactKind::ParseTree);
    assert!(tree.contains("this.GetValue(tree, TokenType.Expr, 0)"));
    assert!(tree.contains("protected virtual object EvalStart(ParseTree tree, params object[] paramlist)"));
}

#[test]
fn missing_template_directory_is_fatal() {
    let root = env!("CARGO_MANIFEST_DIR");
    let options = Options::new(root, std::path::Path::new(root).join("tests"));
    let c = compile(CALC, "calc.tpg", &options);
    assert!(c.is_ok(), "{}", c.diagnostics);
    let diag = c.generate(GenerateMode::Release).unwrap_err();
    assert_eq!(diag.codes(), vec![codes::TEMPLATE_DIR_UNRESOLVED]);
}

#[test]
fn compile_errors_block_generation() {
    let c = compile("Start -> A;", "bad.tpg", &options());
    let diag = c.generate(GenerateMode::Release).unwrap_err();
    assert_eq!(diag.codes(), vec![codes::UNDECLARED_SYMBOL]);
}
