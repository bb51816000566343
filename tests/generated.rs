// Copyright (c) 2018 Fabian Schuiki

//! Building the generated Rust parser and checking it against the
//! interpreter.
//!
//! The calculator grammar is rendered into a scratch crate below the test
//! target directory, together with `tests/fixtures/calc/main.rs`. The crate
//! is built and run with the cargo that runs this test.

extern crate tinypg;
extern crate tinypg_runtime;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tinypg::backend::{write_artifacts, GenerateMode};
use tinypg::compile;
use tinypg::config::Options;
use tinypg_runtime::{ParseTree, TokenKind};

const CALC: &str = "
    [Skip] WS -> \"\\s+\";
    NUMBER -> \"[0-9]+\";
    Start -> Add;
    Add -> Expr ('+' Expr)* { $Expr[0] };
    Expr -> NUMBER | '(' Add ')';
";

const INPUTS: &[&str] = &["1 + (2 + 3)", "1 +", "(1", "+ 2", "1 2", "", "7 $ 8"];

fn options() -> Options {
    let root = env!("CARGO_MANIFEST_DIR");
    Options::new(root, root)
}

/// Render a tree the same way the fixture's `dump` does. `name` maps a node
/// kind to the name of its symbol.
fn dump<K: TokenKind, F: Fn(K) -> String>(tree: &ParseTree<K>, name: F) -> String {
    let mut out = String::new();
    for (depth, id) in tree.walk().into_iter().skip(1) {
        let token = &tree[id].token;
        out.push_str(&format!(
            "{}{} '{}' {}..{}\n",
            "  ".repeat(depth - 1),
            name(token.kind),
            token.text,
            token.span.start,
            token.span.end
        ));
    }
    for e in &tree.errors {
        out.push_str(&format!("error {:#06x} {}:{} {}\n", e.code, e.line, e.column, e.message));
    }
    out
}

fn write_fixture(dir: &Path) {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let src = dir.join("src");
    fs::create_dir_all(&src).unwrap();
    let manifest = format!(
        "[package]\n\
         name = \"calc\"\n\
         version = \"0.0.0\"\n\
         edition = \"2018\"\n\
         publish = false\n\
         \n\
         [workspace]\n\
         \n\
         [dependencies]\n\
         tinypg-runtime = {{ path = '{}' }}\n",
        root.join("src").join("runtime").display()
    );
    fs::write(dir.join("Cargo.toml"), manifest).unwrap();
    let lock = root.join("Cargo.lock");
    if lock.exists() {
        fs::copy(&lock, dir.join("Cargo.lock")).unwrap();
    }
    fs::copy(root.join("tests/fixtures/calc/main.rs"), src.join("main.rs")).unwrap();

    let c = compile(CALC, "calc.tpg", &options());
    assert!(c.is_ok(), "{}", c.diagnostics);
    let artifacts = c.generate(GenerateMode::Release).unwrap();
    let written = write_artifacts(&artifacts, &src).unwrap();
    assert_eq!(written.len(), 3);
}

fn run_fixture(dir: &Path) -> String {
    let output = Command::new(env!("CARGO"))
        .arg("run")
        .arg("--quiet")
        .arg("--offline")
        .arg("--manifest-path")
        .arg(dir.join("Cargo.toml"))
        .arg("--")
        .args(INPUTS)
        .env("CARGO_TARGET_DIR", dir.join("target"))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "generated parser failed to build or run:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn generated_parser_matches_interpreter() {
    let dir: PathBuf = Path::new(env!("CARGO_TARGET_TMPDIR")).join("calc");
    write_fixture(&dir);
    let stdout = run_fixture(&dir);

    let runs: Vec<&str> = stdout.split("--\n").collect();
    assert_eq!(runs.len(), INPUTS.len() + 1, "{}", stdout);
    assert_eq!(runs[INPUTS.len()], "");

    let c = compile(CALC, "calc.tpg", &options());
    let mut interp = c.interpreter().unwrap();
    for (input, run) in INPUTS.iter().zip(&runs) {
        let (value, tree) = {
            let mut lines: Vec<&str> = run.lines().collect();
            let value = lines.pop().unwrap_or("");
            (value.to_string(), lines.iter().map(|l| format!("{}\n", l)).collect::<String>())
        };
        assert!(value.starts_with("value "), "{:?}: {}", input, run);
        let expected = interp.parse(input, "sample");
        let expected = dump(&expected, |kind| interp.kind_name(kind).to_string());
        assert_eq!(tree, expected, "trees differ for {:?}", input);
    }

    assert!(!runs[0].contains("error "));
    assert!(runs[0].ends_with("value 1\n"));
    assert!(runs[1].contains("error "));
    assert!(runs[2].contains("error "));
}
