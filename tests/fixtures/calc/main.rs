// Copyright (c) 2018 Fabian Schuiki

//! Runs the generated calculator parser on its arguments and prints the
//! trees in the format `tests/generated.rs` compares against.

mod parse_tree;
mod parser;
mod scanner;

use scanner::TokenType;
use tinypg_runtime::ParseTree;

fn dump(tree: &ParseTree<TokenType>) -> String {
    let mut out = String::new();
    for (depth, id) in tree.walk().into_iter().skip(1) {
        let token = &tree[id].token;
        out.push_str(&format!(
            "{}{:?} '{}' {}..{}\n",
            "  ".repeat(depth - 1),
            token.kind,
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

fn main() {
    let scanner = scanner::new_scanner().expect("terminal patterns compile");
    let mut parser = parser::Parser::new(scanner);
    for input in std::env::args().skip(1) {
        let tree = parser.parse(&input, "sample");
        print!("{}", dump(&tree));
        println!("value {}", parse_tree::eval(&tree));
        println!("--");
    }
}
