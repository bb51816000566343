// Copyright (c) 2018 Fabian Schuiki

//! A parser generator for LL(1) grammars.
//!
//! A grammar description is compiled in a fixed sequence of phases: the
//! description is parsed, analyzed into a [`grammar::Grammar`], given its
//! directive defaults and FIRST sets, and lowered into one parsing routine
//! per nonterminal. The routines are then either rendered into source code
//! through the templates of the target language, or executed directly on
//! sample input by the [`interp::Interpreter`].
//!
//! Problems with the grammar never abort compilation. They are collected as
//! diagnostics, such that a single compile reports everything it can find.

#![deny(missing_docs)]

extern crate bit_set;
extern crate indexmap;
#[macro_use]
extern crate log;
extern crate once_cell;
extern crate regex;
extern crate tinypg_runtime;

pub mod backend;
pub mod config;
pub mod diag;
pub mod directive;
pub mod first;
pub mod grammar;
pub mod host;
pub mod interp;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod preprocess;
pub mod rule;
pub mod sema;
pub mod template;

use crate::backend::{Artifact, GenerateMode};
use crate::config::Options;
use crate::diag::Diagnostics;
use crate::grammar::Grammar;
use crate::lower::Program;

/// A pretty printer.
pub struct Pretty<C, T> {
    ctx: C,
    item: T,
}

impl<C, T> Pretty<C, T> {
    pub(crate) fn new(ctx: C, item: T) -> Pretty<C, T> {
        Pretty { ctx, item }
    }
}

/// The result of compiling a grammar description.
#[derive(Debug)]
pub struct Compilation {
    /// The name of the compiled file.
    pub file: String,
    /// The grammar, unless the description was unusable.
    pub grammar: Option<Grammar>,
    /// The parsing routines of the grammar.
    pub program: Option<Program>,
    /// Everything that is wrong with the description.
    pub diagnostics: Diagnostics,
    options: Options,
}

/// Compile a grammar description.
///
/// Syntax errors stop compilation before semantic analysis. All other
/// problems are collected while compilation continues as far as possible.
pub fn compile(text: &str, file: &str, options: &Options) -> Compilation {
    let (desc, mut diagnostics) = parser::parse(text, file);
    let mut compilation = Compilation {
        file: file.to_string(),
        grammar: None,
        program: None,
        diagnostics: Diagnostics::new(),
        options: options.clone(),
    };
    if !diagnostics.is_empty() {
        debug!("{}: {} syntax errors", file, diagnostics.len());
        compilation.diagnostics = diagnostics;
        return compilation;
    }
    if let Some(mut grammar) = sema::analyze(&desc, options, &mut diagnostics) {
        preprocess::preprocess(&mut grammar, options, &mut diagnostics);
        compilation.program = Some(lower::lower(&grammar));
        compilation.grammar = Some(grammar);
    }
    debug!("{}: compiled with {} diagnostics", file, diagnostics.len());
    compilation.diagnostics = diagnostics;
    compilation
}

impl Compilation {
    /// Whether the grammar is complete and free of errors.
    pub fn is_ok(&self) -> bool {
        self.grammar.is_some() && self.diagnostics.is_empty()
    }

    /// Generate the enabled artifacts.
    ///
    /// Fails with the compile diagnostics if there are any, or with the
    /// problems found while generating.
    pub fn generate(&self, mode: GenerateMode) -> Result<Vec<Artifact>, Diagnostics> {
        let (grammar, program) = match (&self.grammar, &self.program) {
            (&Some(ref g), &Some(ref p)) if self.diagnostics.is_empty() => (g, p),
            _ => return Err(self.diagnostics.clone()),
        };
        let mut diag = Diagnostics::new();
        match backend::generate(grammar, program, mode, &self.options, &mut diag) {
            Some(artifacts) if diag.is_empty() => Ok(artifacts),
            _ => Err(diag),
        }
    }

    /// The directory generated artifacts are written to.
    pub fn output_dir(&self) -> Option<std::path::PathBuf> {
        let grammar = self.grammar.as_ref()?;
        let path = grammar
            .directives()
            .value(directive::DirectiveKind::TinyPG, "OutputPath")?;
        self.options.resolve_output(path)
    }

    /// Get an interpreter that runs the grammar on sample input.
    ///
    /// Returns `None` if the grammar has any diagnostics. Routines of a
    /// left-recursive grammar would never terminate.
    pub fn interpreter(&self) -> Option<interp::Interpreter> {
        match (&self.grammar, &self.program) {
            (&Some(ref g), &Some(ref p)) if self.diagnostics.is_empty() => {
                Some(interp::Interpreter::new(g, p))
            }
            _ => None,
        }
    }
}
