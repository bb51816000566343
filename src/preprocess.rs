// Copyright (c) 2018 Fabian Schuiki

//! Preparation of an analyzed grammar for code generation.

use tinypg_runtime::Span;

use crate::config::Options;
use crate::diag::Diagnostics;
use crate::directive::{Directive, DirectiveKind, Language};
use crate::grammar::Grammar;

/// Fill in directive defaults and compute the FIRST sets.
///
/// Values present in the grammar are never overridden. Diagnostics raised by
/// the FIRST set analysis are appended to `diag`.
pub fn preprocess(grammar: &mut Grammar, options: &Options, diag: &mut Diagnostics) {
    setup_directives(grammar, options);
    let first = grammar.first_sets();
    diag.extend(first.diagnostics().iter().cloned());
    debug!(
        "preprocessed grammar; {} directives, {} first set diagnostics",
        grammar.directives().len(),
        first.diagnostics().len()
    );
}

fn setup_directives(grammar: &mut Grammar, options: &Options) {
    let directives = grammar.directives_mut();

    if directives.find(DirectiveKind::TinyPG).is_none() {
        directives.insert(0, Directive::new(DirectiveKind::TinyPG, Span::none()));
    }
    let language = directives.language().unwrap_or(Language::Rust);
    let template_dir = options.default_template_dir(language.template_dir());
    if let Some(d) = directives.find_mut(DirectiveKind::TinyPG) {
        d.set_default("Namespace", language.default_namespace());
        d.set_default("OutputPath", "./");
        d.set_default("Language", language.name());
        d.set_default("TemplatePath", template_dir.to_string_lossy().into_owned());
    }

    for &kind in &[DirectiveKind::Parser, DirectiveKind::Scanner] {
        if directives.find(kind).is_none() {
            directives.insert(1, Directive::new(kind, Span::none()));
        }
    }
    for &kind in &[DirectiveKind::ParseTree, DirectiveKind::TextHighlighter] {
        if directives.find(kind).is_none() {
            directives.push(Directive::new(kind, Span::none()));
        }
    }
    for &kind in &[
        DirectiveKind::Scanner,
        DirectiveKind::Parser,
        DirectiveKind::ParseTree,
        DirectiveKind::TextHighlighter,
    ] {
        let generate = kind != DirectiveKind::TextHighlighter;
        if let Some(d) = directives.find_mut(kind) {
            d.set_default("Generate", if generate { "True" } else { "False" });
        }
    }
    trace!(
        "directives after defaults: {:?}",
        directives.iter().map(|d| d.kind).collect::<Vec<_>>()
    );
}
