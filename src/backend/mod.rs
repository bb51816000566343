// Copyright (c) 2018 Fabian Schuiki

//! Code generation.
//!
//! The backend renders the lowered routines of a grammar into source files.
//! Each enabled artifact loads its template from the configured template
//! directory and fills the template's slots with code produced by the
//! emitter of the target language.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Options;
use crate::diag::{codes, Diagnostics};
use crate::directive::{DirectiveKind, Language};
use crate::grammar::Grammar;
use crate::lower::Program;
use crate::template::{Slot, Template};

pub mod csharp;
pub mod rust;

/// Whether to generate code for distribution or for in-process debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerateMode {
    /// Code placed in the namespace the grammar asks for.
    Release,
    /// Code that plugs into the debugging interfaces of the host.
    Debug,
}

/// The files that can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The scanner with its token type and patterns.
    Scanner,
    /// The recursive-descent parser.
    Parser,
    /// The parse tree with its evaluator.
    ParseTree,
}

impl ArtifactKind {
    /// All artifact kinds, in generation order.
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Scanner,
        ArtifactKind::Parser,
        ArtifactKind::ParseTree,
    ];

    /// The directive that configures this artifact.
    pub fn directive(self) -> DirectiveKind {
        match self {
            ArtifactKind::Scanner => DirectiveKind::Scanner,
            ArtifactKind::Parser => DirectiveKind::Parser,
            ArtifactKind::ParseTree => DirectiveKind::ParseTree,
        }
    }

    /// The template file of this artifact for a language.
    pub fn template_file(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::Rust, ArtifactKind::Scanner) => "scanner.rs.tpl",
            (Language::Rust, ArtifactKind::Parser) => "parser.rs.tpl",
            (Language::Rust, ArtifactKind::ParseTree) => "parse_tree.rs.tpl",
            (Language::CSharp, ArtifactKind::Scanner) => "Scanner.cs.tpl",
            (Language::CSharp, ArtifactKind::Parser) => "Parser.cs.tpl",
            (Language::CSharp, ArtifactKind::ParseTree) => "ParseTree.cs.tpl",
        }
    }

    /// The output file name used unless the directive sets `FileName`.
    pub fn default_file_name(self, language: Language) -> &'static str {
        let tpl = self.template_file(language);
        &tpl[..tpl.len() - 4]
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.directive())
    }
}

/// A generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Which artifact this is.
    pub kind: ArtifactKind,
    /// The name of the file to write.
    pub file_name: String,
    /// The generated source text.
    pub text: String,
}

/// Everything an emitter needs to know to fill a slot.
pub struct Context<'a> {
    /// The grammar being generated.
    pub grammar: &'a Grammar,
    /// The lowered routines of the grammar.
    pub program: &'a Program,
    /// The generation mode.
    pub mode: GenerateMode,
}

impl<'a> Context<'a> {
    /// The namespace requested by the grammar.
    pub fn namespace(&self) -> &'a str {
        self.grammar
            .directives()
            .value(DirectiveKind::TinyPG, "Namespace")
            .unwrap_or("")
    }
}

/// A target language's way of rendering code.
pub trait Emitter {
    /// The language this emitter produces.
    fn language(&self) -> Language;

    /// Produce the code for a slot of an artifact's template.
    fn slot(&self, ctx: &Context, kind: ArtifactKind, slot: Slot) -> String;
}

/// Get the emitter for a language.
pub fn emitter(language: Language) -> Box<dyn Emitter> {
    match language {
        Language::Rust => Box::new(rust::RustEmitter),
        Language::CSharp => Box::new(csharp::CSharpEmitter),
    }
}

/// Generate the enabled artifacts of a grammar.
///
/// Returns `None` if the template directory cannot be resolved. Artifacts
/// whose template cannot be read are reported and skipped.
pub fn generate(
    grammar: &Grammar,
    program: &Program,
    mode: GenerateMode,
    options: &Options,
    diag: &mut Diagnostics,
) -> Option<Vec<Artifact>> {
    let directives = grammar.directives();
    let language = directives.language().unwrap_or(Language::Rust);
    let dir = directives
        .value(DirectiveKind::TinyPG, "TemplatePath")
        .and_then(|path| options.resolve_template(path));
    let dir = match dir {
        Some(dir) => dir,
        None => {
            diag.unlocated(
                codes::TEMPLATE_DIR_UNRESOLVED,
                format!(
                    "Template path '{}' cannot be resolved",
                    directives
                        .value(DirectiveKind::TinyPG, "TemplatePath")
                        .unwrap_or("")
                ),
            );
            return None;
        }
    };
    debug!("generating {} code from templates in {}", language, dir.display());

    let emitter = emitter(language);
    let ctx = Context {
        grammar,
        program,
        mode,
    };
    let mut artifacts = Vec::new();
    for &kind in &ArtifactKind::ALL {
        if !directives.generate(kind.directive()) {
            trace!("skipping {} artifact", kind);
            continue;
        }
        let path = dir.join(kind.template_file(language));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                diag.unlocated(
                    codes::TEMPLATE_UNREADABLE,
                    format!("Template file '{}' cannot be read: {}", path.display(), e),
                );
                continue;
            }
        };
        let template = Template::parse(kind.template_file(language), &text, diag);
        if mode == GenerateMode::Debug
            && kind == ArtifactKind::Parser
            && !template.has_slot(Slot::IParser)
        {
            warn!(
                "template {} has no {} slot; the parser will not implement the debug interface",
                template.name(),
                Slot::IParser
            );
        }
        let mut values = HashMap::new();
        for segment in template.segments() {
            if let crate::template::Segment::Slot(slot) = *segment {
                values
                    .entry(slot)
                    .or_insert_with(|| emitter.slot(&ctx, kind, slot));
            }
        }
        let file_name = directives
            .value(kind.directive(), "FileName")
            .unwrap_or_else(|| kind.default_file_name(language))
            .to_string();
        artifacts.push(Artifact {
            kind,
            file_name,
            text: template.render(&values),
        });
    }
    if directives.generate(DirectiveKind::TextHighlighter) {
        warn!("text highlighter generation is not supported; ignoring");
    }
    Some(artifacts)
}

/// Write artifacts into a directory, returning the paths written.
pub fn write_artifacts(artifacts: &[Artifact], dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        fs::write(&path, &artifact.text)?;
        debug!("wrote {} to {}", artifact.kind, path.display());
        written.push(path);
    }
    Ok(written)
}

/// Append `text` to `out`, indenting every non-empty line by `indent`
/// levels of four spaces.
pub(crate) fn push_indented(out: &mut String, indent: usize, text: &str) {
    let pad = "    ".repeat(indent);
    for line in text.lines() {
        if !line.is_empty() {
            out.push_str(&pad);
        }
        out.push_str(line);
        out.push('\n');
    }
}

/// Rewrite the `$Name` and `$Name[i]` references of action code.
pub(crate) fn rewrite_code<F: Fn(&str, Option<&str>) -> String>(code: &str, f: F) -> String {
    let mut out = String::new();
    let mut last = 0;
    for (range, var, index) in crate::sema::code_variables(code) {
        out.push_str(&code[last..range.start]);
        out.push_str(&f(&var, index.as_ref().map(String::as_str)));
        last = range.end;
    }
    out.push_str(&code[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(ArtifactKind::Parser.default_file_name(Language::Rust), "parser.rs");
        assert_eq!(ArtifactKind::ParseTree.default_file_name(Language::CSharp), "ParseTree.cs");
    }

    #[test]
    fn code_rewriting() {
        let s = rewrite_code("$A + $B[1] * 2", |var, index| {
            format!("v({}, {})", var, index.unwrap_or("0"))
        });
        assert_eq!(s, "v(A, 0) + v(B, 1) * 2");
    }

    #[test]
    fn indentation() {
        let mut s = String::new();
        push_indented(&mut s, 2, "a\n\nb");
        assert_eq!(s, "        a\n\n        b\n");
    }
}
