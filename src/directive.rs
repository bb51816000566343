// Copyright (c) 2018 Fabian Schuiki

//! Directives that configure code generation.

use std::fmt;
use std::slice::Iter;

use indexmap::IndexMap;
use tinypg_runtime::Span;

/// The directives a grammar may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Global settings such as namespace, language, and paths.
    TinyPG,
    /// Settings of the generated parser.
    Parser,
    /// Settings of the generated scanner.
    Scanner,
    /// Settings of the generated parse tree.
    ParseTree,
    /// Settings of the generated text highlighter.
    TextHighlighter,
}

impl DirectiveKind {
    /// Look up a directive by name.
    pub fn from_name(name: &str) -> Option<DirectiveKind> {
        Some(match name {
            "TinyPG" => DirectiveKind::TinyPG,
            "Parser" => DirectiveKind::Parser,
            "Scanner" => DirectiveKind::Scanner,
            "ParseTree" => DirectiveKind::ParseTree,
            "TextHighlighter" => DirectiveKind::TextHighlighter,
            _ => return None,
        })
    }

    /// The name of the directive.
    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::TinyPG => "TinyPG",
            DirectiveKind::Parser => "Parser",
            DirectiveKind::Scanner => "Scanner",
            DirectiveKind::ParseTree => "ParseTree",
            DirectiveKind::TextHighlighter => "TextHighlighter",
        }
    }

    /// The keys the directive accepts.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            DirectiveKind::TinyPG => &["Namespace", "OutputPath", "TemplatePath", "Language"],
            _ => &["Generate", "FileName"],
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A directive and its key-value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Which directive this is.
    pub kind: DirectiveKind,
    values: IndexMap<String, String>,
    /// Where the directive was declared.
    pub span: Span,
}

impl Directive {
    /// Create an empty directive.
    pub fn new(kind: DirectiveKind, span: Span) -> Directive {
        Directive {
            kind,
            values: IndexMap::new(),
            span,
        }
    }

    /// Get a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value, replacing any previous one.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    /// Set a value unless one is present already.
    pub fn set_default<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Check whether a key has a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get an iterator over the key-value pairs, in order of insertion.
    pub fn values(&self) -> indexmap::map::Iter<String, String> {
        self.values.iter()
    }

    /// Whether the `Generate` key is true.
    pub fn generate(&self) -> bool {
        self.get("Generate")
            .map_or(false, |v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// The ordered list of directives of a grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives(Vec<Directive>);

impl Directives {
    /// Create an empty list.
    pub fn new() -> Directives {
        Directives(Vec::new())
    }

    /// Find a directive.
    pub fn find(&self, kind: DirectiveKind) -> Option<&Directive> {
        self.0.iter().find(|d| d.kind == kind)
    }

    /// Find a directive for modification.
    pub fn find_mut(&mut self, kind: DirectiveKind) -> Option<&mut Directive> {
        self.0.iter_mut().find(|d| d.kind == kind)
    }

    /// Append a directive.
    pub fn push(&mut self, directive: Directive) {
        self.0.push(directive);
    }

    /// Insert a directive at a position.
    pub fn insert(&mut self, index: usize, directive: Directive) {
        let index = index.min(self.0.len());
        self.0.insert(index, directive);
    }

    /// Get a value of a directive.
    pub fn value(&self, kind: DirectiveKind, key: &str) -> Option<&str> {
        self.find(kind).and_then(|d| d.get(key))
    }

    /// The configured target language.
    pub fn language(&self) -> Option<Language> {
        self.value(DirectiveKind::TinyPG, "Language")
            .and_then(Language::from_name)
    }

    /// Whether an artifact directive asks for generation.
    pub fn generate(&self, kind: DirectiveKind) -> bool {
        self.find(kind).map_or(false, Directive::generate)
    }

    /// The number of directives.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no directives.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get an iterator over the directives.
    pub fn iter(&self) -> Iter<Directive> {
        self.0.iter()
    }
}

/// The languages code can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Rust, rendered against the `tinypg-runtime` crate.
    Rust,
    /// C#, rendered against the classic TinyPG templates.
    CSharp,
}

impl Language {
    /// Look up a language by any of its accepted names, ignoring case.
    pub fn from_name(name: &str) -> Option<Language> {
        match name.trim().to_lowercase().as_str() {
            "rust" | "rs" => Some(Language::Rust),
            "c#" | "cs" | "csharp" => Some(Language::CSharp),
            _ => None,
        }
    }

    /// The canonical name of the language.
    pub fn name(self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::CSharp => "C#",
        }
    }

    /// The directory below the template root holding this language's
    /// templates.
    pub fn template_dir(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::CSharp => "csharp",
        }
    }

    /// The namespace used when the grammar does not specify one.
    pub fn default_namespace(self) -> &'static str {
        match self {
            Language::Rust => "crate",
            Language::CSharp => "TinyPG",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for &kind in &[
            DirectiveKind::TinyPG,
            DirectiveKind::Parser,
            DirectiveKind::Scanner,
            DirectiveKind::ParseTree,
            DirectiveKind::TextHighlighter,
        ] {
            assert_eq!(DirectiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DirectiveKind::from_name("Lexer"), None);
    }

    #[test]
    fn languages() {
        assert_eq!(Language::from_name("C#"), Some(Language::CSharp));
        assert_eq!(Language::from_name(" Rust "), Some(Language::Rust));
        assert_eq!(Language::from_name("vb"), None);
    }

    #[test]
    fn defaults_do_not_override() {
        let mut d = Directive::new(DirectiveKind::Parser, Span::none());
        d.set("Generate", "False");
        d.set_default("Generate", "True");
        d.set_default("FileName", "p.rs");
        assert!(!d.generate());
        assert_eq!(d.get("FileName"), Some("p.rs"));
        let mut list = Directives::new();
        list.push(d);
        list.insert(0, Directive::new(DirectiveKind::TinyPG, Span::none()));
        assert_eq!(list.iter().map(|d| d.kind).collect::<Vec<_>>(),
                   vec![DirectiveKind::TinyPG, DirectiveKind::Parser]);
        assert!(!list.generate(DirectiveKind::Scanner));
    }
}
