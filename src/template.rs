// Copyright (c) 2018 Fabian Schuiki

//! Code templates.
//!
//! A template is source text of the target language with `<%Name%>` markers
//! at the places where generated code goes. Templates are parsed once into
//! a sequence of text segments and typed slots, such that rendering never
//! rescans generated code for markers.

use std::collections::HashMap;
use std::fmt;

use crate::diag::{codes, Diagnostics};

/// The places in a template that receive generated code.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Namespace,
    IParser,
    IParseTree,
    ParseNonTerminals,
    TokenType,
    RegExps,
    SkipList,
    FileAndLine,
    EvalSymbols,
    VirtualEvalMethods,
}

impl Slot {
    /// Look up a slot by its marker name.
    pub fn from_name(name: &str) -> Option<Slot> {
        Some(match name {
            "Namespace" => Slot::Namespace,
            "IParser" => Slot::IParser,
            "IParseTree" => Slot::IParseTree,
            "ParseNonTerminals" => Slot::ParseNonTerminals,
            "TokenType" => Slot::TokenType,
            "RegExps" => Slot::RegExps,
            "SkipList" => Slot::SkipList,
            "FileAndLine" => Slot::FileAndLine,
            "EvalSymbols" => Slot::EvalSymbols,
            "VirtualEvalMethods" => Slot::VirtualEvalMethods,
            _ => return None,
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<%{:?}%>", self)
    }
}

/// A piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim.
    Text(String),
    /// A slot replaced by generated code.
    Slot(Slot),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template.
    ///
    /// Markers with an unknown name are reported and kept as text.
    pub fn parse(name: &str, text: &str, diag: &mut Diagnostics) -> Template {
        let mut segments = Vec::new();
        let mut pending = String::new();
        let mut rest = text;
        while let Some(open) = rest.find("<%") {
            pending.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = match after.find("%>") {
                Some(close) => close,
                None => {
                    pending.push_str(&rest[open..]);
                    rest = "";
                    break;
                }
            };
            let marker = &after[..close];
            match Slot::from_name(marker) {
                Some(slot) => {
                    if !pending.is_empty() {
                        segments.push(Segment::Text(std::mem::replace(&mut pending, String::new())));
                    }
                    segments.push(Segment::Slot(slot));
                }
                None => {
                    diag.unlocated(
                        codes::UNKNOWN_MARKER,
                        format!("Unknown template marker '<%{}%>' in {}", marker, name),
                    );
                    pending.push_str(&rest[open..open + 2 + close + 2]);
                }
            }
            rest = &after[close + 2..];
        }
        pending.push_str(rest);
        if !pending.is_empty() {
            segments.push(Segment::Text(pending));
        }
        trace!("parsed template {} into {} segments", name, segments.len());
        Template {
            name: name.to_string(),
            segments,
        }
    }

    /// The name of the template, usually its file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The segments of the template.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check whether the template contains a slot.
    pub fn has_slot(&self, slot: Slot) -> bool {
        self.segments.iter().any(|s| *s == Segment::Slot(slot))
    }

    /// Render the template. Slots without a value render as nothing.
    pub fn render(&self, values: &HashMap<Slot, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match *segment {
                Segment::Text(ref s) => out.push_str(s),
                Segment::Slot(slot) => {
                    if let Some(v) = values.get(&slot) {
                        out.push_str(v);
                    }
                }
            }
        }
        out
    }
}
