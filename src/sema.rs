// Copyright (c) 2018 Fabian Schuiki

//! Semantic analysis of grammar descriptions.
//!
//! Converting a description into a grammar happens in two passes. The
//! declaration pass evaluates the directives and declares every terminal and
//! nonterminal, such that productions may refer to symbols declared further
//! down. The body pass then evaluates the right hand side of each production
//! into a rule tree and validates the attached action code.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tinypg_runtime::{anchored, Span};

use crate::config::Options;
use crate::diag::{codes, Diagnostics};
use crate::directive::{Directive, DirectiveKind, Language};
use crate::grammar::{Grammar, LiteralError, Nonterminal, Param, SymbolRef, Terminal, START};
use crate::parser::ast;
use crate::rule::{Rule, RuleKind};

/// Matches `$Name` and `$Name[index]` references in action code.
static CODE_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?P<var>[a-zA-Z_0-9]+)(\[(?P<index>[^\]]+)\])?")
        .expect("variable pattern is valid")
});

/// Convert a grammar description into a grammar.
///
/// All problems are reported to `diag`. Returns `None` if the description
/// lacks a `Start` production, in which case the body pass is skipped.
pub fn analyze(desc: &ast::Desc, options: &Options, diag: &mut Diagnostics) -> Option<Grammar> {
    let mut grammar = Grammar::new();
    let start_found = declare(desc, options, &mut grammar, diag);
    if !start_found {
        diag.unlocated(
            codes::START_REQUIRED,
            "The grammar requires 'Start' to be a production rule.",
        );
        return None;
    }
    for item in &desc.items {
        if let ast::Item::Production(ref prod) = *item {
            if let ast::Rhs::Rule(ref expr) = prod.rhs {
                define(prod, expr, &mut grammar, diag);
            }
        }
    }
    debug!(
        "analyzed grammar with {} terminals and {} nonterminals",
        grammar.terminal_count(),
        grammar.nonterminal_count()
    );
    Some(grammar)
}

/// The declaration pass. Returns whether a `Start` nonterminal was declared.
fn declare(desc: &ast::Desc, options: &Options, grammar: &mut Grammar, diag: &mut Diagnostics) -> bool {
    // Literals are declared first, such that they win ties against declared
    // patterns in the scanner.
    let reserved: HashSet<String> = desc
        .items
        .iter()
        .filter_map(|item| match *item {
            ast::Item::Production(ref p) => Some(p.name.value.clone()),
            _ => None,
        })
        .collect();
    for item in &desc.items {
        if let ast::Item::Production(ast::ProductionDecl {
            rhs: ast::Rhs::Rule(ref expr),
            ..
        }) = *item
        {
            declare_literals(expr, &reserved, grammar, diag);
        }
    }

    let mut start_found = false;
    for item in &desc.items {
        match *item {
            ast::Item::Directive(ref d) => declare_directive(d, options, grammar, diag),
            ast::Item::Production(ref p) => match p.rhs {
                ast::Rhs::Pattern(ref pattern) => declare_terminal(p, pattern, grammar, diag),
                ast::Rhs::Rule(_) => {
                    declare_nonterminal(p, grammar, diag);
                    start_found |= p.name.value == START
                        && grammar.nonterminal(START).is_some();
                }
            },
        }
    }
    start_found
}

fn declare_literals(
    expr: &ast::Expr,
    reserved: &HashSet<String>,
    grammar: &mut Grammar,
    diag: &mut Diagnostics,
) {
    match *expr {
        ast::Expr::Ident(_) => (),
        ast::Expr::Literal(ref text) => {
            match grammar.add_literal(&text.value, reserved, text.span.clone()) {
                Ok(_) => (),
                Err(LiteralError::Regex(e)) => diag.error(
                    codes::INVALID_REGEX,
                    format!("regular expression for '{}' results in error: {}", text.value, e),
                    &text.span,
                ),
                Err(e @ LiteralError::NameTaken(_)) => {
                    diag.error(codes::NAME_CLASH, e.to_string(), &text.span)
                }
            }
        }
        ast::Expr::Choice(ref v) | ast::Expr::Concat(ref v) => {
            for e in v {
                declare_literals(e, reserved, grammar, diag);
            }
        }
        ast::Expr::Option(ref e) | ast::Expr::ZeroOrMore(ref e) | ast::Expr::OneOrMore(ref e) => {
            declare_literals(e, reserved, grammar, diag)
        }
    }
}

fn declare_directive(
    decl: &ast::DirectiveDecl,
    options: &Options,
    grammar: &mut Grammar,
    diag: &mut Diagnostics,
) {
    let name = &decl.name.value;
    let kind = match DirectiveKind::from_name(name) {
        Some(kind) => kind,
        None => {
            diag.error(
                codes::UNSUPPORTED_DIRECTIVE,
                format!("Directive '{}' is not supported", name),
                &decl.name.span,
            );
            return;
        }
    };
    if grammar.directives().find(kind).is_some() {
        diag.error(
            codes::DUPLICATE_DIRECTIVE,
            format!("Directive '{}' is already defined", name),
            &decl.name.span,
        );
        return;
    }

    let mut directive = Directive::new(kind, decl.name.span.clone());
    for nv in &decl.values {
        let key = nv.key.value.as_str();
        let value = nv.value.value.as_str();
        if !kind.keys().contains(&key) {
            diag.error(
                codes::UNSUPPORTED_KEY,
                format!("Directive attribute '{}' is not supported", key),
                &nv.key.span,
            );
            continue;
        }
        directive.set(key, value);
        if kind != DirectiveKind::TinyPG {
            continue;
        }
        match key {
            "TemplatePath" if options.resolve_template(value).is_none() => diag.error(
                codes::TEMPLATE_PATH,
                format!("Template path '{}' does not exist", value),
                &nv.value.span,
            ),
            "OutputPath" if options.resolve_output(value).is_none() => diag.error(
                codes::OUTPUT_PATH,
                format!("Output path '{}' does not exist", value),
                &nv.value.span,
            ),
            "Language" if Language::from_name(value).is_none() => diag.error(
                codes::LANGUAGE,
                format!("Language '{}' is not supported", value),
                &nv.value.span,
            ),
            _ => (),
        }
    }
    grammar.directives_mut().push(directive);
}

fn declare_terminal(
    prod: &ast::ProductionDecl,
    pattern: &ast::Spanned<String>,
    grammar: &mut Grammar,
    diag: &mut Diagnostics,
) {
    let name = &prod.name.value;
    let ignore_case = prod.attributes.iter().any(|a| a.name.value == "IgnoreCase");
    let regex = match anchored(&pattern.value, ignore_case) {
        Ok(regex) => regex,
        Err(e) => {
            diag.error(
                codes::INVALID_REGEX,
                format!("regular expression for '{}' results in error: {}", name, e),
                &prod.name.span,
            );
            return;
        }
    };
    if name == START {
        diag.error(
            codes::START_IS_TERMINAL,
            "'Start' symbol cannot be a regular expression.",
            &prod.name.span,
        );
    }
    let mut term = Terminal::new(name.as_str(), pattern.value.as_str(), regex, prod.name.span.clone());
    term.ignore_case = ignore_case;
    match grammar.add_terminal(term) {
        Some(id) => {
            for attr in &prod.attributes {
                eval_attribute(attr, SymbolRef::Terminal(id), grammar, diag);
            }
        }
        None => diag.error(
            codes::DUPLICATE_TERMINAL,
            format!("Terminal already declared: {}", name),
            &prod.name.span,
        ),
    }
}

fn declare_nonterminal(prod: &ast::ProductionDecl, grammar: &mut Grammar, diag: &mut Diagnostics) {
    let name = &prod.name.value;
    let id = match grammar.lookup(name) {
        Some(SymbolRef::Nonterminal(id)) => {
            trace!("additional alternative for {}", name);
            id
        }
        Some(SymbolRef::Terminal(_)) => {
            diag.error(
                codes::NAME_CLASH,
                format!("Non terminal already declared: {}", name),
                &prod.name.span,
            );
            return;
        }
        None => {
            let nt = Nonterminal::new(name.as_str(), prod.name.span.clone());
            match grammar.add_nonterminal(nt) {
                Some(id) => id,
                None => return,
            }
        }
    };
    for attr in &prod.attributes {
        eval_attribute(attr, SymbolRef::Nonterminal(id), grammar, diag);
    }
}

fn eval_attribute(attr: &ast::AttributeDecl, symbol: SymbolRef, grammar: &mut Grammar, diag: &mut Diagnostics) {
    let name = attr.name.value.as_str();
    let present = match symbol {
        SymbolRef::Terminal(id) => grammar[id].attributes.contains_key(name),
        SymbolRef::Nonterminal(id) => grammar[id].attributes.contains_key(name),
    };
    if present {
        diag.error(
            codes::DUPLICATE_ATTRIBUTE,
            format!("Attribute already defined for this symbol: {}", name),
            &attr.name.span,
        );
        return;
    }

    let params: Vec<Param> = attr.params.iter().map(|p| eval_param(p, diag)).collect();
    match symbol {
        SymbolRef::Terminal(id) => grammar[id].attributes.insert(name.to_string(), params.clone()),
        SymbolRef::Nonterminal(id) => grammar[id].attributes.insert(name.to_string(), params.clone()),
    };

    let terminal = match symbol {
        SymbolRef::Terminal(id) => Some(id),
        SymbolRef::Nonterminal(_) => None,
    };
    let not_allowed = |diag: &mut Diagnostics| {
        diag.error(
            codes::NONTERMINAL_ATTRIBUTE,
            format!("Attribute for non-terminal rule not allowed: {}", name),
            &attr.span,
        )
    };
    match name {
        "Skip" => match terminal {
            Some(id) => grammar.add_skip(id),
            None => not_allowed(diag),
        },
        "FileAndLine" => match terminal {
            Some(id) => {
                grammar.add_skip(id);
                grammar.set_file_and_line(id);
            }
            None => not_allowed(diag),
        },
        "IgnoreCase" => {
            if terminal.is_none() {
                not_allowed(diag);
            }
        }
        "Color" => {
            if terminal.is_none() {
                not_allowed(diag);
            }
            if params.len() != 1 && params.len() != 3 {
                diag.error(
                    codes::COLOR_PARAMETERS,
                    format!("Attribute {} has too many or missing parameters", name),
                    &attr.name.span,
                );
            }
            let bad = params
                .iter()
                .zip(&attr.params)
                .find(|&(p, _)| match *p {
                    Param::Str(_) => true,
                    _ => false,
                });
            if let Some((_, decl)) = bad {
                diag.error(
                    codes::COLOR_PARAMETERS,
                    format!("Parameter {} is of incorrect type", param_text(&decl.value)),
                    &decl.span,
                );
            }
        }
        _ => diag.error(
            codes::UNSUPPORTED_ATTRIBUTE,
            format!("Attribute not supported: {}", name),
            &attr.name.span,
        ),
    }
}

fn param_text(param: &ast::Param) -> String {
    match *param {
        ast::Param::Integer(ref s) | ast::Param::Hex(ref s) | ast::Param::Double(ref s) => s.clone(),
        ast::Param::Str(ref s) => format!("\"{}\"", s),
    }
}

fn eval_param(param: &ast::Spanned<ast::Param>, diag: &mut Diagnostics) -> Param {
    let value = match param.value {
        ast::Param::Str(ref s) => return Param::Str(s.clone()),
        ast::Param::Integer(ref s) => s.parse::<i32>().map(i64::from).ok(),
        ast::Param::Hex(ref s) => i64::from_str_radix(&s[2..], 16).ok(),
        ast::Param::Double(_) => {
            diag.error(
                codes::INVALID_PARAMETER,
                format!("Attribute parameter is not a valid value: {}", param_text(&param.value)),
                &param.span,
            );
            return Param::Invalid;
        }
    };
    match value {
        Some(v) => Param::Int(v),
        None => {
            diag.error(
                codes::PARAMETER_RANGE,
                format!("Attribute parameter is not a valid value: {}", param_text(&param.value)),
                &param.span,
            );
            Param::Invalid
        }
    }
}

/// The body pass for one production.
fn define(prod: &ast::ProductionDecl, expr: &ast::Expr, grammar: &mut Grammar, diag: &mut Diagnostics) {
    let id = match grammar.nonterminal(&prod.name.value) {
        Some(id) => id,
        None => return,
    };
    let rule = eval_expr(expr, false, grammar, diag);
    if let Some(ref code) = prod.code {
        validate_code(&code.value, &code.span, &rule, grammar, diag);
        grammar[id].code = Some(code.value.clone());
    }
    grammar.add_alternative(id, rule);
}

fn eval_expr(expr: &ast::Expr, operand: bool, grammar: &mut Grammar, diag: &mut Diagnostics) -> Rule {
    let kind = match *expr {
        ast::Expr::Ident(ref name) => match grammar.lookup(&name.value) {
            Some(SymbolRef::Terminal(id)) => RuleKind::Terminal(id),
            Some(SymbolRef::Nonterminal(id)) => RuleKind::Nonterminal(id),
            None => {
                let code = if operand {
                    codes::UNDECLARED_OPERAND
                } else {
                    codes::UNDECLARED_SYMBOL
                };
                diag.error(code, format!("Symbol '{}' is not declared.", name.value), &name.span);
                RuleKind::Unresolved(name.value.clone())
            }
        },
        ast::Expr::Literal(ref text) => match grammar.literal(&text.value) {
            Some(id) => RuleKind::Terminal(id),
            None => RuleKind::Unresolved(text.value.clone()),
        },
        ast::Expr::Choice(ref v) => {
            RuleKind::Choice(v.iter().map(|e| eval_expr(e, false, grammar, diag)).collect())
        }
        ast::Expr::Concat(ref v) => {
            RuleKind::Concat(v.iter().map(|e| eval_expr(e, false, grammar, diag)).collect())
        }
        ast::Expr::Option(ref e) => RuleKind::Option(Box::new(eval_expr(e, true, grammar, diag))),
        ast::Expr::ZeroOrMore(ref e) => {
            RuleKind::ZeroOrMore(Box::new(eval_expr(e, true, grammar, diag)))
        }
        ast::Expr::OneOrMore(ref e) => {
            RuleKind::OneOrMore(Box::new(eval_expr(e, true, grammar, diag)))
        }
    };
    grammar.make_rule(kind)
}

/// Check that every `$Name` in an action code block refers to a symbol of
/// the production.
fn validate_code(code: &str, span: &Span, rule: &Rule, grammar: &Grammar, diag: &mut Diagnostics) {
    let mut symbols = Vec::new();
    rule.production_symbols(&mut symbols);
    for caps in CODE_VARIABLE.captures_iter(code) {
        let var = match caps.name("var") {
            Some(m) => m,
            None => continue,
        };
        if !symbols.iter().any(|s| s.name(grammar) == var.as_str()) {
            let at = span.within(code, var.start()..var.end());
            diag.error(
                codes::UNMATCHED_VARIABLE,
                format!("Variable ${} cannot be matched.", var.as_str()),
                &at,
            );
        }
    }
}

/// Extract the variable references of an action code block.
///
/// Returns the byte range of each reference together with the symbol name
/// and the index expression, if any.
pub fn code_variables(code: &str) -> Vec<(std::ops::Range<usize>, String, Option<String>)> {
    CODE_VARIABLE
        .captures_iter(code)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let var = caps.name("var")?.as_str().to_string();
            let index = caps.name("index").map(|m| m.as_str().to_string());
            Some((whole.start()..whole.end(), var, index))
        })
        .collect()
}
