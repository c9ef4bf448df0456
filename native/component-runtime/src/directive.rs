//! Directive processing for component templates.
//!
//! Two comment-delimited directives are recognized:
//!
//! - `<!-- if(EXPR) --> ... <!-- endif -->` keeps or drops its body depending on
//!   the expression. A failing expression leaves the whole block untouched.
//! - `<!-- innerTemplate:NAME --> ... <!-- /innerTemplate -->` is cut out of the
//!   markup and kept verbatim for list expansion.
//!
//! Conditionals are resolved before fragments are extracted, so a conditional
//! can decide whether a fragment exists at all.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::expr::{self, Scope};

lazy_static! {
    static ref CONDITIONAL_RE: Regex =
        Regex::new(r"<!--\s*if\((.*?)\)\s*-->([\s\S]*?)<!--\s*endif\s*-->").unwrap();
    static ref INNER_TEMPLATE_RE: Regex =
        Regex::new(r"<!--\s*innerTemplate:([\w-]+)\s*-->([\s\S]*?)<!--\s*/innerTemplate\s*-->")
            .unwrap();
}

/// Directive-free markup plus the fragments cut out of it, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedTemplate {
    pub html: String,
    pub inner_templates: Vec<(String, String)>,
}

impl ProcessedTemplate {
    pub fn inner_template(&self, name: &str) -> Option<&str> {
        self.inner_templates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, content)| content.as_str())
    }
}

/// Run both directive passes over a raw template.
pub fn process(raw: &str, scope: &dyn Scope) -> ProcessedTemplate {
    let resolved = process_conditionals(raw, scope);
    let (html, inner_templates) = extract_inner_templates(&resolved);
    ProcessedTemplate {
        html,
        inner_templates,
    }
}

pub fn process_conditionals(html: &str, scope: &dyn Scope) -> String {
    CONDITIONAL_RE
        .replace_all(html, |caps: &Captures| {
            let condition = &caps[1];
            match expr::evaluate(condition, scope) {
                Ok(value) if value.is_truthy() => caps[2].to_string(),
                Ok(_) => String::new(),
                Err(e) => {
                    tracing::warn!(expression = condition, error = %e, "Conditional evaluation failed");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// A repeated name keeps its first position and takes the last body.
pub fn extract_inner_templates(html: &str) -> (String, Vec<(String, String)>) {
    let mut templates: Vec<(String, String)> = Vec::new();

    let clean = INNER_TEMPLATE_RE.replace_all(html, |caps: &Captures| {
        let name = caps[1].to_string();
        let content = caps[2].to_string();
        match templates.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = content,
            None => templates.push((name, content)),
        }
        String::new()
    });

    (clean.into_owned(), templates)
}
