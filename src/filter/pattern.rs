//! Semicolon-separated name patterns.
//!
//! `Order*;*Facade` is two patterns. `*` matches any run of characters,
//! matching is case-insensitive and must cover the whole text. An empty
//! list means "no restriction".

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::error::Warning;

/// A compiled list of patterns for one configuration field.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    /// Compile `raw`. Malformed patterns are reported through `warnings`
    /// and left out, so they never match.
    pub fn compile(field: &str, raw: &str, warnings: &mut Vec<Warning>) -> Self {
        let mut patterns = Vec::new();
        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let expression = format!("^(?:{})$", part.replace('*', ".*"));
            match RegexBuilder::new(&expression).case_insensitive(true).build() {
                Ok(regex) => patterns.push(regex),
                Err(e) => {
                    warn!(field, pattern = part, error = %e, "ignoring malformed pattern");
                    warnings.push(Warning::configuration(format!(
                        "{}: malformed pattern '{}' ignored",
                        field, part
                    )));
                }
            }
        }
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether any pattern matches the whole of `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// Include semantics: an empty list lets everything through.
    pub fn includes(&self, text: &str) -> bool {
        self.is_empty() || self.matches(text)
    }

    /// Exclude semantics: an empty list excludes nothing.
    pub fn excludes(&self, text: &str) -> bool {
        !self.is_empty() && self.matches(text)
    }
}

/// An include/exclude pair applied to the same text.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    pub include: PatternList,
    pub exclude: PatternList,
}

impl NameFilter {
    pub fn compile(field: &str, include: &str, exclude: &str, warnings: &mut Vec<Warning>) -> Self {
        Self {
            include: PatternList::compile(&format!("{}IncludeFilter", field), include, warnings),
            exclude: PatternList::compile(&format!("{}ExcludeFilter", field), exclude, warnings),
        }
    }

    /// Included (or no include list) and not excluded.
    pub fn accepts(&self, text: &str) -> bool {
        self.include.includes(text) && !self.exclude.excludes(text)
    }
}
