//! Code validator
//!
//! Static check of generated source text. It never looks at the tree the
//! source came from, so it also guards hand-edited or model-written code.
//! All pattern tables come from the [`PolicyCatalog`] and are compiled once
//! when the validator is built.

use crate::catalog::{compile_pattern, compile_rules, CompiledRule, PolicyCatalog};
use crate::error::PolicyError;
use crate::report::ValidationReport;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// A single source finding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeViolation {
    /// Empty input
    #[error("No code to validate.")]
    NoCode,

    /// A disallowed pattern matched; carries the rule's message
    #[error("{0}")]
    Disallowed(String),

    /// Import from a module outside the allowed set
    #[error("Invalid import target: {0}")]
    InvalidImport(String),

    /// Opening tag outside the catalog
    #[error("Invalid JSX tag: {0}")]
    InvalidTag(String),
}

/// Validates generated source against a catalog
#[derive(Debug, Clone)]
pub struct CodeValidator {
    catalog: Arc<PolicyCatalog>,
    disallowed: Vec<CompiledRule>,
    import_grammar: Regex,
    tag_grammar: Regex,
}

impl CodeValidator {
    /// Compile the catalog's pattern tables
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if any catalog pattern fails to compile
    pub fn new(catalog: Arc<PolicyCatalog>) -> Result<Self, PolicyError> {
        let disallowed = compile_rules(&catalog.disallowed_patterns)?;
        let import_grammar = compile_pattern(&catalog.import_grammar, false)?;
        let tag_grammar = compile_pattern(&catalog.tag_grammar, false)?;
        Ok(Self {
            catalog,
            disallowed,
            import_grammar,
            tag_grammar,
        })
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    /// Validate source text
    ///
    /// Empty input fails with [`CodeViolation::NoCode`] alone. Otherwise
    /// every check runs and findings accumulate in this order: disallowed
    /// patterns, import targets (in source order), tags (first occurrence
    /// order, each reported once).
    #[must_use]
    pub fn validate(&self, source: &str) -> ValidationReport<CodeViolation> {
        if source.is_empty() {
            return ValidationReport::new(vec![CodeViolation::NoCode]);
        }

        let violations = self.scan(source);
        debug!(violations = violations.len(), bytes = source.len(), "validated source");
        ValidationReport::new(violations)
    }

    /// Run the pattern, import and tag checks over any text fragment
    pub(crate) fn scan(&self, source: &str) -> Vec<CodeViolation> {
        let mut violations: Vec<CodeViolation> = self
            .disallowed
            .iter()
            .filter(|rule| rule.is_match(source))
            .map(|rule| CodeViolation::Disallowed(rule.message().to_string()))
            .collect();

        for captures in self.import_grammar.captures_iter(source) {
            let Some(target) = captures.get(1) else {
                continue;
            };
            if !self.catalog.is_allowed_import(target.as_str()) {
                violations.push(CodeViolation::InvalidImport(target.as_str().to_string()));
            }
        }

        let mut seen = HashSet::new();
        for captures in self.tag_grammar.captures_iter(source) {
            let Some(tag) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if seen.insert(tag) && !self.catalog.is_allowed_type(tag) {
                violations.push(CodeViolation::InvalidTag(tag.to_string()));
            }
        }

        violations
    }

    /// Validate optional source text; `None` is treated as empty
    #[must_use]
    pub fn validate_opt(&self, source: Option<&str>) -> ValidationReport<CodeViolation> {
        self.validate(source.unwrap_or_default())
    }
}
