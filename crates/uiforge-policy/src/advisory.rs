//! Intent advisories
//!
//! Screens the free-text intent for requests the system will not honor
//! (styling, new components, import directives). Matches never block a
//! run; they become notes passed to prompts and appended to explanations.

use crate::catalog::{compile_rules, CompiledRule, PolicyCatalog};
use crate::error::PolicyError;
use tracing::warn;

/// Notes text used when nothing was flagged
pub const NO_NOTES: &str = "None.";

/// Compiled advisory rules
#[derive(Debug, Clone)]
pub struct IntentScreen {
    rules: Vec<CompiledRule>,
}

impl IntentScreen {
    /// Compile the catalog's advisory table
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if a rule fails to compile
    pub fn new(catalog: &PolicyCatalog) -> Result<Self, PolicyError> {
        Ok(Self {
            rules: compile_rules(&catalog.intent_advisories)?,
        })
    }

    /// Advisory notes for `intent`, in table order
    #[must_use]
    pub fn screen(&self, intent: &str) -> Vec<String> {
        let notes: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| rule.is_match(intent))
            .map(|rule| rule.message().to_string())
            .collect();
        if !notes.is_empty() {
            warn!(notes = ?notes, "intent carries requests that will be ignored");
        }
        notes
    }
}

/// Join notes into a single sentence block, or [`NO_NOTES`]
#[must_use]
pub fn policy_notes(notes: &[String]) -> String {
    if notes.is_empty() {
        NO_NOTES.to_string()
    } else {
        notes.join(" ")
    }
}
