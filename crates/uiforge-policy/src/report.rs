//! Validation reports

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// Outcome of a validation pass
///
/// `ok` holds exactly when `violations` is empty. Violations keep the order
/// in which checks found them. On the wire a report is `{ ok, errors }`
/// where `errors` holds the rendered messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport<V> {
    violations: Vec<V>,
}

impl<V> ValidationReport<V> {
    /// Report over collected violations
    #[inline]
    #[must_use]
    pub fn new(violations: Vec<V>) -> Self {
        Self { violations }
    }

    /// Passing report
    #[inline]
    #[must_use]
    pub fn pass() -> Self {
        Self::new(Vec::new())
    }

    /// Check if no violations were found
    #[inline]
    #[must_use]
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations, in discovery order
    #[inline]
    #[must_use]
    pub fn violations(&self) -> &[V] {
        &self.violations
    }

    /// Consume into violations
    #[inline]
    #[must_use]
    pub fn into_violations(self) -> Vec<V> {
        self.violations
    }
}

impl<V: fmt::Display> ValidationReport<V> {
    /// Rendered messages, in discovery order
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// Messages joined with a single space
    #[must_use]
    pub fn joined(&self) -> String {
        self.messages().join(" ")
    }
}

impl<V> Default for ValidationReport<V> {
    fn default() -> Self {
        Self::pass()
    }
}

impl<V: fmt::Display> Serialize for ValidationReport<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationReport", 2)?;
        state.serialize_field("ok", &self.ok())?;
        state.serialize_field("errors", &self.messages())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_ok_and_errors() {
        let report = ValidationReport::new(vec!["first", "second"]);
        assert!(!report.ok());
        assert_eq!(report.joined(), "first second");
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({ "ok": false, "errors": ["first", "second"] })
        );

        let pass: ValidationReport<&str> = ValidationReport::pass();
        assert_eq!(serde_json::to_value(&pass).unwrap(), json!({ "ok": true, "errors": [] }));
    }
}
