//! Plan validator
//!
//! Structural check of a plan tree against the [`PolicyCatalog`]. Two entry
//! points share one set of rules and messages:
//!
//! - [`PlanValidator::validate`] walks a typed [`Plan`]
//! - [`PlanValidator::validate_value`] walks raw JSON, as received from a
//!   model, before it is decoded
//!
//! Both perform a single pre-order traversal and accumulate every finding.
//! Text content and props are also run through the source checks of the
//! [`CodeValidator`] in the form the generator renders them, so a plan that
//! passes here yields source that passes there. Adjacent text siblings are
//! checked as one run since they render separated only by whitespace.

use crate::catalog::PolicyCatalog;
use crate::code_validator::{CodeValidator, CodeViolation};
use crate::error::PolicyError;
use crate::report::ValidationReport;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use uiforge_plan::{Node, Plan, TEXT_TYPE};

/// Root path label used in diagnostics
pub const ROOT_PATH: &str = "root";

/// A single plan finding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanViolation {
    /// Plan has no tree
    #[error("Missing plan tree.")]
    MissingTree,

    /// Root is a component or a text leaf instead of a structural tag
    #[error("Invalid root type {node_type}")]
    InvalidRoot { node_type: String },

    /// Node value is neither an object nor a string
    #[error("Invalid node at {path}")]
    InvalidNode { path: String },

    /// Text node without a string `text`
    #[error("Text node missing text at {path}")]
    TextMissingText { path: String },

    /// Element type outside the catalog
    #[error("Invalid node type {node_type} at {path}")]
    InvalidType { node_type: String, path: String },

    /// Props present but not an object
    #[error("Invalid props at {path}")]
    InvalidProps { path: String },

    /// Props carry reserved styling keys
    #[error("Disallowed styling props at {path}")]
    StylingProps { path: String },

    /// Text or prop content that fails a source check once rendered
    #[error("Disallowed content at {path}: {finding}")]
    UnsafeContent { path: String, finding: CodeViolation },
}

impl PlanViolation {
    /// Diagnostic path, if the finding is tied to a node
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingTree => None,
            Self::InvalidRoot { .. } => Some(ROOT_PATH),
            Self::InvalidNode { path }
            | Self::TextMissingText { path }
            | Self::InvalidType { path, .. }
            | Self::InvalidProps { path }
            | Self::StylingProps { path }
            | Self::UnsafeContent { path, .. } => Some(path),
        }
    }
}

/// Validates plan trees against a catalog
#[derive(Debug, Clone)]
pub struct PlanValidator {
    catalog: Arc<PolicyCatalog>,
    content: CodeValidator,
}

impl PlanValidator {
    /// Create validator over `catalog`
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if any catalog pattern fails to compile
    pub fn new(catalog: Arc<PolicyCatalog>) -> Result<Self, PolicyError> {
        let content = CodeValidator::new(catalog.clone())?;
        Ok(Self { catalog, content })
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    /// Validate a typed plan
    #[must_use]
    pub fn validate(&self, plan: &Plan) -> ValidationReport<PlanViolation> {
        let Some(tree) = &plan.tree else {
            return ValidationReport::new(vec![PlanViolation::MissingTree]);
        };

        let mut violations = Vec::new();
        self.check_root(tree.node_type(), tree.is_text(), &mut violations);

        let mut stack = vec![(tree, ROOT_PATH.to_string())];
        while let Some((node, path)) = stack.pop() {
            let Node::Element(element) = node else {
                continue;
            };
            if !self.catalog.is_allowed_type(&element.node_type) {
                violations.push(PlanViolation::InvalidType {
                    node_type: element.node_type.clone(),
                    path: path.clone(),
                });
            }
            if element.props.keys().any(|key| self.catalog.is_reserved_prop(key)) {
                violations.push(PlanViolation::StylingProps { path: path.clone() });
            }
            for (key, value) in self.unreserved(element.props.iter()) {
                self.scan_prop(key, value, &path, &mut violations);
            }

            let texts = element.children.iter().enumerate().map(|(index, child)| match child {
                Node::Text(text) => (index, Some(text.text.as_str())),
                Node::Element(_) => (index, None),
            });
            self.scan_text_runs(texts, &path, &element.node_type, &mut violations);

            for (index, child) in element.children.iter().enumerate().rev() {
                stack.push((child, child_path(&path, &element.node_type, index)));
            }
        }

        debug!(violations = violations.len(), "validated typed plan");
        ValidationReport::new(violations)
    }

    /// Validate raw plan JSON
    ///
    /// A falsy or absent `tree` counts as missing. `null` nodes are skipped
    /// and bare strings are accepted as implicit text leaves. A node is text
    /// when either `type` or `kind` says so.
    #[must_use]
    pub fn validate_value(&self, plan: &Value) -> ValidationReport<PlanViolation> {
        let tree = plan.get("tree").filter(|tree| !is_falsy(tree));
        let Some(tree) = tree else {
            return ValidationReport::new(vec![PlanViolation::MissingTree]);
        };

        let mut violations = Vec::new();
        match tree {
            Value::String(_) => self.check_root(TEXT_TYPE, true, &mut violations),
            Value::Object(object) if is_text_object(object) => {
                self.check_root(TEXT_TYPE, true, &mut violations);
            }
            Value::Object(object) => {
                if let Some(name) = object.get("type").and_then(Value::as_str) {
                    self.check_root(name, false, &mut violations);
                }
            }
            _ => {}
        }
        self.walk_value(tree, ROOT_PATH.to_string(), &mut violations);
        debug!(violations = violations.len(), "validated raw plan");
        ValidationReport::new(violations)
    }

    fn walk_value(&self, node: &Value, path: String, violations: &mut Vec<PlanViolation>) {
        let object = match node {
            Value::Null | Value::String(_) => return,
            Value::Object(object) => object,
            _ => {
                violations.push(PlanViolation::InvalidNode { path });
                return;
            }
        };

        if is_text_object(object) {
            if !matches!(object.get("text"), Some(Value::String(_))) {
                violations.push(PlanViolation::TextMissingText { path });
            }
            return;
        }

        let node_type = object.get("type");
        let type_label = node_type.map_or_else(|| "undefined".to_string(), display_value);
        let allowed = node_type
            .and_then(Value::as_str)
            .is_some_and(|name| self.catalog.is_allowed_type(name));
        if !allowed {
            violations.push(PlanViolation::InvalidType {
                node_type: type_label.clone(),
                path: path.clone(),
            });
        }

        match object.get("props") {
            Some(Value::Object(props)) => {
                if self.has_reserved_prop(props) {
                    violations.push(PlanViolation::StylingProps { path: path.clone() });
                }
                for (key, value) in self.unreserved(props.iter()) {
                    self.scan_prop(key, value, &path, violations);
                }
            }
            Some(props) if !is_falsy(props) => {
                violations.push(PlanViolation::InvalidProps { path: path.clone() });
            }
            _ => {}
        }

        if let Some(Value::Array(children)) = object.get("children") {
            let texts = children
                .iter()
                .enumerate()
                .filter(|(_, child)| !child.is_null())
                .map(|(index, child)| (index, raw_text(child)));
            self.scan_text_runs(texts, &path, &type_label, violations);

            for (index, child) in children.iter().enumerate() {
                self.walk_value(child, child_path(&path, &type_label, index), violations);
            }
        }
    }

    fn check_root(&self, node_type: &str, is_text: bool, violations: &mut Vec<PlanViolation>) {
        // Unknown types are already reported as invalid node types
        if is_text || self.catalog.is_component(node_type) {
            violations.push(PlanViolation::InvalidRoot {
                node_type: node_type.to_string(),
            });
        }
    }

    fn has_reserved_prop(&self, props: &Map<String, Value>) -> bool {
        props.keys().any(|key| self.catalog.is_reserved_prop(key))
    }

    /// Props whose key is not already reported as reserved
    fn unreserved<'a, I>(&'a self, props: I) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a
    where
        I: Iterator<Item = (&'a String, &'a Value)> + 'a,
    {
        props.filter(|(key, _)| !self.catalog.is_reserved_prop(key))
    }

    fn scan_prop(&self, key: &str, value: &Value, path: &str, violations: &mut Vec<PlanViolation>) {
        self.scan_content(&format!("{key}={{{value}}}"), path, violations);
    }

    /// Scan each maximal run of adjacent text children as one fragment
    ///
    /// `None` marks an element child, which ends the current run.
    fn scan_text_runs<'a, I>(
        &self,
        children: I,
        parent: &str,
        parent_type: &str,
        violations: &mut Vec<PlanViolation>,
    )
    where
        I: IntoIterator<Item = (usize, Option<&'a str>)>,
    {
        let mut run: Option<(usize, Vec<&str>)> = None;
        for (index, text) in children {
            match text {
                Some(text) => run.get_or_insert_with(|| (index, Vec::new())).1.push(text),
                None => {
                    if let Some((first, texts)) = run.take() {
                        let path = child_path(parent, parent_type, first);
                        self.scan_content(&texts.join("\n"), &path, violations);
                    }
                }
            }
        }
        if let Some((first, texts)) = run {
            let path = child_path(parent, parent_type, first);
            self.scan_content(&texts.join("\n"), &path, violations);
        }
    }

    fn scan_content(&self, fragment: &str, path: &str, violations: &mut Vec<PlanViolation>) {
        violations.extend(self.content.scan(fragment).into_iter().map(|finding| {
            PlanViolation::UnsafeContent {
                path: path.to_string(),
                finding,
            }
        }));
    }
}

fn is_text_object(object: &Map<String, Value>) -> bool {
    ["type", "kind"]
        .iter()
        .any(|key| object.get(*key).and_then(Value::as_str) == Some(TEXT_TYPE))
}

/// Text a raw child renders as, if it is a text leaf
fn raw_text(child: &Value) -> Option<&str> {
    match child {
        Value::String(text) => Some(text),
        Value::Object(object) if is_text_object(object) => object.get("text").and_then(Value::as_str),
        _ => None,
    }
}

fn child_path(parent: &str, parent_type: &str, index: usize) -> String {
    format!("{parent}.{parent_type}[{index}]")
}

/// Falsy in the loose sense used by plan documents: null, false, 0, NaN or ""
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Render a JSON value the way it reads inside a diagnostic
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn validator() -> PlanValidator {
        PlanValidator::new(Arc::new(PolicyCatalog::standard())).unwrap()
    }

    fn card_plan(card: Node) -> Plan {
        Plan::new("x", vec![], Node::element("root", "div").with_child(card))
    }

    #[test]
    fn missing_tree_short_circuits() {
        let report = validator().validate_value(&json!({ "kind": "plan" }));
        assert_eq!(report.messages(), vec!["Missing plan tree."]);

        let report = validator().validate_value(&json!({ "tree": "" }));
        assert_eq!(report.messages(), vec!["Missing plan tree."]);

        let report = validator().validate(&Plan::default());
        assert_eq!(report.violations(), &[PlanViolation::MissingTree]);
    }

    #[test]
    fn accumulates_every_finding_with_paths() {
        let plan = json!({
            "tree": {
                "id": "root", "type": "div",
                "children": [
                    null,
                    "bare text",
                    { "id": "t", "type": "text" },
                    { "id": "s", "type": "span", "props": { "style": { "color": "red" } } },
                    { "id": "c", "type": "Card", "props": [1],
                      "children": [42, { "type": "Button", "props": { "className": "x" } }] }
                ]
            }
        });

        let report = validator().validate_value(&plan);
        assert_eq!(
            report.messages(),
            vec![
                "Text node missing text at root.div[2]",
                "Invalid node type span at root.div[3]",
                "Disallowed styling props at root.div[3]",
                "Invalid props at root.div[4]",
                "Invalid node at root.div[4].Card[0]",
                "Disallowed styling props at root.div[4].Card[1]",
            ]
        );
    }

    #[test]
    fn missing_type_reads_as_undefined() {
        let report = validator().validate_value(&json!({ "tree": { "id": "x", "children": [{ "type": 3 }] } }));
        assert_eq!(
            report.messages(),
            vec![
                "Invalid node type undefined at root",
                "Invalid node type 3 at root.undefined[0]",
            ]
        );
    }

    #[test]
    fn falsy_props_are_skipped() {
        let plan = json!({ "tree": { "id": "r", "type": "div", "props": null, "children": [] } });
        assert!(validator().validate_value(&plan).ok());
        let plan = json!({ "tree": { "id": "r", "type": "div", "props": false } });
        assert!(validator().validate_value(&plan).ok());
    }

    #[test]
    fn typed_validation_matches_raw() {
        let tree = Node::element("root", "div")
            .with_child(Node::element("a", "Widget").with_prop("style", "x"))
            .with_child(
                Node::element("b", "section").with_child(Node::element("c", "Card").with_child(Node::text("t", "ok"))),
            );
        let plan = Plan::new("x", vec![], tree);

        let typed = validator().validate(&plan);
        let raw = validator().validate_value(&serde_json::to_value(&plan).unwrap());
        assert_eq!(typed, raw);
        assert_eq!(
            typed.messages(),
            vec![
                "Invalid node type Widget at root.div[0]",
                "Disallowed styling props at root.div[0]",
            ]
        );
    }

    #[test]
    fn revalidation_is_stable() {
        let plan = json!({ "tree": { "type": "p", "children": [{ "type": "q" }] } });
        let first = validator().validate_value(&plan);
        assert_eq!(first, validator().validate_value(&plan));
        assert_eq!(first.violations()[1].path(), Some("root.p[0]"));
    }

    #[test]
    fn kind_marks_text_nodes() {
        let plan = json!({
            "tree": { "id": "root", "type": "div", "children": [{ "id": "t", "kind": "text", "text": "hi" }] }
        });
        assert!(validator().validate_value(&plan).ok());

        let plan = json!({ "tree": { "id": "root", "type": "div", "children": [{ "id": "t", "kind": "text" }] } });
        assert_eq!(validator().validate_value(&plan).messages(), vec!["Text node missing text at root.div[0]"]);
    }

    #[test]
    fn markup_in_props_is_rejected() {
        let plan = card_plan(Node::element("c", "Card").with_prop("title", "<b>Hi</b>"));
        let report = validator().validate(&plan);
        assert_eq!(report.messages(), vec!["Disallowed content at root.div[0]: Invalid JSX tag: b"]);
        assert_eq!(report, validator().validate_value(&serde_json::to_value(&plan).unwrap()));

        let plan = card_plan(Node::element("c", "Card").with_prop("title", "<Card> inside"));
        assert!(validator().validate(&plan).ok());
    }

    #[test]
    fn markup_in_text_is_rejected() {
        let plan = card_plan(Node::element("c", "Card").with_child(Node::text("t", "<span>hi")));
        assert_eq!(
            validator().validate(&plan).messages(),
            vec!["Disallowed content at root.div[0].Card[0]: Invalid JSX tag: span"]
        );
    }

    #[test]
    fn prop_keys_render_into_patterns() {
        let plan = card_plan(Node::element("c", "Card").with_prop("mystyle", 1));
        assert_eq!(
            validator().validate(&plan).messages(),
            vec!["Disallowed content at root.div[0]: style props are not allowed"]
        );
    }

    #[test]
    fn library_names_in_content_are_rejected() {
        let plan = card_plan(Node::element("c", "Card").with_prop("title", "Tailwind tips"));
        assert_eq!(
            validator().validate(&plan).messages(),
            vec!["Disallowed content at root.div[0]: Tailwind usage is not allowed"]
        );
    }

    #[test]
    fn adjacent_text_is_checked_as_one_run() {
        let plan = json!({
            "tree": { "id": "root", "type": "div", "children": [
                { "id": "c", "type": "Card", "children": ["a <", null, { "id": "t", "type": "text", "text": "em" }] }
            ] }
        });
        assert_eq!(
            validator().validate_value(&plan).messages(),
            vec!["Disallowed content at root.div[0].Card[0]: Invalid JSX tag: em"]
        );

        let split = Node::element("c", "Card").with_children([
            Node::text("a", "a <"),
            Node::element("b", "Button"),
            Node::text("d", "em"),
        ]);
        assert!(validator().validate(&card_plan(split)).ok());
    }

    #[test]
    fn root_must_be_structural() {
        let report = validator().validate_value(&json!({ "tree": "hello" }));
        assert_eq!(report.messages(), vec!["Invalid root type text"]);
        assert_eq!(report.violations()[0].path(), Some(ROOT_PATH));

        let report = validator().validate_value(&json!({ "tree": { "id": "root", "type": "Card" } }));
        assert_eq!(report.messages(), vec!["Invalid root type Card"]);

        let plan = Plan::new("x", vec![], Node::element("root", "Card"));
        assert_eq!(validator().validate(&plan).messages(), vec!["Invalid root type Card"]);

        let plan = Plan::new("x", vec![], Node::text("root", "hello"));
        assert_eq!(validator().validate(&plan).messages(), vec!["Invalid root type text"]);

        let plan = Plan::new("x", vec![], Node::element("root", "section"));
        assert!(validator().validate(&plan).ok());
    }
}
