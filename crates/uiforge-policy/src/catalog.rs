//! Policy catalog
//!
//! The fixed configuration every validator consults: allowed component
//! kinds (in canonical order), structural tags, reserved styling props,
//! import targets and the textual pattern tables. The catalog is plain data
//! so it can be versioned, serialized and overridden from configuration
//! without touching validator control flow.

use crate::error::PolicyError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uiforge_plan::Node;

/// Current catalog version
pub const CATALOG_VERSION: u32 = 1;

/// Allowlisted UI building blocks, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Button,
    Card,
    Input,
    Table,
    Modal,
    Sidebar,
    Navbar,
    Chart,
}

impl ComponentKind {
    /// Every kind, in canonical order
    pub const ALL: [Self; 8] = [
        Self::Button,
        Self::Card,
        Self::Input,
        Self::Table,
        Self::Modal,
        Self::Sidebar,
        Self::Navbar,
        Self::Chart,
    ];

    /// Name as used in trees and generated source
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "Button",
            Self::Card => "Card",
            Self::Input => "Input",
            Self::Table => "Table",
            Self::Modal => "Modal",
            Self::Sidebar => "Sidebar",
            Self::Navbar => "Navbar",
            Self::Chart => "Chart",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownComponent(s.to_string()))
    }
}

/// Non-component container tags used for layout nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuralTag {
    Div,
    Section,
}

impl StructuralTag {
    /// Every tag
    pub const ALL: [Self; 2] = [Self::Div, Self::Section];

    /// Tag name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Div => "div",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for StructuralTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regular pattern paired with the message reported when it matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regular expression (Rust `regex` syntax)
    pub pattern: String,
    /// Human-readable reason
    pub message: String,
    /// Match ignoring ASCII/Unicode case
    #[serde(default)]
    pub case_insensitive: bool,
}

impl PatternRule {
    /// Case-sensitive rule
    #[must_use]
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
            case_insensitive: false,
        }
    }

    /// Case-insensitive rule
    #[must_use]
    pub fn ignoring_case(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            case_insensitive: true,
            ..Self::new(pattern, message)
        }
    }

    /// Compile the rule
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if the pattern does not parse
    pub fn compile(&self) -> Result<CompiledRule, PolicyError> {
        let regex = compile_pattern(&self.pattern, self.case_insensitive)?;
        Ok(CompiledRule {
            regex,
            message: self.message.clone(),
        })
    }
}

/// A compiled [`PatternRule`]
#[derive(Debug, Clone)]
pub struct CompiledRule {
    regex: Regex,
    message: String,
}

impl CompiledRule {
    /// Check if the rule matches anywhere in `text`
    #[inline]
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Message reported on match
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Compile a whole rule table, failing on the first bad pattern
///
/// # Errors
/// Returns [`PolicyError::InvalidPattern`] for the first pattern that does not parse
pub fn compile_rules(rules: &[PatternRule]) -> Result<Vec<CompiledRule>, PolicyError> {
    rules.iter().map(PatternRule::compile).collect()
}

pub(crate) fn compile_pattern(pattern: &str, case_insensitive: bool) -> Result<Regex, PolicyError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// The policy catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyCatalog {
    /// Catalog version
    pub version: u32,
    /// Allowed component kinds, in canonical order
    pub component_kinds: Vec<String>,
    /// Allowed structural tags
    pub structural_tags: Vec<String>,
    /// Prop keys reserved for inline styling
    pub reserved_prop_keys: Vec<String>,
    /// Module references generated source may import from
    pub allowed_imports: Vec<String>,
    /// Import path the code generator emits
    pub component_import_path: String,
    /// Component imported when a tree uses none
    pub fallback_component: String,
    /// Grammar for import statements; capture group 1 is the module reference
    pub import_grammar: String,
    /// Grammar for opening tags; capture group 1 is the tag name
    pub tag_grammar: String,
    /// Patterns that must not appear in generated source
    pub disallowed_patterns: Vec<PatternRule>,
    /// Advisory phrase rules screened against user intent
    pub intent_advisories: Vec<PatternRule>,
}

impl PolicyCatalog {
    /// The standard catalog
    #[must_use]
    pub fn standard() -> Self {
        Self {
            version: CATALOG_VERSION,
            component_kinds: ComponentKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            structural_tags: StructuralTag::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            reserved_prop_keys: vec!["className".to_string(), "style".to_string()],
            allowed_imports: vec![
                "./ui-kit".to_string(),
                "./ui-kit/index".to_string(),
                "./ui-kit/index.js".to_string(),
            ],
            component_import_path: "./ui-kit".to_string(),
            fallback_component: ComponentKind::Card.as_str().to_string(),
            import_grammar: r#"import\s+[^;]+from\s+["']([^"']+)["']"#.to_string(),
            tag_grammar: r"<\s*([A-Za-z][A-Za-z0-9]*)".to_string(),
            disallowed_patterns: vec![
                PatternRule::new(r"className\s*=", "className is not allowed"),
                PatternRule::new(r"style\s*=", "style props are not allowed"),
                PatternRule::ignoring_case("tailwind", "Tailwind usage is not allowed"),
                PatternRule::ignoring_case("@mui", "Material UI imports are not allowed"),
                PatternRule::ignoring_case("chakra", "Chakra UI imports are not allowed"),
                PatternRule::ignoring_case("styled-components", "styled-components are not allowed"),
            ],
            intent_advisories: vec![
                PatternRule::ignoring_case(
                    "(tailwind|classname|inline style|styled-components|@mui|chakra|material ui|bootstrap)",
                    "Styling or external UI library request ignored.",
                ),
                PatternRule::ignoring_case(
                    "(create a new component|new component|custom component)",
                    "Requests for new components are ignored.",
                ),
                PatternRule::ignoring_case(
                    r#"import\s+.*from\s+['"]"#,
                    "Import directives are ignored.",
                ),
            ],
        }
    }

    /// Check if `name` is an allowed component kind
    #[inline]
    #[must_use]
    pub fn is_component(&self, name: &str) -> bool {
        self.component_kinds.iter().any(|k| k == name)
    }

    /// Check if `name` is an allowed structural tag
    #[inline]
    #[must_use]
    pub fn is_structural_tag(&self, name: &str) -> bool {
        self.structural_tags.iter().any(|t| t == name)
    }

    /// Check if `name` is an allowed element type (component kind or tag)
    #[inline]
    #[must_use]
    pub fn is_allowed_type(&self, name: &str) -> bool {
        self.is_component(name) || self.is_structural_tag(name)
    }

    /// Check if a prop key is reserved for styling
    #[inline]
    #[must_use]
    pub fn is_reserved_prop(&self, key: &str) -> bool {
        self.reserved_prop_keys.iter().any(|k| k == key)
    }

    /// Check if an import target is allowed
    #[inline]
    #[must_use]
    pub fn is_allowed_import(&self, target: &str) -> bool {
        self.allowed_imports.iter().any(|i| i == target)
    }

    /// Component kinds present in `tree`, in canonical order
    #[must_use]
    pub fn used_components(&self, tree: &Node) -> Vec<String> {
        let present: HashSet<&str> = tree
            .iter()
            .filter(|node| !node.is_text())
            .map(Node::node_type)
            .collect();
        self.component_kinds
            .iter()
            .filter(|kind| present.contains(kind.as_str()))
            .cloned()
            .collect()
    }

    /// Sort component names into canonical order, dropping unknown names
    #[must_use]
    pub fn canonical_order<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: HashSet<&str> = names.into_iter().collect();
        self.component_kinds
            .iter()
            .filter(|kind| wanted.contains(kind.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for PolicyCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
