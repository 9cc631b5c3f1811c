//! Keyword tables for the deterministic planner

use uiforge_policy::ComponentKind;

/// Intent keyword to component kind, matched as lowercase substrings
pub const COMPONENT_KEYWORDS: &[(&str, ComponentKind)] = &[
    ("navbar", ComponentKind::Navbar),
    ("navigation", ComponentKind::Navbar),
    ("sidebar", ComponentKind::Sidebar),
    ("menu", ComponentKind::Sidebar),
    ("card", ComponentKind::Card),
    ("chart", ComponentKind::Chart),
    ("graph", ComponentKind::Chart),
    ("table", ComponentKind::Table),
    ("modal", ComponentKind::Modal),
    ("dialog", ComponentKind::Modal),
    ("input", ComponentKind::Input),
    ("form", ComponentKind::Input),
    ("button", ComponentKind::Button),
    ("cta", ComponentKind::Button),
];

/// Kinds used when no keyword matches (in this order)
pub const DEFAULT_COMPONENTS: [ComponentKind; 3] =
    [ComponentKind::Navbar, ComponentKind::Card, ComponentKind::Button];

const REMOVE_VERBS: &[&str] = &["remove", "delete", "drop"];
const UPDATE_VERBS: &[&str] = &["update", "change", "edit", "rename"];
const ADD_VERBS: &[&str] = &["add", "include", "insert", "append", "create"];

/// Component kinds named in `intent`, in catalog order
///
/// Falls back to [`DEFAULT_COMPONENTS`] when nothing matches.
#[must_use]
pub fn pick_components(intent: &str) -> Vec<ComponentKind> {
    let lower = intent.to_lowercase();
    let found: Vec<ComponentKind> = COMPONENT_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|&(_, kind)| kind)
        .collect();

    if found.is_empty() {
        return DEFAULT_COMPONENTS.to_vec();
    }
    ComponentKind::ALL
        .into_iter()
        .filter(|kind| found.contains(kind))
        .collect()
}

/// Edit verbs present in an intent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbs {
    pub remove: bool,
    pub update: bool,
    pub add: bool,
}

impl Verbs {
    /// Scan `intent` for each verb class
    #[must_use]
    pub fn scan(intent: &str) -> Self {
        let lower = intent.to_lowercase();
        let any = |verbs: &[&str]| verbs.iter().any(|verb| lower.contains(verb));
        Self {
            remove: any(REMOVE_VERBS),
            update: any(UPDATE_VERBS),
            add: any(ADD_VERBS),
        }
    }
}
