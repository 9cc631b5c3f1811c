//! Deterministic plan builder

use super::keywords::pick_components;
use serde_json::{json, Value};
use uiforge_plan::{Node, Plan, ELEMENT_ID_PREFIX, TEXT_ID_PREFIX};
use uiforge_policy::ComponentKind;

/// Layout description of every fallback plan
pub const FALLBACK_LAYOUT: &str =
    "Header section with optional navigation and a content row for components.";

/// Sequential id source shared by element and text nodes
#[derive(Debug, Clone, Default)]
pub(crate) struct IdFactory {
    counter: u64,
}

impl IdFactory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn next(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}-{}", self.counter)
    }

    pub(crate) fn text(&mut self, text: &str) -> Node {
        Node::text(self.next(TEXT_ID_PREFIX), text)
    }

    pub(crate) fn element(&mut self, kind: &str, props: Value, children: Vec<Node>) -> Node {
        let node = Node::element(self.next(ELEMENT_ID_PREFIX), kind);
        let node = match props {
            Value::Object(map) => map.into_iter().fold(node, |node, (k, v)| node.with_prop(k, v)),
            _ => node,
        };
        node.with_children(children)
    }
}

/// Build a plan for `intent` without a model
///
/// Identical intents always yield identical plans.
#[must_use]
pub fn build_plan(intent: &str) -> Plan {
    let kinds = pick_components(intent);
    let has = |kind: ComponentKind| kinds.contains(&kind);
    let mut ids = IdFactory::new();

    let header_child = if has(ComponentKind::Navbar) {
        ids.element(
            "Navbar",
            json!({ "title": "Project Atlas", "links": ["Overview", "Metrics", "Settings"] }),
            vec![],
        )
    } else {
        ids.text("Workspace Overview")
    };
    let header = ids.element("section", json!({}), vec![header_child]);

    let mut body = Vec::new();
    if has(ComponentKind::Sidebar) {
        body.push(ids.element(
            "Sidebar",
            json!({ "title": "Sections", "items": ["Summary", "Reports", "Alerts"] }),
            vec![],
        ));
    }

    let mut content = Vec::new();
    let mut button_placed = false;

    if has(ComponentKind::Card) {
        let mut card_children = vec![ids.text("Snapshot of the latest activity and highlights.")];
        if has(ComponentKind::Button) {
            card_children.push(primary_action(&mut ids));
            button_placed = true;
        }
        content.push(ids.element("Card", json!({ "title": "Highlights" }), card_children));
    }

    if has(ComponentKind::Chart) {
        content.push(ids.element("Chart", json!({ "title": "Weekly Activity" }), vec![]));
    }

    if has(ComponentKind::Table) {
        content.push(ids.element(
            "Table",
            json!({
                "columns": ["Metric", "Value"],
                "rows": [["Active Users", "1,204"], ["Conversion", "4.2%"], ["Sessions", "8,910"]]
            }),
            vec![],
        ));
    }

    if has(ComponentKind::Input) {
        content.push(ids.element(
            "Input",
            json!({ "label": "Search", "placeholder": "Filter by keyword" }),
            vec![],
        ));
    }

    if has(ComponentKind::Modal) {
        let text = ids.text("Send an invite to your teammates.");
        content.push(ids.element(
            "Modal",
            json!({ "title": "Invite Collaborators", "open": true }),
            vec![text],
        ));
    }

    if has(ComponentKind::Button) && !button_placed {
        content.push(primary_action(&mut ids));
    }

    if content.is_empty() {
        content.push(ids.text("No UI components requested."));
    }

    let content_section = ids.element("section", json!({}), content);
    body.push(content_section);
    let body_row = ids.element("div", json!({}), body);
    let main = ids.element("section", json!({}), vec![body_row]);

    let tree = Node::element("root", "div").with_children([header, main]);
    let components = kinds.iter().map(|kind| kind.as_str().to_string()).collect();
    Plan::new(FALLBACK_LAYOUT, components, tree)
}

fn primary_action(ids: &mut IdFactory) -> Node {
    let label = ids.text("Primary Action");
    ids.element("Button", json!({}), vec![label])
}
