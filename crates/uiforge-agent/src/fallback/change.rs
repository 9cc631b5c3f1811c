//! Deterministic change planner
//!
//! Picks one target kind from the intent, one verb class (remove beats
//! update beats add) and synthesizes at most one operation against the
//! last plan.

use super::keywords::{pick_components, Verbs};
use super::planner::IdFactory;
use serde_json::{json, Value};
use uiforge_plan::{ChangePlan, Node, Operation, Plan, Position, Props};
use uiforge_policy::ComponentKind;

/// Summary used when nothing can be changed
pub const NO_MATCH_SUMMARY: &str = "No matching component found to change.";

/// Build a change plan for `intent` against `last_plan` without a model
#[must_use]
pub fn build_change_plan(intent: &str, last_plan: Option<&Plan>) -> ChangePlan {
    let target = pick_components(intent)
        .first()
        .copied()
        .unwrap_or(ComponentKind::Card);
    let target_node = last_plan
        .and_then(|plan| plan.tree.as_ref())
        .and_then(|tree| tree.find_first_of_type(target.as_str()));
    let verbs = Verbs::scan(intent);

    match target_node {
        Some(node) if verbs.remove => ChangePlan::new(
            format!("Removed {target}."),
            vec![Operation::remove(node.id())],
        ),
        Some(node) if verbs.update => ChangePlan::new(
            format!("Updated {target}."),
            vec![update_for(target, node.id())],
        ),
        _ if verbs.add || !verbs.remove => ChangePlan::new(
            format!("Added {target}."),
            vec![Operation::add(
                add_parent_id(last_plan),
                Position::End,
                node_for(target),
            )],
        ),
        _ => ChangePlan::new(NO_MATCH_SUMMARY, Vec::new()),
    }
}

/// Parent for inserted nodes: the root's second child if present, else the root
fn add_parent_id(plan: Option<&Plan>) -> String {
    let tree = plan.and_then(|plan| plan.tree.as_ref());
    tree.and_then(|tree| tree.children().get(1))
        .map(Node::id)
        .filter(|id| !id.is_empty())
        .or_else(|| tree.map(Node::id).filter(|id| !id.is_empty()))
        .unwrap_or("root")
        .to_string()
}

fn update_for(kind: ComponentKind, target_id: &str) -> Operation {
    let props = match kind {
        ComponentKind::Button => {
            return Operation::update_children(
                target_id,
                vec![Node::text("text-900", "Updated Action")],
            );
        }
        ComponentKind::Card => json!({ "title": "Updated Summary" }),
        ComponentKind::Navbar => json!({ "title": "Updated Navigation" }),
        ComponentKind::Sidebar => json!({ "items": ["Updated", "Links", "List"] }),
        ComponentKind::Table => json!({ "rows": [["Updated", "Row"], ["Another", "Row"]] }),
        ComponentKind::Chart => json!({ "title": "Updated Chart" }),
        ComponentKind::Input => json!({ "placeholder": "Updated placeholder" }),
        ComponentKind::Modal => json!({ "title": "Updated Modal" }),
    };
    Operation::update_props(target_id, into_props(props))
}

fn node_for(kind: ComponentKind) -> Node {
    let mut ids = IdFactory::new();
    match kind {
        ComponentKind::Navbar => ids.element(
            "Navbar",
            json!({ "title": "Updated Navigation", "links": ["Home", "Insights", "Settings"] }),
            vec![],
        ),
        ComponentKind::Sidebar => ids.element(
            "Sidebar",
            json!({ "title": "Quick Links", "items": ["Overview", "Pipeline", "Alerts"] }),
            vec![],
        ),
        ComponentKind::Chart => ids.element("Chart", json!({ "title": "Updated Chart" }), vec![]),
        ComponentKind::Table => ids.element(
            "Table",
            json!({
                "columns": ["Name", "Status"],
                "rows": [["Onboarding", "Active"], ["Review", "Pending"]]
            }),
            vec![],
        ),
        ComponentKind::Input => ids.element(
            "Input",
            json!({ "label": "Updated Input", "placeholder": "Type here" }),
            vec![],
        ),
        ComponentKind::Modal => {
            let text = ids.text("Placeholder modal content.");
            ids.element("Modal", json!({ "title": "Updated Modal", "open": true }), vec![text])
        }
        ComponentKind::Button => {
            let text = ids.text("New Action");
            ids.element("Button", json!({}), vec![text])
        }
        ComponentKind::Card => {
            let text = ids.text("Added by the change planner.");
            ids.element("Card", json!({ "title": "New Card" }), vec![text])
        }
    }
}

fn into_props(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}
