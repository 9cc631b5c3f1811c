//! Change-plan apply engine
//!
//! [`apply_change_plan`] runs every operation of a [`ChangePlan`] against a
//! deep copy of the base [`Plan`]. Operations are independent: a failing
//! operation records an [`ApplyError`] and the loop moves on, nothing that
//! already succeeded is undone. Callers that need all-or-nothing semantics
//! discard the returned plan whenever [`ApplyOutcome::errors`] is non-empty.

use crate::ids::IdAllocator;
use crate::node::{Node, Props};
use crate::plan::{ChangePlan, Operation, Plan, Position};

/// Per-operation apply failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// Base plan has no tree
    #[error("Missing base plan.")]
    MissingBasePlan,

    /// Add target parent does not exist
    #[error("Add failed: parent {0} not found.")]
    ParentNotFound(String),

    /// Add target parent is a text leaf; text nodes never gain a child list
    #[error("Add failed: parent {0} cannot have children.")]
    ParentNotContainer(String),

    /// Remove targeted the root
    #[error("Cannot remove root node.")]
    CannotRemoveRoot,

    /// Remove target does not exist
    #[error("Remove failed: node {0} not found.")]
    RemoveTargetNotFound(String),

    /// Update target does not exist
    #[error("Update failed: node {0} not found.")]
    UpdateTargetNotFound(String),
}

/// Result of applying a change plan
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// Resulting plan (the unchanged base when the base had no tree)
    pub plan: Plan,
    /// Failures, in operation order
    pub errors: Vec<ApplyError>,
}

impl ApplyOutcome {
    /// Check if every operation applied
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Keep the plan only if every operation applied
    ///
    /// # Errors
    /// Returns the collected failures if any operation failed
    pub fn into_result(self) -> Result<Plan, Vec<ApplyError>> {
        if self.errors.is_empty() {
            Ok(self.plan)
        } else {
            Err(self.errors)
        }
    }
}

/// Apply `change` to a copy of `base`
///
/// `base` is never touched. Subtrees introduced by `add` and replacement
/// children of `update` are run through one [`IdAllocator`] seeded from the
/// copied tree, so they can neither collide with nor spoof existing ids.
#[must_use]
pub fn apply_change_plan(base: &Plan, change: &ChangePlan) -> ApplyOutcome {
    let Some(base_tree) = base.tree.as_ref() else {
        return ApplyOutcome {
            plan: base.clone(),
            errors: vec![ApplyError::MissingBasePlan],
        };
    };

    let mut working = base_tree.clone();
    let tree = &mut working;
    let mut allocator = IdAllocator::for_tree(tree);
    let mut errors = Vec::new();

    for (index, operation) in change.operations.iter().enumerate() {
        let result = match operation {
            Operation::Add {
                parent_id,
                position,
                node,
            } => apply_add(tree, &mut allocator, parent_id, *position, node),
            Operation::Remove { target_id } => apply_remove(tree, target_id),
            Operation::Update {
                target_id,
                props,
                text,
                children,
            } => apply_update(
                tree,
                &mut allocator,
                target_id,
                props.as_ref(),
                text.as_deref(),
                children.as_deref(),
            ),
        };

        match result {
            Ok(()) => tracing::debug!(index, op = operation.name(), "operation applied"),
            Err(err) => {
                tracing::debug!(index, op = operation.name(), error = %err, "operation failed");
                errors.push(err);
            }
        }
    }

    let plan = Plan {
        kind: base.kind,
        layout: base.layout.clone(),
        components: base.components.clone(),
        tree: Some(working),
    };
    ApplyOutcome { plan, errors }
}

fn apply_add(
    tree: &mut Node,
    allocator: &mut IdAllocator,
    parent_id: &str,
    position: Position,
    node: &Node,
) -> Result<(), ApplyError> {
    let parent = tree
        .find_mut(parent_id)
        .ok_or_else(|| ApplyError::ParentNotFound(parent_id.to_string()))?;
    let children = parent
        .children_mut()
        .ok_or_else(|| ApplyError::ParentNotContainer(parent_id.to_string()))?;

    let mut fresh = node.clone();
    allocator.assign(&mut fresh);

    let at = position.resolve(children.len());
    children.insert(at, fresh);
    Ok(())
}

fn apply_remove(tree: &mut Node, target_id: &str) -> Result<(), ApplyError> {
    if target_id == tree.id() {
        return Err(ApplyError::CannotRemoveRoot);
    }

    let not_found = || ApplyError::RemoveTargetNotFound(target_id.to_string());
    let path = tree.path_to(target_id).ok_or_else(not_found)?;
    let (_, parent_path) = path.split_last().ok_or_else(not_found)?;

    let siblings = tree
        .at_path_mut(parent_path)
        .and_then(Node::children_mut)
        .ok_or_else(not_found)?;
    siblings.retain(|child| child.id() != target_id);
    Ok(())
}

fn apply_update(
    tree: &mut Node,
    allocator: &mut IdAllocator,
    target_id: &str,
    props: Option<&Props>,
    text: Option<&str>,
    children: Option<&[Node]>,
) -> Result<(), ApplyError> {
    let target = tree
        .find_mut(target_id)
        .ok_or_else(|| ApplyError::UpdateTargetNotFound(target_id.to_string()))?;

    match target {
        Node::Element(element) => {
            if let Some(props) = props {
                for (key, value) in props {
                    element.props.insert(key.clone(), value.clone());
                }
            }
            if let Some(text) = text {
                element.text = Some(text.to_string());
            }
            if let Some(children) = children {
                let mut replacement = children.to_vec();
                for child in &mut replacement {
                    allocator.assign(child);
                }
                element.children = replacement;
            }
        }
        Node::Text(leaf) => {
            if let Some(text) = text {
                leaf.text = text.to_string();
            }
            if props.is_some() || children.is_some() {
                tracing::warn!(target_id, "props and children are ignored on text nodes");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::has_unique_ids;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base() -> Plan {
        Plan::new(
            "two sections",
            vec!["Card".to_string()],
            Node::element("root", "div")
                .with_child(Node::element("node-1", "section").with_child(Node::text("text-2", "Hi")))
                .with_child(
                    Node::element("node-3", "section")
                        .with_child(Node::element("node-4", "Card").with_prop("title", "A"))
                        .with_child(Node::element("node-5", "Button")),
                ),
        )
    }

    fn children_of<'a>(plan: &'a Plan, id: &str) -> Vec<&'a str> {
        plan.find(id)
            .map(|n| n.children().iter().map(Node::id).collect())
            .unwrap_or_default()
    }

    #[test]
    fn missing_tree_short_circuits() {
        let base = Plan::default();
        let change = ChangePlan::new("x", vec![Operation::remove("a"), Operation::remove("b")]);
        let outcome = apply_change_plan(&base, &change);
        assert_eq!(outcome.errors, vec![ApplyError::MissingBasePlan]);
        assert_eq!(outcome.plan, base);
    }

    #[test]
    fn add_positions() {
        let change = ChangePlan::new(
            "adds",
            vec![
                Operation::add("node-3", Position::Start, Node::element("s", "Chart")),
                Operation::add("node-3", Position::End, Node::element("e", "Chart")),
                Operation::add("node-3", Position::Index(1), Node::element("i", "Chart")),
            ],
        );
        let outcome = apply_change_plan(&base(), &change);
        assert!(outcome.is_clean());
        assert_eq!(
            children_of(&outcome.plan, "node-3"),
            vec!["s", "i", "node-4", "node-5", "e"]
        );
    }

    #[test]
    fn add_index_past_end_clamps() {
        let change = ChangePlan::new(
            "add",
            vec![Operation::add("node-3", Position::Index(5), Node::element("late", "Table"))],
        );
        let outcome = apply_change_plan(&base(), &change);
        assert!(outcome.is_clean());
        assert_eq!(children_of(&outcome.plan, "node-3"), vec!["node-4", "node-5", "late"]);
    }

    #[test]
    fn add_rewrites_colliding_ids() {
        let incoming = Node::element("node-1", "Card").with_child(Node::text("text-2", "dup"));
        let change = ChangePlan::new(
            "add",
            vec![Operation::add("root", Position::End, incoming)],
        );
        let outcome = apply_change_plan(&base(), &change);
        let tree = outcome.plan.tree.as_ref().unwrap();

        assert!(has_unique_ids(tree));
        let added = tree.children().last().unwrap();
        assert_eq!(added.id(), "node-8");
        assert_eq!(added.children()[0].id(), "text-9");
    }

    #[test]
    fn add_creates_children_on_empty_element() {
        let change = ChangePlan::new(
            "add",
            vec![Operation::add("node-5", Position::End, Node::text("", "Go"))],
        );
        let outcome = apply_change_plan(&base(), &change);
        assert!(outcome.is_clean());
        assert_eq!(children_of(&outcome.plan, "node-5").len(), 1);
    }

    #[test]
    fn add_errors() {
        let change = ChangePlan::new(
            "bad adds",
            vec![
                Operation::add("ghost", Position::End, Node::element("x", "Card")),
                Operation::add("text-2", Position::End, Node::element("y", "Card")),
            ],
        );
        let outcome = apply_change_plan(&base(), &change);
        assert_eq!(
            outcome
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "Add failed: parent ghost not found.",
                "Add failed: parent text-2 cannot have children.",
            ]
        );
    }

    #[test]
    fn add_under_text_keeps_the_leaf() {
        let change = ChangePlan::new(
            "add under text",
            vec![Operation::add("text-2", Position::Start, Node::text("", "more"))],
        );
        let outcome = apply_change_plan(&base(), &change);
        assert_eq!(outcome.errors, vec![ApplyError::ParentNotContainer("text-2".to_string())]);
        let leaf = outcome.plan.find("text-2").unwrap();
        assert!(leaf.is_text());
        assert!(leaf.children().is_empty());
    }

    #[test]
    fn remove_root_is_rejected() {
        let outcome = apply_change_plan(&base(), &ChangePlan::new("rm", vec![Operation::remove("root")]));
        assert_eq!(outcome.errors, vec![ApplyError::CannotRemoveRoot]);
        assert_eq!(outcome.errors[0].to_string(), "Cannot remove root node.");
        assert_eq!(outcome.plan, base());
    }

    #[test]
    fn remove_detaches_subtree() {
        let outcome = apply_change_plan(&base(), &ChangePlan::new("rm", vec![Operation::remove("node-4")]));
        assert!(outcome.is_clean());
        assert!(outcome.plan.find("node-4").is_none());
        assert_eq!(children_of(&outcome.plan, "node-3"), vec!["node-5"]);
    }

    #[test]
    fn remove_missing_node() {
        let outcome = apply_change_plan(&base(), &ChangePlan::new("rm", vec![Operation::remove("nope")]));
        assert_eq!(outcome.errors[0].to_string(), "Remove failed: node nope not found.");
    }

    #[test]
    fn update_merges_props() {
        let mut props = Props::new();
        props.insert("subtitle".into(), json!("B"));
        props.insert("title".into(), json!("Z"));
        let outcome = apply_change_plan(
            &base(),
            &ChangePlan::new("up", vec![Operation::update_props("node-4", props)]),
        );
        let card = outcome.plan.find("node-4").unwrap();
        assert_eq!(
            serde_json::to_value(card.props().unwrap()).unwrap(),
            json!({ "title": "Z", "subtitle": "B" })
        );
    }

    #[test]
    fn update_text_and_children() {
        let change = ChangePlan::new(
            "up",
            vec![
                Operation::Update {
                    target_id: "text-2".into(),
                    props: None,
                    text: Some("Hello".into()),
                    children: None,
                },
                Operation::update_children("node-5", vec![Node::text("text-2", "Clash")]),
            ],
        );
        let outcome = apply_change_plan(&base(), &change);
        assert!(outcome.is_clean());

        let tree = outcome.plan.tree.as_ref().unwrap();
        assert_eq!(tree.find("text-2"), Some(&Node::text("text-2", "Hello")));
        let replaced = &tree.find("node-5").unwrap().children()[0];
        assert_eq!(replaced, &Node::text("text-8", "Clash"));
        assert!(has_unique_ids(tree));
    }

    #[test]
    fn update_missing_node() {
        let outcome = apply_change_plan(
            &base(),
            &ChangePlan::new("up", vec![Operation::update_props("zzz", Props::new())]),
        );
        assert_eq!(outcome.errors[0].to_string(), "Update failed: node zzz not found.");
    }

    #[test]
    fn failures_do_not_stop_later_operations() {
        let change = ChangePlan::new(
            "mixed",
            vec![
                Operation::remove("root"),
                Operation::remove("node-5"),
                Operation::remove("ghost"),
            ],
        );
        let outcome = apply_change_plan(&base(), &change);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.plan.find("node-5").is_none());
        assert!(outcome.clone().into_result().is_err());
    }

    #[test]
    fn base_is_not_mutated() {
        let base = base();
        let snapshot = base.clone();
        let change = ChangePlan::new(
            "all",
            vec![
                Operation::remove("node-1"),
                Operation::add("root", Position::Start, Node::element("", "Navbar")),
            ],
        );
        let mut outcome = apply_change_plan(&base, &change);
        if let Some(Node::Element(root)) = outcome.plan.tree.as_mut() {
            root.children.clear();
        }
        assert_eq!(base, snapshot);
    }
}
