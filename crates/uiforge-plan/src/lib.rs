//! uiforge Plan Model
//!
//! Typed plan trees and the change-plan language that edits them.
//!
//! # Core Concepts
//!
//! - [`Node`]: text leaf or element (component kind / structural tag)
//! - [`Plan`]: full snapshot of an accepted UI (layout, components, tree)
//! - [`ChangePlan`]: ordered [`Operation`]s against one base plan
//! - [`IdAllocator`]: keeps ids unique when subtrees enter a tree
//! - [`apply_change_plan`]: copy-on-write, best-effort apply engine
//!
//! # Example
//!
//! ```rust
//! use uiforge_plan::{apply_change_plan, ChangePlan, Node, Operation, Plan, Position};
//!
//! let base = Plan::new(
//!     "single section",
//!     vec![],
//!     Node::element("root", "div").with_child(Node::element("node-1", "section")),
//! );
//! let change = ChangePlan::new(
//!     "Added Card.",
//!     vec![Operation::add("node-1", Position::End, Node::element("node-1", "Card"))],
//! );
//!
//! let outcome = apply_change_plan(&base, &change);
//! assert!(outcome.is_clean());
//! assert!(base.find("node-4").is_none());
//! assert!(outcome.plan.find("node-4").is_some());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod apply;
mod ids;
mod node;
mod plan;

pub use apply::{apply_change_plan, ApplyError, ApplyOutcome};
pub use ids::{
    collect_ids, has_unique_ids, normalize_ids, IdAllocator, ELEMENT_ID_PREFIX, TEXT_ID_PREFIX,
};
pub use node::{ElementNode, Node, NodeShapeError, PreOrder, Props, TextNode, TEXT_TYPE};
pub use plan::{ChangePlan, ChangePlanKind, Operation, Plan, PlanKind, Position};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
