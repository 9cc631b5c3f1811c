//! uiforge Code Generator
//!
//! Deterministic serialization of a validated [`Plan`] into component
//! source that references only catalog components.
//!
//! # Core Concepts
//!
//! - Import line: the component kinds present in the tree, in catalog order
//! - Markup: one element per node, props as `name={json}`, two spaces per depth
//! - Template: a single default-exported `GeneratedUI` function
//!
//! # Example
//!
//! ```rust
//! use uiforge_codegen::CodeGenerator;
//! use uiforge_plan::{Node, Plan};
//!
//! let tree = Node::element("root", "div")
//!     .with_child(Node::element("node-1", "Card").with_prop("title", "Hi"));
//! let code = CodeGenerator::standard().generate(&Plan::new("one card", vec![], tree));
//! assert!(code.starts_with("import { Card } from \"./ui-kit\";"));
//! assert!(code.contains("      <Card title={\"Hi\"}></Card>"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod generator;

pub use generator::{CodeGenerator, ENTRY_POINT, ROOT_INDENT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
