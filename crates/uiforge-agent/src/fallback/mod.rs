//! Deterministic fallback planning
//!
//! Rule-based stand-in for the model. Its plans and change plans go
//! through exactly the same validators as model output, and identical
//! inputs always produce identical documents.

mod change;
mod explanation;
mod keywords;
mod planner;

pub use change::{build_change_plan, NO_MATCH_SUMMARY};
pub use explanation::{build_explanation, NO_MODEL_NOTE};
pub use keywords::{pick_components, Verbs, COMPONENT_KEYWORDS, DEFAULT_COMPONENTS};
pub use planner::{build_plan, FALLBACK_LAYOUT};
