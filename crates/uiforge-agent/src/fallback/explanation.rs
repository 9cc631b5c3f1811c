//! Deterministic explanation text

use crate::request::Mode;
use uiforge_plan::{ChangePlan, Plan};
use uiforge_policy::NO_NOTES;

/// Closing line of every deterministic explanation
pub const NO_MODEL_NOTE: &str =
    "Deterministic planning is enabled, so no external model calls were made.";

/// Narrate a run that used the deterministic planner
#[must_use]
pub fn build_explanation(
    mode: Mode,
    plan: &Plan,
    change_plan: Option<&ChangePlan>,
    policy_notes: &str,
) -> String {
    let intro = if mode == Mode::Modify {
        let summary = change_plan
            .map(|change| change.summary.as_str())
            .filter(|summary| !summary.is_empty())
            .unwrap_or("updated the layout.");
        format!("Applied a minimal change plan: {summary}")
    } else if plan.components.is_empty() {
        "Generated a layout with No components.".to_string()
    } else {
        format!("Generated a layout with {}.", plan.components.join(", "))
    };

    let policy = if policy_notes.is_empty() || policy_notes == NO_NOTES {
        "All requests fit the deterministic rules.".to_string()
    } else {
        format!("Some requests were ignored due to deterministic rules: {policy_notes}")
    };

    format!("{intro}\n\nPlan layout: {}\n\n{policy}\n\n{NO_MODEL_NOTE}", plan.layout)
}
