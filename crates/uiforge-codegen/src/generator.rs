//! Plan to source serialization

use std::sync::Arc;
use tracing::debug;
use uiforge_plan::{Node, Plan, Props};
use uiforge_policy::PolicyCatalog;

/// Name of the generated default export
pub const ENTRY_POINT: &str = "GeneratedUI";

/// Indentation of the root element inside the template
pub const ROOT_INDENT: &str = "    ";

const STEP: &str = "  ";

/// Renders plans as source text
///
/// Output depends only on the plan and the catalog, so equal inputs always
/// produce byte-identical source.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    catalog: Arc<PolicyCatalog>,
}

impl CodeGenerator {
    /// Create generator over `catalog`
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<PolicyCatalog>) -> Self {
        Self { catalog }
    }

    /// Generator over the standard catalog
    #[must_use]
    pub fn standard() -> Self {
        Self::new(Arc::new(PolicyCatalog::standard()))
    }

    /// Render `plan` as source
    ///
    /// A plan without a tree renders an empty body; callers validate first.
    #[must_use]
    pub fn generate(&self, plan: &Plan) -> String {
        let used = plan
            .tree
            .as_ref()
            .map(|tree| self.catalog.used_components(tree))
            .unwrap_or_default();
        let import_line = self.import_line(&used);

        let mut markup = String::new();
        if let Some(tree) = &plan.tree {
            render_node(tree, ROOT_INDENT, &mut markup);
        }

        debug!(components = ?used, bytes = markup.len(), "generated source");
        format!(
            "{import_line}\n\nexport default function {ENTRY_POINT}() {{\n  return (\n{markup}\n  );\n}}\n"
        )
    }

    /// Import statement for the component kinds in `used`
    #[must_use]
    pub fn import_line(&self, used: &[String]) -> String {
        let names = if used.is_empty() {
            self.catalog.fallback_component.clone()
        } else {
            used.join(", ")
        };
        format!(
            "import {{ {names} }} from \"{}\";",
            self.catalog.component_import_path
        )
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::standard()
    }
}

fn render_node(node: &Node, indent: &str, out: &mut String) {
    match node {
        Node::Text(text) => {
            out.push_str(indent);
            out.push_str(&text.text);
        }
        Node::Element(element) => {
            let tag = element.node_type.as_str();
            out.push_str(indent);
            out.push('<');
            out.push_str(tag);
            render_props(&element.props, out);
            out.push('>');

            if !element.children.is_empty() {
                let child_indent = format!("{indent}{STEP}");
                for child in &element.children {
                    out.push('\n');
                    render_node(child, &child_indent, out);
                }
                out.push('\n');
                out.push_str(indent);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn render_props(props: &Props, out: &mut String) {
    for (key, value) in props {
        out.push(' ');
        out.push_str(key);
        out.push_str("={");
        out.push_str(&value.to_string());
        out.push('}');
    }
}
