//! uiforge Policy
//!
//! The safety envelope every plan and every piece of generated source must
//! stay inside.
//!
//! # Core Concepts
//!
//! - [`PolicyCatalog`]: versioned table of allowed kinds, tags, imports and patterns
//! - [`PlanValidator`]: structural check of a plan tree (typed or raw JSON)
//! - [`CodeValidator`]: static check of generated source text
//! - [`IntentScreen`]: advisory notes for requests that will be ignored
//! - [`ValidationReport`]: accumulated findings, serialized as `{ ok, errors }`
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use uiforge_policy::{CodeValidator, PolicyCatalog};
//!
//! let validator = CodeValidator::new(Arc::new(PolicyCatalog::standard())).unwrap();
//! let report = validator.validate("import { Button } from './ui-kit'; <Button className=\"x\"/>");
//! assert_eq!(report.messages(), vec!["className is not allowed"]);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod advisory;
mod catalog;
mod code_validator;
mod error;
mod plan_validator;
mod report;

pub use advisory::{policy_notes, IntentScreen, NO_NOTES};
pub use catalog::{
    compile_rules, CompiledRule, ComponentKind, PatternRule, PolicyCatalog, StructuralTag,
    CATALOG_VERSION,
};
pub use code_validator::{CodeValidator, CodeViolation};
pub use error::PolicyError;
pub use plan_validator::{PlanValidator, PlanViolation, ROOT_PATH};
pub use report::ValidationReport;

/// Catalog, validators and screen compiled together
#[derive(Debug, Clone)]
pub struct Policy {
    catalog: std::sync::Arc<PolicyCatalog>,
    plans: PlanValidator,
    code: CodeValidator,
    intent: IntentScreen,
}

impl Policy {
    /// Compile every table of `catalog`
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if any catalog pattern fails to compile
    pub fn new(catalog: PolicyCatalog) -> Result<Self, PolicyError> {
        let catalog = std::sync::Arc::new(catalog);
        Ok(Self {
            plans: PlanValidator::new(catalog.clone())?,
            code: CodeValidator::new(catalog.clone())?,
            intent: IntentScreen::new(&catalog)?,
            catalog,
        })
    }

    /// Standard catalog, compiled
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] only if the built-in tables are broken
    pub fn standard() -> Result<Self, PolicyError> {
        Self::new(PolicyCatalog::standard())
    }

    /// Shared catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &std::sync::Arc<PolicyCatalog> {
        &self.catalog
    }

    /// Plan validator
    #[inline]
    #[must_use]
    pub fn plans(&self) -> &PlanValidator {
        &self.plans
    }

    /// Code validator
    #[inline]
    #[must_use]
    pub fn code(&self) -> &CodeValidator {
        &self.code
    }

    /// Intent screen
    #[inline]
    #[must_use]
    pub fn intent(&self) -> &IntentScreen {
        &self.intent
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
