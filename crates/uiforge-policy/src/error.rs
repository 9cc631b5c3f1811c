//! Error types for the policy layer
//!
//! Validation findings are not errors; they are reported through
//! [`crate::ValidationReport`]. These variants cover catalog problems that
//! prevent a validator from being built at all.

/// Policy construction error
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A catalog pattern failed to compile
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// Offending pattern text
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Name is not a catalog component kind
    #[error("unknown component kind: {0}")]
    UnknownComponent(String),
}
