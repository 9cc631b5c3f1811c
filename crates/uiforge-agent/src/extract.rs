//! Model output parsing
//!
//! Models wrap answers in markdown fences and chatter. [`ResponseParser`]
//! removes fence markers and recovers the outermost JSON object.

use crate::error::ParseError;
use regex::Regex;
use serde_json::Value;
use uiforge_policy::PolicyError;

/// Fence marker: three backticks, an optional language tag, an optional newline
pub const CODE_FENCE_PATTERN: &str = r"```[a-zA-Z]*\n?";

/// Strips fences and extracts JSON from model output
#[derive(Debug, Clone)]
pub struct ResponseParser {
    fence: Regex,
}

impl ResponseParser {
    /// Compile the fence grammar
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if the fence pattern fails to compile
    pub fn new() -> Result<Self, PolicyError> {
        let fence = Regex::new(CODE_FENCE_PATTERN).map_err(|source| PolicyError::InvalidPattern {
            pattern: CODE_FENCE_PATTERN.to_string(),
            source,
        })?;
        Ok(Self { fence })
    }

    /// Remove every fence marker, keeping the fenced content
    #[must_use]
    pub fn strip_code_fences(&self, text: &str) -> String {
        self.fence.replace_all(text, "").into_owned()
    }

    /// Parse the span from the first `{` to the last `}` as JSON
    ///
    /// # Errors
    /// Returns [`ParseError::NoJsonObject`] when no such span exists and
    /// [`ParseError::Json`] when the span is not valid JSON
    pub fn extract_json(&self, text: &str) -> Result<Value, ParseError> {
        let cleaned = self.strip_code_fences(text);
        let cleaned = cleaned.trim();
        let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) else {
            return Err(ParseError::NoJsonObject);
        };
        if end <= start {
            return Err(ParseError::NoJsonObject);
        }
        Ok(serde_json::from_str(&cleaned[start..=end])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser() -> ResponseParser {
        ResponseParser::new().unwrap()
    }

    #[test]
    fn strips_fences_with_language_tags() {
        let text = "```jsx\nimport { Card } from \"./ui-kit\";\n```";
        assert_eq!(parser().strip_code_fences(text), "import { Card } from \"./ui-kit\";\n");
    }

    #[test]
    fn extracts_outermost_object() {
        let text = "Here you go:\n```json\n{ \"kind\": \"plan\", \"tree\": { \"id\": \"root\" } }\n```\nEnjoy!";
        assert_eq!(
            parser().extract_json(text).unwrap(),
            json!({ "kind": "plan", "tree": { "id": "root" } })
        );
    }

    #[test]
    fn reports_missing_object() {
        assert!(matches!(parser().extract_json("no braces"), Err(ParseError::NoJsonObject)));
        assert!(matches!(parser().extract_json("} backwards {"), Err(ParseError::NoJsonObject)));
        let err = parser().extract_json("oops").unwrap_err();
        assert_eq!(err.to_string(), "No JSON object found in response.");
    }

    #[test]
    fn reports_invalid_json() {
        assert!(matches!(parser().extract_json("{ not json }"), Err(ParseError::Json(_))));
    }
}
