//! Prompt templates
//!
//! Templates are plain text with `{{NAME}}` placeholders. A
//! [`TemplateSource`] loads them by name; [`PromptCache`] sits in front of a
//! source and keeps each template after its first load. The key set is the
//! fixed [`TemplateName`] list, so entries never need invalidation.

use crate::error::PromptError;
use moka::future::Cache;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Suffix appended to truncated prompt values
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// Known templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateName {
    Planner,
    Generator,
    Explainer,
}

impl TemplateName {
    /// Every template
    pub const ALL: [Self; 3] = [Self::Planner, Self::Generator, Self::Explainer];

    /// File name of the template
    #[inline]
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Planner => "planner.txt",
            Self::Generator => "generator.txt",
            Self::Explainer => "explainer.txt",
        }
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Loads template text by name
#[async_trait::async_trait]
pub trait TemplateSource: Send + Sync + fmt::Debug {
    /// Load the template called `name`
    async fn load(&self, name: TemplateName) -> Result<String, PromptError>;
}

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplates;

#[async_trait::async_trait]
impl TemplateSource for EmbeddedTemplates {
    async fn load(&self, name: TemplateName) -> Result<String, PromptError> {
        let text = match name {
            TemplateName::Planner => include_str!("../prompts/planner.txt"),
            TemplateName::Generator => include_str!("../prompts/generator.txt"),
            TemplateName::Explainer => include_str!("../prompts/explainer.txt"),
        };
        Ok(text.to_string())
    }
}

/// Templates read from a directory
#[derive(Debug, Clone)]
pub struct DirTemplates {
    dir: PathBuf,
}

impl DirTemplates {
    /// Read templates from `dir`
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl TemplateSource for DirTemplates {
    async fn load(&self, name: TemplateName) -> Result<String, PromptError> {
        let path = self.dir.join(name.file_name());
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(PromptError::NotFound {
                name: name.file_name().to_string(),
            }),
            Err(err) => Err(PromptError::Io {
                path,
                message: err.to_string(),
            }),
        }
    }
}

/// Read-through template cache
///
/// Cloning shares the underlying cache.
#[derive(Debug, Clone)]
pub struct PromptCache {
    source: Arc<dyn TemplateSource>,
    inner: Cache<TemplateName, Arc<str>>,
}

impl PromptCache {
    /// Cache in front of `source`
    #[must_use]
    pub fn new(source: Arc<dyn TemplateSource>, max_capacity: u64) -> Self {
        Self {
            source,
            inner: Cache::new(max_capacity),
        }
    }

    /// Template text, loading it on first use
    ///
    /// # Errors
    /// Returns the source's error; failures are not cached
    pub async fn get(&self, name: TemplateName) -> Result<Arc<str>, PromptError> {
        if let Some(cached) = self.inner.get(&name).await {
            return Ok(cached);
        }

        let text: Arc<str> = Arc::from(self.source.load(name).await?);
        debug!(template = %name, chars = text.len(), "prompt template loaded");
        self.inner.insert(name, text.clone()).await;
        Ok(text)
    }

    /// Check if a template is cached
    #[inline]
    #[must_use]
    pub async fn contains(&self, name: TemplateName) -> bool {
        self.inner.get(&name).await.is_some()
    }
}

/// Substitute `{{KEY}}` placeholders, in the order given
///
/// Placeholders without a matching variable are left untouched.
#[must_use]
pub fn fill(template: &str, variables: &[(&str, &str)]) -> String {
    variables
        .iter()
        .fold(template.to_string(), |output, (key, value)| {
            output.replace(&format!("{{{{{key}}}}}"), value)
        })
}

/// Keep the first `max` characters of `value`, marking the cut
#[must_use]
pub fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        None => value.to_string(),
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &value[..cut]),
    }
}
