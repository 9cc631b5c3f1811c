//! Model client seam
//!
//! The pipeline treats the language model as one awaited call from prompt
//! text to output text. Transport, authentication and retries belong to the
//! implementor; the pipeline adds only a timeout.

use crate::error::ModelError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Text completion client
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync + fmt::Debug {
    /// Complete `prompt` with `model` at `temperature`
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, ModelError>;
}

#[async_trait::async_trait]
impl<T: ModelClient + ?Sized> ModelClient for Arc<T> {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, ModelError> {
        (**self).complete(prompt, model, temperature).await
    }
}

/// Single model call bounded by `timeout`
///
/// # Errors
/// Returns the client's error, or [`ModelError::Timeout`] when the call
/// does not finish in time
pub async fn complete_with_timeout(
    client: &dyn ModelClient,
    prompt: &str,
    model: &str,
    temperature: f32,
    timeout: Duration,
) -> Result<String, ModelError> {
    debug!(model, temperature, prompt_chars = prompt.len(), "calling model");
    tokio::time::timeout(timeout, client.complete(prompt, model, temperature))
        .await
        .map_err(|_| ModelError::Timeout {
            secs: timeout.as_secs(),
        })?
}
