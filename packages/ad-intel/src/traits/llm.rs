//! The hosted model seam.
//!
//! Pipelines hold an `Llm` and pass their own rate limiter and retry policy
//! around each call. Implementations only translate a request into a single
//! provider call and classify its failure.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LlmResult;

/// One text-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

/// A hosted text model.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Return the model's raw text reply.
    ///
    /// Rate limiting and 503 responses must surface as
    /// [`LlmError::Transient`](crate::error::LlmError::Transient).
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String>;
}

#[async_trait]
impl<T: Llm + ?Sized> Llm for Arc<T> {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
        (**self).generate(request).await
    }
}
