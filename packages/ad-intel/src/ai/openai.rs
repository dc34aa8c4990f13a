//! OpenAI-backed [`Llm`].

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::traits::llm::{GenerationRequest, Llm};

/// Chat-completions adapter. One `generate` call is one HTTP request.
#[derive(Clone)]
pub struct OpenAiLlm {
    client: OpenAIClient,
}

impl OpenAiLlm {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: OpenAIClient::new(api_key),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }
}

fn to_chat_request(request: &GenerationRequest) -> ChatRequest {
    let mut chat = ChatRequest::new(&request.model);
    if let Some(system) = &request.system {
        chat = chat.message(Message::system(system));
    }
    chat = chat.message(Message::user(&request.prompt));
    if let Some(temperature) = request.temperature {
        chat = chat.temperature(temperature);
    }
    if let Some(limit) = request.max_output_tokens {
        chat = chat.output_token_limit(limit);
    }
    chat
}

pub(crate) fn classify(err: OpenAIError) -> LlmError {
    let transient = err.is_transient();
    match err {
        OpenAIError::Api { status, message } if transient => LlmError::Transient { status, message },
        other => LlmError::Permanent(other.to_string()),
    }
}

#[async_trait]
impl Llm for OpenAiLlm {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
        let response = self
            .client
            .chat_completion(to_chat_request(request))
            .await
            .map_err(classify)?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %request.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model call complete"
            );
        }

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_are_transient() {
        let err = classify(OpenAIError::Api {
            status: 429,
            message: "slow down".into(),
        });
        assert_eq!(
            err,
            LlmError::Transient {
                status: 429,
                message: "slow down".into()
            }
        );
        assert!(classify(OpenAIError::Api {
            status: 503,
            message: String::new()
        })
        .is_transient());
    }

    #[test]
    fn everything_else_is_permanent() {
        assert!(!classify(OpenAIError::Api {
            status: 400,
            message: "bad".into()
        })
        .is_transient());
        assert!(!classify(OpenAIError::Network("reset".into())).is_transient());
        assert!(!classify(OpenAIError::Parse("no choices".into())).is_transient());
    }

    #[test]
    fn builds_chat_request() {
        let request = GenerationRequest::new("gpt-4o-mini", "tag this")
            .with_system("You tag videos.")
            .with_temperature(0.0)
            .with_max_output_tokens(150);
        let chat = to_chat_request(&request);
        let body = serde_json::to_value(&chat).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "tag this");
        assert_eq!(body["max_tokens"], 150);
    }
}
