//! Yes/no relevance classification by a hosted model.

use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{LlmError, LlmResult};
use crate::rate_limit::CallWindow;
use crate::retry::RetryPolicy;
use crate::traits::llm::{GenerationRequest, Llm};

/// Build the yes/no question for `text` and `keywords`.
pub fn build_relevance_prompt<S: AsRef<str>>(text: &str, keywords: &[S]) -> String {
    let joined = keywords
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a yes/no classifier.  Reply with exactly 'Yes' or 'No'.\n\n\
         Question: Does the following social\u{2011}media post feature {joined}?\n\
         Content: {text}\n\
         Answer 'Yes' or 'No'."
    )
}

/// A reply counts as yes iff it starts with "yes" after trimming, ignoring case.
pub fn is_affirmative(reply: &str) -> bool {
    reply.trim().to_lowercase().starts_with("yes")
}

/// Asks the model whether content features the given keywords.
///
/// Every attempt, retries included, takes a slot from the shared
/// [`CallWindow`]. Only transient failures are retried; anything else, and
/// exhaustion, is returned to the caller.
pub struct RelevanceClassifier<L: Llm> {
    llm: L,
    model: String,
    window: CallWindow,
    retry: RetryPolicy,
}

impl<L: Llm> RelevanceClassifier<L> {
    /// 15 calls per rolling minute, five attempts with linear 5s backoff.
    pub fn new(llm: L, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            window: CallWindow::new(15, Duration::from_secs(60)),
            retry: RetryPolicy::linear(5, Duration::from_secs(5)),
        }
    }

    /// Share a window with other callers.
    pub fn with_window(mut self, window: CallWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn window(&self) -> &CallWindow {
        &self.window
    }

    #[instrument(skip(self, text, keywords), fields(text_len = text.len()))]
    pub async fn classify<S: AsRef<str> + Sync>(&self, text: &str, keywords: &[S]) -> LlmResult<bool> {
        let request = GenerationRequest::new(&self.model, build_relevance_prompt(text, keywords));

        let (llm, window, request) = (&self.llm, &self.window, &request);

        let reply = self
            .retry
            .run(
                move |_| async move {
                    window.acquire().await;
                    llm.generate(request).await
                },
                LlmError::is_transient,
            )
            .await?;

        let relevant = is_affirmative(&reply);
        debug!(relevant, reply = %reply.trim(), "Model relevance verdict");
        Ok(relevant)
    }
}
