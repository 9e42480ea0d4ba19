use crate::adapters::llm::{LLMAdapter, LLMRequest};
use crate::core::prompt::ReviewPromptBuilder;
use anyhow::Result;
use tracing::{debug, error, info};

pub const REVIEW_FAILURE_PLACEHOLDER: &str = "Failed to get feedback from the review model.";

/// Reviews diff chunks one at a time and joins the feedback in chunk order.
pub struct ChunkedReviewer<'a> {
    adapter: &'a dyn LLMAdapter,
    prompt_builder: ReviewPromptBuilder,
}

impl<'a> ChunkedReviewer<'a> {
    pub fn new(adapter: &'a dyn LLMAdapter, prompt_builder: ReviewPromptBuilder) -> Self {
        Self {
            adapter,
            prompt_builder,
        }
    }

    /// One completion call per chunk. A failed call yields
    /// [`REVIEW_FAILURE_PLACEHOLDER`] for that chunk and the loop goes on.
    pub async fn review(&self, chunks: &[String]) -> String {
        let mut feedbacks = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            info!(
                "Reviewing chunk {}/{} ({} chars) with {}",
                index + 1,
                chunks.len(),
                chunk.chars().count(),
                self.adapter.model_name()
            );
            let feedback = match self.review_chunk(chunk).await {
                Ok(feedback) => feedback,
                Err(err) => {
                    error!("An error occurred reviewing chunk {}: {:#}", index + 1, err);
                    REVIEW_FAILURE_PLACEHOLDER.to_string()
                }
            };
            feedbacks.push(feedback);
        }

        feedbacks.join(" ")
    }

    async fn review_chunk(&self, chunk: &str) -> Result<String> {
        let prompt = self.prompt_builder.build_review_prompt(chunk);
        let response = self.adapter.complete(LLMRequest::user(prompt)).await?;
        debug!("Received {} chars of feedback from {}", response.content.len(), response.model);
        if let Some(usage) = &response.usage {
            debug!(
                "Token usage: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }
        Ok(response.content)
    }
}
