use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub user_prompt_template: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            user_prompt_template: "Review the following GitHub PR code changes:\n\n\
{diff}\n\n\
Provide detailed constructive feedback to improve the code given. \
When suggesting changes, please show the line before and after change."
                .to_string(),
        }
    }
}

/// Builds the single user message sent for each diff chunk.
#[derive(Debug, Clone, Default)]
pub struct ReviewPromptBuilder {
    config: PromptConfig,
}

impl ReviewPromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn build_review_prompt(&self, chunk: &str) -> String {
        self.config.user_prompt_template.replace("{diff}", chunk)
    }
}
