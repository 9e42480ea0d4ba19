pub mod github;
pub mod llm;
pub mod openai;

pub use github::GitHubClient;
pub use openai::OpenAIAdapter;
