use crate::core::PrLink;
use anyhow::Result;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch PR diff: status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to fetch PR diff: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Fetches pull request diffs from the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("prscope/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            token: token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub async fn fetch_pr_diff(&self, pr: &PrLink) -> Result<String, FetchError> {
        let url = pr.api_url();
        info!("Fetching PR #{} diff from {}/{}...", pr.number, pr.owner, pr.repo);

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, DIFF_MEDIA_TYPE);
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("token {}", token.trim()));
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let diff = response.text().await?;
        debug!("Fetched {} bytes of diff from {}", diff.len(), url);
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn pr_for(server: &mockito::ServerGuard) -> PrLink {
        PrLink::parse("https://github.com/acme/widgets/pull/42")
            .unwrap()
            .with_api_base(server.url())
    }

    #[tokio::test]
    async fn test_fetch_returns_body_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let body = "diff --git a/x.rs b/x.rs\n@@ -1 +1 @@\n-a\n+b\n";
        let mock = server
            .mock("GET", "/repos/acme/widgets/pulls/42")
            .match_header("accept", DIFF_MEDIA_TYPE)
            .match_header("authorization", "token ghp_secret")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = GitHubClient::new(Some("ghp_secret".to_string()), 30).unwrap();
        let diff = client.fetch_pr_diff(&pr_for(&server)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(diff, body);
    }

    #[tokio::test]
    async fn test_fetch_without_token_sends_no_authorization() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/widgets/pulls/42")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let client = GitHubClient::new(Some("  ".to_string()), 30).unwrap();
        client.fetch_pr_diff(&pr_for(&server)).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_reports_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widgets/pulls/42")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(None, 30).unwrap();
        let err = client.fetch_pr_diff(&pr_for(&server)).await.unwrap_err();

        match &err {
            FetchError::Status { status, body } => {
                assert_eq!(*status, StatusCode::NOT_FOUND);
                assert!(body.contains("Not Found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("404"));
    }
}
