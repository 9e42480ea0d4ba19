use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrLinkError {
    #[error("invalid PR link {link:?}: {reason}")]
    InvalidUrl { link: String, reason: String },
    #[error("invalid PR link format: expected https://<host>/<owner>/<repo>/pull/<number>")]
    MissingPathSegments,
    #[error("invalid PR link format: expected a `pull` segment, found {0:?}")]
    NotAPullRequest(String),
    #[error("invalid PR number {0:?}: must be a positive integer")]
    InvalidNumber(String),
}

/// A pull request identified by a browser URL, plus the API base it lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrLink {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub api_base: String,
}

impl PrLink {
    pub fn parse(link: &str) -> Result<Self, PrLinkError> {
        let url = Url::parse(link.trim()).map_err(|err| PrLinkError::InvalidUrl {
            link: link.to_string(),
            reason: err.to_string(),
        })?;
        let host = url.host_str().ok_or_else(|| PrLinkError::InvalidUrl {
            link: link.to_string(),
            reason: "URL has no host".to_string(),
        })?;

        let segments: Vec<&str> = url.path().trim_matches('/').split('/').collect();
        if segments.len() < 4 {
            return Err(PrLinkError::MissingPathSegments);
        }
        let (owner, repo, kind, number) = (segments[0], segments[1], segments[2], segments[3]);
        if owner.is_empty() || repo.is_empty() {
            return Err(PrLinkError::MissingPathSegments);
        }
        if kind != "pull" {
            return Err(PrLinkError::NotAPullRequest(kind.to_string()));
        }
        let number = number
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| PrLinkError::InvalidNumber(number.to_string()))?;

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
            api_base: api_base_for(url.scheme(), host, url.port()),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn api_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.number
        )
    }
}

impl fmt::Display for PrLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// github.com is served from api.github.com; Enterprise hosts expose `/api/v3`.
fn api_base_for(scheme: &str, host: &str, port: Option<u16>) -> String {
    if host.eq_ignore_ascii_case("github.com") || host.eq_ignore_ascii_case("www.github.com") {
        return "https://api.github.com".to_string();
    }
    match port {
        Some(port) => format!("{}://{}:{}/api/v3", scheme, host, port),
        None => format!("{}://{}/api/v3", scheme, host),
    }
}
