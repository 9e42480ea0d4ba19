use crate::core::diff_parser::{FileDiff, PullRequestDiff};
use tracing::{debug, info};

pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[".ipynb", ".md", ".lock"];

/// File extensions whose diffs are dropped before review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    extensions: Vec<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().to_ascii_lowercase();
            if ext.is_empty() || ext == "." {
                continue;
            }
            let ext = if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            };
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        Self {
            extensions: normalized,
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_excluded(&self, file: &FileDiff) -> bool {
        if self.extensions.is_empty() {
            return false;
        }

        match (&file.old_path, &file.new_path) {
            (Some(old), Some(new)) => self.matches_path(old) || self.matches_path(new),
            // Unparseable header: fall back to looking for the extension anywhere in it.
            _ => {
                let header = file.header.to_ascii_lowercase();
                self.extensions.iter().any(|ext| header.contains(ext.as_str()))
            }
        }
    }

    fn matches_path(&self, path: &str) -> bool {
        if path == "/dev/null" {
            return false;
        }
        let path = path.to_ascii_lowercase();
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// Returns a copy of `diff` without the files this set excludes.
    pub fn filter(&self, diff: &PullRequestDiff) -> PullRequestDiff {
        let mut files = Vec::with_capacity(diff.files.len());
        for file in &diff.files {
            if self.is_excluded(file) {
                info!(
                    "Skipping excluded file: {}",
                    file.path().unwrap_or(file.header.as_str())
                );
                continue;
            }
            let (added, removed) = file.stats();
            debug!(
                "Keeping {} (+{} -{})",
                file.path().unwrap_or(file.header.as_str()),
                added,
                removed
            );
            files.push(file.clone());
        }

        PullRequestDiff {
            preamble: diff.preamble.clone(),
            files,
        }
    }
}
