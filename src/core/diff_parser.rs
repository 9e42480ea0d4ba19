use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const FILE_HEADER_PREFIX: &str = "diff --git ";

static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

/// A pull request diff split into per-file sections.
///
/// Every input line lands in exactly one place (preamble, file header,
/// extended header or hunk body), so `lines()` reproduces the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestDiff {
    pub preamble: Vec<String>,
    pub files: Vec<FileDiff>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    pub header: String,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub extended_header: Vec<String>,
    pub hunks: Vec<DiffHunk>,
    pub is_binary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_lines: usize,
    pub new_start: usize,
    pub new_lines: usize,
    pub header: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkRange {
    old_start: usize,
    old_lines: usize,
    new_start: usize,
    new_lines: usize,
}

impl PullRequestDiff {
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.preamble
            .iter()
            .map(String::as_str)
            .chain(self.files.iter().flat_map(|file| file.lines()))
    }
}

impl FileDiff {
    /// The path the file has after the change, falling back to the old one.
    pub fn path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.header.as_str())
            .chain(self.extended_header.iter().map(String::as_str))
            .chain(self.hunks.iter().flat_map(|hunk| hunk.lines()))
    }

    /// Added and removed line counts across all hunks.
    pub fn stats(&self) -> (usize, usize) {
        self.hunks.iter().fold((0, 0), |(added, removed), hunk| {
            let hunk_added = hunk.lines.iter().filter(|l| l.starts_with('+')).count();
            let hunk_removed = hunk.lines.iter().filter(|l| l.starts_with('-')).count();
            (added + hunk_added, removed + hunk_removed)
        })
    }
}

impl DiffHunk {
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.header.as_str()).chain(self.lines.iter().map(String::as_str))
    }
}

pub fn is_file_header(line: &str) -> bool {
    line.starts_with(FILE_HEADER_PREFIX)
}

pub struct DiffParser;

impl DiffParser {
    pub fn parse(diff_content: &str) -> PullRequestDiff {
        // Split on '\n' only so a CRLF diff keeps its '\r's; a final newline
        // ends the last line rather than opening an empty one.
        let mut lines: Vec<&str> = diff_content.split('\n').collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        let mut parsed = PullRequestDiff::default();
        let mut i = 0;

        while i < lines.len() && !is_file_header(lines[i]) {
            parsed.preamble.push(lines[i].to_string());
            i += 1;
        }

        while i < lines.len() {
            let file = Self::parse_file_diff(&lines, &mut i);
            parsed.files.push(file);
        }

        parsed
    }

    fn parse_file_diff(lines: &[&str], i: &mut usize) -> FileDiff {
        let header = lines[*i];
        let (old_path, new_path) = match Self::extract_paths(header) {
            Some((old, new)) => (Some(old), Some(new)),
            None => (None, None),
        };
        *i += 1;

        let mut extended_header = Vec::new();
        let mut is_binary = false;
        while *i < lines.len()
            && !is_file_header(lines[*i])
            && Self::parse_hunk_header(lines[*i]).is_none()
        {
            if lines[*i].starts_with("Binary files") || lines[*i].starts_with("GIT binary patch") {
                is_binary = true;
            }
            extended_header.push(lines[*i].to_string());
            *i += 1;
        }

        let mut hunks = Vec::new();
        while let Some(range) = lines.get(*i).and_then(|line| Self::parse_hunk_header(line)) {
            hunks.push(Self::parse_hunk(lines, i, range));
        }

        FileDiff {
            header: header.to_string(),
            old_path,
            new_path,
            extended_header,
            hunks,
            is_binary,
        }
    }

    fn parse_hunk(lines: &[&str], i: &mut usize, range: HunkRange) -> DiffHunk {
        let header = lines[*i];
        *i += 1;

        let mut body = Vec::new();
        while *i < lines.len()
            && !is_file_header(lines[*i])
            && Self::parse_hunk_header(lines[*i]).is_none()
        {
            body.push(lines[*i].to_string());
            *i += 1;
        }

        DiffHunk {
            old_start: range.old_start,
            old_lines: range.old_lines,
            new_start: range.new_start,
            new_lines: range.new_lines,
            header: header.to_string(),
            lines: body,
        }
    }

    /// Splits `diff --git a/<old> b/<new>` into its two paths.
    fn extract_paths(header: &str) -> Option<(String, String)> {
        let rest = header
            .trim_end_matches('\r')
            .strip_prefix(FILE_HEADER_PREFIX)?;
        let (old, new) = rest.split_once(" b/")?;
        let old = old.strip_prefix("a/")?;
        if old.is_empty() || new.is_empty() {
            return None;
        }
        Some((old.to_string(), new.to_string()))
    }

    fn parse_hunk_header(line: &str) -> Option<HunkRange> {
        let caps = HUNK_HEADER.captures(line)?;
        let number = |idx: usize, default: usize| {
            caps.get(idx)
                .map_or(Some(default), |m| m.as_str().parse().ok())
        };

        Some(HunkRange {
            old_start: number(1, 0)?,
            old_lines: number(2, 1)?,
            new_start: number(3, 0)?,
            new_lines: number(4, 1)?,
        })
    }
}
