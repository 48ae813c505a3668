use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One pull request, addressed the way CI hands it to us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestRef {
    /// "owner/repo"
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(repo: impl Into<String>, number: u64) -> Self {
        Self {
            repo: repo.into(),
            number,
        }
    }
}

/// A changed file as listed by the pulls/files endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullFile {
    pub filename: String,
    pub patch: Option<String>,
}

/// A changed file with its head-revision content and the added lines
/// extracted from the patch, keyed by new-file line number.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: String,
    pub content: String,
    pub changed_lines: BTreeMap<u64, String>,
    pub line_numbers: Vec<u64>,
}

/// One parsed ISSUE/LINE/SUGGESTION block of model feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFinding {
    pub issue: String,
    pub line: u64,
    pub suggestion: Option<String>,
}

/// A review comment ready to send to the reviews API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DraftComment {
    pub path: String,
    pub line: u64,
    pub body: String,
}

/// Result of the analysis phase.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub comments: Vec<DraftComment>,
    pub files_reviewed: usize,
    pub files_skipped: usize,
}

/// Run summary returned by the engine.
#[derive(Debug, Clone, Default)]
pub struct ReviewOutcome {
    pub files_reviewed: usize,
    pub files_skipped: usize,
    pub comments_posted: usize,
}

/// An existing review comment on a PR, as needed by the resolve flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingComment {
    pub id: u64,
    pub author: String,
}
