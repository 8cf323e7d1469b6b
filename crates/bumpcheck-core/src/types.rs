use std::fmt;

use crate::error::BumpcheckError;

/// A file touched by a pull request, as reported by the source-control host.
///
/// `patch` is `None` when the host could not produce a textual diff
/// (binary files, very large files). Such files are never analyzed.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::ChangedFile;
///
/// let file = ChangedFile::new("go.mod", Some("-v1\n+v2".into()));
/// assert_eq!(file.name, "go.mod");
/// assert!(file.patch.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Repository-relative path.
    pub name: String,
    /// Unified diff hunk text, if available.
    pub patch: Option<String>,
}

impl ChangedFile {
    /// Create a changed file entry.
    pub fn new(name: impl Into<String>, patch: Option<String>) -> Self {
        Self {
            name: name.into(),
            patch,
        }
    }
}

/// A retained dependency file with its (possibly truncated) diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Repository-relative path.
    pub file_name: String,
    /// Diff text, bounded by the collector.
    pub diff_text: String,
}

/// Pull-request metadata used only as prompt context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestSummary {
    /// PR title.
    pub title: Option<String>,
    /// PR body.
    pub description: Option<String>,
}

/// Formatted analysis text, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Markdown comment body, provenance envelope included.
    pub body: String,
}

/// A validated pull request target: `owner/repo` plus a PR number.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::PullRequestRef;
///
/// let target = PullRequestRef::parse("renovatebot/renovate", 42).unwrap();
/// assert_eq!(target.owner, "renovatebot");
/// assert_eq!(target.repo, "renovate");
/// assert_eq!(target.to_string(), "renovatebot/renovate#42");
///
/// assert!(PullRequestRef::parse("not-a-valid-repo", 42).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub number: u64,
}

impl PullRequestRef {
    /// Validate a repository identifier and PR number.
    ///
    /// The identifier must split on `/` into exactly two non-empty segments,
    /// and the number must be positive.
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Config`] if either value is malformed.
    pub fn parse(repository: &str, number: u64) -> Result<Self, BumpcheckError> {
        let parts: Vec<&str> = repository.split('/').collect();
        let [owner, repo] = parts.as_slice() else {
            return Err(BumpcheckError::Config(format!(
                "invalid repo format: '{repository}' (expected owner/repo)"
            )));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(BumpcheckError::Config(format!(
                "invalid repo format: '{repository}' (expected owner/repo)"
            )));
        }
        if number == 0 {
            return Err(BumpcheckError::Config(
                "invalid PR number: 0 (expected a positive integer)".into(),
            ));
        }
        Ok(Self {
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
            number,
        })
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}
