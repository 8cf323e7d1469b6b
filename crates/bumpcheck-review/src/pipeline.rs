use std::fmt;

use bumpcheck_core::{BumpcheckError, PullRequestRef};
use bumpcheck_difflens::collect::collect;

use crate::analysis::{Analyzer, Provenance};
use crate::github::{CommentSink, PullRequestSource};
use crate::llm::CompletionService;
use crate::prompt;
use crate::publish::CommentPublisher;

/// How a run ended successfully.
///
/// # Examples
///
/// ```
/// use bumpcheck_review::pipeline::RunOutcome;
///
/// let outcome = RunOutcome::Skipped { files_seen: 2 };
/// assert!(!outcome.posted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No dependency file changed; nothing was analyzed or posted.
    Skipped {
        /// Changed files inspected.
        files_seen: usize,
    },
    /// An analysis comment was posted.
    Posted {
        /// Changed files inspected.
        files_seen: usize,
        /// Dependency files included in the analysis.
        dependency_files: usize,
    },
}

impl RunOutcome {
    /// `true` if a comment was created.
    pub fn posted(&self) -> bool {
        matches!(self, RunOutcome::Posted { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Skipped { files_seen } => write!(
                f,
                "no dependency files among {files_seen} changed file(s), analysis skipped"
            ),
            RunOutcome::Posted {
                files_seen,
                dependency_files,
            } => write!(
                f,
                "posted analysis of {dependency_files} dependency file(s) ({files_seen} changed)"
            ),
        }
    }
}

/// Sequential fetch, collect, assemble, analyze and publish for one PR.
///
/// Any stage error aborts the rest. The only side effect, the comment, is
/// the last step, so an aborted run leaves nothing behind.
pub struct AnalysisPipeline<'a> {
    source: &'a dyn PullRequestSource,
    completion: &'a dyn CompletionService,
    sink: &'a dyn CommentSink,
    provenance: Provenance,
}

impl<'a> AnalysisPipeline<'a> {
    /// Create a pipeline over its three collaborators.
    pub fn new(
        source: &'a dyn PullRequestSource,
        completion: &'a dyn CompletionService,
        sink: &'a dyn CommentSink,
        provenance: Provenance,
    ) -> Self {
        Self {
            source,
            completion,
            sink,
            provenance,
        }
    }

    /// Run the pipeline against `target`.
    ///
    /// # Errors
    ///
    /// Returns the first [`BumpcheckError`] raised by any stage.
    pub async fn run(&self, target: &PullRequestRef) -> Result<RunOutcome, BumpcheckError> {
        tracing::info!(pr = %target, "analyzing pull request");

        let summary = self.source.pull_request(target).await?;
        let files = self.source.changed_files(target).await?;

        let collected = collect(&files);
        if collected.is_empty() {
            tracing::info!("no dependency file changes detected, skipping analysis");
            return Ok(RunOutcome::Skipped {
                files_seen: collected.files_seen,
            });
        }
        tracing::info!(
            dependency_files = collected.diffs.len(),
            "found {} file(s) with changes",
            collected.diffs.len()
        );

        let request = prompt::assemble(&summary, &collected.diffs)
            .map_err(|e| with_target(target, e))?;

        let analyzer = Analyzer::new(self.completion, self.provenance.clone());
        let analysis = analyzer
            .analyze(&request)
            .await
            .map_err(|e| with_target(target, e))?;

        let publisher = CommentPublisher::new(self.sink, self.provenance.clone());
        publisher.publish(target, &analysis).await?;

        Ok(RunOutcome::Posted {
            files_seen: collected.files_seen,
            dependency_files: collected.diffs.len(),
        })
    }
}

/// Prefix stage errors that do not already name the pull request.
fn with_target(target: &PullRequestRef, err: BumpcheckError) -> BumpcheckError {
    match err {
        BumpcheckError::Completion(msg) => BumpcheckError::Completion(format!("{target}: {msg}")),
        BumpcheckError::Prompt(msg) => BumpcheckError::Prompt(format!("{target}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_display() {
        let skipped = RunOutcome::Skipped { files_seen: 3 };
        assert!(skipped.to_string().contains("skipped"));

        let posted = RunOutcome::Posted {
            files_seen: 4,
            dependency_files: 2,
        };
        assert!(posted.posted());
        assert!(posted.to_string().contains("2 dependency file(s)"));
    }

    #[test]
    fn completion_and_prompt_errors_name_the_target() {
        let target = PullRequestRef::parse("octo/app", 17).unwrap();

        let err = with_target(&target, BumpcheckError::Completion("timed out".into()));
        assert_eq!(err.to_string(), "completion error: octo/app#17: timed out");

        let err = with_target(&target, BumpcheckError::Prompt("bad template".into()));
        assert!(err.to_string().contains("octo/app#17"));

        let err = with_target(&target, BumpcheckError::Fetch("octo/app#17: 404".into()));
        assert_eq!(err.to_string().matches("octo/app#17").count(), 1);
    }
}
