use bumpcheck_core::{AnalysisResult, BumpcheckError, PullRequestRef};

use crate::analysis::{Provenance, PROVENANCE_MARKER};
use crate::github::CommentSink;

/// Final comment body for an analysis.
///
/// Text that already carries the provenance marker is returned unchanged;
/// anything else is wrapped once. Applying it twice equals applying it once.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::Provider;
/// use bumpcheck_review::analysis::Provenance;
/// use bumpcheck_review::publish::format_comment;
///
/// let provenance = Provenance::new(Provider::Vllm, "qwen3");
/// let once = format_comment("plain text", &provenance);
/// assert_eq!(format_comment(&once, &provenance), once);
/// ```
pub fn format_comment(text: &str, provenance: &Provenance) -> String {
    if text.contains(PROVENANCE_MARKER) {
        text.to_string()
    } else {
        provenance.wrap(text)
    }
}

/// Posts one analysis comment per invocation.
///
/// Every call creates a new comment; an earlier comment on the same pull
/// request is neither searched for nor updated.
pub struct CommentPublisher<'a> {
    sink: &'a dyn CommentSink,
    provenance: Provenance,
}

impl<'a> CommentPublisher<'a> {
    /// Create a publisher writing to `sink`.
    pub fn new(sink: &'a dyn CommentSink, provenance: Provenance) -> Self {
        Self { sink, provenance }
    }

    /// Format and post the analysis.
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Publish`] if the write fails.
    pub async fn publish(
        &self,
        target: &PullRequestRef,
        analysis: &AnalysisResult,
    ) -> Result<(), BumpcheckError> {
        let body = format_comment(&analysis.body, &self.provenance);
        self.sink.create_comment(target, &body).await?;
        tracing::info!(pr = %target, "posted analysis comment");
        Ok(())
    }
}
