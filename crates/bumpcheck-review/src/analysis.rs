use bumpcheck_core::{AnalysisResult, BumpcheckError, LlmSettings, Provider};

use crate::llm::{CompletionService, SamplingParams};

/// Marker identifying a comment as an automated analysis.
pub const PROVENANCE_MARKER: &str = "## 🤖 Renovate AI Analysis";

/// Full header line opening every analysis comment.
pub const PROVENANCE_HEADER: &str = "## 🤖 Renovate AI Analysis (Self-Hosted Models)";

/// Fixed sampling for analysis runs: low temperature, bounded output.
pub const ANALYSIS_SAMPLING: SamplingParams = SamplingParams {
    temperature: 0.3,
    max_tokens: 3000,
};

/// Which model produced an analysis, named in the envelope footer.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::Provider;
/// use bumpcheck_review::analysis::Provenance;
///
/// let provenance = Provenance::new(Provider::Vllm, "qwen3");
/// assert!(provenance.wrap("body").ends_with("(vllm/qwen3).*"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Provider flavour.
    pub provider: Provider,
    /// Model identifier.
    pub model: String,
}

impl Provenance {
    /// Create a provenance record.
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Provenance of the model configured in `settings`.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(settings.provider, settings.model.clone())
    }

    /// Wrap `body` in the header/footer envelope.
    pub fn wrap(&self, body: &str) -> String {
        format!(
            "{PROVENANCE_HEADER}\n\n{body}\n\n---\n*This analysis was automatically generated by \
             bumpcheck using self-hosted models ({}/{}).*",
            self.provider, self.model
        )
    }
}

/// Drives the single completion call of a run.
pub struct Analyzer<'a> {
    completion: &'a dyn CompletionService,
    provenance: Provenance,
}

impl<'a> Analyzer<'a> {
    /// Create an analyzer over a completion service.
    pub fn new(completion: &'a dyn CompletionService, provenance: Provenance) -> Self {
        Self {
            completion,
            provenance,
        }
    }

    /// Submit `prompt` once and wrap the completion in the provenance envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Completion`] if the service fails. There is
    /// no retry at this layer.
    pub async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, BumpcheckError> {
        tracing::info!(
            provider = %self.provenance.provider,
            model = %self.provenance.model,
            prompt_chars = prompt.chars().count(),
            "running AI analysis"
        );
        let completion = self.completion.complete(prompt, ANALYSIS_SAMPLING).await?;
        Ok(AnalysisResult {
            body: self.provenance.wrap(&completion),
        })
    }
}
