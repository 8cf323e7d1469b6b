/// Errors that can terminate a bumpcheck run.
///
/// Every variant is terminal: nothing is retried locally. The variant names
/// the stage that failed, and every stage past configuration carries the
/// `owner/repo#number` it was working on. Library crates use this type
/// directly; the binary renders it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::BumpcheckError;
///
/// let err = BumpcheckError::Config("missing GitHub token".into());
/// assert!(err.to_string().contains("missing GitHub token"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BumpcheckError {
    /// Invalid or missing configuration, detected before any network call.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(bumpcheck::config),
        help("check --repo (owner/repo), --pr-number, the GitHub token and --llm-provider (vllm or litellm)")
    )]
    Config(String),

    /// Pull-request metadata or the changed-file list could not be fetched.
    #[error("fetch error: {0}")]
    #[diagnostic(code(bumpcheck::fetch))]
    Fetch(String),

    /// The completion service failed or returned no content.
    #[error("completion error: {0}")]
    #[diagnostic(
        code(bumpcheck::completion),
        help("no comment was posted; check --llm-url and that the model server is reachable")
    )]
    Completion(String),

    /// The analysis comment could not be written.
    #[error("publish error: {0}")]
    #[diagnostic(
        code(bumpcheck::publish),
        help("the analysis for this run is lost; re-run the job once the token can write comments")
    )]
    Publish(String),

    /// The analysis template is malformed.
    #[error("prompt template error: {0}")]
    #[diagnostic(code(bumpcheck::prompt))]
    Prompt(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(bumpcheck::io))]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(bumpcheck::toml))]
    Toml(#[from] toml::de::Error),
}
