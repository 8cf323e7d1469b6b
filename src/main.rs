use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::Level;

use bumpcheck_core::{BumpcheckConfig, BumpcheckError, CliOverrides, Settings};
use bumpcheck_review::analysis::Provenance;
use bumpcheck_review::github::GitHubClient;
use bumpcheck_review::llm::{CompletionService, LlmClient, SamplingParams};
use bumpcheck_review::pipeline::AnalysisPipeline;

#[derive(Parser)]
#[command(
    name = "bumpcheck",
    version,
    about = "AI breaking-change analysis for dependency-update pull requests",
    long_about = "Analyzes the dependency manifests changed by an automated update PR\n\
                   (Renovate, Dependabot) with a self-hosted model and posts the result\n\
                   as a PR comment.\n\n\
                   Examples:\n  \
                     bumpcheck --repo owner/repo --pr-number 42\n  \
                     bumpcheck --repo owner/repo --pr-number 42 --llm-provider litellm\n  \
                     LLM_API_URL=http://vllm:8000 bumpcheck --repo owner/repo --pr-number 42"
)]
struct Cli {
    /// Repository name (owner/repo)
    #[arg(long)]
    repo: String,

    /// Pull request number
    #[arg(long)]
    pr_number: u64,

    /// GitHub token (falls back to GITHUB_TOKEN, then GH_TOKEN)
    #[arg(long)]
    github_token: Option<String>,

    /// LLM API base URL
    #[arg(
        long,
        long_help = "LLM API base URL.\n\n\
            Falls back to LLM_API_URL, then VLLM_API_URL, then the config file.\n\
            Defaults to http://localhost:8000/v1 for vllm and\n\
            http://localhost:4000/v1 for litellm. A trailing /chat/completions\n\
            is removed and /v1 is appended when missing."
    )]
    llm_url: Option<String>,

    /// LLM API key (falls back to LLM_API_KEY, VLLM_API_KEY, OPENAI_API_KEY)
    #[arg(long)]
    llm_key: Option<String>,

    /// LLM provider: 'vllm' (direct) or 'litellm' (proxy)
    #[arg(long)]
    llm_provider: Option<String>,

    /// Model name (falls back to LLM_MODEL, default: qwen3)
    #[arg(long)]
    llm_model: Option<String>,

    /// Path to configuration file (default: .bumpcheck.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            repo: self.repo.clone(),
            pr_number: self.pr_number,
            github_token: self.github_token.clone(),
            llm_url: self.llm_url.clone(),
            llm_key: self.llm_key.clone(),
            llm_provider: self.llm_provider.clone(),
            llm_model: self.llm_model.clone(),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<BumpcheckConfig, BumpcheckError> {
    match path {
        Some(path) => BumpcheckConfig::from_file(path),
        None => {
            let default_path = std::path::Path::new(".bumpcheck.toml");
            if default_path.exists() {
                BumpcheckConfig::from_file(default_path)
            } else {
                Ok(BumpcheckConfig::default())
            }
        }
    }
}

/// Shows a spinner on a terminal while the wrapped service is working.
struct WithSpinner<'a> {
    inner: &'a dyn CompletionService,
    message: String,
}

#[async_trait]
impl CompletionService for WithSpinner<'_> {
    async fn complete(
        &self,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, BumpcheckError> {
        if !std::io::stderr().is_terminal() {
            return self.inner.complete(prompt, params).await;
        }

        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
        );
        pb.set_message(self.message.clone());
        pb.enable_steady_tick(Duration::from_millis(100));

        let result = self.inner.complete(prompt, params).await;
        pb.finish_and_clear();
        result
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    bumpcheck_core::telemetry::init_tracing(cli.json, level);

    let config = load_config(cli.config.as_ref())?;
    let settings = Settings::resolve(&cli.overrides(), |key| std::env::var(key).ok(), &config)?;

    tracing::debug!(
        provider = %settings.llm.provider,
        base_url = %settings.llm.base_url,
        model = %settings.llm.model,
        "resolved completion settings"
    );

    let github = GitHubClient::new(&settings.github_token)?;
    let llm = LlmClient::new(&settings.llm)?;
    let completion = WithSpinner {
        inner: &llm,
        message: format!("Waiting for {} ({})", llm.model(), settings.llm.provider),
    };

    let pipeline = AnalysisPipeline::new(
        &github,
        &completion,
        &github,
        Provenance::from_settings(&settings.llm),
    );
    let outcome = pipeline.run(&settings.target).await?;

    tracing::info!(pr = %settings.target, "{outcome}");
    Ok(())
}
