use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::BumpcheckError;
use crate::types::PullRequestRef;

/// Optional configuration loaded from `.bumpcheck.toml`.
///
/// The file only supplies fallbacks: flags and environment variables always
/// take precedence (see [`Settings::resolve`]).
///
/// # Examples
///
/// ```
/// use bumpcheck_core::BumpcheckConfig;
///
/// let config = BumpcheckConfig::default();
/// assert!(config.llm.model.is_none());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BumpcheckConfig {
    /// Completion service settings.
    #[serde(default)]
    pub llm: LlmFileConfig,
}

impl BumpcheckConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Io`] if the file cannot be read, or
    /// [`BumpcheckError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bumpcheck_core::BumpcheckConfig;
    /// use std::path::Path;
    ///
    /// let config = BumpcheckConfig::from_file(Path::new(".bumpcheck.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, BumpcheckError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use bumpcheck_core::BumpcheckConfig;
    ///
    /// let toml = r#"
    /// [llm]
    /// provider = "litellm"
    /// model = "qwen3-coder"
    /// "#;
    /// let config = BumpcheckConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.llm.model.as_deref(), Some("qwen3-coder"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, BumpcheckError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// `[llm]` table of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Provider selector (`vllm` or `litellm`).
    pub provider: Option<String>,
    /// Completion service base URL.
    pub base_url: Option<String>,
    /// Completion service API key.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: Option<String>,
}

/// Model used when nothing else names one.
pub const DEFAULT_MODEL: &str = "qwen3";

/// Completion service flavour. The set is closed.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::Provider;
///
/// let provider: Provider = "LiteLLM".parse().unwrap();
/// assert_eq!(provider, Provider::Litellm);
/// assert_eq!(provider.default_base_url(), "http://localhost:4000/v1");
/// assert!("ollama".parse::<Provider>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// A vLLM server addressed directly.
    Vllm,
    /// A LiteLLM proxy.
    Litellm,
}

impl Provider {
    /// Lowercase selector string.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Vllm => "vllm",
            Provider::Litellm => "litellm",
        }
    }

    /// Base URL used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Vllm => "http://localhost:8000/v1",
            Provider::Litellm => "http://localhost:4000/v1",
        }
    }
}

impl FromStr for Provider {
    type Err = BumpcheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vllm" => Ok(Provider::Vllm),
            "litellm" => Ok(Provider::Litellm),
            _ => Err(BumpcheckError::Config(format!(
                "invalid LLM provider '{s}', must be 'vllm' or 'litellm'"
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a completion service base URL so it ends in exactly one `/v1`.
///
/// A trailing `/chat/completions` (with or without a leading `/v1`) is
/// removed first.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://llm:8000"), "http://llm:8000/v1");
/// assert_eq!(normalize_base_url("http://llm:8000/"), "http://llm:8000/v1");
/// assert_eq!(
///     normalize_base_url("http://llm:8000/v1/chat/completions"),
///     "http://llm:8000/v1"
/// );
/// ```
pub fn normalize_base_url(url: &str) -> String {
    let url = url.strip_suffix("/chat/completions").unwrap_or(url);
    let url = url.strip_suffix("/v1/chat/completions").unwrap_or(url);
    if url.ends_with("/v1") {
        url.to_string()
    } else if url.ends_with('/') {
        format!("{url}v1")
    } else {
        format!("{url}/v1")
    }
}

/// Values supplied on the command line, before any fallback is applied.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Repository identifier, `owner/repo`.
    pub repo: String,
    /// Pull request number.
    pub pr_number: u64,
    /// GitHub access token.
    pub github_token: Option<String>,
    /// Completion service base URL.
    pub llm_url: Option<String>,
    /// Completion service API key.
    pub llm_key: Option<String>,
    /// Provider selector.
    pub llm_provider: Option<String>,
    /// Model identifier.
    pub llm_model: Option<String>,
}

/// Resolved completion service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    /// Provider flavour.
    pub provider: Provider,
    /// Normalized base URL, always ending in `/v1`.
    pub base_url: String,
    /// Bearer token, if any.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
}

/// Immutable run configuration, built once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Pull request under analysis.
    pub target: PullRequestRef,
    /// GitHub access token.
    pub github_token: String,
    /// Completion service settings.
    pub llm: LlmSettings,
}

impl Settings {
    /// Resolve settings from flags, an environment lookup and the config file.
    ///
    /// Pure: the environment is only consulted through `env`, so callers
    /// snapshot it once and tests pass a map. Empty strings count as unset.
    /// Per setting, the first value found wins:
    ///
    /// - GitHub token: flag, `GITHUB_TOKEN`, `GH_TOKEN`
    /// - provider: flag, `LLM_PROVIDER`, file, `vllm`
    /// - base URL: flag, `LLM_API_URL`, `VLLM_API_URL`, file, provider default
    /// - API key: flag, `LLM_API_KEY`, `VLLM_API_KEY`, `OPENAI_API_KEY`, file
    /// - model: flag, `LLM_MODEL`, file, [`DEFAULT_MODEL`]
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Config`] for a malformed repository, a zero
    /// PR number, a missing GitHub token or an unknown provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use bumpcheck_core::{BumpcheckConfig, CliOverrides, Provider, Settings};
    ///
    /// let cli = CliOverrides {
    ///     repo: "octo/app".into(),
    ///     pr_number: 3,
    ///     github_token: Some("ghp_test".into()),
    ///     ..CliOverrides::default()
    /// };
    /// let settings = Settings::resolve(&cli, |_| None, &BumpcheckConfig::default()).unwrap();
    /// assert_eq!(settings.llm.provider, Provider::Vllm);
    /// assert_eq!(settings.llm.base_url, "http://localhost:8000/v1");
    /// assert_eq!(settings.llm.model, "qwen3");
    /// ```
    pub fn resolve<F>(
        cli: &CliOverrides,
        env: F,
        file: &BumpcheckConfig,
    ) -> Result<Self, BumpcheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let target = PullRequestRef::parse(&cli.repo, cli.pr_number)?;

        let lookup = |key: &str| non_empty(env(key));

        let github_token = non_empty(cli.github_token.clone())
            .or_else(|| lookup("GITHUB_TOKEN"))
            .or_else(|| lookup("GH_TOKEN"))
            .ok_or_else(|| {
                BumpcheckError::Config(
                    "GitHub token not set. Pass --github-token or set GITHUB_TOKEN".into(),
                )
            })?;

        let provider = match non_empty(cli.llm_provider.clone())
            .or_else(|| lookup("LLM_PROVIDER"))
            .or_else(|| non_empty(file.llm.provider.clone()))
        {
            Some(selector) => selector.parse::<Provider>()?,
            None => Provider::Vllm,
        };

        let base_url = non_empty(cli.llm_url.clone())
            .or_else(|| lookup("LLM_API_URL"))
            .or_else(|| lookup("VLLM_API_URL"))
            .or_else(|| non_empty(file.llm.base_url.clone()))
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let api_key = non_empty(cli.llm_key.clone())
            .or_else(|| lookup("LLM_API_KEY"))
            .or_else(|| lookup("VLLM_API_KEY"))
            .or_else(|| lookup("OPENAI_API_KEY"))
            .or_else(|| non_empty(file.llm.api_key.clone()));

        let model = non_empty(cli.llm_model.clone())
            .or_else(|| lookup("LLM_MODEL"))
            .or_else(|| non_empty(file.llm.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            target,
            github_token,
            llm: LlmSettings {
                provider,
                base_url: normalize_base_url(&base_url),
                api_key,
                model,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cli(repo: &str) -> CliOverrides {
        CliOverrides {
            repo: repo.into(),
            pr_number: 12,
            github_token: Some("ghp_flag".into()),
            ..CliOverrides::default()
        }
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn normalize_strips_chat_completions() {
        assert_eq!(
            normalize_base_url("http://h:8000/v1/chat/completions"),
            "http://h:8000/v1"
        );
        assert_eq!(
            normalize_base_url("http://h:8000/chat/completions"),
            "http://h:8000/v1"
        );
    }

    #[test]
    fn normalize_keeps_existing_v1() {
        assert_eq!(normalize_base_url("http://h:4000/v1"), "http://h:4000/v1");
    }

    #[test]
    fn normalize_appends_v1() {
        assert_eq!(normalize_base_url("http://h:4000"), "http://h:4000/v1");
        assert_eq!(normalize_base_url("http://h:4000/"), "http://h:4000/v1");
        assert_eq!(
            normalize_base_url("https://proxy.internal/llm"),
            "https://proxy.internal/llm/v1"
        );
    }

    #[test]
    fn normalize_does_not_collapse_v1_slash() {
        // Only the exact `/v1` suffix counts; `/v1/` gets another segment.
        assert_eq!(normalize_base_url("http://h/v1/"), "http://h/v1/v1");
    }

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!("VLLM".parse::<Provider>().unwrap(), Provider::Vllm);
        assert_eq!("litellm".parse::<Provider>().unwrap(), Provider::Litellm);
    }

    #[test]
    fn provider_parse_rejects_unknown() {
        let err = "openai".parse::<Provider>().unwrap_err();
        assert!(matches!(err, BumpcheckError::Config(_)));
    }

    #[test]
    fn resolve_defaults() {
        let settings =
            Settings::resolve(&cli("octo/app"), |_| None, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.target.to_string(), "octo/app#12");
        assert_eq!(settings.github_token, "ghp_flag");
        assert_eq!(settings.llm.provider, Provider::Vllm);
        assert_eq!(settings.llm.base_url, "http://localhost:8000/v1");
        assert_eq!(settings.llm.api_key, None);
        assert_eq!(settings.llm.model, DEFAULT_MODEL);
    }

    #[test]
    fn resolve_rejects_invalid_repo_first() {
        let mut overrides = cli("not-a-valid-repo");
        overrides.github_token = None;
        let err =
            Settings::resolve(&overrides, |_| None, &BumpcheckConfig::default()).unwrap_err();
        assert!(err.to_string().contains("not-a-valid-repo"));
    }

    #[test]
    fn resolve_requires_github_token() {
        let mut overrides = cli("octo/app");
        overrides.github_token = None;
        let err =
            Settings::resolve(&overrides, |_| None, &BumpcheckConfig::default()).unwrap_err();
        assert!(matches!(err, BumpcheckError::Config(_)));
    }

    #[test]
    fn resolve_token_from_env_chain() {
        let mut overrides = cli("octo/app");
        overrides.github_token = Some(String::new());
        let env = env_from(&[("GH_TOKEN", "ghp_gh")]);
        let settings = Settings::resolve(&overrides, env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.github_token, "ghp_gh");

        let env = env_from(&[("GITHUB_TOKEN", "ghp_primary"), ("GH_TOKEN", "ghp_gh")]);
        let settings = Settings::resolve(&overrides, env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.github_token, "ghp_primary");
    }

    #[test]
    fn resolve_litellm_default_url() {
        let env = env_from(&[("LLM_PROVIDER", "LiteLLM")]);
        let settings =
            Settings::resolve(&cli("octo/app"), env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.llm.provider, Provider::Litellm);
        assert_eq!(settings.llm.base_url, "http://localhost:4000/v1");
    }

    #[test]
    fn resolve_rejects_unknown_provider() {
        let mut overrides = cli("octo/app");
        overrides.llm_provider = Some("bedrock".into());
        let err =
            Settings::resolve(&overrides, |_| None, &BumpcheckConfig::default()).unwrap_err();
        assert!(err.to_string().contains("bedrock"));
    }

    #[test]
    fn resolve_url_precedence() {
        let env = env_from(&[
            ("LLM_API_URL", "http://primary:1/"),
            ("VLLM_API_URL", "http://legacy:2"),
        ]);
        let settings =
            Settings::resolve(&cli("octo/app"), env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.llm.base_url, "http://primary:1/v1");

        let env = env_from(&[("VLLM_API_URL", "http://legacy:2/v1/chat/completions")]);
        let settings =
            Settings::resolve(&cli("octo/app"), env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.llm.base_url, "http://legacy:2/v1");

        let mut overrides = cli("octo/app");
        overrides.llm_url = Some("http://flag:3".into());
        let env = env_from(&[("LLM_API_URL", "http://primary:1")]);
        let settings = Settings::resolve(&overrides, env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.llm.base_url, "http://flag:3/v1");
    }

    #[test]
    fn resolve_api_key_chain() {
        let env = env_from(&[("VLLM_API_KEY", "legacy"), ("OPENAI_API_KEY", "openai")]);
        let settings =
            Settings::resolve(&cli("octo/app"), env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.llm.api_key.as_deref(), Some("legacy"));

        let env = env_from(&[("OPENAI_API_KEY", "openai")]);
        let settings =
            Settings::resolve(&cli("octo/app"), env, &BumpcheckConfig::default()).unwrap();
        assert_eq!(settings.llm.api_key.as_deref(), Some("openai"));
    }

    #[test]
    fn resolve_file_is_lowest_precedence() {
        let file = BumpcheckConfig::from_toml(
            r#"
[llm]
provider = "litellm"
base_url = "http://file:9"
model = "file-model"
api_key = "file-key"
"#,
        )
        .unwrap();

        let settings = Settings::resolve(&cli("octo/app"), |_| None, &file).unwrap();
        assert_eq!(settings.llm.provider, Provider::Litellm);
        assert_eq!(settings.llm.base_url, "http://file:9/v1");
        assert_eq!(settings.llm.model, "file-model");
        assert_eq!(settings.llm.api_key.as_deref(), Some("file-key"));

        let env = env_from(&[("LLM_MODEL", "env-model"), ("LLM_PROVIDER", "vllm")]);
        let settings = Settings::resolve(&cli("octo/app"), env, &file).unwrap();
        assert_eq!(settings.llm.model, "env-model");
        assert_eq!(settings.llm.provider, Provider::Vllm);
        assert_eq!(settings.llm.base_url, "http://file:9/v1");
    }

    #[test]
    fn config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bumpcheck.toml");
        std::fs::write(&path, "[llm]\nmodel = \"from-disk\"\n").unwrap();
        let config = BumpcheckConfig::from_file(&path).unwrap();
        assert_eq!(config.llm.model.as_deref(), Some("from-disk"));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = BumpcheckConfig::from_toml("").unwrap();
        assert!(config.llm.provider.is_none());
        assert!(config.llm.base_url.is_none());
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = BumpcheckConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(BumpcheckError::Toml(_))));
    }
}
