use async_trait::async_trait;
use bumpcheck_core::{BumpcheckError, ChangedFile, PullRequestRef, PullRequestSummary};
use serde::{Deserialize, Serialize};

/// Read-only access to pull-request metadata and changed files.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Fetch the title and description of a pull request.
    async fn pull_request(
        &self,
        target: &PullRequestRef,
    ) -> Result<PullRequestSummary, BumpcheckError>;

    /// Fetch the changed files of a pull request, in host order.
    async fn changed_files(
        &self,
        target: &PullRequestRef,
    ) -> Result<Vec<ChangedFile>, BumpcheckError>;
}

/// Write access to a pull request's comment thread.
#[async_trait]
pub trait CommentSink: Send + Sync {
    /// Create a new comment on the pull request.
    async fn create_comment(
        &self,
        target: &PullRequestRef,
        body: &str,
    ) -> Result<(), BumpcheckError>;
}

/// Files returned by the single changed-files request.
const FILES_PER_PAGE: u8 = 100;

#[derive(Deserialize)]
struct PullRequestPayload {
    title: Option<String>,
    body: Option<String>,
}

#[derive(Deserialize)]
struct FilePayload {
    filename: String,
    patch: Option<String>,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
}

/// GitHub client for reading pull requests and posting analysis comments.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
}

impl GitHubClient {
    /// Create a client authenticated with a personal or workflow token.
    ///
    /// # Errors
    ///
    /// Returns [`BumpcheckError::Config`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bumpcheck_review::github::GitHubClient;
    ///
    /// let client = GitHubClient::new("ghp_xxxx").unwrap();
    /// ```
    pub fn new(token: &str) -> Result<Self, BumpcheckError> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| BumpcheckError::Config(format!("failed to create GitHub client: {e}")))?;
        Ok(Self { octocrab })
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn pull_request(
        &self,
        target: &PullRequestRef,
    ) -> Result<PullRequestSummary, BumpcheckError> {
        let route = format!(
            "/repos/{}/{}/pulls/{}",
            target.owner, target.repo, target.number
        );
        let payload: PullRequestPayload = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| {
                BumpcheckError::Fetch(format!("{target}: failed to get PR: {e}"))
            })?;

        Ok(PullRequestSummary {
            title: payload.title,
            description: payload.body,
        })
    }

    async fn changed_files(
        &self,
        target: &PullRequestRef,
    ) -> Result<Vec<ChangedFile>, BumpcheckError> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/files",
            target.owner, target.repo, target.number
        );
        let params = PageParams {
            per_page: FILES_PER_PAGE,
        };
        let files: Vec<FilePayload> = self
            .octocrab
            .get(route, Some(&params))
            .await
            .map_err(|e| {
                BumpcheckError::Fetch(format!("{target}: failed to get PR files: {e}"))
            })?;

        Ok(files
            .into_iter()
            .map(|f| ChangedFile::new(f.filename, f.patch))
            .collect())
    }
}

#[async_trait]
impl CommentSink for GitHubClient {
    async fn create_comment(
        &self,
        target: &PullRequestRef,
        body: &str,
    ) -> Result<(), BumpcheckError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/comments",
            target.owner, target.repo, target.number
        );
        let request = serde_json::json!({ "body": body });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&request))
            .await
            .map_err(|e| {
                BumpcheckError::Publish(format!("{target}: failed to post comment: {e}"))
            })?;

        Ok(())
    }
}
