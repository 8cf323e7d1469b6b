//! Core types, configuration, and error handling for bumpcheck.
//!
//! - [`BumpcheckError`]: the terminal error kinds of a run
//! - [`Settings`]: immutable run configuration resolved from flags,
//!   environment and `.bumpcheck.toml`
//! - Shared pipeline types: [`ChangedFile`], [`FileDiff`],
//!   [`PullRequestSummary`], [`AnalysisResult`], [`PullRequestRef`]

mod config;
mod error;
pub mod telemetry;
mod types;

pub use config::{
    normalize_base_url, BumpcheckConfig, CliOverrides, LlmFileConfig, LlmSettings, Provider,
    Settings, DEFAULT_MODEL,
};
pub use error::BumpcheckError;
pub use types::{AnalysisResult, ChangedFile, FileDiff, PullRequestRef, PullRequestSummary};

/// A convenience `Result` type for bumpcheck operations.
pub type Result<T> = std::result::Result<T, BumpcheckError>;
