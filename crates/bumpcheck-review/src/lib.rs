//! Analysis orchestration for dependency-update pull requests.
//!
//! Provides prompt assembly, the completion client, the analysis
//! orchestrator, comment publication, GitHub integration, and the
//! pipeline that drives them in order.

pub mod analysis;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod publish;
