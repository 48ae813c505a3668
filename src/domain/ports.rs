use crate::domain::model::{
    AnalysisResult, ChangedFile, DraftComment, ExistingComment, PullFile, PullRequestRef,
    ReviewOutcome,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Everything the bot needs from the code-hosting platform.
#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn list_changed_files(&self, pr: &PullRequestRef) -> Result<Vec<PullFile>>;
    async fn head_sha(&self, pr: &PullRequestRef) -> Result<String>;
    async fn file_content(&self, repo: &str, path: &str, git_ref: &str) -> Result<String>;
    async fn latest_commit_sha(&self, pr: &PullRequestRef) -> Result<String>;
    async fn post_review(
        &self,
        pr: &PullRequestRef,
        commit_sha: &str,
        comments: &[DraftComment],
    ) -> Result<()>;
    async fn approve(&self, pr: &PullRequestRef, body: &str) -> Result<()>;
    async fn list_review_comments(&self, pr: &PullRequestRef) -> Result<Vec<ExistingComment>>;
    async fn resolve_review_comment(&self, repo: &str, comment_id: u64) -> Result<()>;
    async fn authenticated_login(&self) -> Result<String>;
}

/// The LLM backend: a prompt in, review feedback text out.
pub trait Analyzer: Send + Sync {
    fn generate(&self, prompt: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn pull_request(&self) -> &PullRequestRef;
    fn skip_extensions(&self) -> &[String];
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ChangedFile>>;
    async fn analyze(&self, files: Vec<ChangedFile>) -> Result<AnalysisResult>;
    async fn publish(&self, result: AnalysisResult) -> Result<ReviewOutcome>;
}
