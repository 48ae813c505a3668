use crate::domain::model::PullRequestRef;
use crate::domain::ports::CodeHost;
use crate::utils::error::Result;

/// Resolve every review comment the bot itself authored on the PR, then
/// approve it. Individual resolve failures are logged and do not abort the
/// sweep; only successfully resolved comments are counted.
pub async fn resolve_bot_comments<H: CodeHost>(host: &H, pr: &PullRequestRef) -> Result<usize> {
    let login = host.authenticated_login().await?;
    tracing::debug!("Resolving comments authored by {}", login);

    let comments = host.list_review_comments(pr).await?;

    let mut resolved = 0;
    for comment in comments {
        if comment.author != login {
            continue;
        }

        match host.resolve_review_comment(&pr.repo, comment.id).await {
            Ok(()) => resolved += 1,
            Err(e) => {
                tracing::warn!("Failed to resolve comment {}: {}", comment.id, e);
            }
        }
    }

    host.approve(pr, "All bot comments resolved.").await?;

    Ok(resolved)
}
