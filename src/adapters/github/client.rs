use crate::config::ApiSettings;
use crate::domain::model::{DraftComment, ExistingComment, PullFile, PullRequestRef};
use crate::domain::ports::CodeHost;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Method};
use serde_json::json;
use std::time::Duration;

use super::{app_auth::AppAuth, USER_AGENT};

/// GitHub REST adapter authenticating as a GitHub App installation.
pub struct GitHubClient {
    http: Client,
    api_base: String,
    auth: AppAuth,
    installation_id: String,
    max_retries: u32,
}

impl GitHubClient {
    pub fn new(
        api: &ApiSettings,
        app_id: &str,
        private_key_pem: &str,
        installation_id: &str,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds.max(1)))
            .build()?;

        Ok(Self {
            http,
            api_base: api.github_base_url.trim_end_matches('/').to_string(),
            auth: AppAuth::new(app_id, private_key_pem)?,
            installation_id: installation_id.to_string(),
            max_retries: api.ratelimit_retries,
        })
    }

    async fn token(&self) -> Result<String> {
        self.auth
            .installation_token(&self.http, &self.api_base, &self.installation_id)
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Send one request, retrying on HTTP 429 with exponential backoff and
    /// honouring `Retry-After` when the server provides it.
    async fn request_with_retry(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self.token().await?;

        for attempt in 0..=self.max_retries {
            let mut request = self
                .http
                .request(method.clone(), url)
                .bearer_auth(&token)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", USER_AGENT);

            if let Some(b) = body {
                request = request.json(b);
            }

            let response = request.send().await?;

            if response.status().as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2u64.pow(attempt + 1));

                if attempt < self.max_retries {
                    tracing::warn!(
                        "GitHub rate limited (attempt {}/{}), retrying in {}s",
                        attempt + 1,
                        self.max_retries,
                        retry_after
                    );
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }

                return Err(BotError::GitHubError {
                    status: 429,
                    message: "rate limit retries exhausted".to_string(),
                });
            }

            return Ok(response);
        }

        Err(BotError::GitHubError {
            status: 429,
            message: "rate limit retries exhausted".to_string(),
        })
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::GitHubError {
                status,
                message: truncate_body(&body, 300),
            });
        }
        Ok(response)
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let response = self
            .request_with_retry(Method::GET, &self.url(path), None)
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Paginated GET collecting all pages of JSON arrays by following the
    /// `Link: <url>; rel="next"` header.
    async fn get_all_pages(&self, path: &str) -> Result<Vec<serde_json::Value>> {
        let mut items = Vec::new();

        let response = self
            .request_with_retry(Method::GET, &self.url(path), None)
            .await?;
        let response = Self::check_response(response).await?;
        let mut next_url = parse_next_link(response.headers());
        let page: serde_json::Value = response.json().await?;
        if let Some(arr) = page.as_array() {
            items.extend(arr.iter().cloned());
        }

        while let Some(url) = next_url.take() {
            let response = self.request_with_retry(Method::GET, &url, None).await?;
            let response = Self::check_response(response).await?;
            next_url = parse_next_link(response.headers());
            let page: serde_json::Value = response.json().await?;
            if let Some(arr) = page.as_array() {
                items.extend(arr.iter().cloned());
            }
        }

        Ok(items)
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .request_with_retry(Method::POST, &self.url(path), Some(body))
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn list_changed_files(&self, pr: &PullRequestRef) -> Result<Vec<PullFile>> {
        let path = format!("repos/{}/pulls/{}/files?per_page=100", pr.repo, pr.number);
        let items = self.get_all_pages(&path).await?;

        let files = items
            .iter()
            .filter_map(|item| {
                item["filename"].as_str().map(|filename| PullFile {
                    filename: filename.to_string(),
                    patch: item["patch"].as_str().map(String::from),
                })
            })
            .collect();

        Ok(files)
    }

    async fn head_sha(&self, pr: &PullRequestRef) -> Result<String> {
        let data = self
            .get_json(&format!("repos/{}/pulls/{}", pr.repo, pr.number))
            .await?;

        data["head"]["sha"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| BotError::ProcessingError {
                message: format!("pull request {}#{} has no head sha", pr.repo, pr.number),
            })
    }

    async fn file_content(&self, repo: &str, path: &str, git_ref: &str) -> Result<String> {
        let api_path = format!("repos/{}/contents/{}?ref={}", repo, path, git_ref);
        let data = self.get_json(&api_path).await?;

        let raw = data["content"].as_str().unwrap_or_default().replace('\n', "");
        let encoding = data["encoding"].as_str().unwrap_or("");

        if encoding == "base64" {
            let bytes = base64::engine::general_purpose::STANDARD.decode(&raw)?;
            String::from_utf8(bytes).map_err(|_| BotError::ProcessingError {
                message: format!("file {} is not valid UTF-8", path),
            })
        } else {
            Ok(raw)
        }
    }

    async fn latest_commit_sha(&self, pr: &PullRequestRef) -> Result<String> {
        let path = format!("repos/{}/pulls/{}/commits?per_page=100", pr.repo, pr.number);
        let commits = self.get_all_pages(&path).await?;

        commits
            .last()
            .and_then(|c| c["sha"].as_str())
            .map(String::from)
            .ok_or_else(|| BotError::ProcessingError {
                message: format!("pull request {}#{} has no commits", pr.repo, pr.number),
            })
    }

    async fn post_review(
        &self,
        pr: &PullRequestRef,
        commit_sha: &str,
        comments: &[DraftComment],
    ) -> Result<()> {
        let review_comments: Vec<serde_json::Value> = comments
            .iter()
            .map(|c| {
                json!({
                    "path": c.path,
                    "line": c.line,
                    "body": c.body,
                })
            })
            .collect();

        let body = json!({
            "commit_id": commit_sha,
            "event": "COMMENT",
            "comments": review_comments,
        });

        self.post_json(
            &format!("repos/{}/pulls/{}/reviews", pr.repo, pr.number),
            &body,
        )
        .await?;
        Ok(())
    }

    async fn approve(&self, pr: &PullRequestRef, body: &str) -> Result<()> {
        let payload = json!({
            "body": body,
            "event": "APPROVE",
        });

        self.post_json(
            &format!("repos/{}/pulls/{}/reviews", pr.repo, pr.number),
            &payload,
        )
        .await?;
        Ok(())
    }

    async fn list_review_comments(&self, pr: &PullRequestRef) -> Result<Vec<ExistingComment>> {
        let path = format!("repos/{}/pulls/{}/comments?per_page=100", pr.repo, pr.number);
        let items = self.get_all_pages(&path).await?;

        let comments = items
            .iter()
            .filter_map(|item| {
                Some(ExistingComment {
                    id: item["id"].as_u64()?,
                    author: item["user"]["login"].as_str().unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(comments)
    }

    async fn resolve_review_comment(&self, repo: &str, comment_id: u64) -> Result<()> {
        let path = format!("repos/{}/pulls/comments/{}/resolve", repo, comment_id);
        let response = self
            .request_with_retry(Method::POST, &self.url(&path), None)
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn authenticated_login(&self) -> Result<String> {
        let data = self.get_json("user").await?;
        Ok(data["login"].as_str().unwrap_or_default().to_string())
    }
}

/// Parse the `Link` header to find the `rel="next"` URL.
fn parse_next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let link = headers.get("link")?.to_str().ok()?;
    for part in link.split(',') {
        let part = part.trim();
        if part.contains(r#"rel="next""#) {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            return Some(part[start..end].to_string());
        }
    }
    None
}

fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        body.chars().take(max_chars).collect()
    }
}
