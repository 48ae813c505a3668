use crate::core::feedback::{parse_feedback, render_comment};
use crate::core::patch::extract_changed_lines;
use crate::domain::model::{AnalysisResult, ChangedFile, DraftComment, ReviewOutcome};
use crate::domain::ports::{Analyzer, CodeHost, ConfigProvider, Pipeline};
use crate::utils::error::Result;
use std::path::Path;

/// The review pipeline: fetch the PR's changed files, run each one through
/// the analyzer, and publish the surviving comments as reviews.
pub struct ReviewPipeline<H: CodeHost, A: Analyzer, C: ConfigProvider> {
    host: H,
    analyzer: A,
    config: C,
}

impl<H: CodeHost, A: Analyzer, C: ConfigProvider> ReviewPipeline<H, A, C> {
    pub fn new(host: H, analyzer: A, config: C) -> Self {
        Self {
            host,
            analyzer,
            config,
        }
    }

    fn is_skipped_extension(&self, path: &str) -> bool {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        self.config
            .skip_extensions()
            .iter()
            .any(|skip| skip == extension)
    }
}

#[async_trait::async_trait]
impl<H: CodeHost, A: Analyzer, C: ConfigProvider> Pipeline for ReviewPipeline<H, A, C> {
    async fn fetch(&self) -> Result<Vec<ChangedFile>> {
        let pr = self.config.pull_request();

        let files = self.host.list_changed_files(pr).await?;
        tracing::debug!("Pull request lists {} changed file(s)", files.len());

        let head = self.host.head_sha(pr).await?;

        let mut changed = Vec::new();
        for file in files {
            if self.is_skipped_extension(&file.filename) {
                tracing::debug!("Skipping {} (excluded extension)", file.filename);
                continue;
            }

            let Some(patch) = file.patch else {
                tracing::info!("No patch available for file {}. Skipping...", file.filename);
                continue;
            };

            let (changed_lines, line_numbers) = extract_changed_lines(&patch);
            if line_numbers.is_empty() {
                tracing::debug!("No added lines in {}, skipping", file.filename);
                continue;
            }

            // 取得 head 版本的完整檔案內容
            match self.host.file_content(&pr.repo, &file.filename, &head).await {
                Ok(content) => changed.push(ChangedFile {
                    path: file.filename,
                    content,
                    changed_lines,
                    line_numbers,
                }),
                Err(e) => {
                    tracing::warn!("Error reading file {}: {}", file.filename, e);
                    continue;
                }
            }
        }

        Ok(changed)
    }

    async fn analyze(&self, files: Vec<ChangedFile>) -> Result<AnalysisResult> {
        let mut comments = Vec::new();
        let mut files_reviewed = 0;
        let mut files_skipped = 0;

        for file in files {
            let prompt = build_review_prompt(&file);

            let feedback = match self.analyzer.generate(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Analysis failed for {}: {}. Skipping...", file.path, e);
                    files_skipped += 1;
                    continue;
                }
            };

            let findings = parse_feedback(&feedback, &file.line_numbers);
            tracing::debug!("{} finding(s) in {}", findings.len(), file.path);

            for finding in &findings {
                comments.push(DraftComment {
                    path: file.path.clone(),
                    line: finding.line,
                    body: render_comment(finding),
                });
            }
            files_reviewed += 1;
        }

        Ok(AnalysisResult {
            comments,
            files_reviewed,
            files_skipped,
        })
    }

    async fn publish(&self, result: AnalysisResult) -> Result<ReviewOutcome> {
        let outcome = ReviewOutcome {
            files_reviewed: result.files_reviewed,
            files_skipped: result.files_skipped,
            comments_posted: result.comments.len(),
        };

        if result.comments.is_empty() {
            tracing::info!("No review comments to post");
            return Ok(outcome);
        }

        let pr = self.config.pull_request();
        let commit_sha = self.host.latest_commit_sha(pr).await?;

        // 每個檔案發佈一則 review
        let mut grouped: Vec<(String, Vec<DraftComment>)> = Vec::new();
        for comment in result.comments {
            match grouped.iter_mut().find(|(path, _)| *path == comment.path) {
                Some((_, batch)) => batch.push(comment),
                None => grouped.push((comment.path.clone(), vec![comment])),
            }
        }

        for (path, batch) in &grouped {
            tracing::debug!("Posting {} comment(s) on {}", batch.len(), path);
            self.host.post_review(pr, &commit_sha, batch).await?;
        }

        Ok(outcome)
    }
}

/// Build the analysis prompt for one changed file.
fn build_review_prompt(file: &ChangedFile) -> String {
    let extension = Path::new(&file.path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let changed_lines_formatted = file
        .changed_lines
        .iter()
        .map(|(number, text)| format!("Line {}: {}", number, text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a senior developer reviewing code changes in a {extension} file.\n\
         Review the following changes and provide specific, actionable feedback.\n\
         Focus on:\n\
         - Code quality and best practices\n\
         - Potential bugs or security issues\n\
         - Performance improvements\n\
         - Readability and maintainability\n\
         \n\
         File: {path}\n\
         \n\
         Changed lines (with line numbers):\n\
         ```\n\
         {changed}\n\
         ```\n\
         \n\
         Full context:\n\
         ```{extension}\n\
         {content}\n\
         ```\n\
         \n\
         Provide each piece of feedback in the following format:\n\
         ISSUE: [Brief description of the issue]\n\
         LINE: [Specific line number where the issue occurs]\n\
         SUGGESTION: [Specific suggestion for improvement]\n\
         ---\n\
         \n\
         Always use a LINE number from the changed lines listed above.\n\
         Prefix concrete improvements with '+' and problematic patterns with '-'.",
        extension = extension,
        path = file.path,
        changed = changed_lines_formatted,
        content = file.content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ExistingComment, PullFile, PullRequestRef};
    use crate::utils::error::BotError;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct MockHost {
        files: Vec<PullFile>,
        contents: HashMap<String, String>,
        posted_reviews: Arc<Mutex<Vec<(String, Vec<DraftComment>)>>>,
    }

    impl MockHost {
        fn new(files: Vec<PullFile>, contents: &[(&str, &str)]) -> Self {
            Self {
                files,
                contents: contents
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                posted_reviews: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait::async_trait]
    impl CodeHost for MockHost {
        async fn list_changed_files(&self, _pr: &PullRequestRef) -> Result<Vec<PullFile>> {
            Ok(self.files.clone())
        }

        async fn head_sha(&self, _pr: &PullRequestRef) -> Result<String> {
            Ok("headsha".to_string())
        }

        async fn file_content(&self, _repo: &str, path: &str, _git_ref: &str) -> Result<String> {
            self.contents
                .get(path)
                .cloned()
                .ok_or_else(|| BotError::ProcessingError {
                    message: format!("no content for {}", path),
                })
        }

        async fn latest_commit_sha(&self, _pr: &PullRequestRef) -> Result<String> {
            Ok("commit2".to_string())
        }

        async fn post_review(
            &self,
            _pr: &PullRequestRef,
            commit_sha: &str,
            comments: &[DraftComment],
        ) -> Result<()> {
            self.posted_reviews
                .lock()
                .await
                .push((commit_sha.to_string(), comments.to_vec()));
            Ok(())
        }

        async fn approve(&self, _pr: &PullRequestRef, _body: &str) -> Result<()> {
            Ok(())
        }

        async fn list_review_comments(
            &self,
            _pr: &PullRequestRef,
        ) -> Result<Vec<ExistingComment>> {
            Ok(Vec::new())
        }

        async fn resolve_review_comment(&self, _repo: &str, _comment_id: u64) -> Result<()> {
            Ok(())
        }

        async fn authenticated_login(&self) -> Result<String> {
            Ok("pr-review-bot[bot]".to_string())
        }
    }

    struct MockAnalyzer {
        responses: HashMap<String, String>,
        fail_on: Option<String>,
    }

    impl MockAnalyzer {
        fn returning(responses: &[(&str, &str)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                fail_on: None,
            }
        }

        fn failing_on(mut self, path: &str) -> Self {
            self.fail_on = Some(path.to_string());
            self
        }
    }

    impl Analyzer for MockAnalyzer {
        fn generate(
            &self,
            prompt: &str,
        ) -> impl std::future::Future<Output = Result<String>> + Send {
            // Key responses by the file name embedded in the prompt.
            let response = self
                .responses
                .iter()
                .find(|(path, _)| prompt.contains(path.as_str()))
                .map(|(_, text)| text.clone());
            let fail = self
                .fail_on
                .as_ref()
                .is_some_and(|path| prompt.contains(path.as_str()));

            async move {
                if fail {
                    return Err(BotError::AnalysisError {
                        message: "model unavailable".to_string(),
                    });
                }
                Ok(response.unwrap_or_default())
            }
        }
    }

    struct MockConfig {
        pr: PullRequestRef,
        skip_extensions: Vec<String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                pr: PullRequestRef::new("o/r", 7),
                skip_extensions: vec!["xml".to_string(), "bin".to_string()],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn pull_request(&self) -> &PullRequestRef {
            &self.pr
        }

        fn skip_extensions(&self) -> &[String] {
            &self.skip_extensions
        }
    }

    fn rust_patch() -> &'static str {
        "@@ -1,2 +1,3 @@\n fn main() {\n+    println!(\"hi\");\n }"
    }

    fn changed_file(path: &str, lines: &[(u64, &str)]) -> ChangedFile {
        let changed_lines: BTreeMap<u64, String> = lines
            .iter()
            .map(|(n, text)| (*n, text.to_string()))
            .collect();
        let line_numbers = changed_lines.keys().copied().collect();
        ChangedFile {
            path: path.to_string(),
            content: "fn main() {}\n".to_string(),
            changed_lines,
            line_numbers,
        }
    }

    #[tokio::test]
    async fn test_fetch_skips_excluded_and_patchless_files() {
        let host = MockHost::new(
            vec![
                PullFile {
                    filename: "src/main.rs".to_string(),
                    patch: Some(rust_patch().to_string()),
                },
                PullFile {
                    filename: "schema.xml".to_string(),
                    patch: Some(rust_patch().to_string()),
                },
                PullFile {
                    filename: "renamed_only.rs".to_string(),
                    patch: None,
                },
            ],
            &[("src/main.rs", "fn main() {\n    println!(\"hi\");\n}")],
        );
        let pipeline = ReviewPipeline::new(host, MockAnalyzer::returning(&[]), MockConfig::new());

        let files = pipeline.fetch().await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "src/main.rs");
        assert_eq!(files[0].line_numbers, vec![2]);
    }

    #[tokio::test]
    async fn test_fetch_skips_files_whose_content_cannot_be_read() {
        let host = MockHost::new(
            vec![PullFile {
                filename: "src/gone.rs".to_string(),
                patch: Some(rust_patch().to_string()),
            }],
            &[], // no content registered, fetch must tolerate it
        );
        let pipeline = ReviewPipeline::new(host, MockAnalyzer::returning(&[]), MockConfig::new());

        let files = pipeline.fetch().await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_skips_files_with_no_added_lines() {
        let host = MockHost::new(
            vec![PullFile {
                filename: "src/deleted_only.rs".to_string(),
                patch: Some("@@ -1,2 +1,1 @@\n keep\n-dropped".to_string()),
            }],
            &[("src/deleted_only.rs", "keep\n")],
        );
        let pipeline = ReviewPipeline::new(host, MockAnalyzer::returning(&[]), MockConfig::new());

        let files = pipeline.fetch().await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_maps_findings_to_draft_comments() {
        let analyzer = MockAnalyzer::returning(&[(
            "src/main.rs",
            "ISSUE: Avoid printing directly\nLINE: 2\nSUGGESTION: Use tracing\n---",
        )]);
        let pipeline = ReviewPipeline::new(
            MockHost::new(vec![], &[]),
            analyzer,
            MockConfig::new(),
        );

        let result = pipeline
            .analyze(vec![changed_file("src/main.rs", &[(2, "println!(\"hi\");")])])
            .await
            .unwrap();

        assert_eq!(result.files_reviewed, 1);
        assert_eq!(result.files_skipped, 0);
        assert_eq!(result.comments.len(), 1);
        assert_eq!(result.comments[0].path, "src/main.rs");
        assert_eq!(result.comments[0].line, 2);
        assert!(result.comments[0].body.contains("Avoid printing directly"));
        assert!(result.comments[0].body.contains("Suggestion: Use tracing"));
    }

    #[tokio::test]
    async fn test_analyze_continues_past_analyzer_failures() {
        let analyzer = MockAnalyzer::returning(&[(
            "src/ok.rs",
            "ISSUE: Something\nLINE: 2\n---",
        )])
        .failing_on("src/broken.rs");
        let pipeline = ReviewPipeline::new(
            MockHost::new(vec![], &[]),
            analyzer,
            MockConfig::new(),
        );

        let result = pipeline
            .analyze(vec![
                changed_file("src/broken.rs", &[(2, "x")]),
                changed_file("src/ok.rs", &[(2, "y")]),
            ])
            .await
            .unwrap();

        assert_eq!(result.files_reviewed, 1);
        assert_eq!(result.files_skipped, 1);
        assert_eq!(result.comments.len(), 1);
        assert_eq!(result.comments[0].path, "src/ok.rs");
    }

    #[tokio::test]
    async fn test_analyze_with_empty_feedback_produces_no_comments() {
        let analyzer = MockAnalyzer::returning(&[("src/main.rs", "Looks good to me!")]);
        let pipeline = ReviewPipeline::new(
            MockHost::new(vec![], &[]),
            analyzer,
            MockConfig::new(),
        );

        let result = pipeline
            .analyze(vec![changed_file("src/main.rs", &[(2, "x")])])
            .await
            .unwrap();

        assert_eq!(result.files_reviewed, 1);
        assert!(result.comments.is_empty());
    }

    #[tokio::test]
    async fn test_publish_posts_one_review_per_file() {
        let host = MockHost::new(vec![], &[]);
        let posted = host.posted_reviews.clone();
        let pipeline = ReviewPipeline::new(host, MockAnalyzer::returning(&[]), MockConfig::new());

        let result = AnalysisResult {
            comments: vec![
                DraftComment {
                    path: "src/a.rs".to_string(),
                    line: 2,
                    body: "first".to_string(),
                },
                DraftComment {
                    path: "src/b.rs".to_string(),
                    line: 5,
                    body: "second".to_string(),
                },
                DraftComment {
                    path: "src/a.rs".to_string(),
                    line: 9,
                    body: "third".to_string(),
                },
            ],
            files_reviewed: 2,
            files_skipped: 0,
        };

        let outcome = pipeline.publish(result).await.unwrap();

        assert_eq!(outcome.comments_posted, 3);
        let reviews = posted.lock().await;
        assert_eq!(reviews.len(), 2);
        // All reviews pin the latest commit.
        assert!(reviews.iter().all(|(sha, _)| sha == "commit2"));
        assert_eq!(reviews[0].1.len(), 2);
        assert_eq!(reviews[0].1[0].path, "src/a.rs");
        assert_eq!(reviews[1].1.len(), 1);
        assert_eq!(reviews[1].1[0].path, "src/b.rs");
    }

    #[tokio::test]
    async fn test_publish_with_no_comments_posts_nothing() {
        let host = MockHost::new(vec![], &[]);
        let posted = host.posted_reviews.clone();
        let pipeline = ReviewPipeline::new(host, MockAnalyzer::returning(&[]), MockConfig::new());

        let outcome = pipeline
            .publish(AnalysisResult {
                comments: vec![],
                files_reviewed: 1,
                files_skipped: 0,
            })
            .await
            .unwrap();

        assert_eq!(outcome.comments_posted, 0);
        assert!(posted.lock().await.is_empty());
    }

    #[test]
    fn test_prompt_contains_changed_lines_and_contract() {
        let file = changed_file("src/main.rs", &[(2, "println!(\"hi\");")]);
        let prompt = build_review_prompt(&file);

        assert!(prompt.contains("File: src/main.rs"));
        assert!(prompt.contains("Line 2: println!(\"hi\");"));
        assert!(prompt.contains("```rs"));
        assert!(prompt.contains("ISSUE:"));
        assert!(prompt.contains("LINE:"));
        assert!(prompt.contains("SUGGESTION:"));
    }
}
