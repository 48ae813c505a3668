use clap::Parser;
use pr_review_bot::utils::{logger, validation::Validate};
use pr_review_bot::{
    CliConfig, GeminiClient, GitHubClient, ReviewEngine, ReviewPipeline, RunConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting pr-review-bot");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 解析並驗證配置
    let config = match RunConfig::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration resolution failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 Run monitoring enabled");
    }

    tracing::info!(
        "Reviewing {}#{} with {}",
        config.pr.repo,
        config.pr.number,
        config.policy.review.model
    );

    // 建立 adapters 和 pipeline
    let host = GitHubClient::new(
        &config.policy.api,
        &config.app_id,
        &config.private_key,
        &config.installation_id,
    )?;
    let analyzer = GeminiClient::new(
        &config.policy.api,
        &config.policy.review.model,
        &config.gemini_api_key,
    )?;
    let pipeline = ReviewPipeline::new(host, analyzer, config);

    let engine = ReviewEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Review completed successfully!");
            println!(
                "✅ Reviewed {} file(s), posted {} comment(s)",
                outcome.files_reviewed, outcome.comments_posted
            );
            if outcome.files_skipped > 0 {
                println!("⚠️ Skipped {} file(s) during analysis", outcome.files_skipped);
            }
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Review failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                pr_review_bot::utils::error::ErrorSeverity::Low => 0,
                pr_review_bot::utils::error::ErrorSeverity::Medium => 2,
                pr_review_bot::utils::error::ErrorSeverity::High => 1,
                pr_review_bot::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
