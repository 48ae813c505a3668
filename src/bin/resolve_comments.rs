use clap::Parser;
use pr_review_bot::core::resolve::resolve_bot_comments;
use pr_review_bot::utils::{logger, validation::Validate};
use pr_review_bot::{GitHubClient, ResolveConfig};

/// Comment-triggered flow: resolve the bot's own review threads on a PR
/// and approve it.
#[derive(Debug, Clone, Parser)]
#[command(name = "resolve_comments")]
#[command(about = "Resolves the bot's review comments on a pull request and approves it")]
struct ResolveCli {
    #[arg(long, help = "Repository in owner/repo form (defaults to GITHUB_REPOSITORY)")]
    repo: Option<String>,

    #[arg(long, help = "Pull request number (defaults to GITHUB_PR_NUMBER)")]
    pr_number: Option<u64>,

    #[arg(long, help = "Path to a review policy TOML file")]
    config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = ResolveCli::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting resolve_comments");

    let config = match ResolveConfig::resolve(
        cli.repo.clone(),
        cli.pr_number,
        cli.config.as_deref(),
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration resolution failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let host = GitHubClient::new(
        &config.policy.api,
        &config.app_id,
        &config.private_key,
        &config.installation_id,
    )?;

    match resolve_bot_comments(&host, &config.pr).await {
        Ok(resolved) => {
            tracing::info!("✅ Resolved {} bot comment(s)", resolved);
            println!(
                "✅ Resolved {} bot comment(s) on {}#{}",
                resolved, config.pr.repo, config.pr.number
            );
        }
        Err(e) => {
            tracing::error!("❌ Resolve flow failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(2);
        }
    }

    Ok(())
}
