//! `ownergate` entry point.
//!
//! Runs one full cycle for a pull request: refresh the ownership tree from
//! the repository's OWNERS files, evaluate the PR's coverage, record the
//! check-run, and post the notification. Webhook-driven operation wraps
//! this same coordinator; the binary is the on-demand path.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use ownergate_engine::CoveragePolicy;
use ownergate_service::config::ServiceConfig;
use ownergate_service::coordinator::{Coordinator, EvaluationOutcome};
use ownergate_service::github::GithubClient;
use ownergate_service::pacing::TokioPacer;
use ownergate_service::providers::{
    CheckRunSink, MembershipResolver, NotificationSink, PrSnapshotProvider, RuleSource,
};

#[derive(Debug, Parser)]
#[command(name = "ownergate", about = "Ownership approval check for pull requests")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "ownergate.toml")]
    config: PathBuf,

    /// Pull request number to evaluate.
    #[arg(long)]
    pr: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let token = config.resolve_token()?;

    let repo = format!("{}/{}", config.github.owner, config.github.repo);
    tracing::info!(
        repo = %repo,
        pr = cli.pr,
        "ownergate v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let client = Arc::new(GithubClient::new(&config.github, token).context("building client")?);
    let pacer = Arc::new(TokioPacer::new(
        config.pacing.team_sync_gap(),
        config.pacing.check_run_settle(),
    ));
    let policy = CoveragePolicy {
        ownerless_blocks: config.policy.ownerless_blocks,
    };

    let coordinator = Coordinator::new(
        Arc::clone(&client) as Arc<dyn RuleSource>,
        Arc::clone(&client) as Arc<dyn MembershipResolver>,
        Arc::clone(&client) as Arc<dyn PrSnapshotProvider>,
        Arc::clone(&client) as Arc<dyn CheckRunSink>,
        client as Arc<dyn NotificationSink>,
        pacer,
        policy,
    );

    // Ctrl+C aborts the refresh; the evaluation that follows is short.
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("signal received, cancelling refresh");
        cancel_on_signal.cancel();
    });

    let stats = coordinator.refresh(&cancel).await?;
    tracing::info!(
        rules = stats.rules,
        teams = stats.teams_resolved,
        diagnostics = stats.diagnostics,
        "ownership tree ready"
    );

    match coordinator.evaluate_pr(cli.pr).await? {
        EvaluationOutcome::Completed { output, .. } => {
            println!("{}: {}", output.conclusion.as_str(), output.title);
            print!("{}", output.summary);
        }
        EvaluationOutcome::SkippedClosed { number } => {
            println!("pull request #{number} is closed; nothing to evaluate");
        }
    }

    Ok(())
}
