//! Demo daemon for git-autostage.
//!
//! Watches one or more workspace roots given as arguments (defaulting to
//! the current directory) and stages every newly created untracked file,
//! printing each staging outcome.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_autostage::enablement::{default_flag_path, EnablementFlag};
use git_autostage::pipeline::StageOutcome;
use git_autostage::service::AutoStage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("git_autostage=info".parse()?),
        )
        .init();

    println!("=== git-autostage ===\n");
    println!("Newly created untracked files are staged automatically.");
    println!("Modified or already tracked files are left alone.\n");

    let mut roots: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if roots.is_empty() {
        roots.push(std::env::current_dir()?);
    }

    let flag = EnablementFlag::load(default_flag_path());
    if !flag.get() {
        println!(
            "Auto-staging is disabled; edit {} to re-enable.\n",
            flag.path().display()
        );
    }

    let (mut service, mut outcomes) = AutoStage::new(flag);
    for root in roots {
        println!("Workspace root: {}", root.display());
        service.add_root(root).await;
    }
    service.start().await;

    for root in service.watched_roots() {
        println!("Watching repository: {}", root.display());
    }
    if service.watched_roots().is_empty() && service.is_enabled() {
        println!("No repositories found under the given roots.");
    }
    println!("\nPress Ctrl+C to exit\n---\n");

    // Print staging outcomes as they arrive.
    tokio::spawn(async move {
        while let Ok(outcome) = outcomes.recv().await {
            match outcome {
                StageOutcome::Staged { path } => {
                    println!("staged (A): {}", path.display());
                }
                StageOutcome::AddFailed { path, error } => {
                    println!("add failed for {}: {}", path.display(), error);
                }
                StageOutcome::PostcheckMismatch { path, status } => {
                    println!(
                        "staged {} but status reads {:?}",
                        path.display(),
                        status
                    );
                }
                StageOutcome::StatusFailed { path, error } => {
                    println!("status failed for {}: {}", path.display(), error);
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    // Dropping the service disposes all watches; an in-flight git add is
    // not cancelled.
    drop(service);
    println!("Done!");

    Ok(())
}
