use clap::Parser;
use scorebot::cli::Cli;
use scorebot::commentary::OpenAiClient;
use scorebot::config::AppConfig;
use scorebot::error::{BotError, Result};
use scorebot::publish::{DryRunPublisher, Publisher, TwitterPublisher};
use scorebot::scoreboard::HttpScoreboard;
use scorebot::services::{CycleOutcome, Orchestrator};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod main_runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = AppConfig::load_from(&cli.config_dir)?;
    if cli.dry_run {
        cfg.publish.dry_run = true;
    }

    main_runtime::init_logging(&cfg.logging);

    if let Err(errors) = cfg.validate() {
        for e in &errors {
            error!("Config: {}", e);
        }
        return Err(BotError::InvalidConfig(errors.join("; ")));
    }

    let scoreboard = HttpScoreboard::from_config(&cfg)?;
    info!("Watching {} ({})", scoreboard.url(), cfg.sport);

    let generator = OpenAiClient::new(cfg.commentary.clone())?;
    if !generator.is_configured() {
        warn!("Commentary API key not set; every post will use a canned line");
    }

    let publisher: Arc<dyn Publisher> = if cfg.publish.dry_run {
        info!("Dry run: posts are logged, not published");
        Arc::new(DryRunPublisher::new())
    } else {
        Arc::new(TwitterPublisher::from_config(&cfg.publish)?)
    };

    let mut orchestrator =
        Orchestrator::from_config(&cfg, Arc::new(scoreboard), Arc::new(generator), publisher)?;

    if cli.once {
        match orchestrator.run_cycle().await {
            CycleOutcome::Completed(report) => {
                info!("Single pass done: {} published", report.published)
            }
            CycleOutcome::Failed(reason) => {
                return Err(BotError::Internal(format!("pass failed: {}", reason)))
            }
        }
        return Ok(());
    }

    tokio::select! {
        _ = orchestrator.run() => {}
        res = signal::ctrl_c() => match res {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        },
    }

    info!(
        "Stopped after publishing {} game(s)",
        orchestrator.deduplicator().len()
    );
    Ok(())
}
