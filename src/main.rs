//! Fantasy Advisor
//!
//! Runs every analysis phase for the configured team and appends the model's
//! recommendations to the output log. All behavior comes from configuration.

use anyhow::{Context, Result};
use fantasy_advisor::{
    advisor::{Advisor, AdvisorOptions},
    config::Config,
    league::EspnClient,
    llm::{LlmClient, PromptSet},
    report::RecommendationLog,
};
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // `.env` may set RUST_LOG, so it is read before the subscriber exists.
    if let Err(err) = Config::load_env_file() {
        eprintln!("error: {}", err);
        return ExitCode::FAILURE;
    }
    init_tracing();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every unit of work succeeded.
async fn run() -> Result<bool> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let prompts =
        PromptSet::load(&config.paths.prompt_dir).context("Failed to load prompt templates")?;

    info!(
        league = config.league.league_id,
        year = config.league.year,
        team = %config.league.team_name,
        model = %config.llm.model,
        endpoint = %config.llm.api_base,
        "Starting fantasy advisor"
    );

    let start = Instant::now();

    let espn = EspnClient::new(config.league.clone());
    let llm = LlmClient::new(config.llm.clone());
    let log = RecommendationLog::new(&config.paths.output_dir);
    let log_path = log.path().to_path_buf();

    let mut options = AdvisorOptions::new(&config.league.team_name);
    options.continue_on_error = config.run.continue_on_error;

    let mut advisor = Advisor::new(&espn, &llm, &prompts, log, options);
    let summary = advisor.run().await.context("Advisor run failed")?;

    info!(
        completed = summary.completed,
        failed = summary.failed,
        elapsed = ?start.elapsed(),
        output = %log_path.display(),
        "Done"
    );

    if summary.failed > 0 {
        eprintln!(
            "error: {} of {} recommendations failed; see log output above",
            summary.failed,
            summary.completed + summary.failed
        );
    }

    Ok(summary.failed == 0)
}

/// Initialize tracing to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fantasy_advisor=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
