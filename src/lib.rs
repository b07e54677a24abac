//! Fantasy Advisor - LLM lineup, waiver and trade advice for ESPN leagues.
//!
//! Fetches a fantasy football league from ESPN, formats rosters and free
//! agents into prompts, asks a locally hosted OpenAI-compatible model for
//! recommendations and appends the replies to a text log.
//!
//! # Quick Start
//!
//! ```no_run
//! use fantasy_advisor::{
//!     advisor::{Advisor, AdvisorOptions},
//!     config::Config,
//!     league::EspnClient,
//!     llm::{LlmClient, PromptSet},
//!     report::RecommendationLog,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     Config::load_env_file()?;
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let prompts = PromptSet::load(&config.paths.prompt_dir)?;
//!     let espn = EspnClient::new(config.league.clone());
//!     let llm = LlmClient::new(config.llm.clone());
//!     let log = RecommendationLog::new(&config.paths.output_dir);
//!
//!     let mut advisor = Advisor::new(
//!         &espn,
//!         &llm,
//!         &prompts,
//!         log,
//!         AdvisorOptions::new(&config.league.team_name),
//!     );
//!     let summary = advisor.run().await?;
//!     println!("{} recommendations written", summary.completed);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Config**: environment / `.env` / YAML configuration
//! - **EspnClient**: league snapshots and free agents behind [`league::LeagueSource`]
//! - **format_players**: fixed-width roster tables
//! - **PromptSet**: validated prompt templates
//! - **LlmClient**: OpenAI-compatible client behind [`llm::Recommender`]
//! - **RecommendationLog**: append-only output file
//! - **Advisor**: the substitution, free-agent and trade phases

pub mod advisor;
pub mod config;
pub mod error;
pub mod league;
pub mod llm;
pub mod report;
pub mod roster;

// Re-export commonly used types
pub use advisor::{Advisor, AdvisorOptions, Recommendation, RunSummary};
pub use config::Config;
pub use error::{AdvisorError, Result};
pub use league::{EspnClient, League, LeagueSource, Player, Slot, Team};
pub use llm::{LlmClient, PromptSet, Recommender};
pub use report::RecommendationLog;
pub use roster::format_players;
