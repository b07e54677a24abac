//! Configuration for the fantasy advisor.
//!
//! Supports both environment variables (optionally seeded from a `.env`
//! file) and a YAML config file. Environment variables take precedence over
//! config file values.

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Read host for the ESPN fantasy football API.
pub const DEFAULT_ESPN_API_BASE: &str = "https://lm-api-reads.fantasy.espn.com/apis/v3/games/ffl";

/// Local inference server (Ollama's OpenAI-compatible endpoint).
pub const DEFAULT_LLM_API_BASE: &str = "http://localhost:11434";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "FANTASY_ADVISOR_CONFIG";

/// ESPN league settings and session credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueConfig {
    /// ESPN league identifier
    pub league_id: i64,

    /// Season year (e.g., 2024)
    pub year: u16,

    /// `espn_s2` session cookie
    pub espn_s2: String,

    /// `SWID` session cookie
    pub swid: String,

    /// Display name of the team to advise
    pub team_name: String,

    /// Base URL for the ESPN fantasy API
    #[serde(default = "default_espn_api_base")]
    pub api_base: String,
}

fn default_espn_api_base() -> String {
    DEFAULT_ESPN_API_BASE.to_string()
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            league_id: 0,
            year: 0,
            espn_s2: String::new(),
            swid: String::new(),
            team_name: String::new(),
            api_base: default_espn_api_base(),
        }
    }
}

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "http://localhost:11434")
    pub api_base: String,

    /// API key for authentication (local servers usually need none)
    #[serde(default)]
    pub api_key: String,

    /// Model name (e.g., "llama3.1:8b")
    pub model: String,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_LLM_API_BASE.to_string(),
            api_key: String::new(),
            model: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Filesystem locations for prompt templates and recommendation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the prompt template files
    pub prompt_dir: PathBuf,

    /// Directory the recommendation log is written to
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            prompt_dir: PathBuf::from("prompts"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Run behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Record a failed position/team and keep going instead of aborting
    pub continue_on_error: bool,
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// League and credentials
    pub league: LeagueConfig,
    /// LLM settings
    pub llm: LlmConfig,
    /// Prompt and output locations
    pub paths: PathsConfig,
    /// Run behavior
    pub run: RunConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    league: Option<LeagueFileSection>,
    llm: Option<LlmFileSection>,
    paths: Option<PathsFileSection>,
    run: Option<RunFileSection>,
}

#[derive(Debug, Deserialize)]
struct LeagueFileSection {
    league_id: Option<i64>,
    year: Option<u16>,
    espn_s2: Option<String>,
    swid: Option<String>,
    team_name: Option<String>,
    api_base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct PathsFileSection {
    prompt_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RunFileSection {
    continue_on_error: Option<bool>,
}

impl Config {
    /// Load configuration from the environment and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (see [`Config::load_env_file`] for `.env`)
    /// 2. Config file (`$FANTASY_ADVISOR_CONFIG`, which must exist, or
    ///    ~/.config/fantasy-advisor/config.yaml when present)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let explicit = env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        if let Some(config_path) = resolve_config_file(explicit, Self::default_config_path())? {
            config = Self::load_from_file(&config_path)?;
        }

        config.apply_env(|name| env::var(name).ok())?;

        Ok(config)
    }

    /// Overlay values from an environment lookup.
    ///
    /// Numeric and boolean variables that are present but malformed are
    /// errors rather than being skipped.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LEAGUE_ID") {
            self.league.league_id = parse_var("LEAGUE_ID", &value)?;
        }
        if let Some(value) = lookup("LEAGUE_YEAR") {
            self.league.year = parse_var("LEAGUE_YEAR", &value)?;
        }
        if let Some(value) = lookup("ESPN_S2") {
            self.league.espn_s2 = value;
        }
        if let Some(value) = lookup("ESPN_SWID") {
            self.league.swid = value;
        }
        if let Some(value) = lookup("TEAM_NAME") {
            self.league.team_name = value;
        }
        if let Some(value) = lookup("ESPN_API_BASE") {
            self.league.api_base = value;
        }

        if let Some(value) = lookup("LLM_API_BASE") {
            self.llm.api_base = value;
        }
        if let Some(value) = lookup("LLM_API_KEY") {
            self.llm.api_key = value;
        }
        if let Some(value) = lookup("LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = lookup("LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_var("LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = lookup("LLM_TEMPERATURE") {
            self.llm.temperature = parse_var("LLM_TEMPERATURE", &value)?;
        }

        if let Some(value) = lookup("PROMPT_DIR") {
            self.paths.prompt_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(value);
        }

        if let Some(value) = lookup("CONTINUE_ON_ERROR") {
            self.run.continue_on_error = parse_flag("CONTINUE_ON_ERROR", &value)?;
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AdvisorError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, filling gaps with defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| AdvisorError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(league) = file_config.league {
            if let Some(league_id) = league.league_id {
                config.league.league_id = league_id;
            }
            if let Some(year) = league.year {
                config.league.year = year;
            }
            if let Some(espn_s2) = league.espn_s2 {
                config.league.espn_s2 = espn_s2;
            }
            if let Some(swid) = league.swid {
                config.league.swid = swid;
            }
            if let Some(team_name) = league.team_name {
                config.league.team_name = team_name;
            }
            if let Some(api_base) = league.api_base {
                config.league.api_base = api_base;
            }
        }

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
        }

        if let Some(paths) = file_config.paths {
            if let Some(prompt_dir) = paths.prompt_dir {
                config.paths.prompt_dir = prompt_dir;
            }
            if let Some(output_dir) = paths.output_dir {
                config.paths.output_dir = output_dir;
            }
        }

        if let Some(run) = file_config.run {
            if let Some(continue_on_error) = run.continue_on_error {
                config.run.continue_on_error = continue_on_error;
            }
        }

        Ok(config)
    }

    /// Seed the process environment from a `.env` file in the working
    /// directory or one of its parents. Variables already set win. A missing
    /// file is fine; an unreadable or malformed one is a config error.
    ///
    /// Call this before reading any environment variable, `RUST_LOG`
    /// included.
    pub fn load_env_file() -> Result<()> {
        env_file_outcome(dotenvy::dotenv())
    }

    /// The platform config file, e.g. ~/.config/fantasy-advisor/config.yaml.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "fantasy-advisor")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.league.league_id <= 0 {
            return Err(AdvisorError::Config(
                "League id is required. Set LEAGUE_ID environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.league.year == 0 {
            return Err(AdvisorError::Config(
                "League year is required. Set LEAGUE_YEAR environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.league.espn_s2.is_empty() || self.league.swid.is_empty() {
            return Err(AdvisorError::Config(
                "ESPN session credentials are required. Set ESPN_S2 and ESPN_SWID environment variables or add to config file.".to_string()
            ));
        }

        if self.league.team_name.is_empty() {
            return Err(AdvisorError::Config(
                "Team name is required. Set TEAM_NAME environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.llm.api_base.is_empty() {
            return Err(AdvisorError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(AdvisorError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Pick the config file to read. An explicitly named file must exist; the
/// platform default is skipped when absent.
fn resolve_config_file(
    explicit: Option<PathBuf>,
    default: Option<PathBuf>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(AdvisorError::Config(format!(
                "{} points to {}, which does not exist",
                CONFIG_PATH_VAR,
                path.display()
            )));
        }
        return Ok(Some(path));
    }
    Ok(default.filter(|path| path.is_file()))
}

fn env_file_outcome<T>(result: dotenvy::Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(AdvisorError::Config(format!("Failed to load .env: {}", err))),
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        AdvisorError::Config(format!("{} must be a number, got '{}'", name, value))
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AdvisorError::Config(format!(
            "{} must be true or false, got '{}'",
            name, value
        ))),
    }
}
