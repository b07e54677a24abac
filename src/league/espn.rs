//! ESPN fantasy football API client.
//!
//! Private leagues are read with the `espn_s2` and `SWID` session cookies
//! copied from a logged-in browser.

use super::model::{League, Player, Slot, Team, pro_team_abbrev};
use super::LeagueSource;
use crate::config::LeagueConfig;
use crate::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Seasons before this year are only served by the league history endpoint.
const FIRST_CURRENT_API_SEASON: u16 = 2018;

const LEAGUE_VIEWS: &str = "view=mTeam&view=mRoster&view=mSettings";

/// Raw league payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLeague {
    #[serde(default)]
    scoring_period_id: Option<u32>,
    #[serde(default)]
    status: Option<RawStatus>,
    #[serde(default)]
    teams: Vec<RawTeam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    #[serde(default)]
    latest_scoring_period: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeam {
    id: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    roster: Option<RawRoster>,
}

#[derive(Debug, Deserialize)]
struct RawRoster {
    #[serde(default)]
    entries: Vec<RawRosterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRosterEntry {
    lineup_slot_id: u16,
    player_pool_entry: RawPoolEntry,
}

#[derive(Debug, Deserialize)]
struct RawPoolEntry {
    player: RawPlayer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlayer {
    full_name: String,
    default_position_id: u16,
    #[serde(default)]
    pro_team_id: u16,
    #[serde(default)]
    eligible_slots: Vec<u16>,
    #[serde(default)]
    stats: Vec<RawStat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStat {
    #[serde(default)]
    season_id: u16,
    #[serde(default)]
    stat_source_id: u8,
    #[serde(default)]
    stat_split_type_id: u8,
    #[serde(default)]
    applied_total: f64,
}

/// Raw free-agent (`kona_player_info`) payload.
#[derive(Debug, Deserialize)]
struct RawPlayerPool {
    #[serde(default)]
    players: Vec<RawPoolEntry>,
}

/// ESPN API error body.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    messages: Vec<String>,
}

/// Client for one ESPN league.
#[derive(Clone)]
pub struct EspnClient {
    client: Client,
    config: LeagueConfig,
}

impl EspnClient {
    /// Create a new client for the configured league.
    pub fn new(config: LeagueConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn uses_history_endpoint(&self) -> bool {
        self.config.year < FIRST_CURRENT_API_SEASON
    }

    /// URL of the league resource, without query string.
    fn league_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if self.uses_history_endpoint() {
            format!("{}/leagueHistory/{}", base, self.config.league_id)
        } else {
            format!(
                "{}/seasons/{}/segments/0/leagues/{}",
                base, self.config.year, self.config.league_id
            )
        }
    }

    fn league_views_url(&self) -> String {
        if self.uses_history_endpoint() {
            format!(
                "{}?seasonId={}&{}",
                self.league_url(),
                self.config.year,
                LEAGUE_VIEWS
            )
        } else {
            format!("{}?{}", self.league_url(), LEAGUE_VIEWS)
        }
    }

    fn cookie(&self) -> String {
        format!("espn_s2={}; SWID={}", self.config.espn_s2, self.config.swid)
    }

    /// GET `url` with session cookies and optional fantasy filter, returning the body.
    async fn get(&self, url: &str, filter: Option<String>) -> Result<String> {
        debug!(url, "ESPN request");

        let mut request = self.client.get(url).header("Cookie", self.cookie());
        if let Some(filter) = filter {
            request = request.header("x-fantasy-filter", filter);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        Err(league_status_error(
            status,
            &body,
            self.config.league_id,
            self.config.year,
        ))
    }
}

/// Map a non-success ESPN response to an error.
fn league_status_error(status: StatusCode, body: &str, league_id: i64, year: u16) -> AdvisorError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AdvisorError::LeagueApi(format!(
            "authentication failed ({}): check ESPN_S2 and ESPN_SWID",
            status
        ));
    }

    if status == StatusCode::NOT_FOUND {
        return AdvisorError::LeagueApi(format!(
            "league {} not found for season {}",
            league_id, year
        ));
    }

    // Try to parse as API error
    if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
        if !api_error.messages.is_empty() {
            return AdvisorError::LeagueApi(format!(
                "API error ({}): {}",
                status,
                api_error.messages.join("; ")
            ));
        }
    }
    AdvisorError::LeagueApi(format!("Request failed ({}): {}", status, body))
}

#[async_trait]
impl LeagueSource for EspnClient {
    async fn fetch_league(&self) -> Result<League> {
        let body = self.get(&self.league_views_url(), None).await?;
        parse_league(
            &body,
            self.config.league_id,
            self.config.year,
            self.uses_history_endpoint(),
        )
    }

    async fn free_agents(&self, league: &League, slot: Slot, limit: usize) -> Result<Vec<Player>> {
        if self.uses_history_endpoint() {
            return Err(AdvisorError::LeagueApi(format!(
                "free agents are not available for the {} season",
                league.year
            )));
        }

        let url = format!(
            "{}?view=kona_player_info&scoringPeriodId={}",
            self.league_url(),
            league.current_week
        );
        let body = self.get(&url, Some(free_agent_filter(slot, limit))).await?;
        parse_free_agents(&body, league.year)
    }
}

/// `x-fantasy-filter` header selecting available players at one slot.
fn free_agent_filter(slot: Slot, limit: usize) -> String {
    serde_json::json!({
        "players": {
            "filterStatus": { "value": ["FREEAGENT", "WAIVERS"] },
            "filterSlotIds": { "value": [slot.espn_id()] },
            "limit": limit,
            "sortPercOwned": { "sortPriority": 1, "sortAsc": false },
            "sortDraftRanks": { "sortPriority": 100, "sortAsc": true, "value": "STANDARD" }
        }
    })
    .to_string()
}

fn parse_league(body: &str, league_id: i64, year: u16, history: bool) -> Result<League> {
    let raw: RawLeague = if history {
        let mut seasons: Vec<RawLeague> = serde_json::from_str(body)?;
        if seasons.is_empty() {
            return Err(AdvisorError::LeagueApi(format!(
                "no history for league {} in season {}",
                league_id, year
            )));
        }
        seasons.swap_remove(0)
    } else {
        serde_json::from_str(body)?
    };

    let current_week = raw
        .scoring_period_id
        .or_else(|| raw.status.and_then(|s| s.latest_scoring_period))
        .unwrap_or(0);

    let teams = raw
        .teams
        .into_iter()
        .map(|team| {
            let name = team_name(&team);
            let roster = team
                .roster
                .map(|r| r.entries)
                .unwrap_or_default()
                .into_iter()
                .map(|entry| {
                    convert_player(
                        entry.player_pool_entry.player,
                        Slot::from_espn_id(entry.lineup_slot_id),
                        year,
                    )
                })
                .collect();
            Team {
                id: team.id,
                name,
                roster,
            }
        })
        .collect();

    Ok(League {
        id: league_id,
        year,
        current_week,
        teams,
    })
}

fn parse_free_agents(body: &str, year: u16) -> Result<Vec<Player>> {
    let pool: RawPlayerPool = serde_json::from_str(body)?;
    Ok(pool
        .players
        .into_iter()
        .map(|entry| convert_player(entry.player, Slot::Bench, year))
        .collect())
}

/// Newer seasons carry `name`; older ones split it into location and nickname.
fn team_name(team: &RawTeam) -> String {
    match &team.name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => format!(
            "{} {}",
            team.location.as_deref().unwrap_or_default(),
            team.nickname.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string(),
    }
}

fn convert_player(raw: RawPlayer, lineup_slot: Slot, year: u16) -> Player {
    let season_total = |source: u8| {
        raw.stats
            .iter()
            .find(|s| {
                s.stat_source_id == source && s.stat_split_type_id == 0 && s.season_id == year
            })
            .map(|s| s.applied_total)
            .unwrap_or(0.0)
    };
    let total_points = season_total(0);
    let projected_points = season_total(1);

    Player {
        position: Slot::from_position_id(raw.default_position_id),
        pro_team: pro_team_abbrev(raw.pro_team_id).to_string(),
        lineup_slot,
        eligible_slots: raw
            .eligible_slots
            .iter()
            .copied()
            .map(Slot::from_espn_id)
            .collect::<BTreeSet<_>>(),
        total_points,
        projected_points,
        name: raw.full_name,
    }
}
