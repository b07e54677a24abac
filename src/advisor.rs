//! Recommendation pipeline.
//!
//! One run fetches the league once and then walks three phases in order:
//!
//! 1. **Substitution**: for each position, compare the current starters with
//!    every roster player eligible there.
//! 2. **Free agents**: for each position, compare my eligible players with
//!    the best available free agents.
//! 3. **Trades**: for each opposing team, compare their roster with mine.
//!
//! Every unit of work renders one prompt, asks the model once and appends the
//! reply to the recommendation log before moving on.

use crate::error::Result;
use crate::league::{League, LeagueSource, Player, ROSTER_POSITIONS, Slot, Team};
use crate::llm::{
    FreeAgentPrompt, PromptKind, PromptSet, PromptValues, Recommender, SubstitutionPrompt,
    TradePrompt,
};
use crate::report::RecommendationLog;
use crate::roster::format_players;
use tracing::{info, warn};

/// Free agents requested per position.
pub const FREE_AGENT_LIMIT: usize = 1000;

/// Options for a run.
#[derive(Debug, Clone)]
pub struct AdvisorOptions {
    /// Name of the team being advised.
    pub team_name: String,
    /// Record a failed unit and continue instead of aborting the run.
    pub continue_on_error: bool,
    /// Maximum free agents fetched per position.
    pub free_agent_limit: usize,
}

impl AdvisorOptions {
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            continue_on_error: false,
            free_agent_limit: FREE_AGENT_LIMIT,
        }
    }
}

/// A model reply and what it was asked about.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub kind: PromptKind,
    /// Position label or opposing team name.
    pub subject: String,
    pub text: String,
}

/// Outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Roster players currently starting in `slot`.
pub fn starters_at(roster: &[Player], slot: Slot) -> Vec<Player> {
    roster
        .iter()
        .filter(|p| p.lineup_slot == slot)
        .cloned()
        .collect()
}

/// Roster players allowed to play `slot`, starting or not.
pub fn eligible_at(roster: &[Player], slot: Slot) -> Vec<Player> {
    roster
        .iter()
        .filter(|p| p.is_eligible(slot))
        .cloned()
        .collect()
}

pub fn substitution_prompt(team: &Team, slot: Slot, current_week: u32) -> SubstitutionPrompt {
    SubstitutionPrompt {
        position: slot.label().to_string(),
        starters: format_players(&starters_at(&team.roster, slot), current_week),
        eligible: format_players(&eligible_at(&team.roster, slot), current_week),
    }
}

pub fn free_agent_prompt(
    team: &Team,
    slot: Slot,
    free_agents: &[Player],
    current_week: u32,
) -> FreeAgentPrompt {
    FreeAgentPrompt {
        position: slot.label().to_string(),
        my_roster: format_players(&eligible_at(&team.roster, slot), current_week),
        free_agents: format_players(free_agents, current_week),
    }
}

pub fn trade_prompt(mine: &Team, opponent: &Team, current_week: u32) -> TradePrompt {
    TradePrompt {
        my_roster: format_players(&mine.roster, current_week),
        opponent_team_name: opponent.name.clone(),
        opponent_roster: format_players(&opponent.roster, current_week),
    }
}

/// Drives the three analysis phases for one team.
pub struct Advisor<'a, S: LeagueSource + ?Sized, R: Recommender + ?Sized> {
    source: &'a S,
    recommender: &'a R,
    prompts: &'a PromptSet,
    log: RecommendationLog,
    options: AdvisorOptions,
}

impl<'a, S: LeagueSource + ?Sized, R: Recommender + ?Sized> Advisor<'a, S, R> {
    pub fn new(
        source: &'a S,
        recommender: &'a R,
        prompts: &'a PromptSet,
        log: RecommendationLog,
        options: AdvisorOptions,
    ) -> Self {
        Self {
            source,
            recommender,
            prompts,
            log,
            options,
        }
    }

    /// Fetch the league and run every phase.
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!("Fetching league data");
        let league = self.source.fetch_league().await?;
        let my_team = league.find_team(&self.options.team_name)?;
        info!(
            team = %my_team.name,
            week = league.current_week,
            teams = league.teams.len(),
            players = my_team.roster.len(),
            "League loaded"
        );

        let mut summary = RunSummary::default();

        info!("Substitution phase");
        for slot in ROSTER_POSITIONS {
            info!(position = %slot, "Reviewing lineup");
            let result = self.substitution(&league, my_team, slot).await;
            self.settle(&mut summary, "substitution", slot.label(), result)?;
        }

        info!("Free agent phase");
        for slot in ROSTER_POSITIONS {
            info!(position = %slot, "Searching free agents");
            let result = self.free_agent_search(&league, my_team, slot).await;
            self.settle(&mut summary, "free-agent", slot.label(), result)?;
        }

        info!("Trade phase");
        for opponent in league.opponents(my_team) {
            info!(opponent = %opponent.name, "Evaluating trades");
            let result = self.trade(&league, my_team, opponent).await;
            self.settle(&mut summary, "trade", &opponent.name, result)?;
        }

        info!(
            completed = summary.completed,
            failed = summary.failed,
            log = %self.log.path().display(),
            "Run finished"
        );
        Ok(summary)
    }

    async fn substitution(&mut self, league: &League, my_team: &Team, slot: Slot) -> Result<()> {
        let values = substitution_prompt(my_team, slot, league.current_week);
        self.advise(&values, slot.label()).await
    }

    async fn free_agent_search(
        &mut self,
        league: &League,
        my_team: &Team,
        slot: Slot,
    ) -> Result<()> {
        let free_agents = self
            .source
            .free_agents(league, slot, self.options.free_agent_limit)
            .await?;
        let values = free_agent_prompt(my_team, slot, &free_agents, league.current_week);
        self.advise(&values, slot.label()).await
    }

    async fn trade(&mut self, league: &League, my_team: &Team, opponent: &Team) -> Result<()> {
        let values = trade_prompt(my_team, opponent, league.current_week);
        self.advise(&values, &opponent.name).await
    }

    /// Render, ask the model, log the reply.
    async fn advise(&mut self, values: &dyn PromptValues, subject: &str) -> Result<()> {
        let user = self.prompts.render(values)?;
        let text = self
            .recommender
            .recommend(self.prompts.system(), &user)
            .await?;

        let recommendation = Recommendation {
            kind: values.kind(),
            subject: subject.to_string(),
            text,
        };
        self.log.append(&recommendation.text)?;

        info!(
            kind = %recommendation.kind,
            subject = %recommendation.subject,
            chars = recommendation.text.len(),
            "Recommendation logged"
        );
        Ok(())
    }

    /// Count a unit's outcome; a failure aborts the run unless failures are
    /// being isolated.
    fn settle(
        &self,
        summary: &mut RunSummary,
        phase: &str,
        subject: &str,
        result: Result<()>,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                summary.completed += 1;
                Ok(())
            }
            Err(err) if self.options.continue_on_error => {
                warn!(phase, subject, error = %err, "Skipping after failure");
                summary.failed += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn player(name: &str, position: Slot, lineup_slot: Slot, eligible: &[Slot]) -> Player {
        Player {
            name: name.to_string(),
            position,
            pro_team: "BUF".to_string(),
            lineup_slot,
            eligible_slots: eligible.iter().copied().collect::<BTreeSet<_>>(),
            total_points: 80.0,
            projected_points: 300.0,
        }
    }

    fn team(id: u32, name: &str, roster: Vec<Player>) -> Team {
        Team {
            id,
            name: name.to_string(),
            roster,
        }
    }

    fn league(teams: Vec<Team>) -> League {
        League {
            id: 1,
            year: 2024,
            current_week: 4,
            teams,
        }
    }

    struct FakeLeague {
        league: League,
        free_agents: HashMap<Slot, Vec<Player>>,
        requests: Mutex<Vec<(Slot, usize)>>,
    }

    impl FakeLeague {
        fn new(league: League) -> Self {
            Self {
                league,
                free_agents: HashMap::new(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LeagueSource for FakeLeague {
        async fn fetch_league(&self) -> Result<League> {
            Ok(self.league.clone())
        }

        async fn free_agents(
            &self,
            _league: &League,
            slot: Slot,
            limit: usize,
        ) -> Result<Vec<Player>> {
            self.requests.lock().unwrap().push((slot, limit));
            let mut players = self.free_agents.get(&slot).cloned().unwrap_or_default();
            players.truncate(limit);
            Ok(players)
        }
    }

    /// Records every prompt; fails the call whose index is `fail_at`.
    #[derive(Default)]
    struct RecordingRecommender {
        calls: Mutex<Vec<(String, String)>>,
        fail_at: Option<usize>,
    }

    impl RecordingRecommender {
        fn user_prompts(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, user)| user.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Recommender for RecordingRecommender {
        async fn recommend(&self, system: &str, user: &str) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push((system.to_string(), user.to_string()));
            if self.fail_at == Some(index) {
                return Err(AdvisorError::LlmApi("connection refused".to_string()));
            }
            Ok(format!("<{}>", index))
        }
    }

    fn squad_a() -> League {
        let allen = player(
            "Josh Allen",
            Slot::Qb,
            Slot::Qb,
            &[Slot::Qb, Slot::Other(7), Slot::Bench],
        );
        league(vec![team(1, "Squad A", vec![allen])])
    }

    fn two_teams() -> League {
        league(vec![
            team(
                1,
                "My Team",
                vec![player("Josh Allen", Slot::Qb, Slot::Qb, &[Slot::Qb])],
            ),
            team(
                2,
                "Rival",
                vec![player("Lamar Jackson", Slot::Qb, Slot::Qb, &[Slot::Qb])],
            ),
        ])
    }

    #[test]
    fn test_partition_starters_and_eligible() {
        let roster = vec![
            player("Bijan Robinson", Slot::Rb, Slot::Rb, &[Slot::Rb, Slot::Flex]),
            player("Puka Nacua", Slot::Wr, Slot::Flex, &[Slot::Wr, Slot::Flex]),
            player("Jaylen Warren", Slot::Rb, Slot::Bench, &[Slot::Rb, Slot::Flex]),
        ];

        let names = |players: Vec<Player>| -> Vec<String> {
            players.into_iter().map(|p| p.name).collect()
        };
        assert_eq!(names(starters_at(&roster, Slot::Flex)), vec!["Puka Nacua"]);
        assert_eq!(
            names(eligible_at(&roster, Slot::Rb)),
            vec!["Bijan Robinson", "Jaylen Warren"]
        );
        assert_eq!(eligible_at(&roster, Slot::Flex).len(), 3);
        assert!(starters_at(&roster, Slot::Te).is_empty());
    }

    #[test]
    fn test_substitution_prompt_for_single_qb() {
        let league = squad_a();
        let team = league.find_team("Squad A").unwrap();
        let values = substitution_prompt(team, Slot::Qb, league.current_week);

        let starter_rows: Vec<&str> = values.starters.lines().skip(2).collect();
        assert_eq!(starter_rows.len(), 1);
        assert!(starter_rows[0].starts_with("Josh Allen"));
        assert!(values.eligible.contains("Josh Allen"));
        assert_eq!(values.position, "QB");

        let empty = substitution_prompt(team, Slot::Kicker, league.current_week);
        assert_eq!(empty.starters, "None");
        assert_eq!(empty.eligible, "None");
    }

    #[tokio::test]
    async fn test_substitution_phase_sends_qb_tables() {
        let source = FakeLeague::new(squad_a());
        let recommender = RecordingRecommender::default();
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();

        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            RecommendationLog::new(dir.path()),
            AdvisorOptions::new("Squad A"),
        );
        let summary = advisor.run().await.unwrap();

        // 7 substitution + 7 free agent + no trades
        assert_eq!(summary, RunSummary { completed: 14, failed: 0 });

        let first = &recommender.user_prompts()[0];
        let expected = substitution_prompt(&squad_a().teams[0], Slot::Qb, 4);
        assert!(first.contains(&expected.starters));
        assert!(first.contains(&expected.eligible));

        let calls = recommender.calls.lock().unwrap();
        assert!(calls.iter().all(|(system, _)| system == prompts.system()));
    }

    #[tokio::test]
    async fn test_free_agent_phase_with_no_free_agents() {
        let source = FakeLeague::new(squad_a());
        let recommender = RecordingRecommender::default();
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();

        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            RecommendationLog::new(dir.path()),
            AdvisorOptions::new("Squad A"),
        );
        advisor.run().await.unwrap();

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), ROSTER_POSITIONS.len());
        assert!(requests.iter().all(|(_, limit)| *limit == 1000));
        let slots: Vec<Slot> = requests.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, ROSTER_POSITIONS.to_vec());

        let values = free_agent_prompt(&squad_a().teams[0], Slot::Qb, &[], 4);
        assert_eq!(values.free_agents, "None");
        let rendered = prompts.render(&values).unwrap();
        assert!(rendered.contains("Available free agents at QB:\nNone"));
        assert_eq!(&recommender.user_prompts()[7], &rendered);
    }

    #[tokio::test]
    async fn test_free_agents_are_tabled_in_provider_order() {
        let mut source = FakeLeague::new(squad_a());
        source.free_agents.insert(
            Slot::Qb,
            vec![
                player("Jake Browning", Slot::Qb, Slot::Bench, &[Slot::Qb]),
                player("Andy Dalton", Slot::Qb, Slot::Bench, &[Slot::Qb]),
            ],
        );
        let recommender = RecordingRecommender::default();
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();

        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            RecommendationLog::new(dir.path()),
            AdvisorOptions::new("Squad A"),
        );
        advisor.run().await.unwrap();

        let qb_prompt = &recommender.user_prompts()[7];
        let browning = qb_prompt.find("Jake Browning").unwrap();
        let dalton = qb_prompt.find("Andy Dalton").unwrap();
        assert!(browning < dalton);
    }

    #[tokio::test]
    async fn test_trade_phase_skips_my_team() {
        let source = FakeLeague::new(two_teams());
        let recommender = RecordingRecommender::default();
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();

        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            RecommendationLog::new(dir.path()),
            AdvisorOptions::new("My Team"),
        );
        let summary = advisor.run().await.unwrap();
        assert_eq!(summary.completed, 15);

        let trade_prompts: Vec<String> = recommender
            .user_prompts()
            .into_iter()
            .filter(|p| p.starts_with("Evaluate a possible trade with"))
            .collect();
        assert_eq!(trade_prompts.len(), 1);
        assert!(trade_prompts[0].starts_with("Evaluate a possible trade with Rival."));
        assert!(trade_prompts[0].contains("Lamar Jackson"));
    }

    #[tokio::test]
    async fn test_log_receives_every_reply_in_order() {
        let source = FakeLeague::new(two_teams());
        let recommender = RecordingRecommender::default();
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();
        let log = RecommendationLog::new(dir.path().join("output"));
        let log_path = log.path().to_path_buf();

        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            log,
            AdvisorOptions::new("My Team"),
        );
        advisor.run().await.unwrap();

        let expected: String = (0..15).map(|i| format!("<{}>", i)).collect();
        assert_eq!(std::fs::read_to_string(log_path).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_missing_team_is_fatal_before_any_prompt() {
        let source = FakeLeague::new(two_teams());
        let recommender = RecordingRecommender::default();
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();

        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            RecommendationLog::new(dir.path()),
            AdvisorOptions::new("Ghost Team"),
        );
        let err = advisor.run().await.unwrap_err();
        assert!(matches!(err, AdvisorError::TeamNotFound { .. }));
        assert!(recommender.user_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_aborts_run() {
        let source = FakeLeague::new(two_teams());
        let recommender = RecordingRecommender {
            fail_at: Some(2),
            ..Default::default()
        };
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();
        let log = RecommendationLog::new(dir.path());
        let log_path = log.path().to_path_buf();

        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            log,
            AdvisorOptions::new("My Team"),
        );
        let err = advisor.run().await.unwrap_err();
        assert!(matches!(err, AdvisorError::LlmApi(_)));
        assert_eq!(recommender.user_prompts().len(), 3);
        assert_eq!(std::fs::read_to_string(log_path).unwrap(), "<0><1>");
    }

    #[tokio::test]
    async fn test_continue_on_error_isolates_failures() {
        let source = FakeLeague::new(two_teams());
        let recommender = RecordingRecommender {
            fail_at: Some(2),
            ..Default::default()
        };
        let prompts = PromptSet::builtin().unwrap();
        let dir = TempDir::new().unwrap();

        let mut options = AdvisorOptions::new("My Team");
        options.continue_on_error = true;
        let mut advisor = Advisor::new(
            &source,
            &recommender,
            &prompts,
            RecommendationLog::new(dir.path()),
            options,
        );
        let summary = advisor.run().await.unwrap();
        assert_eq!(summary, RunSummary { completed: 14, failed: 1 });
        assert_eq!(recommender.user_prompts().len(), 15);
    }
}
