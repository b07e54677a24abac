//! League data integration.
//!
//! Provides the [`LeagueSource`] seam used by the advisor and an ESPN
//! fantasy football implementation of it.

mod espn;
mod model;

pub use espn::EspnClient;
pub use model::{League, Player, ROSTER_POSITIONS, Slot, Team, pro_team_abbrev};

use crate::error::Result;
use async_trait::async_trait;

/// Source of league snapshots and free-agent lists.
#[async_trait]
pub trait LeagueSource: Send + Sync {
    /// Fetch teams and rosters for the configured season.
    async fn fetch_league(&self) -> Result<League>;

    /// Up to `limit` free agents eligible at `slot`, in provider order.
    async fn free_agents(&self, league: &League, slot: Slot, limit: usize) -> Result<Vec<Player>>;
}
