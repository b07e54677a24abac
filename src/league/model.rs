//! League snapshot types: slots, players, teams.

use crate::error::{AdvisorError, Result};
use std::collections::BTreeSet;
use std::fmt;

/// A roster slot (or default position) as ESPN numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Qb,
    Rb,
    Wr,
    Te,
    /// ESPN's RB/WR/TE slot.
    Flex,
    DefenseSt,
    Kicker,
    Bench,
    InjuredReserve,
    /// Any slot this crate does not reason about (IDP, OP, HC, ...).
    Other(u16),
}

/// Positions advised on, in the order they are visited.
pub const ROSTER_POSITIONS: [Slot; 7] = [
    Slot::Qb,
    Slot::Rb,
    Slot::Wr,
    Slot::Te,
    Slot::Flex,
    Slot::DefenseSt,
    Slot::Kicker,
];

impl Slot {
    /// Map an ESPN lineup/eligible slot id.
    pub fn from_espn_id(id: u16) -> Self {
        match id {
            0 => Slot::Qb,
            2 => Slot::Rb,
            4 => Slot::Wr,
            6 => Slot::Te,
            16 => Slot::DefenseSt,
            17 => Slot::Kicker,
            20 => Slot::Bench,
            21 => Slot::InjuredReserve,
            23 => Slot::Flex,
            other => Slot::Other(other),
        }
    }

    /// Map an ESPN `defaultPositionId`, which uses its own numbering.
    pub fn from_position_id(id: u16) -> Self {
        match id {
            1 => Slot::Qb,
            2 => Slot::Rb,
            3 => Slot::Wr,
            4 => Slot::Te,
            5 => Slot::Kicker,
            16 => Slot::DefenseSt,
            other => Slot::Other(other),
        }
    }

    /// ESPN slot id, as used in free-agent filters.
    pub fn espn_id(&self) -> u16 {
        match self {
            Slot::Qb => 0,
            Slot::Rb => 2,
            Slot::Wr => 4,
            Slot::Te => 6,
            Slot::DefenseSt => 16,
            Slot::Kicker => 17,
            Slot::Bench => 20,
            Slot::InjuredReserve => 21,
            Slot::Flex => 23,
            Slot::Other(id) => *id,
        }
    }

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            Slot::Qb => "QB",
            Slot::Rb => "RB",
            Slot::Wr => "WR",
            Slot::Te => "TE",
            Slot::Flex => "FLEX",
            Slot::DefenseSt => "D/ST",
            Slot::Kicker => "K",
            Slot::Bench => "BE",
            Slot::InjuredReserve => "IR",
            Slot::Other(id) => match id {
                1 => "TQB",
                3 => "RB/WR",
                5 => "WR/TE",
                7 => "OP",
                8 => "DT",
                9 => "DE",
                10 => "LB",
                11 => "DL",
                12 => "CB",
                13 => "S",
                14 => "DB",
                15 => "DP",
                18 => "P",
                19 => "HC",
                24 => "ER",
                _ => "-",
            },
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Abbreviation for an ESPN `proTeamId`.
pub fn pro_team_abbrev(id: u16) -> &'static str {
    match id {
        1 => "ATL",
        2 => "BUF",
        3 => "CHI",
        4 => "CIN",
        5 => "CLE",
        6 => "DAL",
        7 => "DEN",
        8 => "DET",
        9 => "GB",
        10 => "TEN",
        11 => "IND",
        12 => "KC",
        13 => "LV",
        14 => "LAR",
        15 => "MIA",
        16 => "MIN",
        17 => "NE",
        18 => "NO",
        19 => "NYG",
        20 => "NYJ",
        21 => "PHI",
        22 => "ARI",
        23 => "PIT",
        24 => "LAC",
        25 => "SF",
        26 => "SEA",
        27 => "TB",
        28 => "WSH",
        29 => "CAR",
        30 => "JAX",
        33 => "BAL",
        34 => "HOU",
        _ => "FA",
    }
}

/// A player as of the current fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    /// Default position.
    pub position: Slot,
    /// Pro team abbreviation.
    pub pro_team: String,
    /// Slot the player currently occupies (bench and IR included).
    pub lineup_slot: Slot,
    /// Slots the player may occupy.
    pub eligible_slots: BTreeSet<Slot>,
    /// Season-to-date fantasy points.
    pub total_points: f64,
    /// Projected season fantasy points.
    pub projected_points: f64,
}

impl Player {
    /// Whether the player may be placed in `slot`.
    pub fn is_eligible(&self, slot: Slot) -> bool {
        self.eligible_slots.contains(&slot)
    }

    /// Season points per week, 0 before week one.
    pub fn average_points(&self, current_week: u32) -> f64 {
        if current_week == 0 {
            0.0
        } else {
            self.total_points / f64::from(current_week)
        }
    }
}

/// A fantasy team and its roster, in provider order.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub roster: Vec<Player>,
}

/// One season's league snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct League {
    pub id: i64,
    pub year: u16,
    /// Current scoring period; the divisor for weekly averages.
    pub current_week: u32,
    pub teams: Vec<Team>,
}

impl League {
    /// First team whose name matches exactly.
    pub fn find_team(&self, name: &str) -> Result<&Team> {
        self.teams
            .iter()
            .find(|team| team.name == name)
            .ok_or_else(|| AdvisorError::TeamNotFound {
                name: name.to_string(),
                available: self
                    .teams
                    .iter()
                    .map(|t| format!("'{}'", t.name))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Every team other than `mine`, in provider order.
    pub fn opponents<'a>(&'a self, mine: &'a Team) -> impl Iterator<Item = &'a Team> + 'a {
        self.teams.iter().filter(move |team| team.id != mine.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, name: &str) -> Team {
        Team {
            id,
            name: name.to_string(),
            roster: Vec::new(),
        }
    }

    #[test]
    fn test_slot_ids_round_trip_for_known_slots() {
        for slot in ROSTER_POSITIONS {
            assert_eq!(Slot::from_espn_id(slot.espn_id()), slot);
        }
        assert_eq!(Slot::from_espn_id(23), Slot::Flex);
        assert_eq!(Slot::from_espn_id(7).label(), "OP");
    }

    #[test]
    fn test_position_ids_differ_from_slot_ids() {
        assert_eq!(Slot::from_position_id(1), Slot::Qb);
        assert_eq!(Slot::from_position_id(3), Slot::Wr);
        assert_eq!(Slot::from_position_id(5), Slot::Kicker);
        assert_eq!(Slot::from_espn_id(3), Slot::Other(3));
    }

    #[test]
    fn test_average_points_guards_week_zero() {
        let player = Player {
            name: "Josh Allen".to_string(),
            position: Slot::Qb,
            pro_team: "BUF".to_string(),
            lineup_slot: Slot::Qb,
            eligible_slots: BTreeSet::from([Slot::Qb]),
            total_points: 250.0,
            projected_points: 380.0,
        };
        assert_eq!(player.average_points(0), 0.0);
        assert_eq!(player.average_points(10), 25.0);
    }

    #[test]
    fn test_find_team_first_match_and_missing() {
        let league = League {
            id: 1,
            year: 2024,
            current_week: 3,
            teams: vec![team(1, "Rival"), team(2, "My Team"), team(3, "My Team")],
        };
        assert_eq!(league.find_team("My Team").unwrap().id, 2);

        let err = league.find_team("Nobody").unwrap_err();
        assert!(matches!(err, AdvisorError::TeamNotFound { .. }));
        assert!(err.to_string().contains("'Rival'"));
    }

    #[test]
    fn test_opponents_exclude_my_team() {
        let league = League {
            id: 1,
            year: 2024,
            current_week: 1,
            teams: vec![team(1, "A"), team(2, "Mine"), team(3, "B")],
        };
        let mine = league.find_team("Mine").unwrap();
        let names: Vec<_> = league.opponents(mine).map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
