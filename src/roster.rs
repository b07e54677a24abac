//! Fixed-width roster tables for prompts.

use crate::league::Player;

/// Text used in place of a table when there are no players.
pub const EMPTY_TABLE: &str = "None";

/// Format players as a table: header, dash rule, then one row per player in
/// input order. Text columns are cut to their width so every row lines up.
///
/// The average column is season points divided by `current_week`, or 0
/// before the first week.
pub fn format_players(players: &[Player], current_week: u32) -> String {
    if players.is_empty() {
        return EMPTY_TABLE.to_string();
    }

    let header = format!(
        "{:<20} {:<5} {:<5} {:>7} {:>7} {:>7}",
        "Name", "Pos", "Team", "Total", "Proj", "Avg"
    );
    let rule = "-".repeat(header.chars().count());

    let mut lines = Vec::with_capacity(players.len() + 2);
    lines.push(header);
    lines.push(rule);

    for player in players {
        lines.push(format!(
            "{:<20.20} {:<5.5} {:<5.5} {:>7.2} {:>7.2} {:>7.2}",
            player.name,
            player.position.label(),
            player.pro_team,
            player.total_points,
            player.projected_points,
            player.average_points(current_week)
        ));
    }

    lines.join("\n")
}
