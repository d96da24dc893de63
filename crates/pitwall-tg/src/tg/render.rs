//! Monospace tables sent as replies.

use crate::fantasy::{LeagueStanding, PickedPlayer};
use crate::util::table::Table;
use teloxide::utils::html;

pub(crate) fn standing_table(standing: &LeagueStanding) -> Table {
    let mut table = Table::new(["#", "User", "Team", "Score"]);

    for (rank, entrant) in standing.entrants.iter().enumerate() {
        table.row([
            (rank + 1).to_string(),
            entrant.user.username.clone(),
            entrant.team_name.clone(),
            entrant.score.to_string(),
        ]);
    }

    table
}

pub(crate) fn team_table(players: &[PickedPlayer]) -> Table {
    let mut table = Table::new(["Name", "Team", "Score"]);

    for player in players {
        let name = match &player.position {
            Some(position) => format!("{} ({position})", player.player_name),
            None => player.player_name.clone(),
        };

        table.row([name, player.team_name.clone(), player.score.to_string()]);
    }

    table
}

/// Wraps the table into `<pre>` so that telegram renders it with monospace font
pub(crate) fn html_pre(table: &Table) -> String {
    html::code_block(&table.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fantasy::{LeaderboardEntrant, User};
    use expect_test::expect;

    fn standing() -> LeagueStanding {
        let entrant = |id: &str, username: &str, team_name: &str, score| LeaderboardEntrant {
            user: User {
                id: id.to_owned(),
                username: username.to_owned(),
            },
            score,
            team_name: team_name.to_owned(),
        };

        LeagueStanding {
            entrants: vec![
                entrant("a-1", "alice", "Box Box", 250.0),
                entrant("b-2", "bob", "Undercut", 199.5),
            ],
        }
    }

    #[test]
    fn league_standing() {
        expect![[r#"
            +---+-------+----------+-------+
            | # | User  | Team     | Score |
            +---+-------+----------+-------+
            | 1 | alice | Box Box  | 250   |
            | 2 | bob   | Undercut | 199.5 |
            +---+-------+----------+-------+"#]]
        .assert_eq(&standing_table(&standing()).to_string());
    }

    #[test]
    fn race_standing_has_race_title() {
        let table = standing_table(&standing()).title("Sakhir");

        expect![[r#"
            +------------------------------+
            | Sakhir                       |
            +---+-------+----------+-------+
            | # | User  | Team     | Score |
            +---+-------+----------+-------+
            | 1 | alice | Box Box  | 250   |
            | 2 | bob   | Undercut | 199.5 |
            +---+-------+----------+-------+"#]]
        .assert_eq(&table.to_string());
    }

    #[test]
    fn picked_team() {
        let players = [
            PickedPlayer {
                player_id: 11,
                player_name: "Max Verstappen".to_owned(),
                team_name: "Red Bull".to_owned(),
                position: Some("Driver".to_owned()),
                score: 33.0,
            },
            PickedPlayer {
                player_id: 101,
                player_name: "RBR".to_owned(),
                team_name: "Red Bull".to_owned(),
                position: None,
                score: 40.5,
            },
        ];

        let table = team_table(&players).title("Jeddah: alice");

        expect![[r#"
            +--------------------------------------------+
            | Jeddah: alice                              |
            +-------------------------+----------+-------+
            | Name                    | Team     | Score |
            +-------------------------+----------+-------+
            | Max Verstappen (Driver) | Red Bull | 33    |
            | RBR                     | Red Bull | 40.5  |
            +-------------------------+----------+-------+"#]]
        .assert_eq(&table.to_string());
    }

    #[test]
    fn html_is_escaped() {
        let mut table = Table::new(["User"]);
        table.row(["<b>&</b>"]);

        expect![[r#"
            <pre>+----------+
            | User     |
            +----------+
            | &lt;b&gt;&amp;&lt;/b&gt; |
            +----------+</pre>"#]]
        .assert_eq(&html_pre(&table));
    }
}
