use chrono::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub(crate) enum RaceStatus {
    Completed,
    Scheduled,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Race {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) starts_at: DateTime<Utc>,
    pub(crate) status: RaceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LeagueStanding {
    pub(crate) entrants: Vec<LeaderboardEntrant>,
}

impl LeagueStanding {
    /// Looks up a league member ignoring the case and the leading `@`
    pub(crate) fn find_user(&self, username: &str) -> Option<&User> {
        let username = username.trim().trim_start_matches('@');
        self.entrants
            .iter()
            .map(|entrant| &entrant.user)
            .find(|user| user.username.eq_ignore_ascii_case(username))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LeaderboardEntrant {
    pub(crate) user: User,
    pub(crate) score: f64,
    pub(crate) team_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PickedPlayer {
    pub(crate) player_id: u32,
    pub(crate) player_name: String,
    pub(crate) team_name: String,
    pub(crate) position: Option<String>,
    pub(crate) score: f64,
}

/// Maps the short display names of the drivers and constructors to their
/// full names. It is loaded once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub(crate) struct PlayerNames {
    full_names: HashMap<String, String>,
}

impl PlayerNames {
    /// Falls back to the display name itself when it is unknown
    pub(crate) fn full_name<'a>(&'a self, display_name: &'a str) -> &'a str {
        self.full_names
            .get(display_name)
            .map(String::as_str)
            .unwrap_or(display_name)
    }

    pub(crate) fn len(&self) -> usize {
        self.full_names.len()
    }
}

impl FromIterator<(String, String)> for PlayerNames {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            full_names: iter.into_iter().collect(),
        }
    }
}

/// Last race that has already started before `now` and has its results
pub(crate) fn last_completed_race(races: &[Race], now: DateTime<Utc>) -> Option<&Race> {
    races
        .iter()
        .filter(|race| race.starts_at < now && race.status == RaceStatus::Completed)
        .max_by_key(|race| race.starts_at)
}

/// Closest scheduled race that starts after `now`
pub(crate) fn next_race(races: &[Race], now: DateTime<Utc>) -> Option<&Race> {
    races
        .iter()
        .filter(|race| race.starts_at > now && race.status == RaceStatus::Scheduled)
        .min_by_key(|race| race.starts_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race(id: u32, starts_at: &str, status: RaceStatus) -> Race {
        Race {
            id,
            name: format!("Race {id}"),
            starts_at: starts_at.parse().unwrap(),
            status,
        }
    }

    fn season() -> Vec<Race> {
        vec![
            race(1, "2022-03-20T15:00:00Z", RaceStatus::Completed),
            race(3, "2022-04-10T13:00:00Z", RaceStatus::Completed),
            race(2, "2022-03-27T17:00:00Z", RaceStatus::Completed),
            race(5, "2022-05-08T19:30:00Z", RaceStatus::Scheduled),
            race(4, "2022-04-24T13:00:00Z", RaceStatus::Scheduled),
        ]
    }

    #[test]
    fn picks_the_latest_completed_race() {
        let races = season();
        let now = "2022-04-20T00:00:00Z".parse().unwrap();

        assert_eq!(last_completed_race(&races, now).map(|race| race.id), Some(3));
        assert_eq!(next_race(&races, now).map(|race| race.id), Some(4));
    }

    #[test]
    fn race_that_started_but_has_no_results_is_not_completed() {
        let races = vec![
            race(1, "2022-03-20T15:00:00Z", RaceStatus::Completed),
            race(2, "2022-03-27T17:00:00Z", RaceStatus::Scheduled),
        ];
        let now = "2022-03-27T18:00:00Z".parse().unwrap();

        assert_eq!(last_completed_race(&races, now).map(|race| race.id), Some(1));
        assert_eq!(next_race(&races, now), None);
    }

    #[test]
    fn nothing_is_completed_before_the_season() {
        let races = season();
        let now = "2022-01-01T00:00:00Z".parse().unwrap();

        assert_eq!(last_completed_race(&races, now), None);
        assert_eq!(next_race(&races, now).map(|race| race.id), Some(4));
    }

    #[test]
    fn find_user_ignores_case_and_at_sign() {
        let standing = LeagueStanding {
            entrants: vec![LeaderboardEntrant {
                user: User {
                    id: "guid-1".to_owned(),
                    username: "MaxFan33".to_owned(),
                },
                score: 120.0,
                team_name: "Orange Army".to_owned(),
            }],
        };

        assert_eq!(
            standing.find_user("@maxfan33").map(|user| user.id.as_str()),
            Some("guid-1")
        );
        assert_eq!(standing.find_user("someone"), None);
    }

    #[test]
    fn unknown_player_names_are_kept_verbatim() {
        let names: PlayerNames = [("VER".to_owned(), "Max Verstappen".to_owned())]
            .into_iter()
            .collect();

        assert_eq!(names.full_name("VER"), "Max Verstappen");
        assert_eq!(names.full_name("HAM"), "HAM");
    }
}
