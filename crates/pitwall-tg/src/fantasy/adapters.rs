//! Pure functions that turn the raw response bodies into [`records`](super::records).

use super::records::{
    LeaderboardEntrant, LeagueStanding, PickedPlayer, PlayerNames, Race, RaceStatus, User,
};
use super::{api, DecodeError};
use chrono::prelude::*;
use serde::de::DeserializeOwned;

const SESSION_START_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

fn from_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(body).map_err(|source| DecodeError::Json {
        body: String::from_utf8_lossy(body).into_owned(),
        source,
    })
}

fn to_race_status(match_status: &str) -> RaceStatus {
    match match_status {
        "1" => RaceStatus::Completed,
        "0" => RaceStatus::Scheduled,
        _ => RaceStatus::Unknown,
    }
}

fn to_race(period: api::GamePeriod) -> Result<Race, DecodeError> {
    let starts_at =
        NaiveDateTime::parse_from_str(&period.session_start_date, SESSION_START_DATE_FORMAT)
            .map_err(|err| DecodeError::InvalidValue {
                field: "SessionStartDate",
                value: period.session_start_date.clone(),
                source: Box::new(err),
            })?;

    Ok(Race {
        id: period.race_id,
        name: period.meeting_location,
        starts_at: Utc.from_utc_datetime(&starts_at),
        status: to_race_status(&period.match_status),
    })
}

/// Only the main race of each weekend is kept. Qualifying and sprints
/// are game periods too, but they have no standing of their own.
pub(crate) fn to_races(body: &[u8]) -> Result<Vec<Race>, DecodeError> {
    from_json::<api::DataEnvelope<api::GamePeriod>>(body)?
        .into_values()
        .into_iter()
        .filter(|period| period.session_type == "Race")
        .map(to_race)
        .collect()
}

pub(crate) fn to_league_standing(body: &[u8]) -> Result<LeagueStanding, DecodeError> {
    let response: api::LeaderboardResponse = from_json(body)?;

    let entrants = response
        .leaderboard
        .leaderboard_entrants
        .into_iter()
        .map(|entrant| LeaderboardEntrant {
            user: User {
                id: entrant.guid,
                username: entrant.user_name,
            },
            score: entrant.score,
            team_name: entrant.team_name,
        })
        .collect();

    Ok(LeagueStanding { entrants })
}

pub(crate) fn to_picked_players(
    names: &PlayerNames,
) -> impl FnOnce(&[u8]) -> Result<Vec<PickedPlayer>, DecodeError> + '_ {
    move |body| {
        let players = from_json::<api::DataEnvelope<api::PickedPlayer>>(body)?
            .into_values()
            .into_iter()
            .map(|player| PickedPlayer {
                player_id: player.player_id,
                player_name: names.full_name(&player.display_name).to_owned(),
                team_name: player.team_name,
                position: player.position,
                score: player.gameday_points,
            })
            .collect();

        Ok(players)
    }
}

/// Drivers without a full name are skipped, their display name is used as is
pub(crate) fn to_player_names(body: &[u8]) -> Result<PlayerNames, DecodeError> {
    let names = from_json::<api::DataEnvelope<api::Driver>>(body)?
        .into_values()
        .into_iter()
        .filter_map(|driver| Some((driver.display_name, driver.full_name?)))
        .collect();

    Ok(names)
}
