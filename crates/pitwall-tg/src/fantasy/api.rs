//! Shapes of the JSON returned by the Fantasy API. Only the fields we use
//! are listed here.
//!
//! The API is inconsistent about numbers: some of them come as JSON numbers
//! and some as strings, so they are parsed leniently.

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

/// `{ "Data": { "Value": [...] } }` envelope used by the feeds and the
/// legacy `/services` endpoints.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DataEnvelope<T> {
    pub(crate) data: DataValue<T>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DataValue<T> {
    pub(crate) value: Vec<T>,
}

impl<T> DataEnvelope<T> {
    pub(crate) fn into_values(self) -> Vec<T> {
        self.data.value
    }
}

#[serde_as]
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GamePeriod {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub(crate) race_id: u32,
    pub(crate) meeting_location: String,
    pub(crate) session_start_date: String,
    pub(crate) session_type: String,
    pub(crate) match_status: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct LeaderboardResponse {
    pub(crate) leaderboard: Leaderboard,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Leaderboard {
    pub(crate) leaderboard_entrants: Vec<LeaderboardEntrant>,
}

#[serde_as]
#[derive(Deserialize, Debug)]
pub(crate) struct LeaderboardEntrant {
    pub(crate) guid: String,

    #[serde(rename = "userName")]
    pub(crate) user_name: String,

    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub(crate) score: f64,

    pub(crate) team_name: String,
}

#[serde_as]
#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PickedPlayer {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub(crate) player_id: u32,
    pub(crate) display_name: String,
    pub(crate) team_name: String,

    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub(crate) gameday_points: f64,

    #[serde(default)]
    pub(crate) position: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Driver {
    pub(crate) display_name: String,

    // The typo is part of the feed, but it may get fixed one day
    #[serde(rename = "FUllName", alias = "FullName", default)]
    pub(crate) full_name: Option<String>,
}
