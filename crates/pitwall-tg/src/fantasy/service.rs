use super::adapters;
use super::records::{self, LeagueStanding, PickedPlayer, PlayerNames, Race};
use super::{Config, FantasyClient, FantasyError};
use crate::error::err;
use crate::prelude::*;
use crate::Result;
use chrono::prelude::*;
use reqwest::header::HeaderMap;
use reqwest::Method;
use url::form_urlencoded;

/// Operations of the Fantasy API the bot uses. All of them are scoped to
/// the configured league and season.
#[derive(Clone)]
pub(crate) struct FantasyService {
    client: FantasyClient,
    league_id: String,
    season: u16,
}

impl FantasyService {
    pub(crate) fn new(client: FantasyClient, config: &Config) -> Self {
        Self {
            client,
            league_id: config.league_id.clone(),
            season: config.season,
        }
    }

    async fn get<T>(
        &self,
        path: &str,
        decode: impl FnOnce(&[u8]) -> Result<T, super::DecodeError>,
    ) -> Result<T> {
        self.client
            .request(Method::GET, path, HeaderMap::new(), decode)
            .await
    }

    /// Leaderboard of the league for the whole season or a single race
    fn leaderboard_path(&self, race_id: Option<u32>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("v", "1");
        if let Some(race_id) = race_id {
            query.append_pair("game_period_id", &race_id.to_string());
        }
        query.append_pair("league_id", &self.league_id);

        format!("/f1/{}/leaderboards/leagues?{}", self.season, query.finish())
    }

    pub(crate) async fn season_races(&self) -> Result<Vec<Race>> {
        debug!("Getting the season races");
        self.get("/feeds/schedule/raceday_en.json", adapters::to_races)
            .await
    }

    pub(crate) async fn last_completed_race(&self, now: DateTime<Utc>) -> Result<Race> {
        let races = self.season_races().await?;

        records::last_completed_race(&races, now)
            .cloned()
            .ok_or_else(|| err!(FantasyError::NoCompletedRace))
    }

    pub(crate) async fn next_race(&self, now: DateTime<Utc>) -> Result<Race> {
        let races = self.season_races().await?;

        records::next_race(&races, now)
            .cloned()
            .ok_or_else(|| err!(FantasyError::NoUpcomingRace))
    }

    pub(crate) async fn league_standing(&self) -> Result<LeagueStanding> {
        debug!("Getting the league standing");
        self.get(&self.leaderboard_path(None), adapters::to_league_standing)
            .await
    }

    pub(crate) async fn race_standing(&self, race_id: u32) -> Result<LeagueStanding> {
        debug!(race_id, "Getting the race standing");
        self.get(&self.leaderboard_path(Some(race_id)), adapters::to_league_standing)
            .await
    }

    pub(crate) async fn picked_players(
        &self,
        race_id: u32,
        user_id: &str,
        names: &PlayerNames,
    ) -> Result<Vec<PickedPlayer>> {
        debug!(race_id, user_id, "Getting the picked players");
        let path =
            format!("/services/user/opponentteam/opponentgamedayplayerteamget/{race_id}/{user_id}/1/1/1");
        self.get(&path, adapters::to_picked_players(names)).await
    }

    pub(crate) async fn player_names(&self) -> Result<PlayerNames> {
        debug!("Getting the player names");
        self.get("/feeds/drivers/1_en.json", adapters::to_player_names)
            .await
    }
}
