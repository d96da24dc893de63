//! Client of the F1 Fantasy JSON API.
//!
//! [`client`] knows how to make an authenticated request, [`api`] describes
//! the vendor's JSON, [`adapters`] reshape it into [`records`] and
//! [`service`] ties it all into the operations the bot needs.

mod adapters;
mod api;
mod client;
mod records;
mod service;

pub(crate) use client::FantasyClient;
pub(crate) use records::*;
pub(crate) use service::FantasyService;

use crate::util::DynError;
use url::Url;

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) api_url: Url,
    pub(crate) league_id: String,
    pub(crate) season: u16,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FantasyError {
    #[error("There are no completed races")]
    NoCompletedRace,

    #[error("There are no upcoming races")]
    NoUpcomingRace,
}

/// The response arrived, but its body doesn't look like what we expect
#[derive(Debug, thiserror::Error)]
pub(crate) enum DecodeError {
    #[error("Unexpected JSON shape of the response body:\n{body}")]
    Json {
        body: String,
        source: serde_json::Error,
    },

    #[error("Invalid value in the field `{field}`: {value}")]
    InvalidValue {
        field: &'static str,
        value: String,
        source: Box<DynError>,
    },
}
