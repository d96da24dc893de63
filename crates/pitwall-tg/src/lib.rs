mod config;
mod error;
mod fantasy;
mod http;
mod liveness;
mod observability;
mod session;
mod tg;
mod watchdog;

pub mod util;

pub use crate::error::{Error, Result};
pub use config::{Config, ConfigError};
pub use observability::*;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Starts the background services, logs in to the Fantasy website and runs
/// the telegram bot processing loop until it's stopped.
pub async fn run(config: Config, metrics: MetricsHandle) -> Result {
    use crate::prelude::*;

    // The watchdog is started first, so that a hanging startup is also
    // interrupted by the reboot
    let _watchdog = watchdog::spawn(&config.watchdog);
    let _liveness = liveness::spawn(&config.liveness, metrics).await?;

    let cookie = session::acquire(&config.session).await?;

    let client = fantasy::FantasyClient::new(
        http::create_client()?,
        config.fantasy.api_url.clone(),
        &cookie,
    )?;

    let fantasy = fantasy::FantasyService::new(client, &config.fantasy);

    let player_names = fantasy.player_names().await.unwrap_or_else(|err| {
        warn!(
            err = tracing_err(&err),
            "Failed to load player names, display names will be used instead"
        );
        fantasy::PlayerNames::default()
    });

    info!(count = player_names.len(), "Loaded player names");

    let opts = tg::RunBotOptions {
        tg_cfg: config.tg,
        fantasy,
        player_names,
    };

    tg::run_bot(opts).await
}
