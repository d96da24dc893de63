//! Telegram commands root module

mod cmd;
mod echo;
mod reminders;
mod render;

use crate::fantasy::{FantasyService, PlayerNames};
use crate::prelude::*;
use crate::Result;
use dptree::di::DependencyMap;
use reminders::Reminders;
use std::sync::Arc;
use teloxide::adaptors::{CacheMe, DefaultParseMode, Throttle, Trace};
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;

pub(crate) type Bot = Trace<CacheMe<DefaultParseMode<Throttle<teloxide::Bot>>>>;

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) token: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config").field("token", &"<redacted>").finish()
    }
}

/// Errors caused by the user input. Their message is shown in the chat.
#[derive(Debug, thiserror::Error)]
pub(crate) enum UserError {
    #[error("Usage: /last_gp_team <username>")]
    MissingUsername,

    #[error("There is no user `{username}` in the league")]
    UnknownLeagueMember { username: String },

    #[error("Usage: /remind_before_gp <minutes>")]
    InvalidReminderLead { input: String },

    #[error("Sorry, we can't go back to the future!")]
    NegativeReminderLead,

    #[error("It's too late, the {race} GP starts sooner than that")]
    ReminderTooLate { race: String },
}

pub(crate) struct Ctx {
    bot: Bot,
    fantasy: FantasyService,
    player_names: PlayerNames,
    reminders: Reminders,
}

pub(crate) struct RunBotOptions {
    pub(crate) tg_cfg: Config,
    pub(crate) fantasy: FantasyService,
    pub(crate) player_names: PlayerNames,
}

pub(crate) async fn run_bot(opts: RunBotOptions) -> Result {
    let mut di = DependencyMap::new();

    let bot: Bot = teloxide::Bot::new(opts.tg_cfg.token)
        .throttle(Default::default())
        .parse_mode(ParseMode::Html)
        .cache_me()
        .trace(teloxide::adaptors::trace::Settings::all());

    di.insert(Arc::new(Ctx {
        bot: bot.clone(),
        fantasy: opts.fantasy,
        player_names: opts.player_names,
        reminders: Reminders::default(),
    }));

    info!("Starting bot...");

    bot.set_my_commands(cmd::regular::Cmd::bot_commands())
        .await?;

    let handler = dptree::entry()
        .inspect(|update: Update| {
            let kind = update.kind.discriminator();
            metrics::counter!("tg_updates_total", "kind" => kind).increment(1);
            trace!(target: "tg_update", update = ?update, "Received update");
        })
        .branch(
            Update::filter_message()
                .filter_command::<cmd::regular::Cmd>()
                .endpoint(cmd::handle::<cmd::regular::Cmd>()),
        )
        .branch(
            Update::filter_message()
                .filter_command::<cmd::StartCommand>()
                .filter(|msg: Message| msg.chat.is_private())
                .endpoint(cmd::handle::<cmd::StartCommand>()),
        )
        .branch(
            Update::filter_message()
                .chain(dptree::filter_map(echo::filter))
                .endpoint(echo::handle),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(di)
        // We don't handle all possible messages that users send,
        // so to suppress the warning that we don't do this we have
        // a noop default handler here
        .default_handler(|_| std::future::ready(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");

    Ok(())
}
