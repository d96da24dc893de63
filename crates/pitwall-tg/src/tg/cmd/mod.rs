pub(crate) mod regular;

use crate::prelude::*;
use crate::util::DynResult;
use crate::{tg, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use teloxide::macros::BotCommands;
use teloxide::types::{Message, User};
use teloxide::utils::html;

#[async_trait]
pub(crate) trait Command: fmt::Debug + Send + Sync + 'static {
    /// Short name of the command used as a metric label
    fn name(&self) -> &'static str;

    /// What to tell the user if the command fails not by their fault.
    /// The details of the error are not shown to them.
    fn failure_reply(&self) -> &'static str {
        "It wasn't possible to process the command"
    }

    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result;
}

pub(crate) fn handle<'a, C: Command>(
) -> impl Fn(Arc<tg::Ctx>, Message, C) -> BoxFuture<'a, DynResult> {
    move |ctx, msg, cmd| {
        let info = info_span!(
            "handle_message",
            sender = msg.from.as_ref().map(User::debug_id).as_deref(),
            msg_text = msg.text(),
            chat = %msg.chat.debug_id(),
            cmd = format_args!("{cmd:#?}")
        );

        let fut = async move {
            debug!("Processing command");

            let name = cmd.name();
            let failure_reply = cmd.failure_reply();

            let result = cmd.handle(&ctx, &msg).await;

            let label = match &result {
                Ok(()) => "ok",
                Err(err) if err.is_user_error() => "user_error",
                Err(_) => "err",
            };

            metrics::counter!("tg_commands_total", "command" => name, "result" => label)
                .increment(1);

            if let Err(err) = &result {
                let span = warn_span!("err", err = tracing_err(err), id = err.id());
                async {
                    let reply = if err.is_user_error() {
                        err.kind().to_string()
                    } else {
                        warn!("Command handler returned an error");
                        format!("{failure_reply} (error id: {})", err.id())
                    };

                    let msg_result = ctx.bot.reply_to(&msg, html::escape(&reply)).await;

                    if let Err(err) = msg_result {
                        warn!(
                            err = tracing_err(&err),
                            "Failed to reply with the error message to the user"
                        );
                    }
                }
                .instrument(span)
                .await;
            }
            result.map_err(Into::into)
        };

        Box::pin(fut.instrument(info))
    }
}

/// Special case for the `/start` command in PM with the bot.
///
/// We don't want this command to appear in the help message, so we handle
/// it separately
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case")]
pub(crate) enum StartCommand {
    #[command(description = "unreachable")]
    Start,
}

#[async_trait]
impl Command for StartCommand {
    fn name(&self) -> &'static str {
        "start"
    }

    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        regular::Cmd::Help.handle(ctx, msg).await
    }
}
