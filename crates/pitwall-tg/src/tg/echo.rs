use crate::prelude::*;
use crate::tg;
use crate::util::DynResult;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::html;

/// Plain text in a private chat with the bot that is not a command
pub(crate) fn filter(msg: Message) -> Option<String> {
    if !msg.chat.is_private() {
        return None;
    }
    msg.text()
        .filter(|text| !text.starts_with('/'))
        .map(ToOwned::to_owned)
}

#[instrument(skip_all, fields(chat = %msg.chat.debug_id()))]
pub(crate) async fn handle(ctx: Arc<tg::Ctx>, msg: Message, text: String) -> DynResult {
    debug!("Echoing the message");
    ctx.bot.reply_to(&msg, html::escape(&text)).await?;
    Ok(())
}
