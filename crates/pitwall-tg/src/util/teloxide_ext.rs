use easy_ext::ext;
use teloxide::requests::Requester;
use teloxide::types::{Chat, Message, ReplyParameters, UpdateKind, User};

pub(crate) mod prelude {
    pub(crate) use super::{ChatExt as _, UpdateKindExt as _, UserExt as _, UtilRequesterExt as _};
}

#[ext(UserExt)]
pub(crate) impl User {
    fn username(&self) -> String {
        self.username.clone().unwrap_or_else(|| self.full_name())
    }

    fn debug_id(&self) -> String {
        format!("{} ({})", self.username(), self.id)
    }
}

#[ext(ChatExt)]
pub(crate) impl Chat {
    fn debug_id(&self) -> String {
        let title = self
            .title()
            .or_else(|| self.username())
            .unwrap_or("{unknown_chat_title}");

        format!("{title} ({})", self.id)
    }
}

/// There is [`teloxide::prelude::RequesterExt`]. We name this symbol
/// different to avoid collisions.
#[ext(UtilRequesterExt)]
pub(crate) impl<T: Requester> T {
    /// Reply to the message, but don't fail if the original message was deleted.
    fn reply_to(&self, msg: &Message, text: impl Into<String>) -> T::SendMessage {
        use teloxide::payloads::SendMessageSetters;

        self.send_message(msg.chat.id, text)
            .reply_parameters(ReplyParameters::new(msg.id).allow_sending_without_reply())
    }
}

#[ext(UpdateKindExt)]
pub(crate) impl UpdateKind {
    fn discriminator(&self) -> &'static str {
        match self {
            UpdateKind::Message(_) => "Message",
            UpdateKind::EditedMessage(_) => "EditedMessage",
            UpdateKind::ChannelPost(_) => "ChannelPost",
            UpdateKind::EditedChannelPost(_) => "EditedChannelPost",
            UpdateKind::InlineQuery(_) => "InlineQuery",
            UpdateKind::ChosenInlineResult(_) => "ChosenInlineResult",
            UpdateKind::CallbackQuery(_) => "CallbackQuery",
            UpdateKind::MyChatMember(_) => "MyChatMember",
            UpdateKind::ChatMember(_) => "ChatMember",
            UpdateKind::Error(_) => "Error",
            _ => "Other",
        }
    }
}
