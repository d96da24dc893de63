use crate::error::err;
use crate::prelude::*;
use crate::tg::{self, render, UserError};
use crate::Result;
use async_trait::async_trait;
use chrono::prelude::*;
use futures::FutureExt as _;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;

#[derive(BotCommands, Clone, Debug, strum::IntoStaticStr)]
#[command(
    rename_rule = "snake_case",
    description = "I can help you with F1 Fantasy information. My commands are:"
)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Cmd {
    #[command(description = "show this message")]
    Help,

    #[command(description = "get F1 Fantasy league standing")]
    Standing,

    #[command(description = "get F1 Fantasy standing of the last GP")]
    LastGpStanding,

    #[command(description = "show the team a league member picked for the last GP: <username>")]
    LastGpTeam(String),

    #[command(description = "remind about the next GP some minutes before it starts: <minutes>")]
    RemindBeforeGp(String),

    #[command(description = "cancel the reminder about the next GP")]
    CancelReminder,
}

#[async_trait]
impl tg::cmd::Command for Cmd {
    fn name(&self) -> &'static str {
        self.into()
    }

    fn failure_reply(&self) -> &'static str {
        match self {
            Cmd::Help | Cmd::CancelReminder => "It wasn't possible to process the command",
            Cmd::Standing | Cmd::LastGpStanding => "It wasn't possible to retrieve the standing",
            Cmd::LastGpTeam(_) => "It wasn't possible to retrieve the team",
            Cmd::RemindBeforeGp(_) => "It wasn't possible to set the reminder",
        }
    }

    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        let tg::Ctx {
            bot,
            fantasy,
            player_names,
            reminders,
        } = ctx;

        let now = Utc::now();

        let reply = match self {
            Cmd::Help => html::escape(&Cmd::descriptions().to_string()),
            Cmd::Standing => {
                let standing = fantasy.league_standing().await?;
                render::html_pre(&render::standing_table(&standing))
            }
            Cmd::LastGpStanding => {
                let race = fantasy.last_completed_race(now).await?;
                let standing = fantasy.race_standing(race.id).await?;
                render::html_pre(&render::standing_table(&standing).title(race.name))
            }
            Cmd::LastGpTeam(username) => {
                let username = username.trim();
                if username.is_empty() {
                    return Err(err!(UserError::MissingUsername));
                }

                let race = fantasy.last_completed_race(now).await?;
                let standing = fantasy.league_standing().await?;

                let user = standing.find_user(username).ok_or_else(|| {
                    err!(UserError::UnknownLeagueMember {
                        username: username.to_owned()
                    })
                })?;

                let players = fantasy
                    .picked_players(race.id, &user.id, player_names)
                    .await?;

                let title = format!("{}: {}", race.name, user.username);
                render::html_pre(&render::team_table(&players).title(title))
            }
            Cmd::RemindBeforeGp(minutes) => {
                let minutes = parse_lead_minutes(&minutes)?;
                let race = fantasy.next_race(now).await?;

                let lead = Duration::from_secs(minutes.saturating_mul(60));

                let delay = tg::reminders::delay_until(race.starts_at, lead, now).ok_or_else(|| {
                    err!(UserError::ReminderTooLate {
                        race: race.name.clone()
                    })
                })?;

                let chat_id = msg.chat.id;
                let reminder = send_reminder(bot.clone(), chat_id, race.name.clone(), minutes);
                let replaced = reminders.schedule(chat_id, delay, reminder.boxed());

                info!(
                    race = %race.name,
                    minutes,
                    replaced,
                    delay = format_args!("{delay:?}"),
                    "Scheduled a reminder"
                );

                let mut reply = format!(
                    "Reminder successfully set! I will ping you {minutes} minutes \
                    before the {} GP starts.",
                    race.name
                );
                if replaced {
                    reply.push_str(" Old one was removed.");
                }
                html::escape(&reply)
            }
            Cmd::CancelReminder => {
                let reply = if reminders.cancel(msg.chat.id) {
                    "Reminder cancelled"
                } else {
                    "There is no reminder to cancel"
                };
                reply.to_owned()
            }
        };

        bot.reply_to(msg, reply).await?;

        Ok(())
    }
}

fn parse_lead_minutes(input: &str) -> Result<u64> {
    let input = input.trim();
    let minutes: i64 = input.parse().map_err(|_| {
        err!(UserError::InvalidReminderLead {
            input: input.to_owned()
        })
    })?;

    u64::try_from(minutes).map_err(|_| err!(UserError::NegativeReminderLead))
}

async fn send_reminder(bot: tg::Bot, chat_id: ChatId, race: String, minutes: u64) {
    metrics::counter!("reminders_fired_total").increment(1);

    let text = format!(
        "The {race} GP starts in {minutes} minutes! \
        Don't forget to check your team."
    );

    if let Err(err) = bot.send_message(chat_id, html::escape(&text)).await {
        warn!(err = tracing_err(&err), "Failed to send the reminder");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    fn parse(text: &str) -> Cmd {
        Cmd::parse(text, "pitwall_bot").unwrap()
    }

    #[test]
    fn parses_commands_with_arguments() {
        expect![[r#"
            [
                Standing,
                LastGpStanding,
                LastGpTeam(
                    "alice",
                ),
                RemindBeforeGp(
                    "30",
                ),
                CancelReminder,
            ]
        "#]]
        .assert_debug_eq(&[
            parse("/standing"),
            parse("/last_gp_standing@pitwall_bot"),
            parse("/last_gp_team alice"),
            parse("/remind_before_gp 30"),
            parse("/cancel_reminder"),
        ]);
    }

    #[test]
    fn command_names_are_snake_case() {
        let cmd = parse("/remind_before_gp 30");
        assert_eq!(tg::cmd::Command::name(&cmd), "remind_before_gp");
    }

    #[test]
    fn lead_minutes() {
        assert_eq!(parse_lead_minutes(" 15 ").unwrap(), 15);

        let message = |input| parse_lead_minutes(input).unwrap_err().kind().to_string();

        expect!["Sorry, we can't go back to the future!"].assert_eq(&message("-5"));
        expect!["Usage: /remind_before_gp <minutes>"].assert_eq(&message("soon"));
        expect!["Usage: /remind_before_gp <minutes>"].assert_eq(&message(""));
    }
}
