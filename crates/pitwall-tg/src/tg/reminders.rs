//! One-shot reminders about the upcoming race, at most one per chat.

use crate::prelude::*;
use chrono::prelude::*;
use futures::future::BoxFuture;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::ChatId;
use tokio::sync::oneshot;

#[derive(Default, Clone)]
pub(crate) struct Reminders {
    pending: Arc<SyncMutex<HashMap<ChatId, PendingReminder>>>,
    next_id: Arc<AtomicU64>,
}

struct PendingReminder {
    /// Distinguishes the reminder from the one that replaced it
    id: u64,
    cancel: oneshot::Sender<()>,
}

/// How long to wait until it's `lead` before `starts_at`. Returns [`None`]
/// if that moment has already passed or can't be represented.
pub(crate) fn delay_until(
    starts_at: DateTime<Utc>,
    lead: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let lead = chrono::Duration::from_std(lead).ok()?;
    starts_at
        .checked_sub_signed(lead)?
        .signed_duration_since(now)
        .to_std()
        .ok()
        .filter(|delay| !delay.is_zero())
}

impl Reminders {
    /// Runs `fire` after `delay` unless the reminder is cancelled or replaced
    /// by another one for the same chat before that. Returns `true` if there
    /// was a previous reminder in the chat and it was replaced.
    pub(crate) fn schedule(
        &self,
        chat_id: ChatId,
        delay: Duration,
        fire: BoxFuture<'static, ()>,
    ) -> bool {
        let (send, recv) = oneshot::channel::<()>();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let previous = self
            .pending
            .lock()
            .insert(chat_id, PendingReminder { id, cancel: send });

        let replaced = previous.is_some();

        if let Some(previous) = previous {
            debug!(%chat_id, previous = previous.id, "Replacing the reminder");
            // The receiver may be gone if the reminder is firing right now
            let _ = previous.cancel.send(());
        }

        let reminders = self.clone();

        let fut = async move {
            // Both the explicit cancel and the dropped sender stop the reminder
            if tokio::time::timeout(delay, recv).await.is_ok() {
                debug!("Reminder was cancelled");
                return;
            }

            // The timer may elapse right when the reminder is being replaced
            // or cancelled. The one who removes it from `pending` wins.
            if !reminders.take_if_current(chat_id, id) {
                debug!("Reminder was cancelled after its timer elapsed");
                return;
            }

            info!("Firing the reminder");
            fire.await;
        };

        tokio::spawn(fut.instrument(info_span!("reminder", %chat_id, id)));

        replaced
    }

    /// Removes the reminder with the given `id` from the chat if it's still
    /// the pending one there.
    fn take_if_current(&self, chat_id: ChatId, id: u64) -> bool {
        let mut pending = self.pending.lock();
        if !pending.get(&chat_id).is_some_and(|reminder| reminder.id == id) {
            return false;
        }
        pending.remove(&chat_id);
        true
    }

    /// Returns `false` if there was no pending reminder in the chat
    pub(crate) fn cancel(&self, chat_id: ChatId) -> bool {
        let Some(reminder) = self.pending.lock().remove(&chat_id) else {
            return false;
        };

        let _ = reminder.cancel.send(());

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt as _;

    const CHAT: ChatId = ChatId(42);
    const MINUTE: Duration = Duration::from_secs(60);

    #[derive(Default, Clone)]
    struct Fired(Arc<SyncMutex<Vec<&'static str>>>);

    impl Fired {
        fn action(&self, label: &'static str) -> BoxFuture<'static, ()> {
            let fired = self.0.clone();
            async move { fired.lock().push(label) }.boxed()
        }

        fn get(&self) -> Vec<&'static str> {
            self.0.lock().clone()
        }
    }

    #[test]
    fn delay_is_counted_back_from_the_race_start() {
        let starts_at = "2022-03-20T15:00:00Z".parse().unwrap();
        let now = "2022-03-20T12:00:00Z".parse().unwrap();

        assert_eq!(
            delay_until(starts_at, 30 * MINUTE, now),
            Some(150 * MINUTE)
        );
        assert_eq!(delay_until(starts_at, 180 * MINUTE, now), None);
        assert_eq!(delay_until(starts_at, 240 * MINUTE, now), None);
    }

    #[test]
    fn huge_lead_is_too_late_instead_of_overflow() {
        let starts_at = "2022-03-20T15:00:00Z".parse().unwrap();
        let now = "2022-03-20T12:00:00Z".parse().unwrap();

        let lead = Duration::from_secs(1_000_000_000_000 * 60);

        assert_eq!(delay_until(starts_at, lead, now), None);
        assert_eq!(delay_until(starts_at, Duration::MAX, now), None);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn fires_after_delay() {
        let reminders = Reminders::default();
        let fired = Fired::default();

        assert!(!reminders.schedule(CHAT, 10 * MINUTE, fired.action("first")));

        tokio::time::sleep(9 * MINUTE).await;
        assert_eq!(fired.get(), Vec::<&str>::new());

        tokio::time::sleep(2 * MINUTE).await;
        assert_eq!(fired.get(), ["first"]);

        // The fired reminder is no longer pending
        assert!(!reminders.cancel(CHAT));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn new_reminder_replaces_the_old_one() {
        let reminders = Reminders::default();
        let fired = Fired::default();

        assert!(!reminders.schedule(CHAT, 5 * MINUTE, fired.action("old")));
        assert!(reminders.schedule(CHAT, 10 * MINUTE, fired.action("new")));

        tokio::time::sleep(20 * MINUTE).await;
        assert_eq!(fired.get(), ["new"]);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn replaced_reminder_loses_the_race_with_its_timer() {
        let reminders = Reminders::default();
        let fired = Fired::default();

        // Ids are handed out sequentially starting from zero
        reminders.schedule(CHAT, 5 * MINUTE, fired.action("old"));
        assert!(reminders.schedule(CHAT, 10 * MINUTE, fired.action("new")));

        // The old timer elapsing after the replacement must not claim the slot
        assert!(!reminders.take_if_current(CHAT, 0));
        assert!(reminders.take_if_current(CHAT, 1));
        assert!(!reminders.take_if_current(CHAT, 1));

        // Taking the slot is what firing does, so nothing is sent anymore
        tokio::time::sleep(20 * MINUTE).await;
        assert_eq!(fired.get(), Vec::<&str>::new());
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn chats_are_independent() {
        let reminders = Reminders::default();
        let fired = Fired::default();

        reminders.schedule(CHAT, 5 * MINUTE, fired.action("first chat"));
        reminders.schedule(ChatId(43), 10 * MINUTE, fired.action("second chat"));

        tokio::time::sleep(20 * MINUTE).await;
        assert_eq!(fired.get(), ["first chat", "second chat"]);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn cancelled_reminder_never_fires() {
        let reminders = Reminders::default();
        let fired = Fired::default();

        reminders.schedule(CHAT, 5 * MINUTE, fired.action("cancelled"));

        assert!(reminders.cancel(CHAT));
        assert!(!reminders.cancel(CHAT));

        tokio::time::sleep(20 * MINUTE).await;
        assert_eq!(fired.get(), Vec::<&str>::new());
    }
}
