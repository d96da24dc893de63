//! Periodic process reboot. The external supervisor brings the process back,
//! which makes it log in again with a fresh browser.

use crate::prelude::*;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) interval: Duration,
}

pub(crate) fn spawn(config: &Config) -> JoinHandle<()> {
    info!(
        interval = format_args!("{:?}", config.interval),
        "Scheduled periodic reboot"
    );
    spawn_recurring(config.interval, reboot)
}

/// Invokes `action` every `interval`, first time one `interval` after now.
/// The ticks don't wait for any other work in the process.
pub(crate) fn spawn_recurring<F>(interval: Duration, mut action: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            action();
        }
    })
}

/// Exits with a failure code so that the supervisor restarts the process
/// even with the `on-failure` restart policy.
fn reboot() {
    warn!("Rebooting the process to refresh the session");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);
    const EPSILON: Duration = Duration::from_secs(1);

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let action = {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        };
        (fired, action)
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn fires_once_per_interval() {
        let (fired, action) = counter();
        let task = spawn_recurring(DAY, action);

        tokio::time::sleep(DAY - EPSILON).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(EPSILON * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(DAY - EPSILON * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(EPSILON * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);

        task.abort();
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn fires_regardless_of_other_work() {
        let (fired, action) = counter();
        let task = spawn_recurring(Duration::from_secs(60), action);

        // Unrelated in-flight work must not delay the ticks
        let busy = tokio::spawn(tokio::time::sleep(Duration::from_secs(10 * 60)));

        tokio::time::sleep(Duration::from_secs(5 * 60) + EPSILON).await;
        assert_eq!(fired.load(Ordering::SeqCst), 5);

        busy.abort();
        task.abort();
    }
}
