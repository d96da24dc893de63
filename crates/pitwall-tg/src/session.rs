//! Obtains the session cookie of the Fantasy website at startup.

use crate::prelude::*;
use crate::Result;
use session_capture::chromium::{ChromiumLauncher, ChromiumOptions};
use session_capture::{Credentials, LoginPage, SessionAcquirer, SessionCookie};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) credentials: Credentials,
    pub(crate) login_url: String,
    pub(crate) session_url_pattern: String,
    pub(crate) timeout: Duration,
    pub(crate) chrome_executable: Option<PathBuf>,
    pub(crate) headless: bool,
}

/// Makes one login attempt in a fresh browser. There is no retry here: the
/// process exits on failure and the supervisor restarts it.
pub(crate) async fn acquire(config: &Config) -> Result<SessionCookie> {
    let launcher = ChromiumLauncher::new(ChromiumOptions {
        executable: config.chrome_executable.clone(),
        headless: config.headless,
        ..Default::default()
    });

    let page = LoginPage::new(&config.login_url, &config.session_url_pattern);

    let (result, duration) = SessionAcquirer::new(launcher, page)
        .acquire(&config.credentials, config.timeout)
        .with_duration()
        .await;

    let label = if result.is_ok() { "ok" } else { "err" };

    metrics::counter!("session_acquisitions_total", "result" => label).increment(1);
    metrics::histogram!("session_acquisition_duration_seconds").record(duration);

    Ok(result?)
}
