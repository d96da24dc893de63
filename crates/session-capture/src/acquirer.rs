use crate::cookie::session_cookie_from_headers;
use crate::driver::{BrowserLauncher, BrowserSession, CapturedResponse};
use crate::{tracing_err, Credentials, Error, Result, SessionCookie};
use futures::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const DEFAULT_CONSENT_BUTTON: &str = "#truste-consent-button";
const DEFAULT_USERNAME_INPUT: &str = r#"input[name="Login"]"#;
const DEFAULT_PASSWORD_INPUT: &str = r#"input[name="Password"]"#;

/// Describes where to log in and which response carries the session cookie.
#[derive(Debug, Clone)]
pub struct LoginPage {
    pub url: String,

    /// Cookie-consent interstitial. Clicking it is best-effort.
    pub consent_button: String,
    pub username_input: String,
    pub password_input: String,

    /// Substring of the URL of the response that sets the session cookie
    pub session_url_pattern: String,
}

impl LoginPage {
    pub fn new(url: impl Into<String>, session_url_pattern: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            consent_button: DEFAULT_CONSENT_BUTTON.to_owned(),
            username_input: DEFAULT_USERNAME_INPUT.to_owned(),
            password_input: DEFAULT_PASSWORD_INPUT.to_owned(),
            session_url_pattern: session_url_pattern.into(),
        }
    }
}

pub struct SessionAcquirer<L> {
    launcher: L,
    page: LoginPage,
}

impl<L: BrowserLauncher> SessionAcquirer<L> {
    pub fn new(launcher: L, page: LoginPage) -> Self {
        Self { launcher, page }
    }

    /// Logs in with a fresh browser and waits for the session response.
    ///
    /// Exactly one login attempt is made. The browser is closed before
    /// returning, regardless of the outcome. The `timeout` bounds everything
    /// that happens after the browser has started.
    #[instrument(skip_all, fields(login_url = %self.page.url, username = credentials.username()))]
    pub async fn acquire(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<SessionCookie> {
        if timeout.is_zero() {
            return Err(Error::InvalidTimeout);
        }

        let mut session = self.launcher.launch().await?;

        let start = Instant::now();

        let result = tokio::time::timeout(timeout, self.login(&mut session, credentials))
            .await
            .unwrap_or_else(|_elapsed| {
                Err(Error::Timeout {
                    url_pattern: self.page.session_url_pattern.clone(),
                    timeout,
                })
            });

        session.close().await;

        let elapsed = start.elapsed();

        match &result {
            Ok(cookie) => info!(
                cookie = cookie.name(),
                elapsed = format_args!("{elapsed:.2?}"),
                "Captured the session cookie"
            ),
            Err(err) => warn!(
                err = tracing_err(err),
                elapsed = format_args!("{elapsed:.2?}"),
                "Failed to capture the session cookie"
            ),
        }

        result
    }

    async fn login(&self, session: &mut L::Session, credentials: &Credentials) -> Result<SessionCookie> {
        let page = &self.page;

        let mut responses = session.capture_responses().await?;

        session.goto(&page.url).await?;

        if let Err(err) = session.click(&page.consent_button).await {
            debug!(
                err = tracing_err(&err),
                "Cookie consent button wasn't dismissed, continuing anyway"
            );
        }

        session.fill(&page.username_input, credentials.username()).await?;
        session.fill(&page.password_input, credentials.password()).await?;
        session.press_enter(&page.password_input).await?;

        debug!(pattern = %page.session_url_pattern, "Waiting for the session response");

        let response = wait_for_response(&mut responses, &page.session_url_pattern).await?;

        session_cookie_from_headers(&response.response_headers)
            .ok_or(Error::MissingCookieHeader { url: response.url })
    }
}

async fn wait_for_response(
    responses: &mut (impl Stream<Item = CapturedResponse> + Unpin),
    url_pattern: &str,
) -> Result<CapturedResponse> {
    while let Some(response) = responses.next().await {
        if response.url.contains(url_pattern) {
            return Ok(response);
        }
    }

    Err(Error::automation(
        "wait_for_session_response",
        "the browser stopped reporting network events",
    ))
}
