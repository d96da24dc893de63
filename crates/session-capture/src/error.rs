use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type DynError = dyn std::error::Error + Send + Sync;

/// Reasons why the login flow didn't produce a session cookie.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Session timeout: no response from `{url_pattern}` was observed in {timeout:.2?}")]
    Timeout {
        url_pattern: String,
        timeout: Duration,
    },

    #[error("The session response from {url} doesn't contain a `Set-Cookie` header")]
    MissingCookieHeader { url: String },

    #[error("Failed to launch the browser")]
    BrowserLaunchFailure { source: Box<DynError> },

    #[error("Browser automation step `{step}` failed")]
    Automation {
        step: &'static str,
        source: Box<DynError>,
    },

    #[error("Session timeout must be greater than zero")]
    InvalidTimeout,
}

impl Error {
    pub(crate) fn launch(source: impl Into<Box<DynError>>) -> Self {
        Self::BrowserLaunchFailure {
            source: source.into(),
        }
    }

    pub(crate) fn automation(step: &'static str, source: impl Into<Box<DynError>>) -> Self {
        Self::Automation {
            step,
            source: source.into(),
        }
    }
}
