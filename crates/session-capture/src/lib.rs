//! Headless-browser login that captures the session cookie set by the
//! authentication endpoint of a website.
//!
//! The flow is driven through the [`BrowserLauncher`] and [`BrowserSession`]
//! traits. [`chromium::ChromiumLauncher`] implements them on top of the
//! Chrome DevTools protocol.

mod acquirer;
mod cookie;
mod credentials;
mod driver;
mod error;

pub mod chromium;

pub use acquirer::{LoginPage, SessionAcquirer};
pub use credentials::{Credentials, SessionCookie};
pub use driver::{BrowserLauncher, BrowserSession, CapturedResponse};
pub use error::*;

pub(crate) fn tracing_err<'a, E: std::error::Error + 'static>(err: &'a E) -> impl tracing::Value + 'a {
    err as &dyn std::error::Error
}
