//! Seam between the login flow and the browser automation backend.

use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;

/// Response observed by the browser while the login page was open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub url: String,

    /// Header names are lowercased
    pub response_headers: HashMap<String, String>,
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    /// Starts a fresh browser process. The returned session must be closed
    /// with [`BrowserSession::close`] once it's not needed anymore.
    async fn launch(&self) -> Result<Self::Session>;
}

#[async_trait]
pub trait BrowserSession: Send + Sized {
    /// Subscribes to the network responses of the page. Must be called before
    /// any navigation, otherwise the responses may be missed.
    async fn capture_responses(&mut self) -> Result<BoxStream<'static, CapturedResponse>>;

    async fn goto(&mut self, url: &str) -> Result<()>;

    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Clears the input matched by the selector and types the value into it.
    async fn fill(&mut self, selector: &str, value: &str) -> Result<()>;

    async fn press_enter(&mut self, selector: &str) -> Result<()>;

    /// Terminates the browser process. Never fails, problems are only logged.
    async fn close(self);
}
