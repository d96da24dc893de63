//! [`BrowserLauncher`] backed by a local Chromium process controlled via the
//! DevTools protocol.

mod network;

use crate::driver::{BrowserLauncher, BrowserSession, CapturedResponse};
use crate::error::DynError;
use crate::{tracing_err, Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    EventResponseReceivedExtraInfo,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::prelude::*;
use futures::stream::BoxStream;
use network::{NetworkEvent, ResponseMerger};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Time given to the browser to exit gracefully before it's killed
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

const CLEAR_INPUT_JS: &str = "function() { this.value = ''; }";

#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Path to the chrome binary. Looked up in the standard locations if not set.
    pub executable: Option<PathBuf>,

    pub headless: bool,

    /// How long to wait for an element to appear on the page. Single-page
    /// apps render their forms some time after the navigation completes.
    pub element_timeout: Duration,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            element_timeout: Duration::from_secs(10),
        }
    }
}

pub struct ChromiumLauncher {
    options: ChromiumOptions,
}

impl ChromiumLauncher {
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }
}

pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    element_timeout: Duration,
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self) -> Result<ChromiumSession> {
        let mut config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !self.options.headless {
            config = config.with_head();
        }

        if let Some(executable) = &self.options.executable {
            config = config.chrome_executable(executable);
        }

        let config = config.build().map_err(Error::launch)?;

        debug!(options = ?self.options, "Launching the browser");

        let (mut browser, mut handler) = Browser::launch(config).await.map_err(Error::launch)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    trace!(err = tracing_err(&err), "Browser handler reported an error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                shutdown(&mut browser).await;
                handler.abort();
                return Err(Error::launch(err));
            }
        };

        Ok(ChromiumSession {
            browser,
            handler,
            page,
            element_timeout: self.options.element_timeout,
        })
    }
}

impl ChromiumSession {
    async fn find_element(&self, selector: &str) -> Result<Element, CdpError> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            match self.page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(err) if Instant::now() >= deadline => return Err(err),
                Err(_) => tokio::time::sleep(ELEMENT_POLL_INTERVAL).await,
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn capture_responses(&mut self) -> Result<BoxStream<'static, CapturedResponse>> {
        let step = "capture_responses";

        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|err| Error::automation(step, err))?;

        let responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|err| Error::automation(step, err))?
            .map(|event| NetworkEvent::response(&event));

        let extra_info = self
            .page
            .event_listener::<EventResponseReceivedExtraInfo>()
            .await
            .map_err(|err| Error::automation(step, err))?
            .map(|event| NetworkEvent::extra_info(&event));

        let finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(|err| Error::automation(step, err))?
            .map(|event| NetworkEvent::loading_finished(&event));

        let failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(|err| Error::automation(step, err))?
            .map(|event| NetworkEvent::loading_failed(&event));

        let events = stream::select_all([
            responses.boxed(),
            extra_info.boxed(),
            finished.boxed(),
            failed.boxed(),
        ]);

        let captured = events
            .scan(ResponseMerger::default(), |merger, event| {
                future::ready(Some(merger.push(event)))
            })
            .filter_map(future::ready);

        Ok(captured.boxed())
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|err| Error::automation("goto", err))?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let step = "click";
        self.find_element(selector)
            .await
            .map_err(|err| Error::automation(step, err))?
            .click()
            .await
            .map_err(|err| Error::automation(step, err))?;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        let step = "fill";
        let element = self
            .find_element(selector)
            .await
            .map_err(|err| Error::automation(step, err))?;

        element
            .call_js_fn(CLEAR_INPUT_JS, false)
            .await
            .map_err(|err| Error::automation(step, err))?;

        element
            .click()
            .await
            .map_err(|err| Error::automation(step, err))?
            .type_str(value)
            .await
            .map_err(|err| Error::automation(step, err))?;

        Ok(())
    }

    async fn press_enter(&mut self, selector: &str) -> Result<()> {
        let step = "press_enter";
        self.find_element(selector)
            .await
            .map_err(|err| Error::automation(step, err))?
            .press_key("Enter")
            .await
            .map_err(|err| Error::automation(step, err))?;
        Ok(())
    }

    async fn close(mut self) {
        shutdown(&mut self.browser).await;
        self.handler.abort();
    }
}

async fn shutdown(browser: &mut Browser) {
    let graceful = async {
        browser.close().await?;
        browser.wait().await?;
        Ok::<_, Box<DynError>>(())
    };

    let err: Box<DynError> = match tokio::time::timeout(CLOSE_TIMEOUT, graceful).await {
        Ok(Ok(())) => {
            debug!("Browser closed");
            return;
        }
        Ok(Err(err)) => err,
        Err(elapsed) => elapsed.into(),
    };

    {
        // The borrow must not live across the `kill().await` below
        let err: &(dyn std::error::Error + 'static) = &*err;
        warn!(err, "Failed to close the browser gracefully, killing it");
    }

    if let Some(Err(err)) = browser.kill().await {
        warn!(err = tracing_err(&err), "Failed to kill the browser process");
    }
}
