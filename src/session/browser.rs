//! Web client driver — delivers messages through a Chrome instance running
//! the messaging client's web app.
//!
//! `open` launches the browser, loads the web client and waits once for the
//! user to log in. Each send then:
//! 1. types the identifier into the chat search box
//! 2. opens the first matching chat, or deep-links to a new one
//! 3. types the message into the composer and presses Enter
//!
//! Every UI action is followed by a fixed settle delay so the page can
//! render before the next step.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use reqwest::Url;
use tokio::task::JoinHandle;

use super::{AttemptOutcome, SessionDriver};
use crate::config::BrowserConfig;
use crate::error::SessionError;

/// Messaging web client entry point.
pub const WEB_CLIENT_URL: &str = "https://web.whatsapp.com/";

const SEARCH_BOX_SELECTOR: &str = r#"div[contenteditable="true"][data-tab="3"]"#;
const CHAT_RESULT_SELECTOR: &str = "span[title]";
const COMPOSER_SELECTOR: &str = r#"div[contenteditable="true"][data-tab="10"]"#;

const SEARCH_SETTLE: Duration = Duration::from_secs(2);
const DEEP_LINK_SETTLE: Duration = Duration::from_secs(4);
const ACTION_SETTLE: Duration = Duration::from_secs(1);

/// Live browser state, present between `open` and `close`.
struct ActiveSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

/// `SessionDriver` backed by a real browser.
pub struct WebClientDriver {
    config: BrowserConfig,
    active: Option<ActiveSession>,
}

impl WebClientDriver {
    /// Create a driver. Nothing is launched until `open`.
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    async fn launch(config: &BrowserConfig) -> Result<ActiveSession, SessionError> {
        let mut builder = CdpBrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut events) = Browser::launch(cdp_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page(WEB_CLIENT_URL)
            .await
            .map_err(|e| SessionError::Open(e.to_string()))?;

        tracing::info!(
            wait_secs = config.login_wait.as_secs(),
            "Web client opened; waiting for login"
        );
        tokio::time::sleep(config.login_wait).await;

        Ok(ActiveSession {
            browser,
            page,
            handler,
        })
    }
}

impl ActiveSession {
    async fn open_chat(&self, identifier: &str) -> Result<(), String> {
        let search = self
            .page
            .find_element(SEARCH_BOX_SELECTOR)
            .await
            .map_err(|e| format!("search box not found: {e}"))?;
        clear(&search).await?;
        search
            .click()
            .await
            .map_err(|e| format!("search box click failed: {e}"))?;
        search
            .type_str(identifier)
            .await
            .map_err(|e| format!("typing identifier failed: {e}"))?;
        tokio::time::sleep(SEARCH_SETTLE).await;

        let results = self
            .page
            .find_elements(CHAT_RESULT_SELECTOR)
            .await
            .unwrap_or_default();

        match results.first() {
            Some(chat) => {
                chat.click()
                    .await
                    .map_err(|e| format!("opening chat failed: {e}"))?;
            }
            None => {
                let link = deep_link(identifier)?;
                self.page
                    .goto(link.as_str())
                    .await
                    .map_err(|e| format!("deep link failed: {e}"))?;
                tokio::time::sleep(DEEP_LINK_SETTLE).await;
            }
        }

        tokio::time::sleep(ACTION_SETTLE).await;
        Ok(())
    }

    async fn submit(&self, text: &str) -> Result<(), String> {
        let composer = self
            .page
            .find_element(COMPOSER_SELECTOR)
            .await
            .map_err(|e| format!("message box not found: {e}"))?;
        composer
            .click()
            .await
            .map_err(|e| format!("message box click failed: {e}"))?;
        composer
            .type_str(text)
            .await
            .map_err(|e| format!("typing message failed: {e}"))?;
        tokio::time::sleep(ACTION_SETTLE).await;
        composer
            .press_key("Enter")
            .await
            .map_err(|e| format!("submit failed: {e}"))?;
        tokio::time::sleep(ACTION_SETTLE).await;
        Ok(())
    }
}

async fn clear(element: &Element) -> Result<(), String> {
    element
        .call_js_fn("function() { this.textContent = ''; }", false)
        .await
        .map(|_| ())
        .map_err(|e| format!("clearing search box failed: {e}"))
}

/// Deep link that opens a chat with `identifier` even when none exists yet.
fn deep_link(identifier: &str) -> Result<Url, String> {
    Url::parse_with_params(
        &format!("{WEB_CLIENT_URL}send"),
        &[("phone", identifier), ("text", "")],
    )
    .map_err(|e| format!("invalid deep link for {identifier}: {e}"))
}

#[async_trait]
impl SessionDriver for WebClientDriver {
    fn name(&self) -> &str {
        "web-client"
    }

    async fn open(&mut self) -> Result<(), SessionError> {
        if self.active.is_none() {
            self.active = Some(Self::launch(&self.config).await?);
        }
        Ok(())
    }

    async fn send(&mut self, identifier: &str, text: &str) -> AttemptOutcome {
        let Some(session) = self.active.as_ref() else {
            return AttemptOutcome::failure("browser session is not open");
        };
        if let Err(reason) = session.open_chat(identifier).await {
            return AttemptOutcome::Failure(reason);
        }
        match session.submit(text).await {
            Ok(()) => AttemptOutcome::Success,
            Err(reason) => AttemptOutcome::Failure(reason),
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let Some(mut session) = self.active.take() else {
            return Ok(());
        };
        let result = session
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Unavailable(e.to_string()));
        let _ = session.browser.wait().await;
        session.handler.abort();
        result
    }
}
