use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use std::time::Duration;
use tracing::debug;

use crate::session::{Browser, BrowserSession, SessionError};

/// Opens one headless Chrome session per booking run through a WebDriver
/// endpoint (chromedriver or a Selenium grid)
pub struct WebDriverBrowser {
    webdriver_url: String,
}

impl WebDriverBrowser {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        let caps = serde_json::json!({
            "goog:chromeOptions": {
                "args": ["--headless=new", "--window-size=1920,1080", "--no-sandbox"]
            }
        });
        let caps = caps
            .as_object()
            .cloned()
            .unwrap_or_default();

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        debug!(webdriver = %self.webdriver_url, "opened browser session");

        Ok(Box::new(WebDriverSession {
            client: Some(client),
        }))
    }
}

struct WebDriverSession {
    client: Option<Client>,
}

impl WebDriverSession {
    fn client(&self) -> Result<&Client, SessionError> {
        self.client
            .as_ref()
            .ok_or_else(|| SessionError::Other("session already closed".to_string()))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.client()?
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<String, SessionError> {
        let url = self
            .client()?
            .current_url()
            .await
            .map_err(|e| SessionError::Other(e.to_string()))?;
        Ok(url.to_string())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), SessionError> {
        let element = self
            .client()?
            .find(Locator::Css(selector))
            .await
            .map_err(|e| SessionError::Element {
                selector: selector.to_string(),
                detail: e.to_string(),
            })?;
        element.clear().await.map_err(|e| SessionError::Element {
            selector: selector.to_string(),
            detail: e.to_string(),
        })?;
        element
            .send_keys(value)
            .await
            .map_err(|e| SessionError::Element {
                selector: selector.to_string(),
                detail: e.to_string(),
            })
    }

    async fn click(&mut self, selector: &str) -> Result<(), SessionError> {
        let element = self
            .client()?
            .find(Locator::Css(selector))
            .await
            .map_err(|e| SessionError::Element {
                selector: selector.to_string(),
                detail: e.to_string(),
            })?;
        element.click().await.map_err(|e| SessionError::Element {
            selector: selector.to_string(),
            detail: e.to_string(),
        })
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, SessionError> {
        // Only an elapsed wait means "not there"; a broken session is a fault
        match self
            .client()?
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => Ok(false),
            Err(e) => Err(SessionError::Element {
                selector: selector.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, SessionError> {
        match self.client()?.find(Locator::Css(selector)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_no_such_element() => Ok(false),
            Err(e) => Err(SessionError::Element {
                selector: selector.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    async fn text(&mut self, selector: &str) -> Result<Option<String>, SessionError> {
        let element = match self.client()?.find(Locator::Css(selector)).await {
            Ok(element) => element,
            Err(e) if e.is_no_such_element() => return Ok(None),
            Err(e) => {
                return Err(SessionError::Element {
                    selector: selector.to_string(),
                    detail: e.to_string(),
                })
            }
        };
        Ok(element.text().await.ok())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| SessionError::Other(e.to_string()))?;
        }
        Ok(())
    }
}
