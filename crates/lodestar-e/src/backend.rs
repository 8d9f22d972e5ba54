use crate::webdriver::{WebDriverClient, headless_capabilities, script_body};
use async_trait::async_trait;
use lodestar_engine::backend::{Backend, BackendError, NavigationResult};
use serde_json::Value;
use tracing::{info, warn};

/// Backend speaking W3C WebDriver to an already running driver.
pub struct WebDriverBackend {
    client: Option<WebDriverClient>,
    webdriver_url: String,
    headless: bool,
}

impl WebDriverBackend {
    pub fn with_url(webdriver_url: String) -> Self {
        Self {
            client: None,
            webdriver_url,
            headless: false,
        }
    }

    /// Ask the driver for a headless browser session.
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    async fn get_navigation_result(
        client: &WebDriverClient,
    ) -> Result<NavigationResult, BackendError> {
        let title = client.client.title().await.unwrap_or_default();
        let url = client
            .client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default();

        Ok(NavigationResult { url, title })
    }
}

#[async_trait]
impl Backend for WebDriverBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Connecting to WebDriver at {}...", self.webdriver_url);
        let capabilities = self.headless.then(headless_capabilities);
        let client = WebDriverClient::connect(&self.webdriver_url, capabilities)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;

        info!("Navigating to: {}", url);
        client
            .client
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        Self::get_navigation_result(client).await
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;
        let script = script_body(expression);

        let mut last_error = None;
        for attempt in 1..=3 {
            if attempt > 1 {
                warn!("Retrying script execution (attempt {})...", attempt);
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
            match client.client.execute(&script, vec![]).await {
                Ok(value) => return Ok(value),
                Err(fantoccini::error::CmdError::Standard(e)) => {
                    // Only transport-level failures are retried.
                    return Err(BackendError::Script(e.to_string()));
                }
                Err(e) => last_error = Some(BackendError::Script(e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| BackendError::Script("script execution failed".into())))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let client = self.client.as_mut().ok_or(BackendError::NotReady)?;
        client
            .client
            .screenshot()
            .await
            .map_err(|e| BackendError::Other(format!("Screenshot failed: {}", e)))
    }
}
