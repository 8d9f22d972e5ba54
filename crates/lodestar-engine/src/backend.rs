use async_trait::async_trait;
pub use lodestar_common::error::backend_error::BackendError;
use lodestar_common::protocol::{MatchedElement, Selector};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// The Backend trait is the live-page interface every driver implements.
///
/// Drivers only need to evaluate expressions; probing and pixel-ratio
/// lookups are built on top of that.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, connect to a driver, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    async fn evaluate(&mut self, expression: &str) -> Result<Value, BackendError>;

    /// Capture a PNG screenshot of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::NotSupported("screenshot".into()))
    }

    /// Every element currently matching a selector, including inside shadow roots.
    async fn find_all(&mut self, selector: &Selector) -> Result<Vec<MatchedElement>, BackendError> {
        let expression = lodestar_scanner::invoke(
            lodestar_scanner::PROBE_JS,
            &[json!(selector.kind()), json!(selector.query())],
        );
        let value = self.evaluate(&expression).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Ratio between screenshot pixels and CSS pixels.
    async fn device_pixel_ratio(&mut self) -> Result<f64, BackendError> {
        let value = self.evaluate("window.devicePixelRatio").await?;
        Ok(value.as_f64().filter(|r| *r > 0.0).unwrap_or(1.0))
    }
}
