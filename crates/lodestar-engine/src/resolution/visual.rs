use crate::backend::Backend;
use crate::models::ModelError;
use crate::models::ocr::TextRecognizer;
use lodestar_common::protocol::OcrToken;
use std::time::Duration;
use tracing::debug;

/// Screenshot the viewport and recognize its text.
///
/// Token coordinates are converted from screenshot pixels to CSS pixels so
/// they compare directly with element geometry. No confidence filtering
/// happens here. Recognition running past `limit` is a `Recognition` error.
pub async fn scan(
    backend: &mut dyn Backend,
    recognizer: &dyn TextRecognizer,
    limit: Duration,
) -> Result<Vec<OcrToken>, ModelError> {
    let png = backend
        .screenshot()
        .await
        .map_err(|e| ModelError::Recognition(format!("screenshot: {}", e)))?;
    let ratio = backend.device_pixel_ratio().await.unwrap_or(1.0);

    let tokens = tokio::time::timeout(limit, recognizer.recognize(&png))
        .await
        .map_err(|_| {
            ModelError::Recognition(format!("no result within {}ms", limit.as_millis()))
        })??;
    debug!("Visual scan: {} tokens (pixel ratio {})", tokens.len(), ratio);

    if (ratio - 1.0).abs() < f64::EPSILON {
        return Ok(tokens);
    }
    Ok(tokens.into_iter().map(|t| t.scaled(1.0 / ratio)).collect())
}
