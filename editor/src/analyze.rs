use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use slateink_shared::{AnalyzeRequest, AnalyzeResponse, ErrorBody};

use crate::error::EditorError;
use crate::geometry::Rect;
use crate::session::MIN_SELECTION_EDGE;
use crate::surface::Surface;

/// Client for the vision endpoint: crops the selection, ships it as
/// bare base64 and returns the model's text answer.
pub struct AnalyzeClient {
    endpoint: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl AnalyzeClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Sends the selected region for analysis. Undersized selections
    /// are rejected before any pixels are encoded or bytes leave the
    /// process.
    pub async fn analyze(&self, surface: &Surface, region: Rect) -> Result<String, EditorError> {
        if region.width < MIN_SELECTION_EDGE || region.height < MIN_SELECTION_EDGE {
            return Err(EditorError::SelectionTooSmall);
        }
        let png = surface.export_region(region)?;
        let request = AnalyzeRequest {
            // Bare payload, no data-URL prefix.
            image: BASE64.encode(&png),
            api_key: self.api_key.clone(),
        };
        log::debug!(
            "analyzing {}x{} region via {}",
            region.width as u32,
            region.height as u32,
            self.endpoint
        );
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => format!("Analyze request failed with status {}", status.as_u16()),
            };
            return Err(EditorError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body: AnalyzeResponse = response.json().await?;
        Ok(body.response)
    }
}
