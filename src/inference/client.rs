use async_trait::async_trait;
use thiserror::Error;

use super::config::InferenceConfig;
use super::extract::parse_estimate;
use super::wire::{ApiErrorBody, MessagesRequest, MessagesResponse};
use crate::capture::ImagePayload;
use crate::nutrition::NutritionEstimate;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const NUTRITION_PROMPT: &str = "Identify what food item is in this image. Then provide accurate nutritional information in this format: {\"food\": \"Food Name\", \"calories\": calories_number, \"protein\": protein_grams, \"carbs\": carbs_grams, \"fat\": fat_grams}. Return only the JSON object without any other text.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// Deployment problem; retrying will not help.
    #[error("vision service is not configured: {0}")]
    Configuration(String),
    #[error("vision service error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    RemoteService { status: Option<u16>, message: String },
    #[error("could not read nutrition data from reply: {0}")]
    ResponseParse(String),
}

/// Anything that can turn a captured image into nutrition facts.
#[async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    async fn analyze(&self, payload: ImagePayload) -> Result<NutritionEstimate, InferenceError>;
}

/// Client for a messages-style multimodal API.
pub struct VisionClient {
    config: InferenceConfig,
    http: reqwest::Client,
}

impl VisionClient {
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        reqwest::Url::parse(&config.endpoint).map_err(|err| {
            InferenceError::Configuration(format!("invalid endpoint {:?}: {err}", config.endpoint))
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| {
                InferenceError::Configuration(format!("could not build HTTP client: {err}"))
            })?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
}

fn transport_error(err: reqwest::Error) -> InferenceError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    InferenceError::RemoteService {
        status: err.status().map(|s| s.as_u16()),
        message,
    }
}

#[async_trait]
impl NutritionAnalyzer for VisionClient {
    async fn analyze(&self, payload: ImagePayload) -> Result<NutritionEstimate, InferenceError> {
        let api_key = self.config.credential().ok_or_else(|| {
            InferenceError::Configuration("no API key set for the vision service".into())
        })?;

        let (width, height) = payload.dimensions();
        let captured_at = payload.captured_at();
        let body = MessagesRequest::image_prompt(
            &self.config.model,
            self.config.max_tokens,
            payload.media_type(),
            payload.to_base64(),
            NUTRITION_PROMPT,
        );
        drop(payload);

        log_info!(
            "sending {}x{} image captured at {} to {} ({})",
            width,
            height,
            captured_at.to_rfc3339(),
            self.config.endpoint,
            self.config.model
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            log_warn!("vision service returned {}: {}", status, message);
            return Err(InferenceError::RemoteService {
                status: Some(status.as_u16()),
                message,
            });
        }

        let text = response.text().await.map_err(transport_error)?;
        let reply: MessagesResponse = serde_json::from_str(&text)
            .map_err(|err| InferenceError::ResponseParse(format!("malformed reply body: {err}")))?;

        let reply_text = reply
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| InferenceError::ResponseParse("reply has no text content".into()))?;

        parse_estimate(&reply_text)
    }
}
