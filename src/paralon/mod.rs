pub mod fallback_client;
pub mod image_client;

use crate::{
    config::ParalonConfig,
    error::{ParalonError, Result},
    models::{ImageEditRequest, ImageGenerationRequest, ImageReference, ImageVariationRequest},
};
use reqwest::Client;
use std::time::Duration;

pub use fallback_client::FallbackClient;
pub use image_client::ImageClient;

/// Per-call ceiling for remote generation/edit/variation requests.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Client for ParalonCloud's OpenAI-compatible image API.
///
/// Construction is fallible: credentials and the base URL are validated up
/// front so the boundary layer can reject requests uniformly instead of
/// routing them to a half-configured client.
#[derive(Clone)]
pub struct ParalonClient {
    image_client: ImageClient,
    fallback_client: FallbackClient,
}

impl ParalonClient {
    pub fn new(config: ParalonConfig) -> Result<Self> {
        config.validate()?;

        let api_key = config
            .api_key
            .ok_or_else(|| ParalonError::ConfigError("Paralon API key is required".into()))?;
        let api_base = config
            .api_base
            .ok_or_else(|| ParalonError::ConfigError("Paralon API base URL is required".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ParalonError::TransportError(e.to_string()))?;

        Ok(Self {
            image_client: ImageClient::new(client.clone(), api_base.clone(), api_key.clone()),
            fallback_client: FallbackClient::new(client, api_base, api_key),
        })
    }

    pub fn images(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn fallback(&self) -> &FallbackClient {
        &self.fallback_client
    }

    /// Generates images, probing the candidate endpoints first and retrying
    /// once through the direct OpenAI-compatible call when no candidate
    /// answered. Authentication and server-side rejections are surfaced
    /// as-is; only routing misses reach the fallback.
    pub async fn generate_images(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<Vec<ImageReference>> {
        match self.image_client.generate(&request).await {
            Ok(references) => Ok(references),
            Err(probe_err) => match probe_err {
                ParalonError::EndpointNotFound(_) | ParalonError::TransportError(_) => {
                    log::warn!(
                        "Endpoint probing failed, retrying via direct call: {}",
                        probe_err
                    );
                    self.fallback_client
                        .generate(&request)
                        .await
                        .map_err(|fallback_err| {
                            ParalonError::EndpointNotFound(format!(
                                "probing failed ({}); direct call failed ({})",
                                probe_err, fallback_err
                            ))
                        })
                }
                other => Err(other),
            },
        }
    }

    pub async fn edit_image(&self, request: ImageEditRequest) -> Result<Vec<ImageReference>> {
        self.image_client.edit(&request).await
    }

    pub async fn create_variation(
        &self,
        request: ImageVariationRequest,
    ) -> Result<Vec<ImageReference>> {
        self.image_client.create_variation(&request).await
    }
}
