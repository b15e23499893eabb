use crate::{
    error::{ParalonError, Result},
    models::{ImageApiResponse, ImageGenerationRequest, ImageReference},
};
use reqwest::{Client, StatusCode};
use serde_json::json;

/// Secondary client modeling a generic OpenAI-compatible SDK: one direct
/// typed call to the standard generations route, no endpoint probing. Used
/// only after the probing client has exhausted its candidates.
#[derive(Clone)]
pub struct FallbackClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl FallbackClient {
    pub fn new(client: Client, api_base: String, api_key: String) -> Self {
        Self {
            client,
            api_base,
            api_key,
        }
    }

    pub async fn generate(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<ImageReference>> {
        let url = format!(
            "{}/images/generations",
            self.api_base.trim_end_matches('/')
        );
        // The SDK-shaped call always carries the quality flag.
        let payload = json!({
            "prompt": request.prompt,
            "model": request.model.as_deref().unwrap_or("dall-e-3"),
            "size": request.size.as_deref().unwrap_or("1024x1024"),
            "quality": request.quality.unwrap_or_default().as_str(),
            "n": request.n.unwrap_or(1).max(1),
        });

        log::debug!("Direct generation call: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ParalonError::TransportError(format!("{}: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ParalonError::TransportError(format!("{}: {}", url, e)))?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ParalonError::AuthError(format!(
                "HTTP 401 from {}: {}",
                url, body
            )));
        }
        if !status.is_success() {
            return Err(ParalonError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ImageApiResponse = serde_json::from_str(&body).map_err(|e| {
            ParalonError::ResponseError(format!("malformed JSON from {}: {}", url, e))
        })?;

        if parsed.data.is_empty() {
            return Err(ParalonError::ResponseError(format!(
                "no data returned from {}",
                url
            )));
        }

        Ok(parsed
            .data
            .into_iter()
            .filter_map(|item| {
                if let Some(url) = item.url {
                    Some(ImageReference::Url(url))
                } else {
                    item.b64_json.map(ImageReference::InlineData)
                }
            })
            .collect())
    }
}
