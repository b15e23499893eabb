use crate::{
    error::{ParalonError, Result},
    models::{ImageEditRequest, ImageGenerationRequest, ImageReference, ImageVariationRequest},
};
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};

/// Endpoint path suffixes tried in priority order during generation. The
/// exact route of a deployment is not reliably known in advance, so the
/// client discovers it by probing.
pub const ENDPOINT_CANDIDATES: &[&str] = &[
    "/images/generations",
    "/v1/images/generations",
    "/api/v1/images/generations",
    "/generate",
    "/v1/generate",
];

const DEFAULT_GENERATION_MODEL: &str = "dall-e-3";
const DEFAULT_EDIT_MODEL: &str = "dall-e-2";
const DEFAULT_SIZE: &str = "1024x1024";

/// The only model tier that honors the `quality` flag.
const HD_CAPABLE_MODEL: &str = "dall-e-3";

/// Outcome of probing one endpoint candidate. The probe loop consumes these
/// values directly: NotFound, Transport and NoData advance to the next
/// candidate, Auth and Server abort the whole scan.
enum ProbeOutcome {
    Success(Vec<ImageReference>),
    NotFound,
    Transport(String),
    /// 200 whose body yielded no image references.
    NoData(String),
    Auth(String),
    Server { status: u16, body: String },
}

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl ImageClient {
    pub fn new(client: Client, api_base: String, api_key: String) -> Self {
        Self {
            client,
            api_base,
            api_key,
        }
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("dall-e-3", "DALL-E 3", "OpenAI-compatible"),
            ("dall-e-2", "DALL-E 2", "OpenAI-compatible"),
        ]
    }

    /// Generates images from a text prompt, discovering the deployment's
    /// generation route by scanning the candidate endpoints in order.
    ///
    /// A 404 means "this path does not exist here" and moves on to the next
    /// candidate; any other failing status is a real rejection and aborts
    /// the scan. Transport errors are recorded and the scan continues.
    pub async fn generate(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<ImageReference>> {
        let payload = build_generation_payload(request);
        let base = self.api_base.trim_end_matches('/');
        let mut last_failure: Option<String> = None;

        for candidate in ENDPOINT_CANDIDATES {
            let url = format!("{}{}", base, candidate);
            log::debug!("Probing generation endpoint: {}", url);

            match self.probe(&url, &payload).await {
                ProbeOutcome::Success(references) => {
                    log::info!(
                        "Generated {} image(s) via {}",
                        references.len(),
                        candidate
                    );
                    return Ok(references);
                }
                ProbeOutcome::NotFound => {
                    last_failure = Some(format!("HTTP 404 at {}", url));
                }
                ProbeOutcome::Transport(err) => {
                    log::warn!("Candidate {} unreachable: {}", url, err);
                    last_failure = Some(err);
                }
                ProbeOutcome::NoData(err) => {
                    log::warn!("Candidate {} answered without image data", url);
                    last_failure = Some(err);
                }
                ProbeOutcome::Auth(msg) => return Err(ParalonError::AuthError(msg)),
                ProbeOutcome::Server { status, body } => {
                    return Err(ParalonError::ServerError { status, body })
                }
            }
        }

        Err(ParalonError::EndpointNotFound(format!(
            "no generation endpoint answered at {} (last failure: {})",
            self.api_base,
            last_failure.unwrap_or_else(|| "none recorded".into())
        )))
    }

    async fn probe(&self, url: &str, payload: &Value) -> ProbeOutcome {
        let response = match self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return ProbeOutcome::Transport(format!("{}: {}", url, err)),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return ProbeOutcome::NotFound;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return ProbeOutcome::Transport(format!("failed to read body from {}: {}", url, err))
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            return ProbeOutcome::Auth(format!("HTTP 401 from {}: {}", url, body));
        }
        if !status.is_success() {
            return ProbeOutcome::Server {
                status: status.as_u16(),
                body,
            };
        }

        // A 200 with a non-JSON body degrades to the opaque string fallback.
        let value = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
        let references = extract_references(&value);
        if references.is_empty() {
            ProbeOutcome::NoData(format!("no image data in response from {}", url))
        } else {
            ProbeOutcome::Success(references)
        }
    }

    /// Edits an image guided by a prompt. Single-endpoint call, no probing;
    /// the source image and optional mask travel as binary multipart parts.
    pub async fn edit(&self, request: &ImageEditRequest) -> Result<Vec<ImageReference>> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_EDIT_MODEL);
        let mut form = multipart::Form::new()
            .part("image", image_part(request.image.clone(), "image.png")?)
            .text("prompt", request.prompt.clone())
            .text("model", model.to_string())
            .text(
                "size",
                request.size.clone().unwrap_or_else(|| DEFAULT_SIZE.into()),
            )
            .text("n", request.n.unwrap_or(1).to_string());

        if let Some(mask) = &request.mask {
            form = form.part("mask", image_part(mask.clone(), "mask.png")?);
        }

        log::info!("Editing image with model: {}", model);
        self.send_multipart("/images/edits", form).await
    }

    /// Produces variations of an image. Single-endpoint call, no probing.
    pub async fn create_variation(
        &self,
        request: &ImageVariationRequest,
    ) -> Result<Vec<ImageReference>> {
        let model = request.model.as_deref().unwrap_or(DEFAULT_EDIT_MODEL);
        let form = multipart::Form::new()
            .part("image", image_part(request.image.clone(), "image.png")?)
            .text("model", model.to_string())
            .text(
                "size",
                request.size.clone().unwrap_or_else(|| DEFAULT_SIZE.into()),
            )
            .text("n", request.n.unwrap_or(1).to_string());

        log::info!("Creating image variation with model: {}", model);
        self.send_multipart("/images/variations", form).await
    }

    async fn send_multipart(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<Vec<ImageReference>> {
        let url = format!("{}{}", self.api_base.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
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
        if status == StatusCode::NOT_FOUND {
            return Err(ParalonError::EndpointNotFound(format!(
                "HTTP 404 at {}",
                url
            )));
        }
        if !status.is_success() {
            return Err(ParalonError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ParalonError::ResponseError(format!("malformed JSON from {}: {}", url, e)))?;
        Ok(extract_from_first_array(&value))
    }
}

/// Builds the generation payload. The `quality` flag is only meaningful to
/// the hd-capable model tier and is omitted for everything else.
fn build_generation_payload(request: &ImageGenerationRequest) -> Value {
    let model = request.model.as_deref().unwrap_or(DEFAULT_GENERATION_MODEL);
    let mut payload = json!({
        "prompt": request.prompt,
        "model": model,
        "size": request.size.as_deref().unwrap_or(DEFAULT_SIZE),
        "n": request.n.unwrap_or(1).max(1),
    });

    if model == HD_CAPABLE_MODEL {
        payload["quality"] = json!(request.quality.unwrap_or_default().as_str());
    }

    payload
}

/// Ordered-priority parser over the heterogeneous response shapes seen in
/// the wild: `data[].url` / `data[].b64_json`, an `images` array, a bare
/// top-level array, and finally the whole body wrapped as one opaque string.
/// The first pattern whose structure matches wins; a matching shape with no
/// usable entries yields an empty list, which the probe loop treats as
/// "keep scanning".
fn extract_references(body: &Value) -> Vec<ImageReference> {
    if let Some(data) = body.get("data").and_then(Value::as_array) {
        return data
            .iter()
            .filter_map(|item| {
                if let Some(url) = item.get("url").and_then(Value::as_str) {
                    Some(ImageReference::Url(url.to_string()))
                } else {
                    item.get("b64_json")
                        .and_then(Value::as_str)
                        .map(|b64| ImageReference::InlineData(b64.to_string()))
                }
            })
            .collect();
    }

    if let Some(images) = body.get("images").and_then(Value::as_array) {
        return raw_strings(images);
    }

    if let Some(items) = body.as_array() {
        return raw_strings(items);
    }

    // Degenerate last resort: treat the whole body as a single reference.
    match body {
        Value::String(s) if !s.is_empty() => vec![ImageReference::from_raw(s)],
        Value::Null => vec![],
        other => vec![ImageReference::from_raw(&other.to_string())],
    }
}

fn raw_strings(items: &[Value]) -> Vec<ImageReference> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(ImageReference::from_raw)
        .collect()
}

/// Edit/variation normalization: take `url` from every element of the first
/// array found; when no element carries a `url`, fall back to `b64_json`.
fn extract_from_first_array(body: &Value) -> Vec<ImageReference> {
    let items = match body.get("data").and_then(Value::as_array) {
        Some(items) => items,
        None => match body.as_array() {
            Some(items) => items,
            None => return vec![],
        },
    };

    let urls: Vec<ImageReference> = items
        .iter()
        .filter_map(|item| item.get("url").and_then(Value::as_str))
        .map(|url| ImageReference::Url(url.to_string()))
        .collect();
    if !urls.is_empty() {
        return urls;
    }

    items
        .iter()
        .filter_map(|item| item.get("b64_json").and_then(Value::as_str))
        .map(|b64| ImageReference::InlineData(b64.to_string()))
        .collect()
}

fn image_part(bytes: Vec<u8>, file_name: &str) -> Result<multipart::Part> {
    multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .map_err(|e| ParalonError::TransportError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_includes_quality_for_hd_capable_model() {
        let request = ImageGenerationRequest {
            prompt: "a lighthouse".into(),
            model: Some("dall-e-3".into()),
            size: None,
            quality: Some(crate::models::ImageQuality::Hd),
            n: Some(2),
        };
        let payload = build_generation_payload(&request);
        assert_eq!(payload["quality"], "hd");
        assert_eq!(payload["n"], 2);
        assert_eq!(payload["size"], "1024x1024");
    }

    #[test]
    fn test_payload_omits_quality_for_other_models() {
        let request = ImageGenerationRequest {
            prompt: "a lighthouse".into(),
            model: Some("dall-e-2".into()),
            size: Some("512x512".into()),
            quality: Some(crate::models::ImageQuality::Hd),
            n: None,
        };
        let payload = build_generation_payload(&request);
        assert!(payload.get("quality").is_none());
        assert_eq!(payload["size"], "512x512");
        assert_eq!(payload["n"], 1);
    }

    #[test]
    fn test_extract_prefers_data_urls() {
        let body = json!({
            "data": [
                {"url": "http://x/1.png"},
                {"b64_json": "aGVsbG8="}
            ],
            "images": ["http://x/ignored.png"]
        });
        let refs = extract_references(&body);
        assert_eq!(
            refs,
            vec![
                ImageReference::Url("http://x/1.png".into()),
                ImageReference::InlineData("aGVsbG8=".into()),
            ]
        );
    }

    #[test]
    fn test_extract_falls_back_to_images_array() {
        let body = json!({"images": ["http://x/a.png", "aGVsbG8="]});
        let refs = extract_references(&body);
        assert_eq!(
            refs,
            vec![
                ImageReference::Url("http://x/a.png".into()),
                ImageReference::InlineData("aGVsbG8=".into()),
            ]
        );
    }

    #[test]
    fn test_extract_handles_top_level_array() {
        let body = json!(["http://x/a.png"]);
        let refs = extract_references(&body);
        assert_eq!(refs, vec![ImageReference::Url("http://x/a.png".into())]);
    }

    #[test]
    fn test_extract_wraps_opaque_body() {
        let body = Value::String("something unexpected".into());
        let refs = extract_references(&body);
        assert_eq!(
            refs,
            vec![ImageReference::InlineData("something unexpected".into())]
        );
    }

    #[test]
    fn test_extract_empty_data_array_yields_nothing() {
        // The data shape matched, so no other pattern is consulted; the
        // probe loop keeps scanning on an empty extraction.
        let body = json!({"data": [], "images": ["http://x/b.png"]});
        assert!(extract_references(&body).is_empty());
    }

    #[test]
    fn test_supported_models_catalog() {
        let models = ImageClient::supported_models();
        assert!(models.iter().any(|(id, _, _)| *id == "dall-e-3"));
        assert!(models.iter().any(|(id, _, _)| *id == "dall-e-2"));
    }

    #[test]
    fn test_first_array_prefers_urls_over_b64() {
        let body = json!({
            "data": [
                {"url": "http://x/1.png", "b64_json": "aaaa"},
                {"url": "http://x/2.png"}
            ]
        });
        let refs = extract_from_first_array(&body);
        assert_eq!(
            refs,
            vec![
                ImageReference::Url("http://x/1.png".into()),
                ImageReference::Url("http://x/2.png".into()),
            ]
        );
    }

    #[test]
    fn test_first_array_falls_back_to_b64() {
        let body = json!({"data": [{"b64_json": "aaaa"}, {"b64_json": "bbbb"}]});
        let refs = extract_from_first_array(&body);
        assert_eq!(
            refs,
            vec![
                ImageReference::InlineData("aaaa".into()),
                ImageReference::InlineData("bbbb".into()),
            ]
        );
    }

    #[test]
    fn test_candidate_order_is_stable() {
        assert_eq!(ENDPOINT_CANDIDATES[0], "/images/generations");
        assert_eq!(ENDPOINT_CANDIDATES.len(), 5);
        assert_eq!(ENDPOINT_CANDIDATES[4], "/v1/generate");
    }
}
