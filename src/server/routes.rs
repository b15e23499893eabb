//! JSON route handlers. Image payloads arrive as base64 fields, get saved
//! under the uploads root, flow through the remote client, and every result
//! is persisted under the generated root before local paths are returned.

use super::{AppState, WebError};
use crate::models::{ImageEditRequest, ImageGenerationRequest, ImageVariationRequest};
use crate::processor::ImageProcessor;
use actix_web::{get, post, web, Responder};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, WebError>;

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub success: bool,
    pub images: Vec<String>,
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SingleImageResponse {
    pub success: bool,
    pub image: String,
}

#[get("/")]
pub async fn health() -> impl Responder {
    web::Json(serde_json::json!({
        "status": "ok",
        "message": "Paralon image generation & editing API"
    }))
}

#[get("/generated/{filename}")]
pub async fn serve_generated(
    filename: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    serve_from(state.store.generated_dir(), &filename.into_inner()).await
}

#[get("/uploads/{filename}")]
pub async fn serve_upload(
    filename: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    serve_from(state.store.upload_dir(), &filename.into_inner()).await
}

/// Serves one file from a storage root. Only bare filenames are accepted;
/// anything that could climb out of the root is treated as missing.
async fn serve_from(root: &std::path::Path, filename: &str) -> actix_web::HttpResponse {
    if !is_safe_filename(filename) {
        return actix_web::HttpResponse::NotFound().finish();
    }

    match tokio::fs::read(root.join(filename)).await {
        Ok(bytes) => actix_web::HttpResponse::Ok()
            .content_type(content_type_for(filename))
            .body(bytes),
        Err(_) => actix_web::HttpResponse::NotFound().finish(),
    }
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.contains('/') && !name.contains('\\')
}

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[post("/api/generate")]
pub async fn generate(
    body: web::Json<ImageGenerationRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let mut request = body.into_inner();
    request.n = Some(request.n.unwrap_or(1).max(1));

    let references = state.client.generate_images(request).await?;
    let response = persist_all(&state, references).await?;
    log::info!("Served generation request: {} image(s)", response.images.len());

    Ok(web::Json(response))
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
    /// Base64-encoded source image.
    pub image: String,
    pub prompt: String,
    /// Optional base64-encoded mask; transparent regions mark editable area.
    pub mask: Option<String>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub n: Option<u32>,
}

#[post("/api/edit")]
pub async fn edit(
    body: web::Json<EditBody>,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let body = body.into_inner();

    let image = general_purpose::STANDARD.decode(&body.image)?;
    state.store.save_upload("source.png", &image).await?;

    let mask = match &body.mask {
        Some(encoded) => {
            let bytes = general_purpose::STANDARD.decode(encoded)?;
            state.store.save_upload("mask.png", &bytes).await?;
            Some(bytes)
        }
        None => None,
    };

    let request = ImageEditRequest {
        image,
        prompt: body.prompt,
        mask,
        model: body.model,
        size: body.size,
        n: body.n,
    };

    let references = state.client.edit_image(request).await?;
    let response = persist_all(&state, references).await?;
    log::info!("Served edit request: {} image(s)", response.images.len());

    Ok(web::Json(response))
}

#[derive(Debug, Deserialize)]
pub struct VariationBody {
    /// Base64-encoded source image.
    pub image: String,
    pub model: Option<String>,
    pub size: Option<String>,
    pub n: Option<u32>,
}

#[post("/api/variation")]
pub async fn variation(
    body: web::Json<VariationBody>,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let body = body.into_inner();

    let image = general_purpose::STANDARD.decode(&body.image)?;
    state.store.save_upload("source.png", &image).await?;

    let request = ImageVariationRequest {
        image,
        model: body.model,
        size: body.size,
        n: body.n,
    };

    let references = state.client.create_variation(request).await?;
    let response = persist_all(&state, references).await?;
    log::info!(
        "Served variation request: {} image(s)",
        response.images.len()
    );

    Ok(web::Json(response))
}

#[derive(Debug, Deserialize)]
pub struct StyleTransferBody {
    /// Base64-encoded base image.
    pub base_image: String,
    /// Base64-encoded style image.
    pub style_image: String,
    pub alpha: Option<f32>,
}

#[post("/api/style-transfer")]
pub async fn style_transfer(
    body: web::Json<StyleTransferBody>,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let body = body.into_inner();

    let base = general_purpose::STANDARD.decode(&body.base_image)?;
    let style = general_purpose::STANDARD.decode(&body.style_image)?;
    state.store.save_upload("base.png", &base).await?;
    state.store.save_upload("style.png", &style).await?;

    let blended = ImageProcessor::blend(&base, &style, body.alpha.unwrap_or(0.5))?;
    let filename = state.store.save_generated_bytes(&blended).await?;
    log::info!("Served style-transfer request: /generated/{}", filename);

    Ok(web::Json(SingleImageResponse {
        success: true,
        image: format!("/generated/{}", filename),
    }))
}

async fn persist_all(
    state: &AppState,
    references: Vec<crate::models::ImageReference>,
) -> Result<ImagesResponse> {
    let filenames = futures::future::try_join_all(
        references
            .iter()
            .map(|reference| state.store.save_generated(reference)),
    )
    .await?;

    Ok(ImagesResponse {
        success: true,
        images: filenames
            .into_iter()
            .map(|name| format!("/generated/{}", name))
            .collect(),
        urls: references
            .iter()
            .map(|reference| reference.as_str().to_string())
            .collect(),
    })
}
