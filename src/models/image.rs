use serde::{Deserialize, Serialize};

/// Quality tier requested from the remote API. Only the hd-capable model
/// tier honors `Hd`; the flag is omitted from the payload for other models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    #[default]
    Standard,
    Hd,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Standard => "standard",
            ImageQuality::Hd => "hd",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub size: Option<String>,
    pub quality: Option<ImageQuality>,
    pub n: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub image: Vec<u8>,
    pub prompt: String,
    pub mask: Option<Vec<u8>>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub n: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ImageVariationRequest {
    pub image: Vec<u8>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub n: Option<u32>,
}

/// One image produced by the remote API, either fetchable or inlined.
///
/// References only live between the remote call and local persistence; the
/// store resolves them into files and they are never kept around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    Url(String),
    InlineData(String), // Base64 encoded
}

impl ImageReference {
    /// Classifies a bare string produced by response normalization.
    pub fn from_raw(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            ImageReference::Url(value.to_string())
        } else {
            ImageReference::InlineData(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageReference::Url(s) => s,
            ImageReference::InlineData(s) => s,
        }
    }
}

/// Wire shape of an OpenAI-compatible image response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageApiResponse {
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}
