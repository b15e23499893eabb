use std::fmt;

#[derive(Debug)]
pub enum ParalonError {
    ConfigError(String),
    AuthError(String),
    EndpointNotFound(String),
    ServerError { status: u16, body: String },
    TransportError(String),
    ResponseError(String),
    DecodeError(String),
    ImageError(String),
    IoError(String),
}

impl fmt::Display for ParalonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParalonError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ParalonError::AuthError(msg) => {
                write!(f, "Authentication failed, check PARALON_API_KEY: {}", msg)
            }
            ParalonError::EndpointNotFound(msg) => {
                write!(f, "API endpoint not found, check PARALON_API_BASE: {}", msg)
            }
            ParalonError::ServerError { status, body } => {
                write!(f, "Remote server error (HTTP {}): {}", status, body)
            }
            ParalonError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            ParalonError::ResponseError(msg) => write!(f, "Response error: {}", msg),
            ParalonError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            ParalonError::ImageError(msg) => write!(f, "Image processing error: {}", msg),
            ParalonError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ParalonError {}

impl From<std::io::Error> for ParalonError {
    fn from(err: std::io::Error) -> Self {
        ParalonError::IoError(err.to_string())
    }
}

impl From<image::ImageError> for ParalonError {
    fn from(err: image::ImageError) -> Self {
        ParalonError::ImageError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ParalonError>;
