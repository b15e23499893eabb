//! The user-facing JSON web server. Every request-scoped failure is mapped
//! to a uniform JSON error body here; no error kind is allowed to escape a
//! handler and crash the process.

use crate::error::ParalonError;
use crate::paralon::ParalonClient;
use crate::store::ImageStore;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;

pub mod routes;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub client: ParalonClient,
    pub store: ImageStore,
}

#[derive(Debug)]
pub struct WebError {
    err: ParalonError,
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl actix_web::error::ResponseError for WebError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({ "success": false, "error": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match self.err {
            ParalonError::AuthError(_) => StatusCode::UNAUTHORIZED,
            ParalonError::DecodeError(_) => StatusCode::BAD_REQUEST,
            ParalonError::EndpointNotFound(_)
            | ParalonError::ServerError { .. }
            | ParalonError::TransportError(_)
            | ParalonError::ResponseError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ParalonError> for WebError {
    fn from(err: ParalonError) -> WebError {
        WebError { err }
    }
}

impl From<base64::DecodeError> for WebError {
    fn from(err: base64::DecodeError) -> Self {
        WebError {
            err: ParalonError::DecodeError(format!("invalid base64 field: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::ResponseError;

    #[test]
    fn test_status_codes_by_error_kind() {
        let auth = WebError::from(ParalonError::AuthError("nope".into()));
        assert_eq!(auth.status_code(), StatusCode::UNAUTHORIZED);

        let decode = WebError::from(ParalonError::DecodeError("bad".into()));
        assert_eq!(decode.status_code(), StatusCode::BAD_REQUEST);

        let remote = WebError::from(ParalonError::ServerError {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(remote.status_code(), StatusCode::BAD_GATEWAY);

        let io = WebError::from(ParalonError::IoError("disk".into()));
        assert_eq!(io.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
