//! HTTP request handlers.

pub mod fonts;
pub mod render;
pub mod workspace;

use axum::http::StatusCode;

use crate::error::CertigenError;

/// Map a library error onto an HTTP status and message.
pub fn error_response(e: CertigenError) -> (StatusCode, String) {
    let status = match &e {
        CertigenError::ImageDecode(_)
        | CertigenError::Font(_)
        | CertigenError::InvalidInput(_)
        | CertigenError::Json(_) => StatusCode::BAD_REQUEST,
        CertigenError::FontUnavailable(_) => StatusCode::NOT_FOUND,
        CertigenError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        CertigenError::ExportEncoding(_) | CertigenError::Storage(_) | CertigenError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}
