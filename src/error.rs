//! # Error Types
//!
//! This module defines error types used throughout the certigen library.
//!
//! Every error is scoped to the single load, render, export or dispatch
//! operation that produced it. Nothing here is fatal to a batch.

use thiserror::Error;

/// Main error type for certigen operations
#[derive(Debug, Error)]
pub enum CertigenError {
    /// The template image could not be fetched or decoded
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// A strict font lookup named a family that was never registered
    #[error("Font unavailable: {0}")]
    FontUnavailable(String),

    /// Font bytes were rejected at registration
    #[error("Font error: {0}")]
    Font(String),

    /// An encoder rejected the rendered surface
    #[error("Export encoding error: {0}")]
    ExportEncoding(String),

    /// Email delivery failed for one recipient
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Caller supplied malformed data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
