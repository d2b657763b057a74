//! Font API handlers.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

use crate::fonts::FontUpload;
use crate::model::FontWeight;

use super::super::state::AppState;
use super::error_response;

#[derive(Debug, Serialize)]
pub struct FontsResponse {
    pub families: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub name: String,
    pub family: String,
    pub weight: FontWeight,
}

/// GET /api/fonts - List registered families, built-in first.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<FontsResponse> {
    let fonts = state.fonts.read().await;
    Json(FontsResponse {
        families: fonts.families(),
    })
}

/// POST /api/fonts - Upload a TTF/OTF font.
///
/// Multipart fields: `name` (display name), optional `weight`, and `file`.
/// The font is validated and registered before it is persisted, so a
/// `200` means it is usable by the next render.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut name: Option<String> = None;
    let mut weight = FontWeight::normal();
    let mut data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "name" => {
                name = Some(field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read name: {}", e))
                })?);
            }
            "weight" => {
                let text = field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read weight: {}", e))
                })?;
                weight = FontWeight::from(text.trim());
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("font").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Failed to read font: {}", e))
                })?;
                data = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        data.ok_or((StatusCode::BAD_REQUEST, "No file field found".to_string()))?;
    // Fall back to the file stem when no display name was given.
    let name = name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| {
            file_name
                .rsplit_once('.')
                .map(|(stem, _)| stem.to_string())
                .unwrap_or(file_name)
        });

    let upload = FontUpload::new(&name, weight, &bytes);
    state
        .fonts
        .write()
        .await
        .register_upload(&upload)
        .map_err(error_response)?;
    state
        .workspace
        .add_font_upload(&upload)
        .map_err(error_response)?;

    Ok(Json(UploadResponse {
        name: upload.name,
        family: upload.family,
        weight: upload.weight,
    }))
}
