//! Workspace API handlers: current template, elements, recipients and
//! saved templates.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::image_source::ImageSource;
use crate::model::{ElementList, Recipient, RecipientList, SavedTemplate, Template};

use super::super::state::AppState;
use super::error_response;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// GET /api/template - The current template, if any.
pub async fn current(State(state): State<Arc<AppState>>) -> ApiResult<Option<Template>> {
    state.workspace.current_template().map(Json).map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct SetTemplateRequest {
    pub image: ImageSource,
}

/// PUT /api/template - Choose the background image being edited.
pub async fn set_current(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetTemplateRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let image = state.admit_template(req.image).await.map_err(error_response)?;
    state
        .workspace
        .set_current_image(&image)
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/elements
pub async fn elements(State(state): State<Arc<AppState>>) -> ApiResult<ElementList> {
    state.workspace.elements().map(Json).map_err(error_response)
}

/// PUT /api/elements - Replace the whole element list.
///
/// Positions are clamped into 0-100 on the way in.
pub async fn set_elements(
    State(state): State<Arc<AppState>>,
    Json(mut elements): Json<ElementList>,
) -> ApiResult<ElementList> {
    elements.apply_to_all(|el| {
        let (x, y) = el.clamped_position();
        el.with_position(x, y)
    });
    state
        .workspace
        .set_elements(&elements)
        .map_err(error_response)?;
    Ok(Json(elements))
}

/// GET /api/recipients
pub async fn recipients(State(state): State<Arc<AppState>>) -> ApiResult<RecipientList> {
    state.workspace.recipients().map(Json).map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct AddRecipientRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// POST /api/recipients - Add one recipient.
pub async fn add_recipient(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddRecipientRequest>,
) -> Result<(StatusCode, Json<Recipient>), (StatusCode, String)> {
    let mut recipient = Recipient::new(&req.name).map_err(error_response)?;
    if let Some(email) = req.email {
        recipient = recipient.with_email(email);
    }
    if let Some(description) = req.description {
        recipient = recipient.with_description(description);
    }

    state
        .workspace
        .add_recipient(recipient.clone())
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(recipient)))
}

/// DELETE /api/recipients/:id
pub async fn remove_recipient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !state.workspace.remove_recipient(&id).map_err(error_response)? {
        return Err((StatusCode::NOT_FOUND, format!("No recipient '{}'", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct SavedTemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "savedAt")]
    pub saved_at: chrono::DateTime<chrono::Utc>,
    pub elements: usize,
}

impl From<&SavedTemplate> for SavedTemplateSummary {
    fn from(saved: &SavedTemplate) -> Self {
        Self {
            id: saved.id.clone(),
            name: saved.name.clone(),
            saved_at: saved.saved_at,
            elements: saved.template.elements.len(),
        }
    }
}

/// GET /api/templates - Saved templates, without their image data.
pub async fn saved(State(state): State<Arc<AppState>>) -> ApiResult<Vec<SavedTemplateSummary>> {
    let all = state.workspace.saved_templates().map_err(error_response)?;
    Ok(Json(all.iter().map(SavedTemplateSummary::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub name: String,
}

/// POST /api/templates - Snapshot the current template under a name.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveTemplateRequest>,
) -> Result<(StatusCode, Json<SavedTemplateSummary>), (StatusCode, String)> {
    let saved = state
        .workspace
        .save_current(&req.name)
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(SavedTemplateSummary::from(&saved))))
}

/// POST /api/templates/:id/open - Make a saved template the one being edited.
pub async fn open(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Template> {
    match state.workspace.open_saved(&id).map_err(error_response)? {
        Some(template) => Ok(Json(template)),
        None => Err((StatusCode::NOT_FOUND, format!("No saved template '{}'", id))),
    }
}
