//! Certificate render API handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::compositor::Compositor;
use crate::export::{self, ExportFormat, ExportOptions};
use crate::image_source::{ImageSource, TemplateImage};
use crate::model::ElementList;

use super::super::state::AppState;
use super::error_response;

/// Request body for render and preview.
///
/// Omitted `template` and `elements` fall back to the workspace's current
/// template.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub template: Option<ImageSource>,
    #[serde(default)]
    pub elements: Option<ElementList>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub options: ExportOptions,
}

/// Resolve the template and elements, admitting any client-named image.
async fn resolve_inputs(
    state: &AppState,
    req: &RenderRequest,
) -> Result<(ImageSource, ElementList), (StatusCode, String)> {
    let image = match &req.template {
        Some(image) => state
            .admit_template(image.clone())
            .await
            .map_err(error_response)?,
        None => state
            .workspace
            .current_image()
            .map_err(error_response)?
            .ok_or((StatusCode::BAD_REQUEST, "No template image given or stored".to_string()))?,
    };
    let elements = match &req.elements {
        Some(elements) => elements.clone(),
        None => state.workspace.elements().map_err(error_response)?,
    };
    Ok((image, elements))
}

async fn load(state: &AppState, image: &ImageSource) -> Result<TemplateImage, (StatusCode, String)> {
    image
        .load_with(&state.http_client)
        .await
        .map_err(error_response)
}

/// Run render and encode work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, (StatusCode, String)>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, (StatusCode, String)> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Processing error: {}", e),
        )
    })?
}

fn file_response(file: export::ExportedFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.mime_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file.file_name.replace('"', "'")),
            ),
        ],
        file.bytes,
    )
        .into_response()
}

/// POST /api/render - Render one certificate in the requested format.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<Response, (StatusCode, String)> {
    let (image, elements) = resolve_inputs(&state, &req).await?;
    let template = load(&state, &image).await?;
    let fonts = state.fonts.clone().read_owned().await;

    let RenderRequest { name, options, .. } = req;
    let file = blocking(move || {
        let surface = Compositor::new(&fonts).render(&template, elements.as_slice(), &name);
        drop(fonts);

        let file = export::export(&surface, &name, &options).map_err(error_response)?;
        tracing::info!(
            recipient = %name,
            format = %options.format,
            width = surface.width(),
            height = surface.height(),
            "certificate rendered"
        );
        Ok(file)
    })
    .await?;

    Ok(file_response(file))
}

/// POST /api/preview - Live PNG preview.
///
/// Responds `204 No Content` when a newer preview request started while
/// this one was loading its template.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> Result<Response, (StatusCode, String)> {
    let ticket = state.preview.begin();
    let (image, elements) = resolve_inputs(&state, &req).await?;
    let template = load(&state, &image).await?;
    let fonts = state.fonts.clone().read_owned().await;
    let session = state.preview.clone();

    let name = req.name;
    let file = blocking(move || {
        let Some(surface) =
            session.render_if_current(ticket, &template, elements.as_slice(), &name, &fonts)
        else {
            return Ok(None);
        };
        drop(fonts);

        let options = ExportOptions::new(ExportFormat::Png);
        export::export(&surface, &name, &options)
            .map(Some)
            .map_err(error_response)
    })
    .await?;

    Ok(match file {
        Some(file) => file_response(file),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
