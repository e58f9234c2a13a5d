//! Web UI for the vehicle swap form.
//!
//! Routes:
//! - GET  /             Form page
//! - POST /image        Upload the original image (multipart field `image`)
//! - POST /image/clear  Remove the image and any result
//! - POST /submit       Set the prompt and start an edit
//! - GET  /api/state    Form snapshot (JSON)
//! - GET  /api/health   Upstream reachability check
//! - GET  /health       Liveness

mod page;

pub use page::{escape_html, render};

use crate::config::AppConfig;
use crate::error::{Result, VehicleSwapError};
use crate::form::{EditForm, FormView};
use crate::image::{ImageEditor, ImageFormat, MemoryFile};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared server state: one form session and the injected editor.
#[derive(Clone)]
pub struct AppState {
    form: Arc<Mutex<EditForm>>,
    editor: Arc<dyn ImageEditor>,
}

impl AppState {
    /// Creates state with an empty form.
    pub fn new(editor: Arc<dyn ImageEditor>) -> Self {
        Self {
            form: Arc::new(Mutex::new(EditForm::new())),
            editor,
        }
    }

    /// Handle to the form session.
    pub fn form(&self) -> Arc<Mutex<EditForm>> {
        Arc::clone(&self.form)
    }
}

/// Builds the router.
pub fn router(state: AppState, upload_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/image", post(upload_image))
        .route("/image/clear", post(clear_image))
        .route("/submit", post(submit))
        .route("/api/state", get(form_state))
        .route("/api/health", get(upstream_health))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(upload_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the web UI until Ctrl-C.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let editor: Arc<dyn ImageEditor> = Arc::new(config.editor()?);
    let app = router(AppState::new(editor), config.upload_limit_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        model = %config.model,
        "vehicle swap UI listening on http://{}",
        config.listen_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.form.lock().await.view();
    Html(render(&view))
}

async fn form_state(State(state): State<AppState>) -> Json<FormView> {
    Json(state.form.lock().await.view())
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "healthy": true,
        "model": state.editor.model(),
    }))
}

async fn upstream_health(State(state): State<AppState>) -> impl IntoResponse {
    match state.editor.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "reachable": true })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "reachable": false, "error": e.to_string() })),
        ),
    }
}

async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> Redirect {
    match read_upload(&mut multipart).await {
        Ok(Some(file)) => {
            let mut form = state.form.lock().await;
            if let Err(e) = form.select_image(Arc::new(file)).await {
                tracing::debug!("image selection rejected: {e}");
            }
        }
        Ok(None) => tracing::debug!("upload without a file"),
        Err(e) => {
            tracing::warn!("failed to read upload: {e}");
            state.form.lock().await.report_file_error(&e);
        }
    }
    Redirect::to("/")
}

/// Pulls the `image` field out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<MemoryFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| VehicleSwapError::FileRead(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let declared = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| VehicleSwapError::FileRead(e.to_string()))?;

        if name.is_empty() && data.is_empty() {
            return Ok(None);
        }

        // Browsers send application/octet-stream for unknown extensions
        let mime_type = if ImageFormat::from_mime_type(&declared).is_some() {
            declared
        } else {
            ImageFormat::from_magic_bytes(&data)
                .map(|f| f.mime_type().to_string())
                .unwrap_or(declared)
        };

        return Ok(Some(MemoryFile::new(name, mime_type, data.to_vec())));
    }
    Ok(None)
}

async fn clear_image(State(state): State<AppState>) -> Redirect {
    state.form.lock().await.clear_image();
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
struct SubmitParams {
    #[serde(default)]
    prompt: String,
}

async fn submit(State(state): State<AppState>, Form(params): Form<SubmitParams>) -> Redirect {
    let ticket = {
        let mut form = state.form.lock().await;
        form.set_prompt(params.prompt);
        match form.begin_submit() {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!("submission rejected: {e}");
                return Redirect::to("/");
            }
        }
    };

    // The form stays unlocked while the service works
    let form = state.form();
    let editor = Arc::clone(&state.editor);
    let id = ticket.id();
    let edit = tokio::spawn(async move {
        let outcome = ticket.run(editor.as_ref()).await;
        (ticket, outcome)
    });
    tokio::spawn(async move {
        match edit.await {
            Ok((ticket, outcome)) => {
                form.lock().await.finish_submit(ticket, outcome);
            }
            Err(e) => {
                tracing::error!(ticket = id, "edit task failed: {e}");
                form.lock()
                    .await
                    .abandon_submit(id, VehicleSwapError::Internal(e.to_string()));
            }
        }
    });

    Redirect::to("/")
}
