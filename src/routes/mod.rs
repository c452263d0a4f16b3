// 🌐 HTTP surface - page routes, upload form, JSON API
//
// Page routes come from the config's route table; the API, static assets
// and uploaded media are always mounted.

mod api;
mod pages;

pub use api::ApiResponse;
pub use pages::render_upload_form;

use crate::config::{AppConfig, Page};
use crate::error::StoreError;
use crate::store::RecordStore;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::task::JoinError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: RecordStore, config: AppConfig) -> Self {
        AppState {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Registered path of a page, falling back to its default.
    pub fn page_path(&self, page: Page) -> &str {
        self.config.path_for(page).unwrap_or(page.default_path())
    }
}

/// Request failures that are not validation errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("storage task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "request failed: storage unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::SERVER_ERROR_HTML),
                )
                    .into_response()
            }
            AppError::Task(e) => {
                tracing::error!(error = %e, "request failed: storage task aborted");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::SERVER_ERROR_HTML),
                )
                    .into_response()
            }
            AppError::Multipart(e) => {
                tracing::warn!(error = %e, "rejected multipart body");
                (e.status(), e.body_text()).into_response()
            }
        }
    }
}

/// Run a store call on the blocking pool; SQLite and blob writes are synchronous.
async fn blocking<T, F>(store: &Arc<RecordStore>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&RecordStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    Ok(tokio::task::spawn_blocking(move || f(&store)).await??)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let mut app: Router<AppState> = Router::new();

    for entry in &state.config.routes {
        let path = entry.path.as_str();
        app = match entry.page {
            Page::Home => app.route(path, get(pages::home)),
            Page::Dashboard => app.route(path, get(pages::dashboard)),
            Page::Explorer => app.route(path, get(pages::explorer)),
            Page::Prediction => app.route(path, get(pages::prediction)),
            Page::Upload => app.route(
                path,
                get(pages::upload_form).post(pages::upload_submit),
            ),
        };
    }

    let api_routes: Router<AppState> = Router::new()
        .route("/health", get(api::health_check))
        .route(
            "/predictions",
            get(api::list_predictions).post(api::create_prediction),
        )
        .route("/uploads", get(api::list_uploads));

    let media = ServeDir::new(state.store.blobs().media_root());
    let body_limit = state.config.max_upload_bytes;

    app.nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .nest_service("/media", media)
        .fallback(pages::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
