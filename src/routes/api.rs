// JSON API over the record store

use super::{blocking, AppState};
use crate::db::{Prediction, UploadedFile};
use crate::forms::{self, FormData};
use crate::store::Repository;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            errors: None,
        }
    }
}

/// Upload row plus the URL its blob is served from.
#[derive(Debug, Serialize)]
pub struct UploadView {
    #[serde(flatten)]
    pub file: UploadedFile,
    pub url: String,
}

impl From<UploadedFile> for UploadView {
    fn from(file: UploadedFile) -> Self {
        let url = media_url(&file.file_path);
        Self { file, url }
    }
}

/// `/media/...` URL for a stored relative path, each segment percent-encoded.
pub fn media_url(relative: &str) -> String {
    let encoded: Vec<String> = relative
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("/media/{}", encoded.join("/"))
}

fn storage_failure(e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "api request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::failure("storage unavailable")),
    )
        .into_response()
}

/// GET /api/health - Health check
pub(super) async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/predictions - All predictions, newest first
pub(super) async fn list_predictions(State(state): State<AppState>) -> Response {
    match state.store.predictions().list() {
        Ok(predictions) => (StatusCode::OK, Json(ApiResponse::ok(predictions))).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// POST /api/predictions - Urlencoded prediction form
pub(super) async fn create_prediction(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let form: FormData = fields.into_iter().collect();

    let draft = match forms::validate_prediction(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::info!(errors = %errors, "prediction rejected");
            let body = ApiResponse::<Prediction> {
                success: false,
                data: None,
                error: Some("validation failed".to_string()),
                errors: Some(errors.to_map()),
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
        }
    };

    match blocking(&state.store, move |store| store.predictions().save(draft)).await {
        Ok(saved) => (StatusCode::CREATED, Json(ApiResponse::ok(saved))).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// GET /api/uploads - Uploaded file rows, newest first
pub(super) async fn list_uploads(State(state): State<AppState>) -> Response {
    match state.store.uploads().list() {
        Ok(files) => {
            let views: Vec<UploadView> = files.into_iter().map(UploadView::from).collect();
            (StatusCode::OK, Json(ApiResponse::ok(views))).into_response()
        }
        Err(e) => storage_failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url_encodes_segments() {
        assert_eq!(media_url("uploads/report.pdf"), "/media/uploads/report.pdf");
        assert_eq!(media_url("uploads/q3 data#1.csv"), "/media/uploads/q3%20data%231.csv");
    }

    #[test]
    fn test_failure_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::failure("storage unavailable")).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "storage unavailable");
        assert!(json.get("data").is_none());
        assert!(json.get("errors").is_none());
    }
}
