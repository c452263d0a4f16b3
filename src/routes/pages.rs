// 📄 Page handlers

use super::{blocking, AppError, AppState};
use crate::config::Page;
use crate::forms::{self, FilePayload, FormData, FormErrors};
use crate::store::Repository;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

const HOME_HTML: &str = include_str!("../../web/home.html");
const DASHBOARD_HTML: &str = include_str!("../../web/dashboard.html");
const EXPLORER_HTML: &str = include_str!("../../web/explorer.html");
const PREDICTION_HTML: &str = include_str!("../../web/prediction.html");
const UPLOAD_HTML: &str = include_str!("../../web/upload.html");
const NOT_FOUND_HTML: &str = include_str!("../../web/404.html");
pub(super) const SERVER_ERROR_HTML: &str = include_str!("../../web/500.html");

const FORM_PLACEHOLDER: &str = "{{ form }}";

// ============================================================================
// Static pages
// ============================================================================

/// GET / - Landing page
pub(super) async fn home() -> Html<&'static str> {
    Html(HOME_HTML)
}

/// GET /dashboard/
pub(super) async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// GET /explorer/
pub(super) async fn explorer() -> Html<&'static str> {
    Html(EXPLORER_HTML)
}

/// GET /prediction/ - no computation behind it
pub(super) async fn prediction() -> Html<&'static str> {
    Html(PREDICTION_HTML)
}

pub(super) async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_HTML))
}

// ============================================================================
// Upload
// ============================================================================

/// GET /upload/ - Empty form
pub(super) async fn upload_form(State(state): State<AppState>) -> Html<String> {
    let action = state.page_path(Page::Upload);
    Html(render_upload_page(action, "", "", None))
}

/// POST /upload/ - Validate, store, redirect; or re-render with errors
pub(super) async fn upload_submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_multipart(&mut multipart).await?;

    let draft = match forms::validate_upload(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::info!(errors = %errors, "upload rejected");
            let html = render_upload_page(
                state.page_path(Page::Upload),
                form.value("name").unwrap_or(""),
                form.value("observation").unwrap_or(""),
                Some(&errors),
            );
            return Ok((StatusCode::OK, Html(html)).into_response());
        }
    };

    blocking(&state.store, move |store| store.uploads().save(draft)).await?;

    Ok(found(state.page_path(Page::Dashboard)))
}

/// 302 Found, as browsers expect after a form POST.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

async fn read_multipart(multipart: &mut Multipart) -> Result<FormData, AppError> {
    let mut form = FormData::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let bytes = field.bytes().await?;
                form.insert_file(name, FilePayload::new(filename, bytes.to_vec()));
            }
            None => {
                let text = field.text().await?;
                form.insert_value(name, text);
            }
        }
    }

    Ok(form)
}

fn render_upload_page(
    action: &str,
    name: &str,
    observation: &str,
    errors: Option<&FormErrors>,
) -> String {
    UPLOAD_HTML.replace(
        FORM_PLACEHOLDER,
        &render_upload_form(action, name, observation, errors),
    )
}

/// HTML for the upload form, with sticky values and per-field errors.
pub fn render_upload_form(
    action: &str,
    name: &str,
    observation: &str,
    errors: Option<&FormErrors>,
) -> String {
    let field_errors = |field: &str| -> String {
        let messages = errors.map(|e| e.for_field(field)).unwrap_or_default();
        if messages.is_empty() {
            return String::new();
        }
        let items: String = messages
            .iter()
            .map(|m| format!("<li>{}</li>", escape_html(m)))
            .collect();
        format!("<ul class=\"errorlist\" id=\"error_{}\">{}</ul>", field, items)
    };

    format!(
        r#"<form method="post" action="{action}" enctype="multipart/form-data" class="upload-form">
  <p>
    <label for="id_name">Name:</label>
    {name_errors}<input type="text" name="name" id="id_name" maxlength="{max}" required value="{name}">
  </p>
  <p>
    <label for="id_file">File:</label>
    {file_errors}<input type="file" name="file" id="id_file" required>
  </p>
  <p>
    <label for="id_observation">Observation:</label>
    {observation_errors}<textarea name="observation" id="id_observation" cols="40" rows="6">{observation}</textarea>
  </p>
  <button type="submit">Upload</button>
</form>"#,
        action = escape_html(action),
        max = forms::NAME_MAX_CHARS,
        name = escape_html(name),
        observation = escape_html(observation),
        name_errors = field_errors("name"),
        file_errors = field_errors("file"),
        observation_errors = field_errors("observation"),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
