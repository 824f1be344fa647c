//! HTTP routes for the LinkPilot gateway
//!
//! Stateless JSON endpoints over the library's workflow steps, plus the
//! OAuth redirect/callback pair. Missing required fields are a 400; any
//! downstream failure is a 500 carrying the upstream detail. No endpoint
//! returns a partial-success status.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use liblinkpilot::config::Config;
use liblinkpilot::generator::Generator;
use liblinkpilot::platform::Platform;
use liblinkpilot::service::{assets, auth, publisher};
use liblinkpilot::{
    ImageAsset, ImageFile, ImageMimeType, LinkpilotError, PublishRequest, Session,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub platform: Arc<dyn Platform>,
    pub generator: Arc<dyn Generator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth", get(auth_redirect))
        .route("/api/callback", get(auth_callback))
        .route("/api/generate", post(generate))
        .route("/api/upload-image", post(upload_image))
        .route("/api/post", post(create_post))
        .route("/api/agentic-post", post(agentic_post))
        .with_state(state)
}

fn missing_fields() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Missing required fields" })),
    )
        .into_response()
}

fn bad_request(error: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": error }))).into_response()
}

/// Downstream failures keep the upstream status/body in `details`.
fn downstream_failure(error: &str, source: LinkpilotError) -> Response {
    let details = match &source {
        LinkpilotError::Platform(platform_error) => platform_error.upstream().to_string(),
        other => other.to_string(),
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": error, "details": details })),
    )
        .into_response()
}

async fn auth_redirect(State(state): State<AppState>) -> Redirect {
    let state_token = auth::generate_state();
    Redirect::temporary(&auth::authorization_url(
        &state.config.linkedin,
        &state_token,
    ))
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code else {
        return missing_fields();
    };

    match auth::complete_authorization(state.platform.as_ref(), &code).await {
        Ok(session) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("accessToken", &session.access_token)
                .append_pair("authorUrn", &session.author_urn)
                .append_pair("name", session.display_name.as_deref().unwrap_or(""))
                .append_pair("picture", session.display_picture.as_deref().unwrap_or(""))
                .finish();
            let target = format!("{}/?{}", state.config.gateway.public_base_url, query);
            Redirect::temporary(&target).into_response()
        }
        Err(e) => downstream_failure("OAuth flow failed", e),
    }
}

#[derive(Deserialize)]
struct GenerateRequest {
    input: Option<String>,
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let Some(input) = request.input.filter(|s| !s.trim().is_empty()) else {
        return missing_fields();
    };

    match state.generator.generate(&input).await {
        Ok(generated) => Json(json!({ "generatedPost": generated })).into_response(),
        Err(e) => downstream_failure("Generation failed", e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadImageRequest {
    access_token: Option<String>,
    author_urn: Option<String>,
    file_name: Option<String>,
    file_type: Option<String>,
    file_data: Option<String>,
}

async fn upload_image(
    State(state): State<AppState>,
    Json(request): Json<UploadImageRequest>,
) -> Response {
    let (Some(access_token), Some(author_urn), Some(file_name), Some(file_type), Some(file_data)) = (
        request.access_token,
        request.author_urn,
        request.file_name,
        request.file_type,
        request.file_data,
    ) else {
        return missing_fields();
    };

    let Some(mime_type) = ImageMimeType::from_mime_str(&file_type) else {
        return bad_request("Unsupported file type");
    };
    let Ok(data) = base64::engine::general_purpose::STANDARD.decode(file_data) else {
        return bad_request("Invalid base64 file data");
    };

    let session = Session::restore(access_token, author_urn);
    let mut batch = vec![ImageAsset::selected(ImageFile {
        name: file_name,
        mime_type,
        data,
    })];

    match assets::prepare_all(state.platform.as_ref(), &session, &mut batch).await {
        Ok(()) => {
            // prepare_all only returns Ok once every entry is Ready
            let asset = batch[0].asset_urn.clone().unwrap_or_default();
            Json(json!({ "asset": asset })).into_response()
        }
        Err(e) => downstream_failure("Image upload failed", e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    content: Option<String>,
    access_token: Option<String>,
    author_urn: Option<String>,
    image_asset_urns: Option<Vec<String>>,
}

async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Response {
    let (Some(content), Some(access_token), Some(author_urn)) =
        (request.content, request.access_token, request.author_urn)
    else {
        return missing_fields();
    };
    if content.trim().is_empty() {
        return missing_fields();
    }

    let session = Session::restore(access_token, author_urn);
    let publish_request = PublishRequest {
        body: content,
        author_urn: session.author_urn.clone(),
        asset_urns: request.image_asset_urns.unwrap_or_default(),
    };

    match publisher::publish(state.platform.as_ref(), &session, &publish_request).await {
        Ok(()) => Json(json!({ "message": "Post created successfully" })).into_response(),
        Err(e) => downstream_failure("LinkedIn post failed", e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgenticPostRequest {
    prompt: Option<String>,
    access_token: Option<String>,
    author_urn: Option<String>,
}

/// One-shot flow: generate a draft from the prompt and publish it
/// immediately, text-only. No intermediate review step.
async fn agentic_post(
    State(state): State<AppState>,
    Json(request): Json<AgenticPostRequest>,
) -> Response {
    let (Some(prompt), Some(access_token), Some(author_urn)) =
        (request.prompt, request.access_token, request.author_urn)
    else {
        return missing_fields();
    };
    if prompt.trim().is_empty() {
        return missing_fields();
    }

    let generated = match state.generator.generate(&prompt).await {
        Ok(generated) => generated,
        Err(e) => return downstream_failure("Generation failed", e),
    };

    let session = Session::restore(access_token, author_urn);
    let publish_request = PublishRequest {
        body: generated,
        author_urn: session.author_urn.clone(),
        asset_urns: Vec::new(),
    };

    match publisher::publish(state.platform.as_ref(), &session, &publish_request).await {
        Ok(()) => Json(json!({ "message": "Post created successfully" })).into_response(),
        Err(e) => downstream_failure("LinkedIn post failed", e),
    }
}
