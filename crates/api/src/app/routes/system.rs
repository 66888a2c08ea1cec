use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn root() -> &'static str {
    "asset management server is running"
}

/// Issue a session token for the given identity.
pub async fn issue_token(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::IssueTokenRequest>,
) -> axum::response::Response {
    let email = match errors::parse_email(&body.email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.tokens.issue(email, body.name, Utc::now()) {
        Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "token_error",
            e.to_string(),
        ),
    }
}
