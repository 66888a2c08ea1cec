use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use assetflow_core::EmailAddress;
use assetflow_infra::projections::PageRequest;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// The team row a member belongs to (used by the company-info page).
pub async fn company_info(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let email = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.teams.row_for_member(&email) {
        Some(row) => Json(dto::team_json(&row)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "no team membership"),
    }
}

pub async fn add_single(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddSingleMemberRequest>,
) -> axum::response::Response {
    let hr_email = match errors::parse_email(&body.hr_email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let member_email = match errors::parse_email(&body.member_email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.membership.add_member(&hr_email, &member_email) {
        Ok(membership_id) => (
            StatusCode::CREATED,
            Json(json!({ "id": membership_id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_multiple(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddMultipleMembersRequest>,
) -> axum::response::Response {
    let hr_email = match errors::parse_email(&body.hr_email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut member_emails: Vec<EmailAddress> = Vec::with_capacity(body.member_emails.len());
    for raw in &body.member_emails {
        match errors::parse_email(raw) {
            Ok(v) => member_emails.push(v),
            Err(resp) => return resp,
        }
    }

    match services.membership.add_members(&hr_email, &member_emails) {
        Ok(ids) => (
            StatusCode::CREATED,
            Json(json!({
                "ids": ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let membership_id = match errors::parse_uuid(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.membership.remove_member(membership_id) {
        Ok(()) => Json(json!({ "deleted": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// HR roster, paginated.
pub async fn my_team(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Query(page): Query<PageRequest>,
) -> axum::response::Response {
    let email = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let page = services.teams.team_of_hr(&email, page);
    Json(dto::page_json(page, dto::team_json)).into_response()
}

/// The whole team a member belongs to, paginated.
pub async fn my_teams(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Query(page): Query<PageRequest>,
) -> axum::response::Response {
    let email = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let page = services.teams.team_of_member(&email, page);
    Json(dto::page_json(page, dto::team_json)).into_response()
}
