use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use assetflow_infra::projections::PageRequest;
use assetflow_infra::services::RegisterEmployeeInput;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterEmployeeRequest>,
) -> axum::response::Response {
    let email = match errors::parse_email(&body.email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.membership.register(RegisterEmployeeInput {
        email,
        name: body.name,
        role: body.role,
    }) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let email = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.employees.by_email(&email) {
        Some(row) => Json(dto::employee_json(&row)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "employee not found"),
    }
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let email = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.employees.by_email(&email) {
        Some(row) => Json(json!({ "role": row.role.as_str() })).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "employee not found"),
    }
}

/// Record a subscription purchase against an HR identity: bumps the member
/// limit by the tier's seat allotment.
pub async fn record_hr_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Json(body): Json<dto::RecordHrPaymentRequest>,
) -> axum::response::Response {
    let email = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.membership.record_payment(&email, body.price) {
        Ok(()) => Json(json!({ "updated": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn not_affiliated(
    Extension(services): Extension<Arc<AppServices>>,
    Query(page): Query<PageRequest>,
) -> axum::response::Response {
    let page = services.employees.not_affiliated(page);
    Json(dto::page_json(page, dto::employee_json)).into_response()
}
