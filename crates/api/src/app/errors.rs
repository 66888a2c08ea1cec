use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use assetflow_core::{AggregateId, EmailAddress};
use assetflow_infra::command_dispatcher::DispatchError;
use assetflow_infra::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::DuplicateRequest => json_error(
            StatusCode::CONFLICT,
            "duplicate_request",
            "an active request for this asset already exists",
        ),
        ServiceError::DuplicateEmployee => json_error(
            StatusCode::CONFLICT,
            "duplicate_employee",
            "an employee with this email is already registered",
        ),
        ServiceError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        ServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        ServiceError::Dispatch(e) => dispatch_error_to_response(e),
        ServiceError::Projection(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "projection_error",
            e.to_string(),
        ),
        ServiceError::Gateway(e) => {
            json_error(StatusCode::BAD_GATEWAY, "gateway_error", e.to_string())
        }
    }
}

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DispatchError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DispatchError::Unauthorized => unauthorized(),
        DispatchError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            format!("{e:?}"),
        ),
        DispatchError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn unauthorized() -> axum::response::Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "unauthorized access",
    )
}

pub fn parse_aggregate_id(s: &str) -> Result<AggregateId, axum::response::Response> {
    s.parse().map_err(|_| {
        json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid id")
    })
}

pub fn parse_uuid(s: &str) -> Result<uuid::Uuid, axum::response::Response> {
    s.parse().map_err(|_| {
        json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid id")
    })
}

pub fn parse_email(s: &str) -> Result<EmailAddress, axum::response::Response> {
    EmailAddress::parse(s).map_err(|e| {
        json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}
