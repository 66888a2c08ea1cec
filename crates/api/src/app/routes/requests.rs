use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use assetflow_assets::AssetId;
use assetflow_core::EmailAddress;
use assetflow_infra::projections::{PageRequest, RequestFilter};
use assetflow_infra::services::CreateRequestInput;
use assetflow_requests::{RequestId, RequesterInfo};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateRequestRequest>,
) -> axum::response::Response {
    let asset_id = match errors::parse_aggregate_id(&body.requested_asset_id) {
        Ok(v) => AssetId::new(v),
        Err(resp) => return resp,
    };
    let requester_email = match errors::parse_email(&body.requester_info.email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.workflow.create(CreateRequestInput {
        asset_id,
        requester: RequesterInfo {
            email: requester_email,
            name: body.requester_info.name,
        },
        note: body.note,
    }) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn approve(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ApproveRequestRequest>,
) -> axum::response::Response {
    let request_id = match parse_request_id(&body.req_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.workflow.approve(request_id) {
        Ok(()) => Json(json!({ "updated": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Reject or cancel a pending request.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStatusRequest>,
) -> axum::response::Response {
    let request_id = match parse_request_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.workflow.update_status(request_id, body.status) {
        Ok(()) => Json(json!({ "updated": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn return_request(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReturnRequestRequest>,
) -> axum::response::Response {
    let request_id = match parse_request_id(&body.req_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.workflow.return_request(request_id) {
        Ok(()) => Json(json!({ "updated": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// An employee's own requests, with search/filter/pagination.
pub async fn for_requester(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let requester = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let filter = query.filter.as_deref().and_then(RequestFilter::parse);
    let page = PageRequest {
        page: query.page,
        size: query.size,
    };

    let result = services
        .requests
        .for_requester(&requester, query.search.as_deref(), filter, page);
    Json(dto::page_json(result, dto::request_json)).into_response()
}

/// HR inbox: all requests addressed to a provider, searchable by requester.
pub async fn hr_inbox(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let provider = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let page = PageRequest {
        page: query.page,
        size: query.size,
    };

    let result = services
        .requests
        .hr_inbox(&provider, query.search.as_deref(), page);
    Json(dto::page_json(result, dto::request_json)).into_response()
}

pub async fn provider_count(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let provider = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let count = services.requests.count_for_provider(&provider);
    Json(json!({ "count": count })).into_response()
}

/// The five oldest pending requests for a provider's dashboard.
pub async fn pending_for_provider(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let provider = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rows = services.requests.pending_for_provider(&provider, 5);
    Json(dto::list_json(&rows, dto::request_json)).into_response()
}

/// Pending requests grouped by product type.
pub async fn pending_type_counts(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let provider = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let counts = services.requests.pending_type_counts(&provider);
    Json(counts).into_response()
}

pub async fn pending_for_requester(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Query(page): Query<PageRequest>,
) -> axum::response::Response {
    let requester = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = services.requests.pending_for_requester(&requester, page);
    Json(dto::page_json(result, dto::request_json)).into_response()
}

/// This month's requests for an employee, newest first.
pub async fn monthly_for_requester(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Query(page): Query<PageRequest>,
) -> axum::response::Response {
    let requester: EmailAddress = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = services
        .requests
        .monthly_for_requester(&requester, Utc::now(), page);
    Json(dto::page_json(result, dto::request_json)).into_response()
}

fn parse_request_id(s: &str) -> Result<RequestId, axum::response::Response> {
    errors::parse_aggregate_id(s).map(RequestId::new)
}
