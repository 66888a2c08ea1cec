use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use assetflow_assets::AssetId;
use assetflow_infra::projections::{AssetFilter, AssetSort, PageRequest};
use assetflow_infra::services::{CreateAssetInput, UpdateAssetInput};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::CallerContext;

/// Create an asset owned by the authenticated caller.
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateAssetRequest>,
) -> axum::response::Response {
    let provider = caller.email().clone();

    match services.asset_service.create(CreateAssetInput {
        product_name: body.product_name,
        product_type: body.product_type,
        product_quantity: body.product_quantity,
        provider,
    }) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let asset_id = match parse_asset_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.assets.get(&asset_id) {
        Some(row) => Json(dto::asset_json(&row)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "asset not found"),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateAssetRequest>,
) -> axum::response::Response {
    let asset_id = match parse_asset_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.asset_service.update(
        asset_id,
        UpdateAssetInput {
            product_name: body.product_name,
            product_type: body.product_type,
            product_quantity: body.product_quantity,
        },
    ) {
        Ok(()) => Json(json!({ "updated": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let asset_id = match parse_asset_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.asset_service.delete(asset_id) {
        Ok(()) => Json(json!({ "deleted": true })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Full catalogue with filter/sort/search/pagination.
pub async fn list_all(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    list_assets(&services, None, query)
}

/// A provider's own catalogue, same query params.
pub async fn list_for_provider(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let provider = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    list_assets(&services, Some(provider), query)
}

fn list_assets(
    services: &AppServices,
    provider: Option<assetflow_core::EmailAddress>,
    query: dto::ListQuery,
) -> axum::response::Response {
    let filter = query.filter.as_deref().and_then(AssetFilter::parse);
    let sort = query.sort.as_deref().and_then(AssetSort::parse);
    let page = PageRequest {
        page: query.page,
        size: query.size,
    };

    let result = services.assets.list(
        provider.as_ref(),
        filter,
        sort,
        query.search.as_deref(),
        page,
    );
    Json(dto::page_json(result, dto::asset_json)).into_response()
}

/// Top four most requested items for a provider.
pub async fn top_requested(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let provider = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rows = services.assets.top_requested(&provider, 4);
    Json(dto::list_json(&rows, dto::asset_json)).into_response()
}

/// Items with quantity under ten.
pub async fn limited_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    let provider = match errors::parse_email(&email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rows = services.assets.limited_stock(&provider, 10);
    Json(dto::list_json(&rows, dto::asset_json)).into_response()
}

fn parse_asset_id(s: &str) -> Result<AssetId, axum::response::Response> {
    errors::parse_aggregate_id(s).map(AssetId::new)
}
