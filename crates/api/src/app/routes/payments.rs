use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;

use assetflow_infra::services::RecordPaymentInput;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// Create a card-processing intent for a tier price.
pub async fn create_intent(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreatePaymentIntentRequest>,
) -> axum::response::Response {
    match services.payment_service.create_intent(body.price).await {
        Ok(intent) => Json(json!({ "clientSecret": intent.client_secret })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Record a completed charge as an immutable receipt.
pub async fn record(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordPaymentRequest>,
) -> axum::response::Response {
    let payer_email = match errors::parse_email(&body.email) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.payment_service.record(RecordPaymentInput {
        payer_email,
        payer_name: body.name,
        price: body.price,
    }) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
