//! Request DTOs and JSON mapping for read-model rows.
//!
//! Field names follow the wire format the frontend already speaks:
//! `product_name`, `requester_info`, `isJoin`, `added_date`, and so on.

use serde::Deserialize;
use serde_json::{Value, json};

use assetflow_assets::ProductType;
use assetflow_infra::projections::{
    AssetRow, EmployeeRow, Page, PaymentRow, RequestRow, TeamRow,
};
use assetflow_membership::EmployeeRole;
use assetflow_requests::RequestStatus;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterEmployeeRequest {
    pub email: String,
    pub name: String,
    pub role: EmployeeRole,
}

#[derive(Debug, Deserialize)]
pub struct RecordHrPaymentRequest {
    pub price: u32,
}

#[derive(Debug, Deserialize)]
pub struct AddSingleMemberRequest {
    #[serde(rename = "hrEmail")]
    pub hr_email: String,
    #[serde(rename = "empEmail")]
    pub member_email: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMultipleMembersRequest {
    #[serde(rename = "hrEmail")]
    pub hr_email: String,
    #[serde(rename = "empEmails")]
    pub member_emails: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub product_name: String,
    pub product_type: ProductType,
    pub product_quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAssetRequest {
    pub product_name: Option<String>,
    pub product_type: Option<ProductType>,
    pub product_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RequesterInfoDto {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestRequest {
    #[serde(rename = "requestedAssetId")]
    pub requested_asset_id: String,
    pub requester_info: RequesterInfoDto,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequestRequest {
    #[serde(rename = "reqId")]
    pub req_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequestRequest {
    #[serde(rename = "reqId")]
    pub req_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub price: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub email: String,
    pub name: String,
    pub price: u32,
}

/// Query params shared by the asset and request list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn asset_json(row: &AssetRow) -> Value {
    json!({
        "id": row.asset_id.to_string(),
        "product_name": row.product_name,
        "product_type": row.product_type.as_str(),
        "product_quantity": row.product_quantity,
        "availability": row.availability().as_str(),
        "request_count": row.request_count,
        "email": row.provider.as_str(),
        "added_date": row.added_date,
    })
}

pub fn request_json(row: &RequestRow) -> Value {
    json!({
        "id": row.request_id.to_string(),
        "requestedAssetId": row.asset_id.to_string(),
        "product_name": row.product_name,
        "product_type": row.product_type.as_str(),
        "requester_info": {
            "email": row.requester_email.as_str(),
            "name": row.requester_name,
        },
        "email": row.provider.as_str(),
        "note": row.note,
        "status": row.status.as_str(),
        "request_date": row.requested_at,
        "approve_date": row.decided_at,
    })
}

pub fn employee_json(row: &EmployeeRow) -> Value {
    json!({
        "id": row.employee_id.to_string(),
        "email": row.email.as_str(),
        "name": row.name,
        "role": row.role.as_str(),
        "isJoin": row.is_join,
        "joined_under": row.joined_under.as_ref().map(|e| e.as_str()),
        "employee_count": row.employee_count,
        "member_limit": row.member_limit,
        "package": row.package.map(|p| json!({ "price": p.price, "members": p.members })),
        "payment_status": row.payment_status.map(|_| "success"),
    })
}

pub fn team_json(row: &TeamRow) -> Value {
    json!({
        "id": row.membership_id.to_string(),
        "teamId": row.team_id.to_string(),
        "hr_info": {
            "email": row.hr_email.as_str(),
            "name": row.hr_name,
        },
        "employee_info": {
            "email": row.member_email.as_str(),
            "name": row.member_name,
        },
        "joined_date": row.joined_at,
    })
}

pub fn payment_json(row: &PaymentRow) -> Value {
    json!({
        "id": row.payment_id.to_string(),
        "email": row.payer_email.as_str(),
        "name": row.payer_name,
        "price": row.price,
        "seats": row.seats,
        "date": row.recorded_at,
    })
}

/// Wrap a projection page as `{"items": [...], "count": N}`.
pub fn page_json<T>(page: Page<T>, map: impl Fn(&T) -> Value) -> Value {
    let items: Vec<Value> = page.items.iter().map(&map).collect();
    json!({ "items": items, "count": page.count })
}

/// Wrap an unpaged row list the same way.
pub fn list_json<T>(rows: &[T], map: impl Fn(&T) -> Value) -> Value {
    let items: Vec<Value> = rows.iter().map(&map).collect();
    json!({ "items": items, "count": rows.len() })
}
