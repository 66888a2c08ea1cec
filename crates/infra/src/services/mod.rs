//! Application services.
//!
//! Services drive the compound transitions: phase 1 appends to the primary
//! aggregate's stream, phase 2 appends the idempotent side effect to the
//! secondary aggregate's stream, and committed events are applied to the
//! projections synchronously so reads observe writes immediately.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use assetflow_assets::AssetId;
use assetflow_events::{EventEnvelope, InMemoryEventBus};
use assetflow_membership::EmployeeId;
use assetflow_payments::{GatewayError, PaymentId};
use assetflow_requests::RequestId;

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::InMemoryEventStore;
use crate::projections::{
    AssetRow, AssetsProjection, EmployeeRow, EmployeesProjection, PaymentRow, PaymentsProjection,
    ProjectionError, RequestRow, RequestsProjection, TeamRow, TeamsProjection,
};
use crate::read_model::InMemoryRecordStore;

pub mod assets;
pub mod membership;
pub mod payments;
pub mod requests;

pub use assets::{AssetService, CreateAssetInput, UpdateAssetInput};
pub use membership::{MembershipService, RegisterEmployeeInput};
pub use payments::{PaymentService, RecordPaymentInput};
pub use requests::{CreateRequestInput, RequestWorkflowService};

/// The in-memory backend stack (the only backend; durable queues and schema
/// migrations are out of scope).
pub type Dispatcher =
    CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

pub type Assets = AssetsProjection<Arc<InMemoryRecordStore<AssetId, AssetRow>>>;
pub type Requests = RequestsProjection<Arc<InMemoryRecordStore<RequestId, RequestRow>>>;
pub type Employees = EmployeesProjection<Arc<InMemoryRecordStore<EmployeeId, EmployeeRow>>>;
pub type Teams = TeamsProjection<Arc<InMemoryRecordStore<Uuid, TeamRow>>>;
pub type Payments = PaymentsProjection<Arc<InMemoryRecordStore<PaymentId, PaymentRow>>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// An active request for the same (requester, asset) already exists.
    #[error("an active request for this asset already exists")]
    DuplicateRequest,

    /// An employee with this email is already registered.
    #[error("an employee with this email is already registered")]
    DuplicateEmployee,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("command dispatch failed: {0:?}")]
    Dispatch(DispatchError),

    #[error("projection apply failed: {0}")]
    Projection(#[from] ProjectionError),

    #[error("payment gateway failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<DispatchError> for ServiceError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::NotFound => ServiceError::NotFound,
            other => ServiceError::Dispatch(other),
        }
    }
}
