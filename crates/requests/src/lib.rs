//! `assetflow-requests` — the request workflow.
//!
//! Lifecycle of a single asset request: `pending → {approve, reject, cancel}`,
//! `approve → return`. Inventory side effects are decided elsewhere (the asset
//! aggregate); this aggregate guards the legal status transitions so an effect
//! can never fire twice for the same request.

pub mod request;

pub use request::{
    ApproveRequest, CancelRequest, CreateRequest, RejectRequest, Request, RequestApproved,
    RequestCancelled, RequestCommand, RequestCreated, RequestEvent, RequestId, RequestRejected,
    RequestReturned, RequestStatus, RequesterInfo, ReturnRequest,
};
