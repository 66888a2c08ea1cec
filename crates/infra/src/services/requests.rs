//! Request workflow service: the two-phase compound transitions.
//!
//! Phase 1 appends the status change to the request stream; phase 2 appends
//! the inventory effect to the asset stream. Every phase-2 command is keyed by
//! the request id and idempotent, so a crash between the phases is recoverable
//! by [`RequestWorkflowService::repair`].

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use assetflow_assets::{
    Asset, AssetCommand, AssetId, DecrementOnApprove, NoteRequest, RestoreOnReturn,
};
use assetflow_core::AggregateId;
use assetflow_requests::{
    ApproveRequest, CancelRequest, CreateRequest, RejectRequest, Request, RequestCommand,
    RequestId, RequestStatus, RequesterInfo, ReturnRequest,
};

use super::{Assets, Dispatcher, Requests, ServiceError};

const REQUEST_AGGREGATE: &str = "request";
const ASSET_AGGREGATE: &str = "asset";

#[derive(Debug, Clone)]
pub struct CreateRequestInput {
    pub asset_id: AssetId,
    pub requester: RequesterInfo,
    pub note: Option<String>,
}

pub struct RequestWorkflowService {
    dispatcher: Arc<Dispatcher>,
    requests: Arc<Requests>,
    assets: Arc<Assets>,
}

impl RequestWorkflowService {
    pub fn new(dispatcher: Arc<Dispatcher>, requests: Arc<Requests>, assets: Arc<Assets>) -> Self {
        Self {
            dispatcher,
            requests,
            assets,
        }
    }

    /// Create a request as `pending`, then note it on the asset's counter.
    pub fn create(&self, input: CreateRequestInput) -> Result<RequestId, ServiceError> {
        let asset = self.assets.get(&input.asset_id).ok_or(ServiceError::NotFound)?;

        if self
            .requests
            .has_active(&input.requester.email, &input.asset_id)
        {
            return Err(ServiceError::DuplicateRequest);
        }

        let request_id = RequestId::new(AggregateId::new());

        // Phase 1: the request itself.
        let committed = self.dispatcher.dispatch::<Request>(
            request_id.0,
            REQUEST_AGGREGATE,
            RequestCommand::CreateRequest(CreateRequest {
                request_id,
                asset_id: input.asset_id,
                product_name: asset.product_name.clone(),
                product_type: asset.product_type,
                requester: input.requester,
                provider: asset.provider.clone(),
                note: input.note,
                occurred_at: Utc::now(),
            }),
            |id| Request::empty(RequestId::new(id)),
        )?;
        for stored in &committed {
            self.requests.apply_envelope(&stored.to_envelope())?;
        }

        // Phase 2: request counter on the asset.
        self.note_request(input.asset_id, *request_id.0.as_uuid())?;

        Ok(request_id)
    }

    /// Approve a pending request, then take one unit out of stock.
    pub fn approve(&self, request_id: RequestId) -> Result<(), ServiceError> {
        let row = self.requests.get(&request_id).ok_or(ServiceError::NotFound)?;

        // Check stock before committing phase 1, so an out-of-stock asset
        // rejects the approval instead of leaving it half-applied.
        let asset = self.assets.get(&row.asset_id).ok_or(ServiceError::NotFound)?;
        if asset.product_quantity < 1 {
            return Err(ServiceError::Dispatch(
                crate::command_dispatcher::DispatchError::InvariantViolation(
                    "asset is out of stock".to_string(),
                ),
            ));
        }

        // Phase 1: status transition (guards non-pending).
        let committed = self.dispatcher.dispatch::<Request>(
            request_id.0,
            REQUEST_AGGREGATE,
            RequestCommand::ApproveRequest(ApproveRequest {
                request_id,
                occurred_at: Utc::now(),
            }),
            |id| Request::empty(RequestId::new(id)),
        )?;
        for stored in &committed {
            self.requests.apply_envelope(&stored.to_envelope())?;
        }

        // Phase 2: inventory decrement, idempotent per request id.
        self.decrement(row.asset_id, *request_id.0.as_uuid())?;

        Ok(())
    }

    /// Reject or cancel a pending request. No inventory effect.
    pub fn update_status(
        &self,
        request_id: RequestId,
        status: RequestStatus,
    ) -> Result<(), ServiceError> {
        let command = match status {
            RequestStatus::Rejected => RequestCommand::RejectRequest(RejectRequest {
                request_id,
                occurred_at: Utc::now(),
            }),
            RequestStatus::Cancelled => RequestCommand::CancelRequest(CancelRequest {
                request_id,
                occurred_at: Utc::now(),
            }),
            other => {
                return Err(ServiceError::Validation(format!(
                    "unsupported status transition '{}'",
                    other.as_str()
                )));
            }
        };

        let committed = self.dispatcher.dispatch::<Request>(
            request_id.0,
            REQUEST_AGGREGATE,
            command,
            |id| Request::empty(RequestId::new(id)),
        )?;
        for stored in &committed {
            self.requests.apply_envelope(&stored.to_envelope())?;
        }
        Ok(())
    }

    /// Return an approved request, then put the unit back in stock.
    pub fn return_request(&self, request_id: RequestId) -> Result<(), ServiceError> {
        let row = self.requests.get(&request_id).ok_or(ServiceError::NotFound)?;

        let committed = self.dispatcher.dispatch::<Request>(
            request_id.0,
            REQUEST_AGGREGATE,
            RequestCommand::ReturnRequest(ReturnRequest {
                request_id,
                occurred_at: Utc::now(),
            }),
            |id| Request::empty(RequestId::new(id)),
        )?;
        for stored in &committed {
            self.requests.apply_envelope(&stored.to_envelope())?;
        }

        self.restore(row.asset_id, *request_id.0.as_uuid())?;

        Ok(())
    }

    /// Re-drive phase 2 for every request in the read model.
    ///
    /// Safe to run at any time: every inventory effect is idempotent per
    /// request id, so requests whose effects already landed are no-ops. Only
    /// the gap left by a crash between the phases produces new events.
    pub fn repair(&self) -> Result<(), ServiceError> {
        for row in self.requests.all_rows() {
            let request_uuid = *row.request_id.0.as_uuid();

            let outcome = self.note_request(row.asset_id, request_uuid).and_then(|()| {
                match row.status {
                    RequestStatus::Approved => self.decrement(row.asset_id, request_uuid),
                    RequestStatus::Returned => self
                        .decrement(row.asset_id, request_uuid)
                        .and_then(|()| self.restore(row.asset_id, request_uuid)),
                    _ => Ok(()),
                }
            });

            // A single unrepairable row (e.g. the asset was deleted) must not
            // stall the sweep.
            if let Err(e) = outcome {
                tracing::warn!(
                    request_id = %row.request_id,
                    asset_id = %row.asset_id,
                    error = %e,
                    "phase-2 repair skipped a request"
                );
            }
        }
        Ok(())
    }

    fn note_request(&self, asset_id: AssetId, request_id: Uuid) -> Result<(), ServiceError> {
        let committed = self.dispatcher.dispatch::<Asset>(
            asset_id.0,
            ASSET_AGGREGATE,
            AssetCommand::NoteRequest(NoteRequest {
                asset_id,
                request_id,
                occurred_at: Utc::now(),
            }),
            |id| Asset::empty(AssetId::new(id)),
        )?;
        for stored in &committed {
            self.assets.apply_envelope(&stored.to_envelope())?;
        }
        Ok(())
    }

    fn decrement(&self, asset_id: AssetId, request_id: Uuid) -> Result<(), ServiceError> {
        let committed = self.dispatcher.dispatch::<Asset>(
            asset_id.0,
            ASSET_AGGREGATE,
            AssetCommand::DecrementOnApprove(DecrementOnApprove {
                asset_id,
                request_id,
                occurred_at: Utc::now(),
            }),
            |id| Asset::empty(AssetId::new(id)),
        )?;
        for stored in &committed {
            self.assets.apply_envelope(&stored.to_envelope())?;
        }
        Ok(())
    }

    fn restore(&self, asset_id: AssetId, request_id: Uuid) -> Result<(), ServiceError> {
        let committed = self.dispatcher.dispatch::<Asset>(
            asset_id.0,
            ASSET_AGGREGATE,
            AssetCommand::RestoreOnReturn(RestoreOnReturn {
                asset_id,
                request_id,
                occurred_at: Utc::now(),
            }),
            |id| Asset::empty(AssetId::new(id)),
        )?;
        for stored in &committed {
            self.assets.apply_envelope(&stored.to_envelope())?;
        }
        Ok(())
    }
}
