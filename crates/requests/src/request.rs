use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetflow_assets::{AssetId, ProductType};
use assetflow_core::{Aggregate, AggregateId, AggregateRoot, DomainError, EmailAddress};
use assetflow_events::Event;

/// Request identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub AggregateId);

impl RequestId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Request status lifecycle (wire strings match the HTTP surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "approve")]
    Approved,
    #[serde(rename = "reject")]
    Rejected,
    #[serde(rename = "return")]
    Returned,
    #[serde(rename = "cancel")]
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approve",
            RequestStatus::Rejected => "reject",
            RequestStatus::Returned => "return",
            RequestStatus::Cancelled => "cancel",
        }
    }

    /// Active requests block a second request for the same (requester, asset).
    pub fn is_active(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }
}

/// Requester identity snapshot carried on the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterInfo {
    pub email: EmailAddress,
    pub name: String,
}

/// Aggregate root: Request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    id: RequestId,
    asset_id: Option<AssetId>,
    product_name: String,
    product_type: ProductType,
    requester: Option<RequesterInfo>,
    provider: Option<EmailAddress>,
    note: Option<String>,
    status: RequestStatus,
    requested_at: Option<DateTime<Utc>>,
    decided_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Request {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: RequestId) -> Self {
        Self {
            id,
            asset_id: None,
            product_name: String::new(),
            product_type: ProductType::Returnable,
            requester: None,
            provider: None,
            note: None,
            status: RequestStatus::Pending,
            requested_at: None,
            decided_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> RequestId {
        self.id
    }

    pub fn asset_id(&self) -> Option<AssetId> {
        self.asset_id
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn requester(&self) -> Option<&RequesterInfo> {
        self.requester.as_ref()
    }

    pub fn provider(&self) -> Option<&EmailAddress> {
        self.provider.as_ref()
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }
}

impl AggregateRoot for Request {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub request_id: RequestId,
    pub asset_id: AssetId,
    pub product_name: String,
    pub product_type: ProductType,
    pub requester: RequesterInfo,
    pub provider: EmailAddress,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRequest {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReturnRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestCommand {
    CreateRequest(CreateRequest),
    ApproveRequest(ApproveRequest),
    RejectRequest(RejectRequest),
    ReturnRequest(ReturnRequest),
    CancelRequest(CancelRequest),
}

/// Event: RequestCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCreated {
    pub request_id: RequestId,
    pub asset_id: AssetId,
    pub product_name: String,
    pub product_type: ProductType,
    pub requester: RequesterInfo,
    pub provider: EmailAddress,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestApproved {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRejected {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestReturned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestReturned {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCancelled {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    RequestCreated(RequestCreated),
    RequestApproved(RequestApproved),
    RequestRejected(RequestRejected),
    RequestReturned(RequestReturned),
    RequestCancelled(RequestCancelled),
}

impl Event for RequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequestEvent::RequestCreated(_) => "request.created",
            RequestEvent::RequestApproved(_) => "request.approved",
            RequestEvent::RequestRejected(_) => "request.rejected",
            RequestEvent::RequestReturned(_) => "request.returned",
            RequestEvent::RequestCancelled(_) => "request.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequestEvent::RequestCreated(e) => e.occurred_at,
            RequestEvent::RequestApproved(e) => e.occurred_at,
            RequestEvent::RequestRejected(e) => e.occurred_at,
            RequestEvent::RequestReturned(e) => e.occurred_at,
            RequestEvent::RequestCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Request {
    type Command = RequestCommand;
    type Event = RequestEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RequestEvent::RequestCreated(e) => {
                self.id = e.request_id;
                self.asset_id = Some(e.asset_id);
                self.product_name = e.product_name.clone();
                self.product_type = e.product_type;
                self.requester = Some(e.requester.clone());
                self.provider = Some(e.provider.clone());
                self.note = e.note.clone();
                self.status = RequestStatus::Pending;
                self.requested_at = Some(e.occurred_at);
                self.created = true;
            }
            RequestEvent::RequestApproved(e) => {
                self.status = RequestStatus::Approved;
                self.decided_at = Some(e.occurred_at);
            }
            RequestEvent::RequestRejected(e) => {
                self.status = RequestStatus::Rejected;
                self.decided_at = Some(e.occurred_at);
            }
            RequestEvent::RequestReturned(e) => {
                self.status = RequestStatus::Returned;
                self.decided_at = Some(e.occurred_at);
            }
            RequestEvent::RequestCancelled(e) => {
                self.status = RequestStatus::Cancelled;
                self.decided_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RequestCommand::CreateRequest(cmd) => self.handle_create(cmd),
            RequestCommand::ApproveRequest(cmd) => self.handle_approve(cmd),
            RequestCommand::RejectRequest(cmd) => self.handle_reject(cmd),
            RequestCommand::ReturnRequest(cmd) => self.handle_return(cmd),
            RequestCommand::CancelRequest(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Request {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_request_id(&self, request_id: RequestId) -> Result<(), DomainError> {
        if self.id != request_id {
            return Err(DomainError::invariant("request_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateRequest) -> Result<Vec<RequestEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("request already exists"));
        }
        if cmd.product_name.trim().is_empty() {
            return Err(DomainError::validation("product_name cannot be empty"));
        }

        Ok(vec![RequestEvent::RequestCreated(RequestCreated {
            request_id: cmd.request_id,
            asset_id: cmd.asset_id,
            product_name: cmd.product_name.clone(),
            product_type: cmd.product_type,
            requester: cmd.requester.clone(),
            provider: cmd.provider.clone(),
            note: cmd.note.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_request_id(cmd.request_id)?;

        // Approving twice would decrement inventory twice; only pending
        // requests may transition.
        if self.status != RequestStatus::Pending {
            return Err(DomainError::invariant(
                "only pending requests can be approved",
            ));
        }

        Ok(vec![RequestEvent::RequestApproved(RequestApproved {
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_request_id(cmd.request_id)?;

        if self.status != RequestStatus::Pending {
            return Err(DomainError::invariant(
                "only pending requests can be rejected",
            ));
        }

        Ok(vec![RequestEvent::RequestRejected(RequestRejected {
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_return(&self, cmd: &ReturnRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_request_id(cmd.request_id)?;

        if self.status != RequestStatus::Approved {
            return Err(DomainError::invariant(
                "only approved requests can be returned",
            ));
        }

        Ok(vec![RequestEvent::RequestReturned(RequestReturned {
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelRequest) -> Result<Vec<RequestEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_request_id(cmd.request_id)?;

        if self.status != RequestStatus::Pending {
            return Err(DomainError::invariant(
                "only pending requests can be cancelled",
            ));
        }

        Ok(vec![RequestEvent::RequestCancelled(RequestCancelled {
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetflow_core::AggregateId;

    fn test_request_id() -> RequestId {
        RequestId::new(AggregateId::new())
    }

    fn test_asset_id() -> AssetId {
        AssetId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(request_id: RequestId) -> CreateRequest {
        CreateRequest {
            request_id,
            asset_id: test_asset_id(),
            product_name: "Keyboard".to_string(),
            product_type: ProductType::Returnable,
            requester: RequesterInfo {
                email: EmailAddress::parse("emp@company.com").unwrap(),
                name: "Employee".to_string(),
            },
            provider: EmailAddress::parse("hr@company.com").unwrap(),
            note: None,
            occurred_at: test_time(),
        }
    }

    fn pending_request() -> Request {
        let id = test_request_id();
        let mut request = Request::empty(id);
        let events = request
            .handle(&RequestCommand::CreateRequest(create_cmd(id)))
            .unwrap();
        for e in &events {
            request.apply(e);
        }
        request
    }

    fn drive(request: &mut Request, cmd: RequestCommand) {
        let events = request.handle(&cmd).unwrap();
        for e in &events {
            request.apply(e);
        }
    }

    #[test]
    fn create_emits_request_created_in_pending() {
        let id = test_request_id();
        let request = Request::empty(id);
        let events = request
            .handle(&RequestCommand::CreateRequest(create_cmd(id)))
            .unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RequestEvent::RequestCreated(e) => assert_eq!(e.request_id, id),
            _ => panic!("Expected RequestCreated event"),
        }
    }

    #[test]
    fn approve_transitions_pending_to_approved_with_decision_time() {
        let mut request = pending_request();
        let request_id = request.id_typed();
        drive(
            &mut request,
            RequestCommand::ApproveRequest(ApproveRequest {
                request_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(request.status(), RequestStatus::Approved);
        assert!(request.decided_at().is_some());
    }

    #[test]
    fn approve_is_rejected_when_not_pending() {
        let mut request = pending_request();
        let request_id = request.id_typed();
        drive(
            &mut request,
            RequestCommand::ApproveRequest(ApproveRequest {
                request_id,
                occurred_at: test_time(),
            }),
        );

        let err = request
            .handle(&RequestCommand::ApproveRequest(ApproveRequest {
                request_id: request.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn return_only_valid_from_approved() {
        let mut request = pending_request();
        let err = request
            .handle(&RequestCommand::ReturnRequest(ReturnRequest {
                request_id: request.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let request_id = request.id_typed();
        drive(
            &mut request,
            RequestCommand::ApproveRequest(ApproveRequest {
                request_id,
                occurred_at: test_time(),
            }),
        );
        drive(
            &mut request,
            RequestCommand::ReturnRequest(ReturnRequest {
                request_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(request.status(), RequestStatus::Returned);
    }

    #[test]
    fn cancel_only_valid_from_pending() {
        let mut request = pending_request();
        let request_id = request.id_typed();
        drive(
            &mut request,
            RequestCommand::CancelRequest(CancelRequest {
                request_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(request.status(), RequestStatus::Cancelled);

        let err = request
            .handle(&RequestCommand::ApproveRequest(ApproveRequest {
                request_id: request.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn reject_and_cancel_are_terminal() {
        let mut request = pending_request();
        let request_id = request.id_typed();
        drive(
            &mut request,
            RequestCommand::RejectRequest(RejectRequest {
                request_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(request.status(), RequestStatus::Rejected);
        assert!(!request.status().is_active());

        for cmd in [
            RequestCommand::ApproveRequest(ApproveRequest {
                request_id: request.id_typed(),
                occurred_at: test_time(),
            }),
            RequestCommand::ReturnRequest(ReturnRequest {
                request_id: request.id_typed(),
                occurred_at: test_time(),
            }),
            RequestCommand::CancelRequest(CancelRequest {
                request_id: request.id_typed(),
                occurred_at: test_time(),
            }),
        ] {
            assert!(request.handle(&cmd).is_err());
        }
    }

    #[test]
    fn pending_and_approved_are_active() {
        assert!(RequestStatus::Pending.is_active());
        assert!(RequestStatus::Approved.is_active());
        assert!(!RequestStatus::Returned.is_active());
        assert!(!RequestStatus::Rejected.is_active());
        assert!(!RequestStatus::Cancelled.is_active());
    }
}
