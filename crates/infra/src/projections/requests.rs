use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use assetflow_assets::{AssetId, ProductType};
use assetflow_core::EmailAddress;
use assetflow_events::EventEnvelope;
use assetflow_requests::{RequestEvent, RequestId, RequestStatus};

use crate::read_model::RecordStore;

use super::{CursorDecision, Page, PageRequest, ProjectionError, StreamCursors, paginate_counted};

/// Queryable request read model row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRow {
    pub request_id: RequestId,
    pub asset_id: AssetId,
    pub product_name: String,
    pub product_type: ProductType,
    pub requester_email: EmailAddress,
    pub requester_name: String,
    pub provider: EmailAddress,
    pub note: Option<String>,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// List filter for a requester's own requests: a status or a product type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestFilter {
    Status(RequestStatus),
    Type(ProductType),
}

impl RequestFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Status(RequestStatus::Pending)),
            "approve" => Some(Self::Status(RequestStatus::Approved)),
            "Returnable" => Some(Self::Type(ProductType::Returnable)),
            "Non-returnable" => Some(Self::Type(ProductType::NonReturnable)),
            _ => None,
        }
    }

    fn matches(&self, row: &RequestRow) -> bool {
        match self {
            Self::Status(s) => row.status == *s,
            Self::Type(t) => row.product_type == *t,
        }
    }
}

/// One slice of the pending-requests-by-type chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub name: String,
    pub value: usize,
}

/// Requests projection: one row per request, status kept current.
#[derive(Debug)]
pub struct RequestsProjection<S>
where
    S: RecordStore<RequestId, RequestRow>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> RequestsProjection<S>
where
    S: RecordStore<RequestId, RequestRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, request_id: &RequestId) -> Option<RequestRow> {
        self.store.get(request_id)
    }

    /// True if the requester already has a pending/approved request for the asset.
    pub fn has_active(&self, requester: &EmailAddress, asset_id: &AssetId) -> bool {
        self.store.list().into_iter().any(|r| {
            &r.requester_email == requester && &r.asset_id == asset_id && r.status.is_active()
        })
    }

    fn rows_for_requester(&self, requester: &EmailAddress) -> Vec<RequestRow> {
        let mut rows: Vec<RequestRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| &r.requester_email == requester)
            .collect();
        rows.sort_by_key(|r| r.requested_at);
        rows
    }

    fn rows_for_provider(&self, provider: &EmailAddress) -> Vec<RequestRow> {
        let mut rows: Vec<RequestRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| &r.provider == provider)
            .collect();
        rows.sort_by_key(|r| r.requested_at);
        rows
    }

    /// A requester's own requests; count covers the whole requester scope.
    pub fn for_requester(
        &self,
        requester: &EmailAddress,
        search: Option<&str>,
        filter: Option<RequestFilter>,
        page: PageRequest,
    ) -> Page<RequestRow> {
        let scoped = self.rows_for_requester(requester);
        let count = scoped.len();

        let rows: Vec<RequestRow> = scoped
            .into_iter()
            .filter(|r| {
                search.is_none_or(|s| r.product_name.to_lowercase().contains(&s.to_lowercase()))
            })
            .filter(|r| filter.is_none_or(|f| f.matches(r)))
            .collect();

        paginate_counted(rows, count, page)
    }

    /// HR inbox: every request addressed to this provider, with an optional
    /// search over the requester's email or name.
    pub fn hr_inbox(
        &self,
        provider: &EmailAddress,
        search: Option<&str>,
        page: PageRequest,
    ) -> Page<RequestRow> {
        let scoped = self.rows_for_provider(provider);
        let count = scoped.len();

        let rows: Vec<RequestRow> = scoped
            .into_iter()
            .filter(|r| {
                search.is_none_or(|s| {
                    let s = s.to_lowercase();
                    r.requester_email.as_str().contains(&s)
                        || r.requester_name.to_lowercase().contains(&s)
                })
            })
            .collect();

        paginate_counted(rows, count, page)
    }

    pub fn count_for_provider(&self, provider: &EmailAddress) -> usize {
        self.rows_for_provider(provider).len()
    }

    /// The first few pending requests for the HR dashboard.
    pub fn pending_for_provider(&self, provider: &EmailAddress, limit: usize) -> Vec<RequestRow> {
        let mut rows: Vec<RequestRow> = self
            .rows_for_provider(provider)
            .into_iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect();
        rows.truncate(limit);
        rows
    }

    pub fn pending_for_requester(
        &self,
        requester: &EmailAddress,
        page: PageRequest,
    ) -> Page<RequestRow> {
        let rows: Vec<RequestRow> = self
            .rows_for_requester(requester)
            .into_iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect();
        let count = rows.len();
        paginate_counted(rows, count, page)
    }

    /// This month's requests for a requester, newest first.
    pub fn monthly_for_requester(
        &self,
        requester: &EmailAddress,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Page<RequestRow> {
        let mut rows: Vec<RequestRow> = self
            .rows_for_requester(requester)
            .into_iter()
            .filter(|r| {
                r.requested_at.year() == now.year() && r.requested_at.month() == now.month()
            })
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.requested_at));
        let count = rows.len();
        paginate_counted(rows, count, page)
    }

    /// Pending requests grouped by product type (HR dashboard chart).
    pub fn pending_type_counts(&self, provider: &EmailAddress) -> Vec<TypeCount> {
        let pending: Vec<RequestRow> = self
            .rows_for_provider(provider)
            .into_iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect();

        [ProductType::Returnable, ProductType::NonReturnable]
            .into_iter()
            .filter_map(|t| {
                let value = pending.iter().filter(|r| r.product_type == t).count();
                (value > 0).then(|| TypeCount {
                    name: t.as_str().to_string(),
                    value,
                })
            })
            .collect()
    }

    /// Every decided row, for phase-2 repair sweeps.
    pub fn all_rows(&self) -> Vec<RequestRow> {
        self.store.list()
    }

    /// Apply a committed envelope. Idempotent for at-least-once delivery.
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        match self.cursors.decide(aggregate_id, seq)? {
            CursorDecision::Duplicate => return Ok(()),
            CursorDecision::Apply => {}
        }

        let event: RequestEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let request_id = match &event {
            RequestEvent::RequestCreated(e) => e.request_id,
            RequestEvent::RequestApproved(e) => e.request_id,
            RequestEvent::RequestRejected(e) => e.request_id,
            RequestEvent::RequestReturned(e) => e.request_id,
            RequestEvent::RequestCancelled(e) => e.request_id,
        };
        if request_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(
                "event request_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match event {
            RequestEvent::RequestCreated(e) => {
                self.store.upsert(
                    e.request_id,
                    RequestRow {
                        request_id: e.request_id,
                        asset_id: e.asset_id,
                        product_name: e.product_name,
                        product_type: e.product_type,
                        requester_email: e.requester.email,
                        requester_name: e.requester.name,
                        provider: e.provider,
                        note: e.note,
                        status: RequestStatus::Pending,
                        requested_at: e.occurred_at,
                        decided_at: None,
                    },
                );
            }
            RequestEvent::RequestApproved(e) => {
                self.set_status(e.request_id, RequestStatus::Approved, e.occurred_at);
            }
            RequestEvent::RequestRejected(e) => {
                self.set_status(e.request_id, RequestStatus::Rejected, e.occurred_at);
            }
            RequestEvent::RequestReturned(e) => {
                self.set_status(e.request_id, RequestStatus::Returned, e.occurred_at);
            }
            RequestEvent::RequestCancelled(e) => {
                self.set_status(e.request_id, RequestStatus::Cancelled, e.occurred_at);
            }
        }

        self.cursors.advance(aggregate_id, seq);
        Ok(())
    }

    fn set_status(&self, request_id: RequestId, status: RequestStatus, at: DateTime<Utc>) {
        if let Some(mut row) = self.store.get(&request_id) {
            row.status = status;
            row.decided_at = Some(at);
            self.store.upsert(request_id, row);
        }
    }

    /// Rebuild from scratch by replaying envelopes in stream order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        self.cursors.reset();
        self.store.clear();

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (*e.aggregate_id().as_uuid().as_bytes(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
