use serde_json::Value as JsonValue;

use assetflow_core::EmailAddress;
use assetflow_events::EventEnvelope;
use assetflow_membership::{EmployeeEvent, EmployeeId, EmployeeRole, PackageInfo, PaymentStatus};

use crate::read_model::RecordStore;

use super::{CursorDecision, Page, PageRequest, ProjectionError, StreamCursors, paginate};

/// Queryable employee read model row.
///
/// `employee_count` and `member_limit` stay zero for non-HR identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    pub employee_id: EmployeeId,
    pub email: EmailAddress,
    pub name: String,
    pub role: EmployeeRole,
    pub is_join: bool,
    pub joined_under: Option<EmailAddress>,
    pub employee_count: u32,
    pub member_limit: u32,
    pub package: Option<PackageInfo>,
    pub payment_status: Option<PaymentStatus>,
}

/// Employees projection over the membership ledger streams.
#[derive(Debug)]
pub struct EmployeesProjection<S>
where
    S: RecordStore<EmployeeId, EmployeeRow>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> EmployeesProjection<S>
where
    S: RecordStore<EmployeeId, EmployeeRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, employee_id: &EmployeeId) -> Option<EmployeeRow> {
        self.store.get(employee_id)
    }

    /// Emails are normalized at write time, so lookup is an exact match.
    pub fn by_email(&self, email: &EmailAddress) -> Option<EmployeeRow> {
        self.store.list().into_iter().find(|r| &r.email == email)
    }

    /// Regular employees who are not on any team yet.
    pub fn not_affiliated(&self, page: PageRequest) -> Page<EmployeeRow> {
        let mut rows: Vec<EmployeeRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| r.role == EmployeeRole::Employee && !r.is_join)
            .collect();
        rows.sort_by(|a, b| a.email.as_str().cmp(b.email.as_str()));
        paginate(rows, page)
    }

    /// Apply a committed envelope. Idempotent for at-least-once delivery.
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        match self.cursors.decide(aggregate_id, seq)? {
            CursorDecision::Duplicate => return Ok(()),
            CursorDecision::Apply => {}
        }

        let event: EmployeeEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let employee_id = match &event {
            EmployeeEvent::EmployeeRegistered(e) => e.employee_id,
            EmployeeEvent::TeamJoined(e) => e.employee_id,
            EmployeeEvent::TeamLeft(e) => e.employee_id,
            EmployeeEvent::MemberAdded(e) => e.employee_id,
            EmployeeEvent::MembersAdded(e) => e.employee_id,
            EmployeeEvent::MemberRemoved(e) => e.employee_id,
            EmployeeEvent::SeatsPurchased(e) => e.employee_id,
        };
        if employee_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(
                "event employee_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match event {
            EmployeeEvent::EmployeeRegistered(e) => {
                self.store.upsert(
                    e.employee_id,
                    EmployeeRow {
                        employee_id: e.employee_id,
                        email: e.email,
                        name: e.name,
                        role: e.role,
                        is_join: false,
                        joined_under: None,
                        employee_count: 0,
                        member_limit: 0,
                        package: None,
                        payment_status: None,
                    },
                );
            }
            EmployeeEvent::TeamJoined(e) => {
                self.update(e.employee_id, |row| {
                    row.is_join = true;
                    row.joined_under = Some(e.hr_email.clone());
                });
            }
            EmployeeEvent::TeamLeft(e) => {
                self.update(e.employee_id, |row| {
                    row.is_join = false;
                    row.joined_under = None;
                });
            }
            EmployeeEvent::MemberAdded(e) => {
                self.update(e.employee_id, |row| row.employee_count += 1);
            }
            EmployeeEvent::MembersAdded(e) => {
                let added = e.entries.len() as u32;
                self.update(e.employee_id, |row| row.employee_count += added);
            }
            EmployeeEvent::MemberRemoved(e) => {
                self.update(e.employee_id, |row| {
                    row.employee_count = row.employee_count.saturating_sub(1);
                });
            }
            EmployeeEvent::SeatsPurchased(e) => {
                self.update(e.employee_id, |row| {
                    row.member_limit += e.seats;
                    row.package = Some(PackageInfo {
                        price: e.price,
                        members: e.seats,
                    });
                    row.payment_status = Some(PaymentStatus::Success);
                });
            }
        }

        self.cursors.advance(aggregate_id, seq);
        Ok(())
    }

    fn update(&self, employee_id: EmployeeId, f: impl FnOnce(&mut EmployeeRow)) {
        if let Some(mut row) = self.store.get(&employee_id) {
            f(&mut row);
            self.store.upsert(employee_id, row);
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
