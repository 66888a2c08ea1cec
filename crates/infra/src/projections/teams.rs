use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use assetflow_core::{AggregateId, EmailAddress};
use assetflow_events::EventEnvelope;
use assetflow_membership::{EmployeeEvent, MemberInfo};

use crate::read_model::RecordStore;

use super::{CursorDecision, Page, PageRequest, ProjectionError, StreamCursors, paginate_counted};

/// One denormalized team membership row.
///
/// `team_id` is the HR identity's aggregate id, shared by every member of that
/// HR's team. Rows exist iff the membership is currently active; the roster
/// and the HR's `employee_count` derive from the same events and cannot
/// disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub membership_id: Uuid,
    pub team_id: AggregateId,
    pub hr_email: EmailAddress,
    pub hr_name: String,
    pub member_email: EmailAddress,
    pub member_name: String,
    pub joined_at: DateTime<Utc>,
}

/// Teams projection over the HR side of the membership ledger.
#[derive(Debug)]
pub struct TeamsProjection<S>
where
    S: RecordStore<Uuid, TeamRow>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> TeamsProjection<S>
where
    S: RecordStore<Uuid, TeamRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, membership_id: &Uuid) -> Option<TeamRow> {
        self.store.get(membership_id)
    }

    /// The membership row for a member (company info lookup).
    pub fn row_for_member(&self, email: &EmailAddress) -> Option<TeamRow> {
        self.store
            .list()
            .into_iter()
            .find(|r| &r.member_email == email)
    }

    /// An HR's whole roster, paginated.
    pub fn team_of_hr(&self, hr_email: &EmailAddress, page: PageRequest) -> Page<TeamRow> {
        let mut rows: Vec<TeamRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| &r.hr_email == hr_email)
            .collect();
        rows.sort_by_key(|r| r.joined_at);
        let count = rows.len();
        paginate_counted(rows, count, page)
    }

    /// Everyone on the same team as the given member, paginated.
    pub fn team_of_member(&self, email: &EmailAddress, page: PageRequest) -> Page<TeamRow> {
        let Some(own_row) = self.row_for_member(email) else {
            return Page {
                items: vec![],
                count: 0,
            };
        };

        let mut rows: Vec<TeamRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| r.team_id == own_row.team_id)
            .collect();
        rows.sort_by_key(|r| r.joined_at);
        let count = rows.len();
        paginate_counted(rows, count, page)
    }

    /// Apply a committed envelope. Only the roster events matter here; the
    /// rest of the membership stream is ignored.
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        match self.cursors.decide(aggregate_id, seq)? {
            CursorDecision::Duplicate => return Ok(()),
            CursorDecision::Apply => {}
        }

        let event: EmployeeEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        match event {
            EmployeeEvent::MemberAdded(e) => {
                self.insert_row(aggregate_id, e.membership_id, &e.hr, &e.member, e.occurred_at);
            }
            EmployeeEvent::MembersAdded(e) => {
                for entry in &e.entries {
                    self.insert_row(
                        aggregate_id,
                        entry.membership_id,
                        &e.hr,
                        &entry.member,
                        e.occurred_at,
                    );
                }
            }
            EmployeeEvent::MemberRemoved(e) => {
                self.store.remove(&e.membership_id);
            }
            _ => {}
        }

        self.cursors.advance(aggregate_id, seq);
        Ok(())
    }

    fn insert_row(
        &self,
        team_id: AggregateId,
        membership_id: Uuid,
        hr: &MemberInfo,
        member: &MemberInfo,
        joined_at: DateTime<Utc>,
    ) {
        self.store.upsert(
            membership_id,
            TeamRow {
                membership_id,
                team_id,
                hr_email: hr.email.clone(),
                hr_name: hr.name.clone(),
                member_email: member.email.clone(),
                member_name: member.name.clone(),
                joined_at,
            },
        );
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
