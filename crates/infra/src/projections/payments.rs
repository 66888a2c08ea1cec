use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use assetflow_core::EmailAddress;
use assetflow_events::EventEnvelope;
use assetflow_payments::{PaymentEvent, PaymentId};

use crate::read_model::RecordStore;

use super::{CursorDecision, ProjectionError, StreamCursors};

/// Immutable payment receipt row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRow {
    pub payment_id: PaymentId,
    pub payer_email: EmailAddress,
    pub payer_name: String,
    pub price: u32,
    pub seats: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Payments projection: the receipt ledger.
#[derive(Debug)]
pub struct PaymentsProjection<S>
where
    S: RecordStore<PaymentId, PaymentRow>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> PaymentsProjection<S>
where
    S: RecordStore<PaymentId, PaymentRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, payment_id: &PaymentId) -> Option<PaymentRow> {
        self.store.get(payment_id)
    }

    pub fn for_payer(&self, payer: &EmailAddress) -> Vec<PaymentRow> {
        let mut rows: Vec<PaymentRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| &r.payer_email == payer)
            .collect();
        rows.sort_by_key(|r| r.recorded_at);
        rows
    }

    /// Apply a committed envelope. Idempotent for at-least-once delivery.
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        match self.cursors.decide(aggregate_id, seq)? {
            CursorDecision::Duplicate => return Ok(()),
            CursorDecision::Apply => {}
        }

        let event: PaymentEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        match event {
            PaymentEvent::PaymentRecorded(e) => {
                if e.payment_id.0 != aggregate_id {
                    return Err(ProjectionError::StreamMismatch(
                        "event payment_id does not match envelope aggregate_id".to_string(),
                    ));
                }
                self.store.upsert(
                    e.payment_id,
                    PaymentRow {
                        payment_id: e.payment_id,
                        payer_email: e.payer_email,
                        payer_name: e.payer_name,
                        price: e.price,
                        seats: e.seats,
                        recorded_at: e.occurred_at,
                    },
                );
            }
        }

        self.cursors.advance(aggregate_id, seq);
        Ok(())
    }
}
