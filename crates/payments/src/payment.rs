use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetflow_core::{Aggregate, AggregateId, AggregateRoot, DomainError, EmailAddress};
use assetflow_events::Event;

/// Payment receipt identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub AggregateId);

impl PaymentId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Payment.
///
/// A receipt for a charge the processor already confirmed. Written once,
/// never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    id: PaymentId,
    payer_email: Option<EmailAddress>,
    payer_name: String,
    price: u32,
    seats: u32,
    recorded_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Payment {
    pub fn empty(id: PaymentId) -> Self {
        Self {
            id,
            payer_email: None,
            payer_name: String::new(),
            price: 0,
            seats: 0,
            recorded_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn payer_email(&self) -> Option<&EmailAddress> {
        self.payer_email.as_ref()
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn seats(&self) -> u32 {
        self.seats
    }
}

impl AggregateRoot for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub payment_id: PaymentId,
    pub payer_email: EmailAddress,
    pub payer_name: String,
    pub price: u32,
    pub seats: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentCommand {
    RecordPayment(RecordPayment),
}

/// Event: PaymentRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub payment_id: PaymentId,
    pub payer_email: EmailAddress,
    pub payer_name: String,
    pub price: u32,
    pub seats: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEvent {
    PaymentRecorded(PaymentRecorded),
}

impl Event for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentRecorded(_) => "payment.recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PaymentEvent::PaymentRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Payment {
    type Command = PaymentCommand;
    type Event = PaymentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PaymentEvent::PaymentRecorded(e) => {
                self.id = e.payment_id;
                self.payer_email = Some(e.payer_email.clone());
                self.payer_name = e.payer_name.clone();
                self.price = e.price;
                self.seats = e.seats;
                self.recorded_at = Some(e.occurred_at);
                self.created = true;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PaymentCommand::RecordPayment(cmd) => {
                if self.created {
                    return Err(DomainError::conflict("payment already recorded"));
                }
                if cmd.price == 0 {
                    return Err(DomainError::validation("price must be at least 1"));
                }

                Ok(vec![PaymentEvent::PaymentRecorded(PaymentRecorded {
                    payment_id: cmd.payment_id,
                    payer_email: cmd.payer_email.clone(),
                    payer_name: cmd.payer_name.clone(),
                    price: cmd.price,
                    seats: cmd.seats,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetflow_core::AggregateId;

    fn record_cmd(payment_id: PaymentId, price: u32) -> PaymentCommand {
        PaymentCommand::RecordPayment(RecordPayment {
            payment_id,
            payer_email: EmailAddress::parse("hr@company.com").unwrap(),
            payer_name: "HR".to_string(),
            price,
            seats: 10,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn record_creates_immutable_receipt() {
        let id = PaymentId::new(AggregateId::new());
        let mut payment = Payment::empty(id);
        let events = payment.handle(&record_cmd(id, 8)).unwrap();
        for e in &events {
            payment.apply(e);
        }

        assert_eq!(payment.price(), 8);
        assert_eq!(payment.seats(), 10);
        assert_eq!(payment.version(), 1);

        let err = payment.handle(&record_cmd(id, 8)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn zero_price_is_rejected() {
        let id = PaymentId::new(AggregateId::new());
        let payment = Payment::empty(id);
        let err = payment.handle(&record_cmd(id, 0)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
