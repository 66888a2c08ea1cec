//! Payment service: intent creation against the gateway, receipt recording.

use std::sync::Arc;

use chrono::Utc;

use assetflow_core::{AggregateId, EmailAddress};
use assetflow_membership::seat_allotment;
use assetflow_payments::{
    Payment, PaymentCommand, PaymentGateway, PaymentId, PaymentIntent, RecordPayment,
};

use super::{Dispatcher, Payments, ServiceError};

const PAYMENT_AGGREGATE: &str = "payment";

#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    pub payer_email: EmailAddress,
    pub payer_name: String,
    pub price: u32,
}

pub struct PaymentService {
    dispatcher: Arc<Dispatcher>,
    payments: Arc<Payments>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        payments: Arc<Payments>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            dispatcher,
            payments,
            gateway,
        }
    }

    /// Create a payment intent for a tier price (whole USD).
    pub async fn create_intent(&self, price: u32) -> Result<PaymentIntent, ServiceError> {
        if price < 1 {
            return Err(ServiceError::Validation("price must be at least 1".to_string()));
        }
        let intent = self.gateway.create_intent(u64::from(price) * 100).await?;
        Ok(intent)
    }

    /// Record a completed charge as an immutable receipt.
    pub fn record(&self, input: RecordPaymentInput) -> Result<PaymentId, ServiceError> {
        let payment_id = PaymentId::new(AggregateId::new());
        let seats = seat_allotment(input.price);

        let committed = self.dispatcher.dispatch::<Payment>(
            payment_id.0,
            PAYMENT_AGGREGATE,
            PaymentCommand::RecordPayment(RecordPayment {
                payment_id,
                payer_email: input.payer_email,
                payer_name: input.payer_name,
                price: input.price,
                seats,
                occurred_at: Utc::now(),
            }),
            |id| Payment::empty(PaymentId::new(id)),
        )?;

        for stored in &committed {
            self.payments.apply_envelope(&stored.to_envelope())?;
        }
        Ok(payment_id)
    }
}
