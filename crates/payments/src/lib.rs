//! `assetflow-payments` — payment receipts and the card-processing gateway.
//!
//! Receipts are immutable: one `Payment` aggregate per completed charge, with a
//! single `PaymentRecorded` event. Intent creation talks to the processor
//! through the `PaymentGateway` trait so tests never touch the network.

pub mod gateway;
pub mod payment;

pub use gateway::{GatewayError, MockGateway, PaymentGateway, PaymentIntent, StripeGateway};
pub use payment::{Payment, PaymentCommand, PaymentEvent, PaymentId, PaymentRecorded, RecordPayment};
