//! Infrastructure layer: event store, dispatcher, read models, services.

pub mod command_dispatcher;
pub mod event_store;
pub mod projections;
pub mod read_model;
pub mod services;

#[cfg(test)]
mod integration_tests;
