//! `assetflow-assets` — the inventory ledger.
//!
//! One counter-bearing `Asset` aggregate per trackable item: quantity,
//! derived availability, and a monotonic request counter. All inventory side
//! effects triggered by the request workflow are keyed by request id and are
//! idempotent under redelivery.

pub mod asset;

pub use asset::{
    Asset, AssetCommand, AssetCreated, AssetDeleted, AssetEvent, AssetId, AssetUpdated,
    Availability, CreateAsset, DecrementOnApprove, DeleteAsset, NoteRequest, ProductType,
    RequestNoted, RestoreOnReturn, StockDecremented, StockRestored, UpdateAsset,
};
