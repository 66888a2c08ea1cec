use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use assetflow_assets::{AssetEvent, AssetId, Availability, ProductType};
use assetflow_core::EmailAddress;
use assetflow_events::EventEnvelope;

use crate::read_model::RecordStore;

use super::{CursorDecision, Page, PageRequest, ProjectionError, StreamCursors, paginate_counted};

/// Queryable asset read model row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    pub asset_id: AssetId,
    pub product_name: String,
    pub product_type: ProductType,
    pub product_quantity: i64,
    pub request_count: u64,
    pub provider: EmailAddress,
    pub added_date: DateTime<Utc>,
}

impl AssetRow {
    /// Derived, never stored: the invariant `Out of stock iff quantity < 1`
    /// cannot drift.
    pub fn availability(&self) -> Availability {
        Availability::from_quantity(self.product_quantity)
    }
}

/// List filter: either a product type or an availability value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssetFilter {
    Type(ProductType),
    Availability(Availability),
}

impl AssetFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Returnable" => Some(Self::Type(ProductType::Returnable)),
            "Non-returnable" => Some(Self::Type(ProductType::NonReturnable)),
            "Available" => Some(Self::Availability(Availability::Available)),
            "Out of stock" => Some(Self::Availability(Availability::OutOfStock)),
            _ => None,
        }
    }

    fn matches(&self, row: &AssetRow) -> bool {
        match self {
            Self::Type(t) => row.product_type == *t,
            Self::Availability(a) => row.availability() == *a,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssetSort {
    DateAsc,
    DateDesc,
    QuantityAsc,
    QuantityDesc,
}

impl AssetSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "date-asc" => Some(Self::DateAsc),
            "date-dsc" => Some(Self::DateDesc),
            "quantity-asc" => Some(Self::QuantityAsc),
            "quantity-dsc" => Some(Self::QuantityDesc),
            _ => None,
        }
    }

    fn apply(&self, rows: &mut [AssetRow]) {
        match self {
            Self::DateAsc => rows.sort_by_key(|r| r.added_date),
            Self::DateDesc => rows.sort_by_key(|r| std::cmp::Reverse(r.added_date)),
            Self::QuantityAsc => rows.sort_by_key(|r| r.product_quantity),
            Self::QuantityDesc => rows.sort_by_key(|r| std::cmp::Reverse(r.product_quantity)),
        }
    }
}

/// Assets projection: one row per live asset; deleted assets drop their row.
#[derive(Debug)]
pub struct AssetsProjection<S>
where
    S: RecordStore<AssetId, AssetRow>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> AssetsProjection<S>
where
    S: RecordStore<AssetId, AssetRow>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, asset_id: &AssetId) -> Option<AssetRow> {
        self.store.get(asset_id)
    }

    /// List assets with optional provider scoping, filter, search, sort and
    /// pagination.
    ///
    /// The reported count covers the provider scope only (not the
    /// filter/search), which is what the pagination UI expects.
    pub fn list(
        &self,
        provider: Option<&EmailAddress>,
        filter: Option<AssetFilter>,
        sort: Option<AssetSort>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Page<AssetRow> {
        let scoped: Vec<AssetRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| provider.is_none_or(|p| &r.provider == p))
            .collect();
        let count = scoped.len();

        let mut rows: Vec<AssetRow> = scoped
            .into_iter()
            .filter(|r| filter.is_none_or(|f| f.matches(r)))
            .filter(|r| {
                search.is_none_or(|s| {
                    r.product_name
                        .to_lowercase()
                        .contains(&s.to_lowercase())
                })
            })
            .collect();

        // Default to newest-first so unpaged lists stay deterministic.
        sort.unwrap_or(AssetSort::DateDesc).apply(&mut rows);

        paginate_counted(rows, count, page)
    }

    /// Top requested items for a provider, by request counter.
    pub fn top_requested(&self, provider: &EmailAddress, limit: usize) -> Vec<AssetRow> {
        let mut rows: Vec<AssetRow> = self
            .store
            .list()
            .into_iter()
            .filter(|r| &r.provider == provider)
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.request_count));
        rows.truncate(limit);
        rows
    }

    /// Items running low on stock (quantity under the threshold).
    pub fn limited_stock(&self, provider: &EmailAddress, threshold: i64) -> Vec<AssetRow> {
        self.store
            .list()
            .into_iter()
            .filter(|r| &r.provider == provider && r.product_quantity < threshold)
            .collect()
    }

    /// Apply a committed envelope. Idempotent for at-least-once delivery.
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        match self.cursors.decide(aggregate_id, seq)? {
            CursorDecision::Duplicate => return Ok(()),
            CursorDecision::Apply => {}
        }

        let event: AssetEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let asset_id = match &event {
            AssetEvent::AssetCreated(e) => e.asset_id,
            AssetEvent::AssetUpdated(e) => e.asset_id,
            AssetEvent::AssetDeleted(e) => e.asset_id,
            AssetEvent::RequestNoted(e) => e.asset_id,
            AssetEvent::StockDecremented(e) => e.asset_id,
            AssetEvent::StockRestored(e) => e.asset_id,
        };
        if asset_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(
                "event asset_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match event {
            AssetEvent::AssetCreated(e) => {
                self.store.upsert(
                    e.asset_id,
                    AssetRow {
                        asset_id: e.asset_id,
                        product_name: e.product_name,
                        product_type: e.product_type,
                        product_quantity: e.product_quantity,
                        request_count: 0,
                        provider: e.provider,
                        added_date: e.occurred_at,
                    },
                );
            }
            AssetEvent::AssetUpdated(e) => {
                if let Some(mut row) = self.store.get(&e.asset_id) {
                    if let Some(name) = e.product_name {
                        row.product_name = name;
                    }
                    if let Some(pt) = e.product_type {
                        row.product_type = pt;
                    }
                    if let Some(q) = e.product_quantity {
                        row.product_quantity = q;
                    }
                    self.store.upsert(e.asset_id, row);
                }
            }
            AssetEvent::AssetDeleted(e) => {
                self.store.remove(&e.asset_id);
            }
            AssetEvent::RequestNoted(e) => {
                if let Some(mut row) = self.store.get(&e.asset_id) {
                    row.request_count += 1;
                    self.store.upsert(e.asset_id, row);
                }
            }
            AssetEvent::StockDecremented(e) => {
                if let Some(mut row) = self.store.get(&e.asset_id) {
                    row.product_quantity -= 1;
                    self.store.upsert(e.asset_id, row);
                }
            }
            AssetEvent::StockRestored(e) => {
                if let Some(mut row) = self.store.get(&e.asset_id) {
                    row.product_quantity += 1;
                    self.store.upsert(e.asset_id, row);
                }
            }
        }

        self.cursors.advance(aggregate_id, seq);
        Ok(())
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
