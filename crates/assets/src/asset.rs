use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use assetflow_core::{Aggregate, AggregateId, AggregateRoot, DomainError, EmailAddress};
use assetflow_events::Event;

/// Asset identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub AggregateId);

impl AssetId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AssetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Whether the item comes back to the pool after use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    Returnable,
    #[serde(rename = "Non-returnable")]
    NonReturnable,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Returnable => "Returnable",
            ProductType::NonReturnable => "Non-returnable",
        }
    }
}

/// Stock availability, derived from quantity.
///
/// Invariant: `OutOfStock` iff `product_quantity < 1`. The aggregate never
/// stores this; it is computed, so the invariant holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    #[serde(rename = "Out of stock")]
    OutOfStock,
}

impl Availability {
    pub fn from_quantity(quantity: i64) -> Self {
        if quantity < 1 {
            Availability::OutOfStock
        } else {
            Availability::Available
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::OutOfStock => "Out of stock",
        }
    }
}

/// Aggregate root: Asset (inventory ledger entry).
///
/// The per-effect request-id sets make the workflow side effects idempotent:
/// redelivering `DecrementOnApprove` / `RestoreOnReturn` / `NoteRequest` for a
/// request id that was already applied decides no events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    id: AssetId,
    product_name: String,
    product_type: ProductType,
    product_quantity: i64,
    request_count: u64,
    provider: Option<EmailAddress>,
    added_date: Option<DateTime<Utc>>,
    noted_requests: HashSet<Uuid>,
    decremented_requests: HashSet<Uuid>,
    restored_requests: HashSet<Uuid>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl Asset {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: AssetId) -> Self {
        Self {
            id,
            product_name: String::new(),
            product_type: ProductType::Returnable,
            product_quantity: 0,
            request_count: 0,
            provider: None,
            added_date: None,
            noted_requests: HashSet::new(),
            decremented_requests: HashSet::new(),
            restored_requests: HashSet::new(),
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> AssetId {
        self.id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn product_quantity(&self) -> i64 {
        self.product_quantity
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn provider(&self) -> Option<&EmailAddress> {
        self.provider.as_ref()
    }

    pub fn availability(&self) -> Availability {
        Availability::from_quantity(self.product_quantity)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl AggregateRoot for Asset {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateAsset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAsset {
    pub asset_id: AssetId,
    pub product_name: String,
    pub product_type: ProductType,
    pub product_quantity: i64,
    pub provider: EmailAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateAsset (direct HR edit; partial).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAsset {
    pub asset_id: AssetId,
    pub product_name: Option<String>,
    pub product_type: Option<ProductType>,
    pub product_quantity: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteAsset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAsset {
    pub asset_id: AssetId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: NoteRequest — bump the informational request counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRequest {
    pub asset_id: AssetId,
    pub request_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DecrementOnApprove — take one unit out of stock for an approved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecrementOnApprove {
    pub asset_id: AssetId,
    pub request_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RestoreOnReturn — put one unit back for a returned request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreOnReturn {
    pub asset_id: AssetId,
    pub request_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetCommand {
    CreateAsset(CreateAsset),
    UpdateAsset(UpdateAsset),
    DeleteAsset(DeleteAsset),
    NoteRequest(NoteRequest),
    DecrementOnApprove(DecrementOnApprove),
    RestoreOnReturn(RestoreOnReturn),
}

/// Event: AssetCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCreated {
    pub asset_id: AssetId,
    pub product_name: String,
    pub product_type: ProductType,
    pub product_quantity: i64,
    pub provider: EmailAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AssetUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdated {
    pub asset_id: AssetId,
    pub product_name: Option<String>,
    pub product_type: Option<ProductType>,
    pub product_quantity: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AssetDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDeleted {
    pub asset_id: AssetId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestNoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestNoted {
    pub asset_id: AssetId,
    pub request_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockDecremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecremented {
    pub asset_id: AssetId,
    pub request_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockRestored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRestored {
    pub asset_id: AssetId,
    pub request_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetEvent {
    AssetCreated(AssetCreated),
    AssetUpdated(AssetUpdated),
    AssetDeleted(AssetDeleted),
    RequestNoted(RequestNoted),
    StockDecremented(StockDecremented),
    StockRestored(StockRestored),
}

impl Event for AssetEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AssetEvent::AssetCreated(_) => "asset.created",
            AssetEvent::AssetUpdated(_) => "asset.updated",
            AssetEvent::AssetDeleted(_) => "asset.deleted",
            AssetEvent::RequestNoted(_) => "asset.request_noted",
            AssetEvent::StockDecremented(_) => "asset.stock_decremented",
            AssetEvent::StockRestored(_) => "asset.stock_restored",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AssetEvent::AssetCreated(e) => e.occurred_at,
            AssetEvent::AssetUpdated(e) => e.occurred_at,
            AssetEvent::AssetDeleted(e) => e.occurred_at,
            AssetEvent::RequestNoted(e) => e.occurred_at,
            AssetEvent::StockDecremented(e) => e.occurred_at,
            AssetEvent::StockRestored(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Asset {
    type Command = AssetCommand;
    type Event = AssetEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AssetEvent::AssetCreated(e) => {
                self.id = e.asset_id;
                self.product_name = e.product_name.clone();
                self.product_type = e.product_type;
                self.product_quantity = e.product_quantity;
                self.request_count = 0;
                self.provider = Some(e.provider.clone());
                self.added_date = Some(e.occurred_at);
                self.created = true;
            }
            AssetEvent::AssetUpdated(e) => {
                if let Some(name) = &e.product_name {
                    self.product_name = name.clone();
                }
                if let Some(pt) = e.product_type {
                    self.product_type = pt;
                }
                if let Some(q) = e.product_quantity {
                    self.product_quantity = q;
                }
            }
            AssetEvent::AssetDeleted(_) => {
                self.deleted = true;
            }
            AssetEvent::RequestNoted(e) => {
                self.request_count += 1;
                self.noted_requests.insert(e.request_id);
            }
            AssetEvent::StockDecremented(e) => {
                self.product_quantity -= 1;
                self.decremented_requests.insert(e.request_id);
            }
            AssetEvent::StockRestored(e) => {
                self.product_quantity += 1;
                self.restored_requests.insert(e.request_id);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AssetCommand::CreateAsset(cmd) => self.handle_create(cmd),
            AssetCommand::UpdateAsset(cmd) => self.handle_update(cmd),
            AssetCommand::DeleteAsset(cmd) => self.handle_delete(cmd),
            AssetCommand::NoteRequest(cmd) => self.handle_note_request(cmd),
            AssetCommand::DecrementOnApprove(cmd) => self.handle_decrement(cmd),
            AssetCommand::RestoreOnReturn(cmd) => self.handle_restore(cmd),
        }
    }
}

impl Asset {
    fn ensure_live(&self) -> Result<(), DomainError> {
        if !self.created || self.deleted {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_asset_id(&self, asset_id: AssetId) -> Result<(), DomainError> {
        if self.id != asset_id {
            return Err(DomainError::invariant("asset_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateAsset) -> Result<Vec<AssetEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("asset already exists"));
        }
        if cmd.product_name.trim().is_empty() {
            return Err(DomainError::validation("product_name cannot be empty"));
        }
        if cmd.product_quantity < 0 {
            return Err(DomainError::validation("product_quantity cannot be negative"));
        }

        Ok(vec![AssetEvent::AssetCreated(AssetCreated {
            asset_id: cmd.asset_id,
            product_name: cmd.product_name.clone(),
            product_type: cmd.product_type,
            product_quantity: cmd.product_quantity,
            provider: cmd.provider.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateAsset) -> Result<Vec<AssetEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_asset_id(cmd.asset_id)?;

        if cmd.product_name.is_none() && cmd.product_type.is_none() && cmd.product_quantity.is_none()
        {
            return Err(DomainError::validation("update carries no fields"));
        }
        if let Some(name) = &cmd.product_name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("product_name cannot be empty"));
            }
        }
        if let Some(q) = cmd.product_quantity {
            if q < 0 {
                return Err(DomainError::validation("product_quantity cannot be negative"));
            }
        }

        Ok(vec![AssetEvent::AssetUpdated(AssetUpdated {
            asset_id: cmd.asset_id,
            product_name: cmd.product_name.clone(),
            product_type: cmd.product_type,
            product_quantity: cmd.product_quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteAsset) -> Result<Vec<AssetEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_asset_id(cmd.asset_id)?;

        Ok(vec![AssetEvent::AssetDeleted(AssetDeleted {
            asset_id: cmd.asset_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_note_request(&self, cmd: &NoteRequest) -> Result<Vec<AssetEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_asset_id(cmd.asset_id)?;

        // Idempotent under redelivery of the same workflow transition.
        if self.noted_requests.contains(&cmd.request_id) {
            return Ok(vec![]);
        }

        Ok(vec![AssetEvent::RequestNoted(RequestNoted {
            asset_id: cmd.asset_id,
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_decrement(&self, cmd: &DecrementOnApprove) -> Result<Vec<AssetEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_asset_id(cmd.asset_id)?;

        if self.decremented_requests.contains(&cmd.request_id) {
            return Ok(vec![]);
        }

        if self.product_quantity < 1 {
            return Err(DomainError::invariant("asset is out of stock"));
        }

        Ok(vec![AssetEvent::StockDecremented(StockDecremented {
            asset_id: cmd.asset_id,
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_restore(&self, cmd: &RestoreOnReturn) -> Result<Vec<AssetEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_asset_id(cmd.asset_id)?;

        if self.restored_requests.contains(&cmd.request_id) {
            return Ok(vec![]);
        }

        // Only approved requests were decremented; only those can restore.
        if !self.decremented_requests.contains(&cmd.request_id) {
            return Err(DomainError::invariant(
                "cannot restore stock for a request that never decremented it",
            ));
        }

        Ok(vec![AssetEvent::StockRestored(StockRestored {
            asset_id: cmd.asset_id,
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
