//! Asset catalogue service (HR-side CRUD).

use std::sync::Arc;

use chrono::Utc;

use assetflow_assets::{
    Asset, AssetCommand, AssetId, CreateAsset, DeleteAsset, ProductType, UpdateAsset,
};
use assetflow_core::{AggregateId, EmailAddress};

use super::{Assets, Dispatcher, ServiceError};

const ASSET_AGGREGATE: &str = "asset";

#[derive(Debug, Clone)]
pub struct CreateAssetInput {
    pub product_name: String,
    pub product_type: ProductType,
    pub product_quantity: i64,
    pub provider: EmailAddress,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAssetInput {
    pub product_name: Option<String>,
    pub product_type: Option<ProductType>,
    pub product_quantity: Option<i64>,
}

pub struct AssetService {
    dispatcher: Arc<Dispatcher>,
    assets: Arc<Assets>,
}

impl AssetService {
    pub fn new(dispatcher: Arc<Dispatcher>, assets: Arc<Assets>) -> Self {
        Self { dispatcher, assets }
    }

    pub fn create(&self, input: CreateAssetInput) -> Result<AssetId, ServiceError> {
        let asset_id = AssetId::new(AggregateId::new());

        let committed = self.dispatcher.dispatch::<Asset>(
            asset_id.0,
            ASSET_AGGREGATE,
            AssetCommand::CreateAsset(CreateAsset {
                asset_id,
                product_name: input.product_name,
                product_type: input.product_type,
                product_quantity: input.product_quantity,
                provider: input.provider,
                occurred_at: Utc::now(),
            }),
            |id| Asset::empty(AssetId::new(id)),
        )?;

        for stored in &committed {
            self.assets.apply_envelope(&stored.to_envelope())?;
        }
        Ok(asset_id)
    }

    pub fn update(&self, asset_id: AssetId, input: UpdateAssetInput) -> Result<(), ServiceError> {
        let committed = self.dispatcher.dispatch::<Asset>(
            asset_id.0,
            ASSET_AGGREGATE,
            AssetCommand::UpdateAsset(UpdateAsset {
                asset_id,
                product_name: input.product_name,
                product_type: input.product_type,
                product_quantity: input.product_quantity,
                occurred_at: Utc::now(),
            }),
            |id| Asset::empty(AssetId::new(id)),
        )?;

        for stored in &committed {
            self.assets.apply_envelope(&stored.to_envelope())?;
        }
        Ok(())
    }

    pub fn delete(&self, asset_id: AssetId) -> Result<(), ServiceError> {
        let committed = self.dispatcher.dispatch::<Asset>(
            asset_id.0,
            ASSET_AGGREGATE,
            AssetCommand::DeleteAsset(DeleteAsset {
                asset_id,
                occurred_at: Utc::now(),
            }),
            |id| Asset::empty(AssetId::new(id)),
        )?;

        for stored in &committed {
            self.assets.apply_envelope(&stored.to_envelope())?;
        }
        Ok(())
    }
}
