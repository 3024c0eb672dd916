use crate::{
    db::DbPool,
    entities::{
        product::Entity as ProductEntity,
        restock::{self, ActiveModel as RestockActiveModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{commit_error, read_error, stock, write_error};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RestockRequest {
    /// Units to add, must be positive
    #[validate(range(min = 1, message = "quantity must be a positive number"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RestockResponse {
    pub restock_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub restocker_id: Uuid,
    pub old_quantity: i32,
    pub new_quantity: i32,
    pub restock_date: chrono::DateTime<Utc>,
}

/// Quantity increases and the restock ledger
#[derive(Clone)]
pub struct RestockService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl RestockService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Adds stock and appends the ledger entry in one transaction. The update
    /// only applies if the quantity is still the one read, so the recorded
    /// before/after pair always matches what happened.
    #[instrument(skip(self, request), fields(quantity = request.quantity))]
    pub async fn restock(
        &self,
        product_id: Uuid,
        restocker_id: Uuid,
        request: RestockRequest,
    ) -> Result<RestockResponse, ServiceError> {
        request.validate()?;
        if restocker_id.is_nil() {
            return Err(ServiceError::ValidationError(
                "restocking operator is required".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for restock");
            ServiceError::DatabaseError(e)
        })?;

        let product = ProductEntity::find_by_id(product_id)
            .one(&txn)
            .await
            .map_err(|e| read_error(e, "product"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let old_quantity = product.quantity;
        let new_quantity = stock::add_stock(&txn, &product, request.quantity).await?;

        let record: restock::Model = RestockActiveModel {
            id: Set(Uuid::new_v4()),
            restocker_id: Set(restocker_id),
            product_id: Set(product_id),
            old_quantity: Set(old_quantity),
            new_quantity: Set(new_quantity),
            restock_date: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| write_error(e, "restock"))?;

        txn.commit().await.map_err(|e| commit_error(e, "restock"))?;

        counter!("inventory.restock.recorded", 1);
        info!(%product_id, old_quantity, new_quantity, "Product restocked");

        self.event_sender
            .send_or_log(Event::ProductRestocked {
                product_id,
                restocker_id,
                old_quantity,
                new_quantity,
                at: record.restock_date,
            })
            .await;

        Ok(RestockResponse {
            restock_id: record.id,
            product_id,
            product_name: product.name,
            restocker_id,
            old_quantity,
            new_quantity,
            restock_date: record.restock_date,
        })
    }
}
