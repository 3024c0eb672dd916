use crate::{
    db::DbPool,
    entities::product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing,
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{read_error, write_error};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 2000, message = "description is required"))]
    pub description: String,
    #[schema(value_type = f64, example = 12.5)]
    pub price: Decimal,
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: i32,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Partial update. Quantity is intentionally absent: it only moves through
/// issuance and restock.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: Option<String>,
}

impl UpdateProductRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
    }
}

/// Catalog CRUD
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    placeholder_image_url: String,
}

impl ProductService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        placeholder_image_url: String,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            placeholder_image_url,
        }
    }

    async fn find_by_name_ci(&self, name: &str) -> Result<Option<product::Model>, ServiceError> {
        ProductEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "product"))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        match self.find_by_name_ci(name).await? {
            Some(existing) if Some(existing.id) != except => Err(ServiceError::Conflict(format!(
                "A product named '{}' already exists",
                existing.name
            ))),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        pricing::validate_price(request.price)?;

        let name = request.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let image_url = request
            .image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.placeholder_image_url.clone());

        let model = ProductActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(request.description.trim().to_string()),
            price: Set(request.price),
            quantity: Set(request.quantity),
            image_url: Set(image_url),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| write_error(e, "product"))?;

        info!(product_id = %model.id, "Product created");
        self.event_sender
            .send_or_log(Event::ProductCreated {
                product_id: model.id,
                name: model.name.clone(),
            })
            .await;

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        ProductEntity::find()
            .order_by_asc(product::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "product"))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "product"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    /// Case-insensitive exact match on the product name
    #[instrument(skip(self))]
    pub async fn get_product_by_name(&self, name: &str) -> Result<product::Model, ServiceError> {
        self.find_by_name_ci(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", name)))
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        if request.is_empty() {
            return Err(ServiceError::ValidationError(
                "no fields to update".to_string(),
            ));
        }
        if let Some(price) = request.price {
            pricing::validate_price(price)?;
        }

        let existing = self.get_product(id).await?;
        let mut active: ProductActiveModel = existing.into();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            self.ensure_name_free(&name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(image_url);
        }

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| write_error(e, "product"))?;

        info!(product_id = %id, "Product updated");
        Ok(updated)
    }
}
