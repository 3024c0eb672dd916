use super::common::{created_response, parse_id, success_response, ApiJson};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::{
        products::{CreateProductRequest, UpdateProductRequest},
        restocks::RestockRequest,
    },
};
use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::info;

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = crate::entities::product::Model,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "A product with this name exists", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.create_product(payload).await?;
    Ok(created_response(product, "Product created"))
}

/// List every product by name
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "All products", body = [crate::entities::product::Model]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let products = state.services.products.list_products().await?;
    Ok(success_response(products))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned", body = crate::entities::product::Model),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "product")?;
    let product = state.services.products.get_product(id).await?;
    Ok(success_response(product))
}

/// Case-insensitive lookup by exact name
#[utoipa::path(
    get,
    path = "/api/v1/products/by-name/{name}",
    params(("name" = String, Path, description = "Product name")),
    responses(
        (status = 200, description = "Product returned", body = crate::entities::product::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_product_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.get_product_by_name(&name).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = crate::entities::product::Model),
        (status = 400, description = "Invalid or empty update", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateProductRequest>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "product")?;
    let product = state.services.products.update_product(id, payload).await?;
    Ok(success_response(product))
}

/// Add stock; the caller is recorded as the restocker
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/quantity",
    params(("id" = String, Path, description = "Product ID")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Stock added", body = crate::services::restocks::RestockResponse),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent stock change", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn restock_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<RestockRequest>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "product")?;
    let restock = state
        .services
        .restocks
        .restock(id, user.user_id, payload)
        .await?;

    info!(product_id = %id, restocker = %user.user_id, "Restock recorded");
    Ok(success_response(restock))
}
