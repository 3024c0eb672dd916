//! Conditional stock movements shared by issuance and restock.
//!
//! Both statements only apply when the row still satisfies the condition the
//! caller checked, so a stale read surfaces as a `ConcurrentModification`
//! (409) instead of overselling or writing a wrong before/after pair.

use crate::{
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::warn;

use super::write_error;

/// `quantity = quantity - n WHERE quantity >= n` for one product.
pub async fn take_stock<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    quantity: i32,
) -> Result<(), ServiceError> {
    let result = ProductEntity::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Quantity.gte(quantity))
        .exec(conn)
        .await
        .map_err(|e| write_error(e, "product"))?;

    if result.rows_affected == 0 {
        counter!("inventory.issue.conflict", 1);
        warn!(product_id = %product.id, "Stock changed concurrently; abandoning issuance");
        return Err(ServiceError::ConcurrentModification(format!(
            "Stock for {} changed while the issue was being recorded; retry the request",
            product.name
        )));
    }
    Ok(())
}

/// Adds `added` units to the quantity read in `product`, provided nobody
/// moved the stock since. Returns the new quantity.
pub async fn add_stock<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    added: i32,
) -> Result<i32, ServiceError> {
    let new_quantity = product.quantity.checked_add(added).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "restocking {} units would overflow the stock counter",
            added
        ))
    })?;

    let result = ProductEntity::update_many()
        .col_expr(product::Column::Quantity, Expr::value(new_quantity))
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product.id))
        .filter(product::Column::Quantity.eq(product.quantity))
        .exec(conn)
        .await
        .map_err(|e| write_error(e, "product"))?;

    if result.rows_affected == 0 {
        counter!("inventory.restock.conflict", 1);
        return Err(ServiceError::ConcurrentModification(format!(
            "Stock for {} changed during the restock; retry the request",
            product.name
        )));
    }
    Ok(new_quantity)
}
