//! Stock issuance: recording products handed to a customer.
//!
//! An issuance is written in one database transaction. Every stock movement
//! is a conditional `quantity = quantity - n WHERE quantity >= n`; if any of
//! them affects no row, another request won the race for that stock and the
//! whole transaction is dropped, which rolls back every earlier decrement.

use crate::{
    db::DbPool,
    entities::{
        issue::{self, ActiveModel as IssueActiveModel, Entity as IssueEntity},
        issue_item::{self, ActiveModel as IssueItemActiveModel, Entity as IssueItemEntity},
        product::{self, Entity as ProductEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing::{self, IssueTotals},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{commit_error, read_error, stock, write_error};

pub const DEFAULT_OPERATOR_COMMENT: &str = "No Comment";

/// Customer snapshot stored on the issuance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CustomerDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
}

impl CustomerDetails {
    fn is_complete(&self) -> bool {
        [&self.name, &self.phone, &self.location]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// One requested line. Prices are never taken from the caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct IssueLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateIssueRequest {
    #[serde(default)]
    pub customer: CustomerDetails,
    #[serde(default)]
    #[validate]
    pub items: Vec<IssueLineRequest>,
    #[validate(length(max = 1000))]
    pub operator_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ApplyDiscountRequest {
    /// Percentage in [0, 10]
    #[schema(value_type = f64, example = 10)]
    pub discount_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueLineResponse {
    pub product_id: Uuid,
    pub product_name: String,
    #[schema(value_type = String, example = "10.00")]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[schema(value_type = String, example = "20.00")]
    pub line_total: Decimal,
}

/// A persisted issuance with its lines and derived totals
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueResponse {
    pub id: Uuid,
    pub issue_id: String,
    pub operator_id: Uuid,
    pub date_issued: DateTime<Utc>,
    pub operator_comment: String,
    pub customer: CustomerDetails,
    pub items: Vec<IssueLineResponse>,
    #[schema(value_type = String, example = "0")]
    pub discount_percent: Decimal,
    #[serde(flatten)]
    pub totals: IssueTotals,
}

/// Result of applying a discount
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiscountSummary {
    pub issue_id: String,
    #[schema(value_type = String, example = "10")]
    pub discount_percent: Decimal,
    #[serde(flatten)]
    pub totals: IssueTotals,
}

pub fn generate_issue_id() -> String {
    format!("ISS-{}", Uuid::new_v4().simple())
}

pub(crate) fn build_response(issue: issue::Model, mut items: Vec<issue_item::Model>) -> IssueResponse {
    items.sort_by_key(|item| item.line_no);
    let totals = pricing::totals(
        items.iter().map(|item| (item.unit_price, item.quantity)),
        issue.discount_amount,
    );

    IssueResponse {
        id: issue.id,
        issue_id: issue.issue_id,
        operator_id: issue.operator_id,
        date_issued: issue.date_issued,
        operator_comment: issue.operator_comment,
        customer: CustomerDetails {
            name: issue.customer_name,
            phone: issue.customer_phone,
            location: issue.customer_location,
        },
        items: items
            .into_iter()
            .map(|item| IssueLineResponse {
                line_total: pricing::line_total(item.unit_price, item.quantity),
                product_id: item.product_id,
                product_name: item.product_name,
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect(),
        discount_percent: issue.discount_percent,
        totals,
    }
}

/// Loads the line items of several issuances, grouped by issuance record id.
pub(crate) async fn load_items<C: ConnectionTrait>(
    conn: &C,
    record_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<issue_item::Model>>, ServiceError> {
    if record_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = IssueItemEntity::find()
        .filter(issue_item::Column::IssueRecordId.is_in(record_ids))
        .order_by_asc(issue_item::Column::LineNo)
        .all(conn)
        .await
        .map_err(|e| read_error(e, "issue item"))?;

    let mut grouped: HashMap<Uuid, Vec<issue_item::Model>> = HashMap::new();
    for item in items {
        grouped.entry(item.issue_record_id).or_default().push(item);
    }
    Ok(grouped)
}

/// Sums quantities per product, ordered by product id. Stock rows are
/// decremented in this order so two orders naming the same products in
/// different orders lock them the same way round.
fn combine_lines(items: &[IssueLineRequest]) -> Vec<(Uuid, i64)> {
    let mut combined: Vec<(Uuid, i64)> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for line in items {
        match index.get(&line.product_id) {
            Some(&pos) => combined[pos].1 += i64::from(line.quantity),
            None => {
                index.insert(line.product_id, combined.len());
                combined.push((line.product_id, i64::from(line.quantity)));
            }
        }
    }
    combined.sort_by_key(|(product_id, _)| *product_id);
    combined
}

/// Checks the request shape in the order callers are told about problems.
fn validate_request(request: &CreateIssueRequest) -> Result<(), ServiceError> {
    if !request.customer.is_complete() {
        return Err(ServiceError::ValidationError(
            "customer details required: name, phone and location".to_string(),
        ));
    }
    if request.items.is_empty() {
        return Err(ServiceError::ValidationError("no items".to_string()));
    }
    request.validate()?;
    Ok(())
}

/// Issuance transaction, listing and discounts
#[derive(Clone)]
pub struct IssuanceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl IssuanceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Validates the order against live stock, decrements it and records the
    /// issuance, all or nothing.
    #[instrument(skip(self, request), fields(operator_id = %operator_id, lines = request.items.len()))]
    pub async fn create_issue(
        &self,
        operator_id: Uuid,
        request: CreateIssueRequest,
    ) -> Result<IssueResponse, ServiceError> {
        validate_request(&request)?;

        let combined = combine_lines(&request.items);
        let product_ids: Vec<Uuid> = combined.iter().map(|(id, _)| *id).collect();

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for issuance");
            ServiceError::DatabaseError(e)
        })?;

        let products: HashMap<Uuid, product::Model> = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&txn)
            .await
            .map_err(|e| read_error(e, "product"))?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // Check every line before touching stock
        for (product_id, requested) in &combined {
            let product = products.get(product_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", product_id))
            })?;
            if i64::from(product.quantity) < *requested {
                counter!("inventory.issue.insufficient_stock", 1);
                return Err(ServiceError::InsufficientStock(format!(
                    "Not enough stock for {} (requested {}, available {})",
                    product.name, requested, product.quantity
                )));
            }
        }

        for (product_id, requested) in &combined {
            if let Some(product) = products.get(product_id) {
                // bounded by the stock check above
                stock::take_stock(&txn, product, *requested as i32).await?;
            }
        }

        let record_id = Uuid::new_v4();
        let comment = request
            .operator_comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_OPERATOR_COMMENT.to_string());

        let issue = IssueActiveModel {
            id: Set(record_id),
            issue_id: Set(generate_issue_id()),
            operator_id: Set(operator_id),
            date_issued: Set(Utc::now()),
            operator_comment: Set(comment),
            customer_name: Set(request.customer.name.trim().to_string()),
            customer_phone: Set(request.customer.phone.trim().to_string()),
            customer_location: Set(request.customer.location.trim().to_string()),
            discount_percent: Set(Decimal::ZERO),
            discount_amount: Set(Decimal::ZERO),
        }
        .insert(&txn)
        .await
        .map_err(|e| write_error(e, "issue"))?;

        let mut items = Vec::with_capacity(request.items.len());
        for (line_no, line) in request.items.iter().enumerate() {
            // presence checked above
            let Some(product) = products.get(&line.product_id) else {
                continue;
            };
            let item = IssueItemActiveModel {
                id: Set(Uuid::new_v4()),
                issue_record_id: Set(record_id),
                line_no: Set(line_no as i32),
                product_id: Set(product.id),
                product_name: Set(product.name.clone()),
                unit_price: Set(product.price),
                quantity: Set(line.quantity),
            }
            .insert(&txn)
            .await
            .map_err(|e| write_error(e, "issue item"))?;
            items.push(item);
        }

        txn.commit().await.map_err(|e| commit_error(e, "issue"))?;

        let response = build_response(issue, items);
        counter!("inventory.issue.created", 1);
        info!(issue_id = %response.issue_id, total = %response.totals.total_amount, "Issue recorded");

        self.event_sender
            .send_or_log(Event::IssueCreated {
                record_id,
                issue_id: response.issue_id.clone(),
                operator_id,
                line_count: response.items.len(),
                total_amount: response.totals.total_amount,
            })
            .await;

        Ok(response)
    }

    /// All issuances, newest first
    #[instrument(skip(self))]
    pub async fn list_issues(&self) -> Result<Vec<IssueResponse>, ServiceError> {
        let db = &*self.db_pool;
        let issues = IssueEntity::find()
            .order_by_desc(issue::Column::DateIssued)
            .all(db)
            .await
            .map_err(|e| read_error(e, "issue"))?;

        let mut items = load_items(db, issues.iter().map(|i| i.id).collect()).await?;
        Ok(issues
            .into_iter()
            .map(|issue| {
                let lines = items.remove(&issue.id).unwrap_or_default();
                build_response(issue, lines)
            })
            .collect())
    }

    async fn find_issue(&self, key: &str) -> Result<issue::Model, ServiceError> {
        let query = match Uuid::parse_str(key) {
            Ok(id) => IssueEntity::find_by_id(id),
            Err(_) => IssueEntity::find().filter(issue::Column::IssueId.eq(key)),
        };

        query
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "issue"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Issue {} not found", key)))
    }

    /// Fetch by storage id or by the `ISS-...` issue id
    #[instrument(skip(self))]
    pub async fn get_issue(&self, key: &str) -> Result<IssueResponse, ServiceError> {
        let issue = self.find_issue(key).await?;
        let mut items = load_items(&*self.db_pool, vec![issue.id]).await?;
        let lines = items.remove(&issue.id).unwrap_or_default();
        Ok(build_response(issue, lines))
    }

    /// Re-derives the discount from the snapshotted lines and stores it.
    /// Applying the same percent twice leaves the same state.
    #[instrument(skip(self))]
    pub async fn apply_discount(
        &self,
        key: &str,
        discount_percent: Decimal,
    ) -> Result<DiscountSummary, ServiceError> {
        let issue = self.find_issue(key).await?;
        pricing::validate_discount_percent(discount_percent)?;

        let mut items = load_items(&*self.db_pool, vec![issue.id]).await?;
        let lines = items.remove(&issue.id).unwrap_or_default();
        let total = pricing::issue_total(lines.iter().map(|l| (l.unit_price, l.quantity)));
        let discount = pricing::checked_discount(total, discount_percent)?;

        let mut active: IssueActiveModel = issue.into();
        active.discount_percent = Set(discount_percent);
        active.discount_amount = Set(discount);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| write_error(e, "issue"))?;

        info!(issue_id = %updated.issue_id, %discount_percent, %discount, "Discount applied");
        self.event_sender
            .send_or_log(Event::DiscountApplied {
                issue_id: updated.issue_id.clone(),
                discount_percent,
                discount_amount: discount,
            })
            .await;

        Ok(DiscountSummary {
            issue_id: updated.issue_id,
            discount_percent,
            totals: IssueTotals {
                total_amount: total,
                discount_amount: discount,
                final_amount: total - discount,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn line(product_id: Uuid, quantity: i32) -> IssueLineRequest {
        IssueLineRequest {
            product_id,
            quantity,
        }
    }

    fn request(items: Vec<IssueLineRequest>) -> CreateIssueRequest {
        CreateIssueRequest {
            customer: CustomerDetails {
                name: "Amina".into(),
                phone: "0722000111".into(),
                location: "Nakuru".into(),
            },
            items,
            operator_comment: None,
        }
    }

    #[test]
    fn duplicate_lines_are_combined_in_product_id_order() {
        let mut ids = [Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let [low, high] = ids;

        // the same products named in opposite orders lock the same way round
        let forward = combine_lines(&[line(low, 2), line(high, 1), line(low, 3)]);
        let backward = combine_lines(&[line(high, 1), line(low, 5)]);
        assert_eq!(forward, vec![(low, 5), (high, 1)]);
        assert_eq!(backward, forward);
    }

    #[test]
    fn customer_is_checked_before_items() {
        let mut req = request(vec![]);
        req.customer.phone = "  ".into();
        assert_matches!(
            validate_request(&req),
            Err(ServiceError::ValidationError(msg)) if msg.contains("customer")
        );
    }

    #[test]
    fn empty_items_rejected() {
        assert_matches!(
            validate_request(&request(vec![])),
            Err(ServiceError::ValidationError(msg)) if msg == "no items"
        );
    }

    #[test]
    fn zero_quantity_line_rejected() {
        let req = request(vec![line(Uuid::new_v4(), 0)]);
        assert_matches!(validate_request(&req), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn issue_ids_are_prefixed_and_unique() {
        let a = generate_issue_id();
        assert!(a.starts_with("ISS-"));
        assert_eq!(a.len(), 4 + 32);
        assert_ne!(a, generate_issue_id());
    }
}
