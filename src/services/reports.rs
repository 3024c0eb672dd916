//! Read-only windowed reports over the issuance and restock ledgers.

use crate::{
    db::DbPool,
    entities::{
        issue::{self, Entity as IssueEntity},
        product::{self, Entity as ProductEntity},
        restock::{self, Entity as RestockEntity},
        user::{self, Entity as UserEntity},
    },
    errors::ServiceError,
    services::{issuance::load_items, pricing},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::read_error;

const UNKNOWN: &str = "Unknown";

/// Fixed report windows, all computed in UTC
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ReportPeriod {
    /// Parses the `{period}` path segment, naming the bad value on failure.
    pub fn from_path(raw: &str) -> Result<Self, ServiceError> {
        raw.parse().map_err(|_: strum::ParseError| {
            ServiceError::ValidationError(format!(
                "unknown report period '{}'; expected daily, weekly, monthly or yearly",
                raw
            ))
        })
    }
}

/// Inclusive time range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

impl ReportPeriod {
    /// The window containing `now`. Days start at 00:00, weeks on Sunday.
    /// `end` is one microsecond before the next window starts.
    pub fn window(self, now: DateTime<Utc>) -> ReportWindow {
        let today = now.date_naive();
        let (start, next) = match self {
            Self::Daily => (today, today + Duration::days(1)),
            Self::Weekly => {
                let offset = i64::from(today.weekday().num_days_from_sunday());
                let start = today - Duration::days(offset);
                (start, start + Duration::days(7))
            }
            Self::Monthly => {
                let start = today.with_day(1).unwrap_or(today);
                let next = if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                };
                (start, next.unwrap_or(start + Duration::days(31)))
            }
            Self::Yearly => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                    .unwrap_or(start + Duration::days(366));
                (start, next)
            }
        };

        ReportWindow {
            start: midnight(start),
            end: midnight(next) - Duration::microseconds(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedProductLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub total_price: Decimal,
}

/// One issuance in a report, lines grouped under it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssueReportEntry {
    pub issue_id: String,
    pub operator_name: String,
    pub customer_name: String,
    pub date_issued: DateTime<Utc>,
    pub products_issued: Vec<IssuedProductLine>,
    #[schema(value_type = String)]
    pub total_cost: Decimal,
    #[schema(value_type = String)]
    pub discount_amount: Decimal,
    #[schema(value_type = String)]
    pub final_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RestockReportEntry {
    pub restock_id: Uuid,
    pub operator_name: String,
    pub product_name: String,
    pub old_quantity: i32,
    pub new_quantity: i32,
    pub quantity_added: i32,
    pub restock_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailySales {
    pub date: NaiveDate,
    pub issue_count: usize,
    /// Σ(line totals − discount), rounded to cents
    #[schema(value_type = String, example = "1520.75")]
    pub total_sales: Decimal,
}

#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn user_names(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, String>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(UserEntity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "user"))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect())
    }

    async fn product_names(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, String>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(ProductEntity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "product"))?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect())
    }

    async fn issues_between(&self, window: ReportWindow) -> Result<Vec<issue::Model>, ServiceError> {
        IssueEntity::find()
            .filter(issue::Column::DateIssued.between(window.start, window.end))
            .order_by_desc(issue::Column::DateIssued)
            .all(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "issue"))
    }

    /// Issuances in `window`, newest first
    #[instrument(skip(self))]
    pub async fn issue_report(
        &self,
        window: ReportWindow,
    ) -> Result<Vec<IssueReportEntry>, ServiceError> {
        let issues = self.issues_between(window).await?;
        let operators = self
            .user_names(issues.iter().map(|i| i.operator_id).collect())
            .await?;
        let mut items = load_items(&*self.db_pool, issues.iter().map(|i| i.id).collect()).await?;

        let entries: Vec<IssueReportEntry> = issues
            .into_iter()
            .map(|issue| {
                let lines = items.remove(&issue.id).unwrap_or_default();
                let products_issued: Vec<IssuedProductLine> = lines
                    .into_iter()
                    .map(|line| IssuedProductLine {
                        total_price: pricing::line_total(line.unit_price, line.quantity),
                        product_id: line.product_id,
                        product_name: line.product_name,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                    })
                    .collect();
                let total_cost: Decimal = products_issued.iter().map(|l| l.total_price).sum();

                IssueReportEntry {
                    operator_name: operators
                        .get(&issue.operator_id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    issue_id: issue.issue_id,
                    customer_name: issue.customer_name,
                    date_issued: issue.date_issued,
                    products_issued,
                    total_cost,
                    discount_amount: issue.discount_amount,
                    final_amount: total_cost - issue.discount_amount,
                }
            })
            .collect();

        debug!(count = entries.len(), "issue report built");
        Ok(entries)
    }

    /// Restocks in `window`, newest first
    #[instrument(skip(self))]
    pub async fn restock_report(
        &self,
        window: ReportWindow,
    ) -> Result<Vec<RestockReportEntry>, ServiceError> {
        let restocks = RestockEntity::find()
            .filter(restock::Column::RestockDate.between(window.start, window.end))
            .order_by_desc(restock::Column::RestockDate)
            .all(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "restock"))?;

        let operators = self
            .user_names(restocks.iter().map(|r| r.restocker_id).collect())
            .await?;
        let products = self
            .product_names(restocks.iter().map(|r| r.product_id).collect())
            .await?;

        Ok(restocks
            .into_iter()
            .map(|r| RestockReportEntry {
                restock_id: r.id,
                operator_name: operators
                    .get(&r.restocker_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                product_name: products
                    .get(&r.product_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                old_quantity: r.old_quantity,
                new_quantity: r.new_quantity,
                quantity_added: r.new_quantity - r.old_quantity,
                restock_date: r.restock_date,
            })
            .collect())
    }

    /// Payable value of today's issuances
    #[instrument(skip(self))]
    pub async fn daily_sales(&self, now: DateTime<Utc>) -> Result<DailySales, ServiceError> {
        let window = ReportPeriod::Daily.window(now);
        let issues = self.issues_between(window).await?;
        let mut items = load_items(&*self.db_pool, issues.iter().map(|i| i.id).collect()).await?;

        let total: Decimal = issues
            .iter()
            .map(|issue| {
                let lines = items.remove(&issue.id).unwrap_or_default();
                pricing::issue_total(lines.iter().map(|l| (l.unit_price, l.quantity)))
                    - issue.discount_amount
            })
            .sum();

        Ok(DailySales {
            date: now.date_naive(),
            issue_count: issues.len(),
            total_sales: pricing::round_money(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().unwrap()
    }

    #[test]
    fn daily_window_spans_the_utc_day() {
        let w = ReportPeriod::Daily.window(at(2024, 3, 14, 15, 9));
        assert_eq!(w.start, at(2024, 3, 14, 0, 0));
        assert_eq!(w.end, at(2024, 3, 15, 0, 0) - Duration::microseconds(1));
    }

    #[test]
    fn weekly_window_starts_on_sunday() {
        // 2024-03-14 is a Thursday
        let w = ReportPeriod::Weekly.window(at(2024, 3, 14, 8, 0));
        assert_eq!(w.start, at(2024, 3, 10, 0, 0));
        assert_eq!(w.end, at(2024, 3, 17, 0, 0) - Duration::microseconds(1));

        // a Sunday is the first day of its own week
        let w = ReportPeriod::Weekly.window(at(2024, 3, 17, 0, 0));
        assert_eq!(w.start, at(2024, 3, 17, 0, 0));
    }

    #[test]
    fn monthly_window_handles_december_and_leap_february() {
        let w = ReportPeriod::Monthly.window(at(2023, 12, 31, 23, 59));
        assert_eq!(w.start, at(2023, 12, 1, 0, 0));
        assert_eq!(w.end, at(2024, 1, 1, 0, 0) - Duration::microseconds(1));

        let w = ReportPeriod::Monthly.window(at(2024, 2, 10, 0, 0));
        assert_eq!(w.end.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn yearly_window_covers_the_calendar_year() {
        let w = ReportPeriod::Yearly.window(at(2024, 7, 1, 12, 0));
        assert_eq!(w.start, at(2024, 1, 1, 0, 0));
        assert_eq!(w.end, at(2025, 1, 1, 0, 0) - Duration::microseconds(1));
    }

    #[test]
    fn period_parsing_is_case_insensitive_and_strict() {
        assert_eq!(ReportPeriod::from_path("Weekly").unwrap(), ReportPeriod::Weekly);
        assert_eq!(ReportPeriod::from_path("YEARLY").unwrap(), ReportPeriod::Yearly);
        assert!(matches!(
            ReportPeriod::from_path("hourly"),
            Err(ServiceError::ValidationError(msg)) if msg.contains("'hourly'")
        ));
    }
}
