use super::common::success_response;
use crate::{
    errors::ServiceError, handlers::AppState, services::reports::ReportPeriod,
};
use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/api/v1/reports/issues/{period}",
    params(("period" = String, Path, description = "daily, weekly, monthly or yearly")),
    responses(
        (status = 200, description = "Issuances in the window, lines grouped per issuance",
            body = [crate::services::reports::IssueReportEntry]),
        (status = 400, description = "Unknown period", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn issue_report(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Response, ServiceError> {
    let window = ReportPeriod::from_path(&period)?.window(Utc::now());
    let entries = state.services.reports.issue_report(window).await?;
    Ok(success_response(entries))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/restocks/{period}",
    params(("period" = String, Path, description = "daily, weekly, monthly or yearly")),
    responses(
        (status = 200, description = "Restocks in the window",
            body = [crate::services::reports::RestockReportEntry]),
        (status = 400, description = "Unknown period", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn restock_report(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Response, ServiceError> {
    let window = ReportPeriod::from_path(&period)?.window(Utc::now());
    let entries = state.services.reports.restock_report(window).await?;
    Ok(success_response(entries))
}

/// Payable value of everything issued today (UTC)
#[utoipa::path(
    get,
    path = "/api/v1/reports/sales/daily",
    responses(
        (status = 200, description = "Today's sales total", body = crate::services::reports::DailySales),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn daily_sales(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let sales = state.services.reports.daily_sales(Utc::now()).await?;
    Ok(success_response(sales))
}
