use super::common::{created_response, success_response, ApiJson};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::issuance::{ApplyDiscountRequest, CreateIssueRequest},
};
use axum::{
    extract::{Path, State},
    response::Response,
};

/// Issue stock to a customer. Every line is checked against live stock and
/// nothing is decremented unless all lines can be filled.
#[utoipa::path(
    post,
    path = "/api/v1/issues",
    request_body = CreateIssueRequest,
    responses(
        (status = 201, description = "Issuance recorded", body = crate::services::issuance::IssueResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Validation failed or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stock changed concurrently, retry", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Issues"
)]
pub async fn create_issue(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateIssueRequest>,
) -> Result<Response, ServiceError> {
    let issue = state
        .services
        .issuance
        .create_issue(user.user_id, payload)
        .await?;
    Ok(created_response(issue, "Products issued successfully"))
}

/// Newest first; an empty store yields an empty list
#[utoipa::path(
    get,
    path = "/api/v1/issues",
    responses(
        (status = 200, description = "All issuances", body = [crate::services::issuance::IssueResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Issues"
)]
pub async fn list_issues(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let issues = state.services.issuance.list_issues().await?;
    Ok(success_response(issues))
}

#[utoipa::path(
    get,
    path = "/api/v1/issues/{id}",
    params(("id" = String, Path, description = "Storage id or ISS- issue id")),
    responses(
        (status = 200, description = "Issuance returned", body = crate::services::issuance::IssueResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Issues"
)]
pub async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let issue = state.services.issuance.get_issue(&id).await?;
    Ok(success_response(issue))
}

/// Set the discount percent (0 to 10). Re-applying the same value is a no-op.
#[utoipa::path(
    put,
    path = "/api/v1/issues/{id}/discount",
    params(("id" = String, Path, description = "Storage id or ISS- issue id")),
    request_body = ApplyDiscountRequest,
    responses(
        (status = 200, description = "Discount applied", body = crate::services::issuance::DiscountSummary),
        (status = 400, description = "Percent out of range", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Issues"
)]
pub async fn apply_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ApplyDiscountRequest>,
) -> Result<Response, ServiceError> {
    let summary = state
        .services
        .issuance
        .apply_discount(&id, payload.discount_percent)
        .await?;
    Ok(success_response(summary))
}
