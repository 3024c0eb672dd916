use super::common::{created_response, parse_id, success_response, ApiJson};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::operators::{CreateOperatorRequest, SetStatusRequest, UpdateOperatorRequest},
};
use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/v1/operators",
    request_body = CreateOperatorRequest,
    responses(
        (status = 201, description = "Operator created", body = crate::services::operators::OperatorResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name, email or phone already used", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Operators"
)]
pub async fn create_operator(
    State(state): State<AppState>,
    admin: AuthUser,
    ApiJson(payload): ApiJson<CreateOperatorRequest>,
) -> Result<Response, ServiceError> {
    let operator = state.services.operators.create_operator(payload).await?;
    info!(admin_id = %admin.user_id, operator_id = %operator.id, "Operator account created");
    Ok(created_response(operator, "Operator created"))
}

#[utoipa::path(
    get,
    path = "/api/v1/operators",
    responses(
        (status = 200, description = "Non-admin accounts", body = [crate::services::operators::OperatorResponse]),
        (status = 403, description = "Admin role required", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Operators"
)]
pub async fn list_operators(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let operators = state.services.operators.list_operators().await?;
    Ok(success_response(operators))
}

#[utoipa::path(
    put,
    path = "/api/v1/operators/{id}",
    params(("id" = String, Path, description = "Operator ID")),
    request_body = UpdateOperatorRequest,
    responses(
        (status = 200, description = "Operator updated", body = crate::services::operators::OperatorResponse),
        (status = 400, description = "Invalid or empty update", body = crate::errors::ErrorResponse),
        (status = 403, description = "Target is not an operator", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Operators"
)]
pub async fn update_operator(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateOperatorRequest>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "operator")?;
    let operator = state.services.operators.update_operator(id, payload).await?;
    Ok(success_response(operator))
}

#[utoipa::path(
    put,
    path = "/api/v1/operators/{id}/status",
    params(("id" = String, Path, description = "Operator ID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = crate::services::operators::OperatorResponse),
        (status = 403, description = "Admins cannot be deactivated", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Operators"
)]
pub async fn set_operator_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<SetStatusRequest>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id, "operator")?;
    let operator = state
        .services
        .operators
        .set_status(id, payload.status)
        .await?;
    Ok(success_response(operator))
}
