use super::common::{message_response, success_response, ApiJson};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppState,
    services::operators::{ChangePasswordRequest, LoginRequest},
};
use axum::{extract::State, response::Response};

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = crate::auth::IssuedToken),
        (status = 400, description = "Malformed request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Bad credentials or deactivated account", body = crate::errors::ErrorResponse),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Response, ServiceError> {
    let token = state.services.operators.login(payload).await?;
    Ok(success_response(token))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Current password incorrect or new one too short", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Response, ServiceError> {
    state
        .services
        .operators
        .change_password(user.user_id, payload)
        .await?;
    Ok(message_response("Password changed"))
}
