use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "1.0.0",
        description = r#"
# Stockroom Inventory API

Catalog, stock issuance, restocking and reporting for a single stockroom.

## Authentication

Every endpoint except login and health requires a bearer token obtained from
`POST /api/v1/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Operator management is restricted to the `admin` role.

## Error Handling

Errors share one body shape:

```json
{
  "success": false,
  "error": "Bad Request",
  "message": "Insufficient stock for Widget: requested 5, available 2",
  "request_id": "4f3c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Insufficient stock is a 400. A 409 means another request changed the same
stock first and the call can be retried.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Login and password management"),
        (name = "Products", description = "Catalog and restocking"),
        (name = "Issues", description = "Stock issuance and discounts"),
        (name = "Reports", description = "Windowed issuance, restock and sales reports"),
        (name = "Operators", description = "Admin-only account management")
    ),
    paths(
        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::change_password,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_name,
        crate::handlers::products::update_product,
        crate::handlers::products::restock_product,

        // Issues
        crate::handlers::issues::create_issue,
        crate::handlers::issues::list_issues,
        crate::handlers::issues::get_issue,
        crate::handlers::issues::apply_discount,

        // Reports
        crate::handlers::reports::issue_report,
        crate::handlers::reports::restock_report,
        crate::handlers::reports::daily_sales,

        // Operators
        crate::handlers::operators::create_operator,
        crate::handlers::operators::list_operators,
        crate::handlers::operators::update_operator,
        crate::handlers::operators::set_operator_status,
    ),
    components(
        schemas(
            crate::ResponseMeta,
            crate::auth::IssuedToken,
            crate::entities::product::Model,
            crate::entities::user::Role,
            crate::entities::user::AccountStatus,
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::restocks::RestockRequest,
            crate::services::restocks::RestockResponse,
            crate::services::issuance::CustomerDetails,
            crate::services::issuance::IssueLineRequest,
            crate::services::issuance::CreateIssueRequest,
            crate::services::issuance::ApplyDiscountRequest,
            crate::services::issuance::IssueLineResponse,
            crate::services::issuance::IssueResponse,
            crate::services::issuance::DiscountSummary,
            crate::services::pricing::IssueTotals,
            crate::services::reports::ReportPeriod,
            crate::services::reports::IssuedProductLine,
            crate::services::reports::IssueReportEntry,
            crate::services::reports::RestockReportEntry,
            crate::services::reports::DailySales,
            crate::services::operators::LoginRequest,
            crate::services::operators::ChangePasswordRequest,
            crate::services::operators::CreateOperatorRequest,
            crate::services::operators::UpdateOperatorRequest,
            crate::services::operators::SetStatusRequest,
            crate::services::operators::OperatorResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths_and_security() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Stockroom API"));
        assert!(json.contains("/api/v1/issues"));
        assert!(json.contains("/api/v1/products/{id}/quantity"));
        assert!(json.contains("bearer_auth"));
    }
}
