pub mod auth;
pub mod common;
pub mod health;
pub mod issues;
pub mod operators;
pub mod products;
pub mod reports;

use crate::{
    auth::{AuthRouterExt, AuthService},
    config::AppConfig,
    db::DbPool,
    entities::user::Role,
    events::EventSender,
    services::{
        issuance::IssuanceService, operators::OperatorService, products::ProductService,
        reports::ReportService, restocks::RestockService,
    },
};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub issuance: Arc<IssuanceService>,
    pub restocks: Arc<RestockService>,
    pub reports: Arc<ReportService>,
    pub operators: Arc<OperatorService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            products: Arc::new(ProductService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.placeholder_image_url.clone(),
            )),
            issuance: Arc::new(IssuanceService::new(db_pool.clone(), event_sender.clone())),
            restocks: Arc::new(RestockService::new(db_pool.clone(), event_sender.clone())),
            reports: Arc::new(ReportService::new(db_pool.clone())),
            operators: Arc::new(OperatorService::new(
                db_pool,
                event_sender,
                auth_service,
                config.default_operator_password.clone(),
            )),
        }
    }
}

/// Everything under `/api/v1`. Login is public, operator management needs
/// the admin role, the rest needs any valid token.
pub fn api_v1_routes() -> Router<AppState> {
    let public = Router::new().route("/auth/login", post(auth::login));

    let authenticated = Router::new()
        .route("/auth/change-password", post(auth::change_password))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/by-name/:name",
            get(products::get_product_by_name),
        )
        .route(
            "/products/:id",
            get(products::get_product).put(products::update_product),
        )
        .route("/products/:id/quantity", put(products::restock_product))
        .route("/issues", get(issues::list_issues).post(issues::create_issue))
        .route("/issues/:id", get(issues::get_issue))
        .route("/issues/:id/discount", put(issues::apply_discount))
        .route("/reports/issues/:period", get(reports::issue_report))
        .route("/reports/restocks/:period", get(reports::restock_report))
        .route("/reports/sales/daily", get(reports::daily_sales))
        .with_auth();

    let admin = Router::new()
        .route(
            "/operators",
            get(operators::list_operators).post(operators::create_operator),
        )
        .route("/operators/:id", put(operators::update_operator))
        .route("/operators/:id/status", put(operators::set_operator_status))
        .with_role(Role::Admin);

    Router::new().merge(public).merge(authenticated).merge(admin)
}
