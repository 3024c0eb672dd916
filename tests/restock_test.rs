mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use sea_orm::EntityTrait;
use serde_json::json;
use stockroom_api::{entities::product::Entity as ProductEntity, errors::ServiceError, services::stock};
use uuid::Uuid;

#[tokio::test]
async fn restock_adds_quantity_and_appends_one_ledger_row() {
    let app = TestApp::new().await;
    let p = app.create_product("Paper Ream", "6.00", 3).await;
    let id = p["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/products/{}/quantity", id),
            Some(json!({ "quantity": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["old_quantity"], 3);
    assert_eq!(body["data"]["new_quantity"], 10);
    assert_eq!(body["data"]["restocker_id"], json!(app.operator_id.to_string()));
    assert_eq!(app.product_quantity(id).await, 10);

    let (status, body) = app
        .call(Method::GET, "/api/v1/reports/restocks/daily", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product_name"], "Paper Ream");
    assert_eq!(rows[0]["operator_name"], "Floor Operator");
    assert_eq!(rows[0]["old_quantity"], 3);
    assert_eq!(rows[0]["new_quantity"], 10);
    assert_eq!(rows[0]["quantity_added"], 7);
}

#[tokio::test]
async fn restock_from_a_stale_reading_conflicts() {
    let app = TestApp::new().await;
    let p = app.create_product("Binder", "2.00", 4).await;
    let id = p["id"].as_str().unwrap();

    let seen = ProductEntity::find_by_id(id.parse::<Uuid>().unwrap())
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("product exists");

    let (status, _) = app.issue(&[(id, 1)]).await;
    assert_eq!(status, StatusCode::CREATED);

    let err = stock::add_stock(&*app.state.db, &seen, 6).await.unwrap_err();
    assert_matches!(err, ServiceError::ConcurrentModification(_));
    assert_eq!(app.product_quantity(id).await, 3);

    let fresh = ProductEntity::find_by_id(seen.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("product exists");
    assert_eq!(stock::add_stock(&*app.state.db, &fresh, 6).await.unwrap(), 9);
}

#[tokio::test]
async fn non_positive_or_non_numeric_quantity_is_rejected() {
    let app = TestApp::new().await;
    let p = app.create_product("Ink", "12.00", 4).await;
    let uri = format!("/api/v1/products/{}/quantity", p["id"].as_str().unwrap());

    for bad in [json!(0), json!(-3), json!("lots"), json!(2.5)] {
        let (status, _) = app
            .call(Method::PUT, &uri, Some(json!({ "quantity": bad })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "quantity {bad}");
    }
    assert_eq!(app.product_quantity(p["id"].as_str().unwrap()).await, 4);
}

#[tokio::test]
async fn restocking_unknown_product_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/products/{}/quantity", Uuid::new_v4()),
            Some(json!({ "quantity": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_restock_is_refused() {
    let app = TestApp::new().await;
    let p = app.create_product("Tape", "1.20", 2).await;
    let id = p["id"].as_str().unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}/quantity", id),
            Some(json!({ "quantity": 5 })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.product_quantity(id).await, 2);
}
