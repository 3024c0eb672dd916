mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn issue_worth_100(app: &TestApp) -> String {
    let p = app.create_product("Cartridge", "50.00", 10).await;
    let (status, body) = app.issue(&[(p["id"].as_str().unwrap(), 2)]).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["issue_id"].as_str().unwrap().to_string()
}

async fn discount(app: &TestApp, issue_id: &str, percent: Value) -> (StatusCode, Value) {
    app.call(
        Method::PUT,
        &format!("/api/v1/issues/{}/discount", issue_id),
        Some(json!({ "discount_percent": percent })),
    )
    .await
}

#[tokio::test]
async fn ten_percent_of_hundred_is_idempotent() {
    let app = TestApp::new().await;
    let issue_id = issue_worth_100(&app).await;

    for _ in 0..2 {
        let (status, body) = discount(&app, &issue_id, json!(10)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(decimal(&body["data"]["discount_percent"]), dec!(10));
        assert_eq!(decimal(&body["data"]["total_amount"]), dec!(100));
        assert_eq!(decimal(&body["data"]["discount_amount"]), dec!(10));
        assert_eq!(decimal(&body["data"]["final_amount"]), dec!(90));
    }

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/issues/{}", issue_id), None)
        .await;
    assert_eq!(decimal(&body["data"]["discount_amount"]), dec!(10));
    assert_eq!(decimal(&body["data"]["final_amount"]), dec!(90));
}

#[tokio::test]
async fn changing_the_percent_replaces_the_previous_discount() {
    let app = TestApp::new().await;
    let issue_id = issue_worth_100(&app).await;

    discount(&app, &issue_id, json!(10)).await;
    let (status, body) = discount(&app, &issue_id, json!("2.5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["discount_amount"]), dec!(2.50));
    assert_eq!(decimal(&body["data"]["final_amount"]), dec!(97.50));

    let (status, body) = discount(&app, &issue_id, json!(0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["final_amount"]), dec!(100));
}

#[tokio::test]
async fn out_of_range_or_malformed_percent_is_rejected() {
    let app = TestApp::new().await;
    let issue_id = issue_worth_100(&app).await;

    for bad in [json!(11), json!(-1), json!("7.555"), json!("ten"), json!(null)] {
        let (status, body) = discount(&app, &issue_id, bad.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "percent {bad} gave {body}");
    }

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/issues/{}", issue_id), None)
        .await;
    assert_eq!(decimal(&body["data"]["discount_amount"]), dec!(0));
}

#[tokio::test]
async fn discount_on_unknown_issue_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = discount(&app, "ISS-missing", json!(5)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
