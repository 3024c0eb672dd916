mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn empty_reports_are_ok_with_empty_lists() {
    let app = TestApp::new().await;
    for period in ["daily", "weekly", "monthly", "yearly"] {
        for kind in ["issues", "restocks"] {
            let (status, body) = app
                .call(Method::GET, &format!("/api/v1/reports/{}/{}", kind, period), None)
                .await;
            assert_eq!(status, StatusCode::OK, "{kind}/{period}");
            assert_eq!(body["data"], json!([]));
        }
    }
}

#[tokio::test]
async fn unknown_period_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(Method::GET, "/api/v1/reports/issues/hourly", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("hourly"));
}

#[tokio::test]
async fn issue_report_groups_lines_under_each_issuance() {
    let app = TestApp::new().await;
    let a = app.create_product("Cable", "5.00", 20).await;
    let b = app.create_product("Adapter", "12.50", 20).await;

    let (status, created) = app
        .issue(&[(a["id"].as_str().unwrap(), 2), (b["id"].as_str().unwrap(), 1)])
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let issue_id = created["data"]["issue_id"].as_str().unwrap();

    app.call(
        Method::PUT,
        &format!("/api/v1/issues/{}/discount", issue_id),
        Some(json!({ "discount_percent": 10 })),
    )
    .await;

    for period in ["daily", "weekly", "monthly", "yearly"] {
        let (status, body) = app
            .call(Method::GET, &format!("/api/v1/reports/issues/{}", period), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1, "{period}");

        let entry = &entries[0];
        assert_eq!(entry["issue_id"], json!(issue_id));
        assert_eq!(entry["operator_name"], "Floor Operator");
        assert_eq!(entry["customer_name"], "Jane Buyer");
        assert_eq!(entry["products_issued"].as_array().unwrap().len(), 2);
        assert_eq!(decimal(&entry["total_cost"]), dec!(22.50));
        assert_eq!(decimal(&entry["discount_amount"]), dec!(2.25));
        assert_eq!(decimal(&entry["final_amount"]), dec!(20.25));
    }
}

#[tokio::test]
async fn daily_sales_sums_payable_value() {
    let app = TestApp::new().await;
    let p = app.create_product("Notebook", "3.25", 50).await;
    let id = p["id"].as_str().unwrap();

    let (_, first) = app.issue(&[(id, 10)]).await;
    app.issue(&[(id, 5)]).await;
    app.call(
        Method::PUT,
        &format!(
            "/api/v1/issues/{}/discount",
            first["data"]["issue_id"].as_str().unwrap()
        ),
        Some(json!({ "discount_percent": 5 })),
    )
    .await;

    let (status, body) = app
        .call(Method::GET, "/api/v1/reports/sales/daily", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["issue_count"], 2);
    // 32.50 - 1.63 + 16.25
    assert_eq!(decimal(&body["data"]["total_sales"]), dec!(47.12));
}
