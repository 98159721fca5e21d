//! グローバルエラーハンドラ統合テスト
//!
//! 実際のミドルウェアスタック（`build_app`）にテスト用のルートを載せ、
//! ハンドラで発生したエラーがクライアントにどう見えるかを検証する。
//!
//! ## テストケース
//!
//! - リクエストのスキーマ検証エラー → 400、問題は検出順
//! - クエリ文字列・パスパラメータの不正 → ボディと同じ 400 の JSON
//! - レスポンスのスキーマ不一致 → 500、生成時のメソッドと URL
//! - 一般的なエラー → 500、メッセージをそのまま返す／空なら固定文言
//! - panic → 500、内容を漏らさない
//! - 同じリクエストには同じボディ

mod helpers;

use anyhow::anyhow;
use axum::{
    Json,
    Router,
    http::StatusCode,
    routing::{get, post},
};
use guarita_api::{
    app::build_app,
    error::Fault,
    request_context::RequestContext,
    schema::{ValidatedJson, ValidatedPath, ValidatedQuery, ValidatedResponse},
};
use helpers::{config, get as get_request, post_json, send};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
struct Order {
    #[validate(length(min = 1, message = "must not be empty"))]
    name:     String,
    #[validate(range(min = 1, message = "must be positive"))]
    quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
struct Page {
    #[validate(range(min = 1, message = "must be positive"))]
    page: u32,
}

#[derive(Debug, Deserialize, Validate)]
struct OrderId {
    id: u64,
}

#[derive(Debug, Serialize, Validate)]
struct Report {
    #[validate(range(max = 100, message = "must be a percentage"))]
    completion: u32,
}

async fn create_order(ValidatedJson(order): ValidatedJson<Order>) -> Json<Order> {
    Json(order)
}

async fn list_orders(ValidatedQuery(page): ValidatedQuery<Page>) -> String {
    format!("page {}", page.page)
}

async fn show_order(ValidatedPath(path): ValidatedPath<OrderId>) -> String {
    format!("order {}", path.id)
}

async fn broken_report(ctx: RequestContext) -> ValidatedResponse<Report> {
    ValidatedResponse::new(&ctx, Report { completion: 250 })
}

async fn disk_full() -> Result<(), Fault> {
    Err(anyhow!("disk full").into())
}

async fn silent_failure() -> Result<(), Fault> {
    Err(anyhow!("").into())
}

async fn explode() {
    panic!("postgres://admin:hunter2@db/orders");
}

fn app() -> Router {
    let routes = Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", get(show_order))
        .route("/reports/weekly", get(broken_report))
        .route("/disk", get(disk_full))
        .route("/silent", get(silent_failure))
        .route("/explode", get(explode));

    build_app(&config("test", &[]), routes)
}

#[tokio::test]
async fn test_スキーマ検証エラーは400で問題を検出順に返す() {
    let response = send(
        &app(),
        post_json("/orders?channel=web", r#"{"name":"","quantity":0}"#),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json(),
        json!({
            "error": "Response Validation Error",
            "message": "The request does not match the expected schema",
            "statusCode": 400,
            "details": {
                "issues": [
                    { "path": "name", "code": "length", "message": "must not be empty" },
                    { "path": "quantity", "code": "range", "message": "must be positive" }
                ],
                "method": "POST",
                "url": "/orders?channel=web"
            }
        })
    );
}

#[tokio::test]
async fn test_読めないクエリ文字列はjsonの400になる() {
    let response = send(&app(), get_request("/orders?page=abc")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["message"], "The request does not match the expected schema");
    assert_eq!(body["details"]["issues"][0]["code"], "invalid_query");
    assert_eq!(body["details"]["method"], "GET");
    assert_eq!(body["details"]["url"], "/orders?page=abc");
}

#[tokio::test]
async fn test_クエリ文字列の検証エラーは問題を返す() {
    let response = send(&app(), get_request("/orders?page=0")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["details"]["issues"],
        json!([{ "path": "page", "code": "range", "message": "must be positive" }])
    );
}

#[tokio::test]
async fn test_型の合わないパスパラメータはjsonの400になる() {
    let response = send(&app(), get_request("/orders/abc")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["details"]["issues"][0]["code"], "invalid_params");
}

#[tokio::test]
async fn test_正しいクエリ文字列とパスパラメータはハンドラに渡る() {
    let page = send(&app(), get_request("/orders?page=2")).await;
    let order = send(&app(), get_request("/orders/42")).await;

    assert_eq!(page.body, b"page 2");
    assert_eq!(order.body, b"order 42");
}

#[tokio::test]
async fn test_レスポンスの不一致は500で生成時のメソッドとurlを返す() {
    let response = send(&app(), get_request("/reports/weekly?week=42")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({
            "error": "Internal Server Error",
            "message": "The response does not match the expected schema",
            "statusCode": 500,
            "details": {
                "issues": [
                    { "path": "completion", "code": "range", "message": "must be a percentage" }
                ],
                "method": "GET",
                "url": "/reports/weekly?week=42"
            }
        })
    );
}

#[tokio::test]
async fn test_一般的なエラーはメッセージをそのまま返す() {
    let response = send(&app(), get_request("/disk")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({
            "error": "Internal Server Error",
            "message": "disk full",
            "statusCode": 500
        })
    );
}

#[tokio::test]
async fn test_メッセージが空のエラーは固定文言を返す() {
    let response = send(&app(), get_request("/silent")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["message"], "An unexpected error occurred.");
}

#[tokio::test]
async fn test_panicの内容はレスポンスに漏れない() {
    let response = send(&app(), get_request("/explode")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!String::from_utf8_lossy(&response.body).contains("hunter2"));
    assert_eq!(
        response.json(),
        json!({
            "error": "Internal Server Error",
            "message": "Erro inesperado sem detalhes disponíveis",
            "statusCode": 500
        })
    );
}

#[tokio::test]
async fn test_同じリクエストには同じボディを返す() {
    let app = app();
    let body = r#"{"name":"pen","quantity":-3}"#;

    let first = send(&app, post_json("/orders", body)).await;
    let second = send(&app, post_json("/orders", body)).await;

    assert_eq!(first.status, StatusCode::BAD_REQUEST);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_正常なリクエストはエラーハンドラを素通りする() {
    let response = send(&app(), post_json("/orders", r#"{"name":"pen","quantity":2}"#)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "name": "pen", "quantity": 2 }));
}
