//! 統合テスト共通ヘルパー

#![allow(dead_code)]

pub mod logs;

use std::{collections::HashMap, net::SocketAddr};

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode},
};
use guarita_api::config::AppConfig;
use tower::ServiceExt;

/// テスト用の設定を組み立てる
///
/// `RATE_LIMIT_MAX=3`、`RATE_LIMIT_WINDOW=1 minute` を基本とし、`overrides` で上書きする。
pub fn config(environment: &str, overrides: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("APP_NAME", "orders"),
        ("APP_VERSION", "1.2.3"),
        ("APP_ENV", environment),
        ("CORS_ORIGIN", "*"),
        ("RATE_LIMIT_MAX", "3"),
        ("RATE_LIMIT_WINDOW", "1 minute"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect();

    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// 接続元アドレス付きの GET リクエスト
pub fn get_from(uri: &str, peer: &str) -> Request<Body> {
    let mut request = get(uri);
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub struct TestResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub body:    Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// ルーターを複製してリクエストを 1 件送る
///
/// 複製してもクォータストアは共有される。
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}
