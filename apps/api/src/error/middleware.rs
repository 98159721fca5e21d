//! # グローバルエラーハンドラ
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/orders", post(create_order))
//!     .layer(CatchPanicLayer::custom(panic_response))
//!     .layer(from_fn(handle_errors))
//! ```
//!
//! `CatchPanicLayer` は `handle_errors` より内側に置く。panic も [`Fault`] として
//! 拡張領域に載るので、分類とログ出力はすべてここに集約される。

use std::any::Any;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{
    classify::classify,
    fault::{Fault, RaisedFault},
};
use crate::request_context::RequestContext;

/// 内側で発生した Fault を分類済みの JSON レスポンスに差し替える
///
/// Fault を含まないレスポンスはそのまま返す。
/// ログはレスポンスを返す前に 1 回だけ出力する。
pub async fn handle_errors(request: Request<Body>, next: Next) -> Response {
    // ハンドラにリクエストを渡すと参照できなくなるため、先に控えておく
    let ctx = RequestContext::from_request(&request);

    let mut response = next.run(request).await;

    let Some(RaisedFault(fault)) = response.extensions_mut().remove::<RaisedFault>() else {
        return response;
    };

    let classified = classify(&fault, &ctx);
    classified.log.emit();
    classified.into_response()
}

/// `CatchPanicLayer::custom` 用のハンドラ
///
/// panic のペイロードは [`Fault::Unknown`] としてログにだけ残る。
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    Fault::from_panic(payload).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Bytes, http::StatusCode, middleware::from_fn, routing::get};
    use guarita_shared::ErrorResponse;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::*;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    async fn failing_handler() -> Result<&'static str, Fault> {
        Err(anyhow::anyhow!("disk full").into())
    }

    async fn panicking_handler() -> &'static str {
        panic!("secret internals")
    }

    fn router() -> Router {
        Router::new()
            .route("/ok", get(ok_handler))
            .route("/fail", get(failing_handler))
            .route("/panic", get(panicking_handler))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(from_fn(handle_errors))
    }

    async fn call(uri: &str) -> (StatusCode, Bytes) {
        let response = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_faultを含まないレスポンスはそのまま返す() {
        let (status, body) = call("/ok").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_ハンドラのエラーを分類済みボディに差し替える() {
        let (status, body) = call("/fail").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, ErrorResponse::unexpected_error("disk full"));
    }

    #[tokio::test]
    async fn test_panicは正体不明のエラーとして返し内容を漏らさない() {
        let (status, body) = call("/panic").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!String::from_utf8_lossy(&body).contains("secret internals"));
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, ErrorResponse::unknown_error());
    }
}
