//! # エラー分類
//!
//! [`Fault`] と [`RequestContext`] から、出すべきログと返すべきレスポンスを決める純粋関数。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use guarita_shared::{ErrorDetails, ErrorResponse, texts::handle_error};

use super::fault::Fault;
use crate::{log_record::LogRecord, request_context::RequestContext};

/// 分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub log:    LogRecord,
    pub status: StatusCode,
    pub body:   ErrorResponse,
}

impl IntoResponse for Classified {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// エラーを分類し、ログとレスポンスを 1 つずつ組み立てる
///
/// 隠れた状態を持たないため、同じ入力には常に同じ結果を返す。
/// `match` は網羅的なので、[`Fault`] に種類を足すとここがコンパイルエラーになる。
pub fn classify(fault: &Fault, ctx: &RequestContext) -> Classified {
    match fault {
        Fault::Validation(fault) => Classified {
            log:    LogRecord::warn(handle_error::validation::LOG_MESSAGE)
                .with_request(&ctx.method, &ctx.url)
                .with_error(fault.to_string()),
            status: StatusCode::BAD_REQUEST,
            body:   ErrorResponse::validation_error(ErrorDetails {
                issues: fault.issues.clone(),
                method: ctx.method.clone(),
                url:    ctx.url.clone(),
            }),
        },
        // ハンドラ完了後に発生するため、エラー自身が記録したメソッドと URL を使う
        Fault::Serialization(fault) => Classified {
            log:    LogRecord::error(handle_error::serialization::LOG_MESSAGE)
                .with_request(&fault.method, &fault.url)
                .with_error(fault.to_string()),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body:   ErrorResponse::serialization_error(ErrorDetails {
                issues: fault.issues.clone(),
                method: fault.method.clone(),
                url:    fault.url.clone(),
            }),
        },
        Fault::Generic(fault) => Classified {
            log:    LogRecord::error(handle_error::unexpected::LOG_MESSAGE)
                .with_request(&ctx.method, &ctx.url)
                .with_error(&fault.detail),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body:   ErrorResponse::unexpected_error(&fault.message),
        },
        Fault::Unknown { description } => Classified {
            log:    LogRecord::error(handle_error::unknown::LOG_MESSAGE)
                .with_request(&ctx.method, &ctx.url)
                .with_error(description),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body:   ErrorResponse::unknown_error(),
        },
    }
}
