//! # エラーレスポンス
//!
//! グローバルエラーハンドラが返す JSON ボディを提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は API クレートの責務（shared に axum 依存を入れない）
//! - フィールド名・順序は既存クライアントとの契約なので変更しない
//!
//! ```json
//! {
//!   "error": "Response Validation Error",
//!   "message": "The request does not match the expected schema",
//!   "statusCode": 400,
//!   "details": { "issues": [], "method": "POST", "url": "/orders" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::texts::handle_error;

/// スキーマ検証で見つかった個々の問題
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 問題のあるフィールドへのパス（例: `items[0].quantity`）。ボディ全体なら空文字
    pub path:    String,
    /// 機械可読なコード（例: `range`, `invalid_json`）
    pub code:    String,
    /// 人間可読な説明
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        path: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path:    path.into(),
            code:    code.into(),
            message: message.into(),
        }
    }
}

/// `details` フィールド
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub issues: Vec<ValidationIssue>,
    pub method: String,
    pub url:    String,
}

/// エラーレスポンスボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error:       String,
    pub message:     String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details:     Option<ErrorDetails>,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        status_code: u16,
        details: Option<ErrorDetails>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
            details,
        }
    }

    /// 400 リクエストのスキーマ検証エラー
    pub fn validation_error(details: ErrorDetails) -> Self {
        Self::new(
            handle_error::validation::ERROR,
            handle_error::validation::MESSAGE,
            400,
            Some(details),
        )
    }

    /// 500 レスポンスのスキーマ不一致
    pub fn serialization_error(details: ErrorDetails) -> Self {
        Self::new(
            handle_error::serialization::ERROR,
            handle_error::serialization::MESSAGE,
            500,
            Some(details),
        )
    }

    /// 500 想定外のエラー
    ///
    /// `message` が空の場合は固定文言にフォールバックする。空文字は返さない。
    pub fn unexpected_error(message: &str) -> Self {
        let message = if message.is_empty() {
            handle_error::unexpected::MESSAGE
        } else {
            message
        };
        Self::new(handle_error::unexpected::ERROR, message, 500, None)
    }

    /// 500 正体不明のエラー
    ///
    /// 元の値は一切表示に使わない。
    pub fn unknown_error() -> Self {
        Self::new(
            handle_error::unknown::ERROR,
            handle_error::unknown::MESSAGE,
            500,
            None,
        )
    }
}
