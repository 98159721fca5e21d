//! # Guarita 共有ユーティリティ
//!
//! API サーバーから利用される、ビジネスロジックを含まない共通部品を提供する。
//!
//! ## 設計方針
//!
//! - レスポンスボディは純粋なデータ構造（axum への依存を持たない）
//! - クライアントに返す文言とログ文言は [`texts`] に集約する
//! - トレーシング初期化は [`observability`]、リクエスト単位のログは [`access_log`] に集約する

pub mod access_log;
pub mod error_response;
pub mod health;
pub mod observability;
pub mod rate_limit_response;
pub mod texts;

pub use error_response::{ErrorDetails, ErrorResponse, ValidationIssue};
pub use health::HealthResponse;
pub use rate_limit_response::RateLimitResponse;
