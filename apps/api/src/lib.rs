//! # Guarita API サーバー
//!
//! HTTP サービスの土台。設定の検証、構造化ログ、CORS、レート制限、
//! グローバルエラーハンドラを組み込んだルーターを提供する。
//!
//! ## リクエストの流れ
//!
//! ```text
//! Request ID → TraceLayer → CORS → レート制限 → エラーハンドラ → panic 捕捉 → handler
//!                                     │                 │
//!                                     ▼                 ▼
//!                              429 (RateLimitResponse)  400 / 500 (ErrorResponse)
//! ```
//!
//! ## モジュール構成
//!
//! - [`app`] - ルーターとミドルウェアの組み立て
//! - [`config`] - 環境変数からの設定読み込み
//! - [`error`] - エラーの分類とレスポンス整形
//! - [`handler`] - HTTP リクエストハンドラ
//! - [`log_record`] - ログ出力を値として表現する型
//! - [`rate_limit`] - クォータ追跡と拒否レスポンス
//! - [`request_context`] - 分類・ログに必要なリクエスト情報
//! - [`schema`] - リクエスト／レスポンスのスキーマ検証

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod log_record;
pub mod rate_limit;
pub mod request_context;
pub mod schema;
