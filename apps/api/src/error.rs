//! # エラーハンドリング
//!
//! リクエスト処理中に発生したあらゆるエラーを 4 種類に分類し、
//! 重大度を決めてログを出し、正規化された JSON ボディを返す。
//!
//! ## 分類（先にマッチしたものが優先）
//!
//! | 種類 | ステータス | ログ | `details` |
//! |------|------------|------|-----------|
//! | リクエストのスキーマ検証エラー | 400 | warn | issues + method/url |
//! | レスポンスのスキーマ不一致 | 500 | error | issues + エラー自身の method/url |
//! | 一般的なエラー | 500 | error | なし |
//! | 正体不明（panic ペイロード等） | 500 | error | なし |
//!
//! ## 仕組み
//!
//! ```text
//! handler ── Err(Fault) ──▶ IntoResponse（拡張領域に Fault を格納）
//!                                │
//!            handle_errors ◀─────┘  RequestContext と突き合わせて classify
//!                                │
//!                                ▼
//!                       LogRecord を emit → JSON レスポンス
//! ```
//!
//! エラーハンドラは終端であり、ここから先にエラーは伝播しない。

mod classify;
mod fault;
mod middleware;

pub use classify::{Classified, classify};
pub use fault::{Fault, FaultKind, GenericFault, RaisedFault, SerializationFault, ValidationFault};
pub use middleware::{handle_errors, panic_response};
