//! # ヘルスチェックハンドラ
//!
//! ロードバランサーや監視システムからの死活監視用エンドポイント。
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0"
//! }
//! ```

use std::sync::Arc;

use axum::{Json, extract::State};
use guarita_shared::HealthResponse;

/// ヘルスチェックハンドラの状態
#[derive(Debug, Clone)]
pub struct HealthState {
    /// `APP_VERSION`（未設定時はクレートのバージョン）
    pub version: String,
}

/// ヘルスチェックエンドポイント
///
/// 外部サービスへの接続は確認せず、プロセスが応答できることだけを返す。
/// 常に 200 OK。
pub async fn health_check(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(&state.version))
}
