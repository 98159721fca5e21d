//! # レート制限
//!
//! クライアント IP ごとにリクエスト数を数え、上限に近づく・超える・BAN されるの
//! 3 段階で異なるログとレスポンスを返す。
//!
//! ```text
//! Normal ──閾値到達──▶ Approaching ──ウィンドウ終了──▶ Normal
//! Normal / Approaching ──上限超過──▶ Exceeded（429）
//! Exceeded ──超過が続く──▶ Banned（ウィンドウ終了まで全拒否）──▶ Normal
//! ```
//!
//! - [`store`]: 固定ウィンドウのカウンタ
//! - [`tracker`]: カウントから状態遷移と拒否を判定
//! - [`policy`]: 状態遷移ごとのログと拒否ボディ
//! - [`middleware`]: axum ミドルウェアとレスポンスヘッダー
//! - [`window`]: `RATE_LIMIT_WINDOW` の解釈

pub mod middleware;
pub mod policy;
pub mod store;
pub mod tracker;
pub mod window;

pub use middleware::{RateLimitState, rate_limit};
pub use policy::{RateLimitContext, RateLimitPolicy};
pub use store::{Hit, MemoryQuotaStore, QuotaError, QuotaStore};
pub use tracker::{QuotaTracker, RateLimitEvent, Rejection, Verdict};
pub use window::{TimeWindow, WindowParseError};
