//! # レート制限ミドルウェア
//!
//! ```rust,ignore
//! let state = RateLimitState::new(tracker, policy);
//! router.layer(from_fn_with_state(state, rate_limit))
//! ```
//!
//! 追跡対象のレスポンスには IETF ドラフトのヘッダーを付ける。
//!
//! | ヘッダー | 値 |
//! |----------|----|
//! | `ratelimit-limit` | ウィンドウ内の最大リクエスト数 |
//! | `ratelimit-remaining` | 残り回数 |
//! | `ratelimit-reset` | リセットまでの秒数（切り上げ） |
//! | `retry-after` | 拒否時のみ。`ratelimit-reset` と同じ |

use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use guarita_shared::texts::rate_limit;

use super::{policy::RateLimitPolicy, store::Hit, tracker::QuotaTracker};
use crate::{log_record::LogRecord, request_context::RequestContext};

pub const RATELIMIT_LIMIT: &str = "ratelimit-limit";
pub const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
pub const RATELIMIT_RESET: &str = "ratelimit-reset";

/// レート制限ミドルウェアの状態
#[derive(Clone)]
pub struct RateLimitState {
    tracker: Arc<QuotaTracker>,
    policy:  Arc<RateLimitPolicy>,
}

impl RateLimitState {
    pub fn new(tracker: QuotaTracker, policy: RateLimitPolicy) -> Self {
        Self {
            tracker: Arc::new(tracker),
            policy:  Arc::new(policy),
        }
    }
}

/// レート制限ミドルウェア
///
/// ストアが使えない場合はリクエストを通す（フェイルオープン）。
/// 拒否レスポンスはエラーハンドラを通らず、ここで完結する。
pub async fn rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&request);

    let verdict = match state.tracker.check(ctx.ip).await {
        Ok(verdict) => verdict,
        Err(e) => {
            LogRecord::warn(rate_limit::STORE_UNAVAILABLE)
                .with_request(&ctx.method, &ctx.url)
                .with_error(e.to_string())
                .emit();
            return next.run(request).await;
        }
    };

    if let Some(event) = &verdict.event {
        state.policy.on_event(event).emit();
    }

    let reset_secs = ceil_secs(verdict.hit.reset_after);

    let mut response = match verdict.rejection {
        Some(rejection) => {
            let (log, body) = state.policy.rejection(rejection, &ctx);
            log.emit();

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(reset_secs));
            response
        }
        None => next.run(request).await,
    };

    insert_draft_headers(response.headers_mut(), &state.tracker, &verdict.hit, reset_secs);
    response
}

fn insert_draft_headers(headers: &mut HeaderMap, tracker: &QuotaTracker, hit: &Hit, reset_secs: u64) {
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(tracker.max()));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(tracker.remaining(hit)));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(reset_secs));
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
