//! # レート制限ポリシー
//!
//! 状態遷移ごとに出すログと、拒否時に返すボディを決める。
//! 出力はすべて値で返すので、ポリシー自体はログ基盤に依存しない。

use guarita_shared::{RateLimitResponse, texts::rate_limit};

use super::tracker::{RateLimitEvent, Rejection};
use crate::{log_record::LogRecord, request_context::RequestContext};

/// クォータトラッカーとポリシーが共有する設定値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitContext {
    /// ウィンドウ内の最大リクエスト数
    pub max:   u64,
    /// ウィンドウの表示用文字列（例: `1 minute`）
    pub after: String,
    /// 超過回数がこれを上回ると BAN。`None` なら BAN しない
    pub ban:   Option<u64>,
}

/// レート制限のレスポンスポリシー
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    context: RateLimitContext,
}

impl RateLimitPolicy {
    pub fn new(context: RateLimitContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RateLimitContext {
        &self.context
    }

    /// 状態遷移のログ
    ///
    /// Approaching はリクエストを通すので、ここで返すログ以外には何も起きない。
    pub fn on_event(&self, event: &RateLimitEvent) -> LogRecord {
        match *event {
            RateLimitEvent::Approaching(ip) => LogRecord::info(rate_limit::approaching_limit(ip)),
            RateLimitEvent::Exceeded(ip) => LogRecord::warn(rate_limit::limit_exceeded(ip)),
            RateLimitEvent::Banned(ip) => LogRecord::error(rate_limit::banned(ip)),
        }
    }

    /// 拒否レスポンスのボディと、その直前に出すログ
    pub fn rejection(
        &self,
        rejection: Rejection,
        ctx: &RequestContext,
    ) -> (LogRecord, RateLimitResponse) {
        let log = LogRecord::warn(rate_limit::log_exceeded(ctx.ip, &ctx.method, &ctx.url))
            .with_request(&ctx.method, &ctx.url);

        let body = match rejection {
            Rejection::Exceeded => RateLimitResponse::exceeded(self.context.max, &self.context.after),
            Rejection::Banned => RateLimitResponse::banned(&self.context.after),
        };

        (log, body)
    }
}
