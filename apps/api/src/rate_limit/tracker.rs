//! # クォータトラッカー
//!
//! ストアのカウントをクライアントの状態に読み替える。
//!
//! ```text
//! count ≤ max - max/10 - 1   通常
//! max - max/10 ≤ count ≤ max  Approaching（通す）
//! count = max + 1             Exceeded（拒否）
//! count - max > ban           Banned（境界を越えた 1 回だけ通知、以降はウィンドウ終了まで拒否）
//! ```

use std::{net::IpAddr, sync::Arc};

use super::{
    policy::RateLimitContext,
    store::{Hit, QuotaError, QuotaStore},
};

/// クライアントの状態遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitEvent {
    Approaching(IpAddr),
    Exceeded(IpAddr),
    Banned(IpAddr),
}

/// 拒否の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Exceeded,
    Banned,
}

/// 1 リクエストに対する判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// `None` なら通す
    pub rejection: Option<Rejection>,
    /// このリクエストで発生した状態遷移
    pub event:     Option<RateLimitEvent>,
    pub hit:       Hit,
}

/// クライアント IP ごとのクォータを追跡する
pub struct QuotaTracker {
    store:     Arc<dyn QuotaStore>,
    max:       u64,
    ban:       Option<u64>,
    namespace: String,
}

impl QuotaTracker {
    pub fn new(
        store: Arc<dyn QuotaStore>,
        context: &RateLimitContext,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            max: context.max,
            ban: context.ban,
            namespace: namespace.into(),
        }
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// リクエストを 1 回数えて判定する
    ///
    /// ストアのエラーはそのまま返す。通すかどうかは呼び出し側が決める。
    pub async fn check(&self, ip: IpAddr) -> Result<Verdict, QuotaError> {
        let key = format!("{}{}", self.namespace, ip);
        let hit = self.store.hit(&key).await?;
        Ok(self.decide(ip, hit))
    }

    fn decide(&self, ip: IpAddr, hit: Hit) -> Verdict {
        let count = hit.count;

        if count <= self.max {
            let threshold = self.max - self.max / 10;
            let event = (count >= threshold).then_some(RateLimitEvent::Approaching(ip));
            return Verdict {
                rejection: None,
                event,
                hit,
            };
        }

        let over = count - self.max;
        if let Some(ban) = self.ban.filter(|ban| over > *ban) {
            let event = (over == ban + 1).then_some(RateLimitEvent::Banned(ip));
            return Verdict {
                rejection: Some(Rejection::Banned),
                event,
                hit,
            };
        }

        let event = (over == 1).then_some(RateLimitEvent::Exceeded(ip));
        Verdict {
            rejection: Some(Rejection::Exceeded),
            event,
            hit,
        }
    }

    /// ウィンドウ内の残り回数
    pub fn remaining(&self, hit: &Hit) -> u64 {
        self.max.saturating_sub(hit.count)
    }
}
