//! # クォータストア
//!
//! キーごとのリクエスト数を固定ウィンドウで数える。
//!
//! トレイトで抽象化しているので、複数インスタンス構成では共有ストアの実装に差し替えられる。
//! 付属の実装はプロセス内メモリの [`MemoryQuotaStore`] のみ。

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use thiserror::Error;

/// 1 回のカウント結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// 現在のウィンドウ内で何回目のリクエストか（1 始まり）
    pub count:       u64,
    /// ウィンドウがリセットされるまでの残り時間
    pub reset_after: Duration,
}

/// クォータストアのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaError {
    #[error("quota store is unavailable: {0}")]
    Unavailable(String),
}

/// クォータストアトレイト
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// キーのカウントを 1 増やし、増やした後の値を返す
    async fn hit(&self, key: &str) -> Result<Hit, QuotaError>;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count:        u64,
    window_start: Instant,
}

/// プロセス内メモリのクォータストア
///
/// 追跡するキー数は `capacity` が上限。溢れそうになったら期限切れのエントリを捨て、
/// それでも足りなければウィンドウ開始が最も古いものから捨てる。
pub struct MemoryQuotaStore {
    entries:  Mutex<HashMap<String, Entry>>,
    window:   Duration,
    capacity: usize,
}

impl MemoryQuotaStore {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window,
            capacity: capacity.max(1),
        }
    }

    /// 時刻を指定してカウントする（テストで時間を進めるため）
    pub fn hit_at(&self, key: &str, now: Instant) -> Result<Hit, QuotaError> {
        // ロック中に await しないこと
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QuotaError::Unavailable(e.to_string()))?;

        if !entries.contains_key(key) && entries.len() >= self.capacity {
            self.prune(&mut entries, now);
        }

        let entry = entries.entry(key.to_string()).or_insert(Entry {
            count:        0,
            window_start: now,
        });

        if now.saturating_duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.saturating_duration_since(entry.window_start);
        Ok(Hit {
            count:       entry.count,
            reset_after: self.window.saturating_sub(elapsed),
        })
    }

    /// 現在追跡しているキーの数
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    fn prune(&self, entries: &mut HashMap<String, Entry>, now: Instant) {
        entries.retain(|_, entry| now.saturating_duration_since(entry.window_start) < self.window);

        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.window_start)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn hit(&self, key: &str) -> Result<Hit, QuotaError> {
        self.hit_at(key, Instant::now())
    }
}
