//! # アクセスログ
//!
//! `TraceLayer` の `on_request` / `on_response` に渡し、リクエストの受信と完了を
//! INFO レベルで 1 行ずつ出力する。
//!
//! ## 出力するヘッダー
//!
//! | 範囲 | ヘッダー |
//! |------|----------|
//! | [`HeaderScope::All`] | すべて（開発環境向け） |
//! | [`HeaderScope::Essential`] | `user-agent` と `host` のみ |
//!
//! どちらの範囲でも、[`Redaction`] に含まれるヘッダーは値を [`REDACTED`] に置き換える。

use std::{
    collections::{BTreeMap, btree_map::Entry},
    convert::Infallible,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use http::{HeaderMap, Request, Response};
use tower_http::trace::{OnRequest, OnResponse};
use tracing::Span;

use crate::texts::access_log;

/// 伏せたヘッダーの代わりに出力する値
pub const REDACTED: &str = "**REDACTED**";

/// `LOG_REDACT_PATHS` 未設定時に伏せるパス
pub const DEFAULT_REDACT_PATHS: [&str; 4] = [
    "req.headers.authorization",
    "req.headers.cookie",
    r#"req.headers["x-api-key"]"#,
    "*.password",
];

const ESSENTIAL_HEADERS: [&str; 2] = ["user-agent", "host"];

/// ログに出すヘッダーの範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScope {
    All,
    Essential,
}

impl HeaderScope {
    fn includes(self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Essential => ESSENTIAL_HEADERS.contains(&name),
        }
    }
}

/// 値を伏せるヘッダー名の集合
///
/// カンマ区切りのパスから組み立てる。受け付ける形式:
///
/// - `req.headers.authorization`
/// - `req.headers["x-api-key"]`（`'` も可）
/// - `*.password`（任意のヘッダー名 `password`）
///
/// アクセスログはヘッダー以外の値を出さないため、それ以外のパスは無視する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    headers: Vec<String>,
}

impl Redaction {
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut headers: Vec<String> = paths.into_iter().filter_map(header_name).collect();
        headers.sort();
        headers.dedup();
        Self { headers }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|header| header.eq_ignore_ascii_case(name))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Default for Redaction {
    fn default() -> Self {
        Self::from_paths(DEFAULT_REDACT_PATHS)
    }
}

impl FromStr for Redaction {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_paths(
            s.split(',').map(str::trim).filter(|path| !path.is_empty()),
        ))
    }
}

fn header_name(path: &str) -> Option<String> {
    let name = if let Some(rest) = path.strip_prefix("req.headers") {
        rest.strip_prefix('.')
            .or_else(|| bracketed(rest, '"'))
            .or_else(|| bracketed(rest, '\''))?
    } else {
        path.strip_prefix("*.")?
    };

    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

fn bracketed(rest: &str, quote: char) -> Option<&str> {
    rest.strip_prefix('[')?
        .strip_prefix(quote)?
        .strip_suffix(']')?
        .strip_suffix(quote)
}

/// ログに出すヘッダーを選び、必要なものを伏せる
///
/// 同名のヘッダーが複数ある場合は `, ` で連結する。名前順に並ぶ。
pub fn loggable_headers(
    headers: &HeaderMap,
    scope: HeaderScope,
    redaction: &Redaction,
) -> BTreeMap<String, String> {
    let mut selected = BTreeMap::new();

    for (name, value) in headers {
        let name = name.as_str();
        if !scope.includes(name) {
            continue;
        }

        let value = if redaction.contains(name) {
            REDACTED.to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };

        match selected.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let joined: &mut String = entry.get_mut();
                joined.push_str(", ");
                joined.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }

    selected
}

/// 受信と完了のアクセスログ
///
/// ```rust,ignore
/// let access_log = AccessLog::new(HeaderScope::Essential, Redaction::default());
/// TraceLayer::new_for_http()
///     .on_request(access_log.clone())
///     .on_response(access_log)
/// ```
#[derive(Debug, Clone)]
pub struct AccessLog {
    scope:     HeaderScope,
    redaction: Arc<Redaction>,
}

impl AccessLog {
    pub fn new(scope: HeaderScope, redaction: Redaction) -> Self {
        Self {
            scope,
            redaction: Arc::new(redaction),
        }
    }
}

impl<B> OnRequest<B> for AccessLog {
    fn on_request(&mut self, request: &Request<B>, _span: &Span) {
        let headers = loggable_headers(request.headers(), self.scope, &self.redaction);

        tracing::info!(
            http.method = %request.method(),
            http.url = %request.uri(),
            http.headers = ?headers,
            "{}",
            access_log::REQUEST_RECEIVED
        );
    }
}

impl<B> OnResponse<B> for AccessLog {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            http.status_code = response.status().as_u16(),
            http.latency_ms = latency_ms,
            "{}",
            access_log::REQUEST_COMPLETED
        );
    }
}
