//! # アプリケーション設定
//!
//! 環境変数からアプリケーション設定を読み込み、起動前にすべて検証する。
//!
//! ## 設計方針
//!
//! [12-Factor App](https://12factor.net/ja/config) の原則に従い、
//! すべての設定を環境変数から読み込む。必須の値が欠けている、または不正な場合は
//! サーバーを起動しない。問題は最初の 1 件で止めず、すべてまとめて報告する。
//!
//! ## 環境変数一覧
//!
//! | 変数名 | 必須 | デフォルト | 説明 |
//! |--------|------|------------|------|
//! | `HOST` | No | `127.0.0.1` | バインドアドレス |
//! | `PORT` | No | `8080` | ポート番号 |
//! | `APP_NAME` | **Yes** | - | サービス名（ログの `service` フィールド） |
//! | `APP_VERSION` | No | クレートのバージョン | バージョン（ログの `version` フィールド） |
//! | `APP_ENV` | **Yes** | - | `development` / `production` / `test`（未設定なら `NODE_ENV` を読む） |
//! | `CORS_ORIGIN` | **Yes** | - | `*` またはカンマ区切りのオリジン |
//! | `LOG_LEVEL` | No | `info` | `fatal` / `error` / `warn` / `info` / `debug` / `trace` |
//! | `LOG_FORMAT` | No | `pretty` | `json` / `pretty` |
//! | `LOG_REDACT_PATHS` | No | `req.headers.authorization,req.headers.cookie,req.headers["x-api-key"],*.password` | アクセスログで値を伏せるヘッダー（カンマ区切り） |
//! | `RATE_LIMIT_MAX` | **Yes** | - | ウィンドウ内の最大リクエスト数 |
//! | `RATE_LIMIT_WINDOW` | **Yes** | - | ウィンドウ（例: `1 minute`, `30s`, `60000`） |
//! | `RATE_LIMIT_BAN` | No | 無効 | 超過回数がこれを上回ると BAN。負の値で無効 |
//! | `RATE_LIMIT_CACHE` | No | `5000` | 追跡するクライアント数の上限 |
//! | `RATE_LIMIT_NAMESPACE` | No | `guarita-ratelimit-` | ストアのキー接頭辞 |
//! | `RATE_LIMIT_INFO_MESSAGE` | No | `Rate limiting configured` | 起動時のログ |
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use guarita_api::config::{AppConfig, load_dotenv};
//!
//! load_dotenv();
//! let config = AppConfig::from_env()?;
//!
//! println!("サーバー: {}:{}", config.server.host, config.server.port);
//! ```

use std::{cell::RefCell, env, fmt::Display, str::FromStr};

use axum::http::HeaderValue;
use guarita_shared::{access_log::Redaction, observability::LogFormat, texts::rate_limit};
use thiserror::Error;

use crate::rate_limit::{RateLimitContext, TimeWindow};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RATE_LIMIT_CACHE: usize = 5000;
const DEFAULT_RATE_LIMIT_NAMESPACE: &str = "guarita-ratelimit-";

/// `APP_ENV` が未設定のときに読む変数
const LEGACY_ENV_KEY: &str = "NODE_ENV";

/// 1 つの環境変数についての問題
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key:    &'static str,
        value:  String,
        reason: String,
    },
}

impl ConfigIssue {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Missing(key) | Self::Invalid { key, .. } => key,
        }
    }
}

/// 設定の読み込みエラー
///
/// 見つかった問題を環境変数の読み込み順にすべて保持する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

/// 実行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err("expected one of development, production, test".to_string()),
        }
    }
}

/// ログレベル
///
/// `fatal` は `tracing` に対応するレベルが無いため `error` として扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `EnvFilter` のディレクティブ
    pub fn directive(self) -> &'static str {
        match self {
            Self::Fatal | Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fatal" => Ok(Self::Fatal),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err("expected one of fatal, error, warn, info, debug, trace".to_string()),
        }
    }
}

/// CORS で許可するオリジン
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigin {
    /// `*`
    Any,
    List(Vec<HeaderValue>),
}

impl FromStr for CorsOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "*" {
            return Ok(Self::Any);
        }

        let origins = s
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| format!("{origin:?} is not a valid origin"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if origins.is_empty() {
            return Err("expected `*` or a comma separated list of origins".to_string());
        }
        Ok(Self::List(origins))
    }
}

/// HTTP サーバー設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// バインドアドレス（例: `0.0.0.0`, `127.0.0.1`）
    pub host: String,
    pub port: u16,
}

/// ログ設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level:  LogLevel,
    pub format: LogFormat,
    /// アクセスログで値を伏せるヘッダー
    pub redact: Redaction,
}

/// レート制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max:          u64,
    pub window:       TimeWindow,
    /// `None` なら BAN しない
    pub ban:          Option<u64>,
    /// 追跡するクライアント数の上限
    pub cache:        usize,
    pub namespace:    String,
    pub info_message: String,
}

impl RateLimitConfig {
    pub fn context(&self) -> RateLimitContext {
        RateLimitContext {
            max:   self.max,
            after: self.window.label().to_string(),
            ban:   self.ban,
        }
    }
}

/// アプリケーション全体の設定
///
/// 起動時に一度だけ構築し、各コンポーネントに渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub name:        String,
    pub version:     String,
    pub environment: Environment,
    pub server:      ServerConfig,
    pub cors_origin: CorsOrigin,
    pub logging:     LoggingConfig,
    pub rate_limit:  RateLimitConfig,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// テストではプロセスの環境変数を汚さないよう、こちらに `HashMap` を渡す。
    /// 空文字は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars::new(lookup);

        let name = vars.required("APP_NAME");
        let version = vars
            .optional("APP_VERSION")
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        let environment_key = vars.first_present(&["APP_ENV", LEGACY_ENV_KEY]);
        let environment = vars.parse_required(environment_key);

        let server = ServerConfig {
            host: vars
                .optional("HOST")
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: vars.parse_or("PORT", DEFAULT_PORT),
        };
        let cors_origin = vars.parse_required("CORS_ORIGIN");

        let logging = LoggingConfig {
            level:  vars.parse_or("LOG_LEVEL", LogLevel::default()),
            format: vars
                .optional("LOG_FORMAT")
                .map(|format| LogFormat::parse(&format))
                .unwrap_or_default(),
            redact: vars.parse_or("LOG_REDACT_PATHS", Redaction::default()),
        };

        let max = vars.ensure(
            "RATE_LIMIT_MAX",
            vars.parse_required::<u64>("RATE_LIMIT_MAX"),
            |max| *max > 0,
            "must be at least 1",
        );
        let window = vars.parse_required("RATE_LIMIT_WINDOW");
        let ban: i64 = vars.parse_or("RATE_LIMIT_BAN", -1);
        let cache = vars
            .ensure(
                "RATE_LIMIT_CACHE",
                Some(vars.parse_or("RATE_LIMIT_CACHE", DEFAULT_RATE_LIMIT_CACHE)),
                |cache| *cache > 0,
                "must be at least 1",
            )
            .unwrap_or(DEFAULT_RATE_LIMIT_CACHE);
        let namespace = vars
            .optional("RATE_LIMIT_NAMESPACE")
            .unwrap_or_else(|| DEFAULT_RATE_LIMIT_NAMESPACE.to_string());
        let info_message = vars
            .optional("RATE_LIMIT_INFO_MESSAGE")
            .unwrap_or_else(|| rate_limit::DEFAULT_INFO_MESSAGE.to_string());

        let (Some(name), Some(environment), Some(cors_origin), Some(max), Some(window)) =
            (name, environment, cors_origin, max, window)
        else {
            return Err(vars.into_error());
        };
        vars.finish()?;

        Ok(Self {
            name,
            version,
            environment,
            server,
            cors_origin,
            logging,
            rate_limit: RateLimitConfig {
                max,
                window,
                ban: u64::try_from(ban).ok(),
                cache,
                namespace,
                info_message,
            },
        })
    }
}

/// `.env` ファイルを読み込む
///
/// `APP_ENV`（未設定なら `NODE_ENV`）が `test` のときは `.env.test` を先に読む。
/// 既に設定済みの変数は上書きしないので、先に読んだファイルが優先される。
/// ファイルが無くてもエラーにしない。
pub fn load_dotenv() {
    let environment = env::var("APP_ENV").or_else(|_| env::var(LEGACY_ENV_KEY));
    if environment.as_deref() == Ok("test") {
        dotenvy::from_filename(".env.test").ok();
    }
    dotenvy::dotenv().ok();
}

/// 環境変数の参照と、見つかった問題の蓄積
struct Vars<F> {
    lookup: F,
    issues: RefCell<Vec<ConfigIssue>>,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            issues: RefCell::new(Vec::new()),
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// 値が設定されている最初のキー。どれも無ければ先頭のキー
    fn first_present(&self, keys: &[&'static str]) -> &'static str {
        keys.iter()
            .copied()
            .find(|key| self.optional(key).is_some())
            .unwrap_or(keys[0])
    }

    fn required(&self, key: &'static str) -> Option<String> {
        let value = self.optional(key);
        if value.is_none() {
            self.report(ConfigIssue::Missing(key));
        }
        value
    }

    fn parse_value<T>(&self, key: &'static str, value: String) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.reject(key, value, e);
                None
            }
        }
    }

    fn parse_required<T>(&self, key: &'static str) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.required(key)?;
        self.parse_value(key, value)
    }

    /// 未設定ならデフォルト値。不正な値は問題として記録し、デフォルト値で続ける
    fn parse_or<T>(&self, key: &'static str, default: T) -> T
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(key) {
            Some(value) => self.parse_value(key, value).unwrap_or(default),
            None => default,
        }
    }

    /// パース済みの値に追加の条件を課す
    fn ensure<T>(
        &self,
        key: &'static str,
        value: Option<T>,
        valid: impl Fn(&T) -> bool,
        reason: &str,
    ) -> Option<T> {
        let value = value?;
        if valid(&value) {
            return Some(value);
        }
        self.reject(key, self.optional(key).unwrap_or_default(), reason);
        None
    }

    fn reject(&self, key: &'static str, value: String, reason: impl Display) {
        self.report(ConfigIssue::Invalid {
            key,
            value,
            reason: reason.to_string(),
        });
    }

    fn report(&self, issue: ConfigIssue) {
        self.issues.borrow_mut().push(issue);
    }

    fn into_error(self) -> ConfigError {
        ConfigError {
            issues: self.issues.into_inner(),
        }
    }

    fn finish(self) -> Result<(), ConfigError> {
        let error = self.into_error();
        if error.issues.is_empty() {
            Ok(())
        } else {
            Err(error)
        }
    }
}
