//! # Observability 基盤
//!
//! トレーシング初期化、ログ出力形式の切り替え、リクエスト単位のスパンと
//! Request ID 生成を提供する。

use http::{HeaderValue, Request};
use tower_http::{
    request_id::{MakeRequestId, RequestId},
    trace::MakeSpan,
};
use tracing::Span;
use uuid::Uuid;

/// Request ID を運ぶヘッダー名
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ログ出力形式
///
/// 環境変数 `LOG_FORMAT` で切り替える。
/// 値が未設定または不正な場合は [`Pretty`](LogFormat::Pretty) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 形式（本番環境向け）
    Json,
    /// 人間が読みやすい形式（開発環境向け）
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする
    ///
    /// 不正な値の場合は [`Pretty`](LogFormat::Pretty) にフォールバックし、
    /// stderr に警告を出力する（この時点ではまだ subscriber が無い）。
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown LOG_FORMAT={other:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub log_format:        LogFormat,
    /// `RUST_LOG` 未設定時に使う `EnvFilter` ディレクティブ（例: `"info"`）
    pub default_directive: String,
}

impl TracingConfig {
    pub fn new(log_format: LogFormat, default_directive: impl Into<String>) -> Self {
        Self {
            log_format,
            default_directive: default_directive.into(),
        }
    }
}

/// トレーシングを初期化する
///
/// `RUST_LOG` 環境変数が設定されていればそれを優先し、
/// 未設定の場合は [`TracingConfig::default_directive`] を使う。
///
/// JSON モードでは `timestamp`, `level`, `target`, `message` がトップレベルに出力される。
/// サービス名などの共通フィールドは、起動処理では `app` スパン、
/// リクエスト処理では [`RequestSpan`] が付与する。
pub fn init_tracing(config: TracingConfig) {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// UUID v7 の Request ID を生成する
///
/// `SetRequestIdLayer` に渡す。クライアントが `x-request-id` を送ってきた場合は
/// レイヤー側がその値を優先するため、ここは呼ばれない。
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// リクエスト単位のスパンを作成する
///
/// `TraceLayer::make_span_with` に渡す。スパン内のすべてのログに
/// `service`, `env`, `version` と `method`, `uri`, `request_id` が付与される。
///
/// 接続ごとのタスクは起動時の `app` スパンを引き継がないため、
/// サービスの識別情報もここで付け直す。
#[derive(Debug, Clone)]
pub struct RequestSpan {
    service: String,
    env:     String,
    version: String,
}

impl RequestSpan {
    pub fn new(
        service: impl Into<String>,
        env: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            env:     env.into(),
            version: version.into(),
        }
    }
}

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            service = %self.service,
            env = %self.env,
            version = %self.version,
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_jsonでjsonを返す() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
    }

    #[test]
    fn test_parse_不正な値でprettyにフォールバックする() {
        assert_eq!(LogFormat::parse("unknown"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Pretty);
    }

    #[test]
    fn test_make_request_idがuuid_v7を返す() {
        let request = Request::new(());
        let id = MakeRequestUuidV7.make_request_id(&request).unwrap();

        let uuid = Uuid::parse_str(id.header_value().to_str().unwrap()).unwrap();
        assert_eq!(uuid.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn test_request_spanはサービスの識別情報を持つ() {
        let subscriber = tracing_subscriber::registry();
        let _guard = tracing::subscriber::set_default(subscriber);
        let request = Request::builder()
            .uri("/orders?page=2")
            .header(REQUEST_ID_HEADER, "req-1")
            .body(())
            .unwrap();

        let span = RequestSpan::new("orders", "production", "1.2.3").make_span(&request);

        let metadata = span.metadata().unwrap();
        assert_eq!(metadata.name(), "request");
        for field in ["service", "env", "version", "method", "uri", "request_id"] {
            assert!(metadata.fields().field(field).is_some(), "{field}");
        }
    }
}
