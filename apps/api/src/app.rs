//! # アプリケーション構築
//!
//! 設定からミドルウェアスタックを組み立て、サービス固有のルートを包む。
//! `main.rs` は設定の読み込みとサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use guarita_shared::{
    access_log::{AccessLog, HeaderScope},
    observability::{MakeRequestUuidV7, RequestSpan},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    config::{AppConfig, CorsOrigin, Environment},
    error::{handle_errors, panic_response},
    handler::{HealthState, health_check},
    log_record::LogRecord,
    rate_limit::{
        MemoryQuotaStore,
        QuotaStore,
        QuotaTracker,
        RateLimitPolicy,
        RateLimitState,
        rate_limit,
    },
};

/// プロセス内メモリのクォータストアでアプリケーションを構築する
pub fn build_app(config: &AppConfig, routes: Router) -> Router {
    let store = Arc::new(MemoryQuotaStore::new(
        config.rate_limit.window.duration(),
        config.rate_limit.cache,
    ));
    build_app_with_store(config, routes, store)
}

/// クォータストアを指定してアプリケーションを構築する
///
/// `routes` はサービス固有のルート。`/health` はここで追加する。
pub fn build_app_with_store(
    config: &AppConfig,
    routes: Router,
    store: Arc<dyn QuotaStore>,
) -> Router {
    let health_state = Arc::new(HealthState {
        version: config.version.clone(),
    });

    // panic 捕捉はエラーハンドラの内側に置き、panic も分類の対象にする
    let app = Router::new()
        .route("/health", get(health_check))
        .with_state(health_state)
        .merge(routes)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn(handle_errors));

    // 429 はエラーハンドラを通さずにここで返る
    let app = install_rate_limit(app, config, store);

    // レイヤーは下から上の順に実行される:
    // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
    // 2. TraceLayer: サービス情報と request_id を持つスパン、受信・完了のアクセスログ
    // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
    // 4. CorsLayer
    app.layer(cors_layer(&config.cors_origin))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(trace_layer(config))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

/// リクエストスパンとアクセスログを設定した `TraceLayer`
///
/// 開発環境ではすべてのヘッダーを、それ以外では `user-agent` と `host` だけを出力する。
fn trace_layer(
    config: &AppConfig,
) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, AccessLog, AccessLog> {
    let scope = match config.environment {
        Environment::Development => HeaderScope::All,
        Environment::Production | Environment::Test => HeaderScope::Essential,
    };
    let access_log = AccessLog::new(scope, config.logging.redact.clone());

    TraceLayer::new_for_http()
        .make_span_with(RequestSpan::new(
            &config.name,
            config.environment.as_str(),
            &config.version,
        ))
        .on_request(access_log.clone())
        .on_response(access_log)
}

/// 実行環境に応じてレート制限を組み込む
///
/// | 環境 | レート制限 | 起動ログ |
/// |------|------------|----------|
/// | production | 有効 | 出す |
/// | development | 無効 | 出す |
/// | test | 無効 | 出さない |
fn install_rate_limit(app: Router, config: &AppConfig, store: Arc<dyn QuotaStore>) -> Router {
    match config.environment {
        Environment::Production => {
            LogRecord::info(&config.rate_limit.info_message).emit();

            let context = config.rate_limit.context();
            let tracker = QuotaTracker::new(store, &context, &config.rate_limit.namespace);
            let state = RateLimitState::new(tracker, RateLimitPolicy::new(context));
            app.layer(from_fn_with_state(state, rate_limit))
        }
        Environment::Development => {
            LogRecord::info(&config.rate_limit.info_message).emit();
            app
        }
        Environment::Test => app,
    }
}

fn cors_layer(origin: &CorsOrigin) -> CorsLayer {
    let allow_origin = match origin {
        CorsOrigin::Any => AllowOrigin::any(),
        CorsOrigin::List(origins) => AllowOrigin::list(origins.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
