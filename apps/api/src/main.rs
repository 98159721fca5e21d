//! # Guarita サーバー
//!
//! 以下の順序で初期化を行う:
//!
//! 1. 環境変数の読み込み（.env ファイル）
//! 2. アプリケーション設定の検証（失敗したら終了コード 1）
//! 3. トレーシングの初期化（`test` 環境では行わない）
//! 4. ルーターの構築
//! 5. HTTP サーバーの起動
//!
//! ```bash
//! APP_NAME=orders APP_ENV=development CORS_ORIGIN='*' \
//! RATE_LIMIT_MAX=100 RATE_LIMIT_WINDOW='1 minute' cargo run
//! ```

use std::{net::SocketAddr, process::ExitCode};

use anyhow::Context as _;
use axum::Router;
use guarita_api::{
    app::build_app,
    config::{AppConfig, Environment, load_dotenv},
};
use guarita_shared::{
    observability::{TracingConfig, init_tracing},
    texts,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    load_dotenv();

    // subscriber が無い段階なので stderr に直接書く
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", texts::environment::VALIDATION_FAILED);
            for issue in &e.issues {
                eprintln!("  - {issue}");
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    if config.environment != Environment::Test {
        init_tracing(TracingConfig::new(
            config.logging.format,
            config.logging.level.directive(),
        ));
    }
    let _tracing_guard = tracing::info_span!(
        "app",
        service = %config.name,
        env = config.environment.as_str(),
        version = %config.version,
    )
    .entered();

    let app = build_app(&config, Router::new());

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let addr = listener.local_addr()?;
    tracing::info!("{}", texts::server::listening(format!("http://{addr}")));

    // クライアント IP をレート制限とエラーログで使うため、接続情報を付与する
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install the shutdown signal handler");
        std::future::pending::<()>().await;
    }
}
