//! # 文言カタログ
//!
//! クライアントへ返すエラーメッセージとログメッセージを一箇所に集約する。
//!
//! 既存クライアントがこれらの文言に依存しているため、変更はワイヤ互換性の破壊になる。
//!
//! プレースホルダを含む文言は名前付き引数を取る関数として定義する。
//! 文字列置換と違い、引数名と文言がずれるとコンパイルエラーになる。

/// サーバー起動時の文言
pub mod server {
    /// 待ち受け開始ログ
    pub fn listening(address: impl std::fmt::Display) -> String {
        format!("Server listening at {address}")
    }
}

/// アクセスログの文言
pub mod access_log {
    pub const REQUEST_RECEIVED: &str = "incoming request";
    pub const REQUEST_COMPLETED: &str = "request completed";
}

/// 環境変数読み込みの文言
pub mod environment {
    /// 環境変数の検証に失敗したときの説明
    pub const VALIDATION_FAILED: &str = "One or more environment variables are missing or invalid.";
}

/// レート制限の文言
pub mod rate_limit {
    use std::net::IpAddr;

    /// 429 レスポンスの `error`
    pub const ERROR: &str = "Too Many Requests";
    /// 429 レスポンスの `codigo`
    pub const CODE: &str = "LIMIT_EXCEEDED";
    /// BAN 中のレスポンスの `error`
    pub const BANNED_ERROR: &str = "Access Blocked";
    /// BAN 中のレスポンスの `message`
    pub const BANNED_MESSAGE: &str =
        "Your access has been temporarily suspended due to excessive requests.";
    /// BAN 中のレスポンスの `codigo`
    pub const BANNED_CODE: &str = "ACCESS_BLOCKED";
    /// `RATE_LIMIT_INFO_MESSAGE` 未設定時の起動ログ
    pub const DEFAULT_INFO_MESSAGE: &str = "Rate limiting configured";
    /// クォータストアが使えずリクエストを通したときのログ
    pub const STORE_UNAVAILABLE: &str = "Rate limit store unavailable, request allowed";

    pub fn approaching_limit(ip: IpAddr) -> String {
        format!("Client {ip} is approaching the limit")
    }

    pub fn limit_exceeded(ip: IpAddr) -> String {
        format!("Client {ip} has exceeded the limit")
    }

    pub fn banned(ip: IpAddr) -> String {
        format!("Client {ip} has been banned due to excessive requests")
    }

    /// 拒否レスポンスを組み立てる直前のログ
    pub fn log_exceeded(ip: IpAddr, method: &str, url: &str) -> String {
        format!("Limit exceeded for {ip} - {method}:{url}")
    }

    /// 429 レスポンスの `message`
    pub fn message(max: u64, after: &str) -> String {
        format!("You have exceeded the limit of {max} requests per {after}. Please try again later.")
    }
}

/// グローバルエラーハンドラの文言
pub mod handle_error {
    /// リクエストのスキーマ検証エラー
    pub mod validation {
        pub const ERROR: &str = "Response Validation Error";
        pub const MESSAGE: &str = "The request does not match the expected schema";
        pub const LOG_MESSAGE: &str = "Request Validation Error";
    }

    /// レスポンスのシリアライズ（スキーマ不一致）エラー
    pub mod serialization {
        pub const ERROR: &str = "Internal Server Error";
        pub const MESSAGE: &str = "The response does not match the expected schema";
        pub const LOG_MESSAGE: &str = "Response Serialization Error";
    }

    /// 想定外のエラー
    pub mod unexpected {
        pub const ERROR: &str = "Internal Server Error";
        /// エラー自身のメッセージが空のときに使う
        pub const MESSAGE: &str = "An unexpected error occurred.";
        pub const LOG_MESSAGE: &str = "Unexpected Error";
    }

    /// エラー値ですらない何か（panic ペイロードなど）
    pub mod unknown {
        pub const ERROR: &str = "Internal Server Error";
        pub const MESSAGE: &str = "Erro inesperado sem detalhes disponíveis";
        pub const LOG_MESSAGE: &str = "Erro desconhecido capturado pelo handler global";
    }
}
