//! # ログレコード
//!
//! エラー分類やレート制限ポリシーは、ログを直接出力せずに [`LogRecord`] を返す。
//! 呼び出し側（ミドルウェア）が [`LogRecord::emit`] で `tracing` に流す。
//!
//! これによりポリシー自体はグローバルな subscriber に依存せず、
//! 単体テストでは返り値の比較だけで「何をどのレベルで出すか」を検証できる。

/// ログの重大度
///
/// このサービスが出し分けるのは 3 段階のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// 1 回分のログ出力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message:  String,
    pub method:   Option<String>,
    pub url:      Option<String>,
    /// 元のエラーの内容（ログ専用、クライアントには返さない）
    pub error:    Option<String>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            method: None,
            url: None,
            error: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// メソッドと URL を構造化フィールドとして付与する
    pub fn with_request(mut self, method: impl Into<String>, url: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.url = Some(url.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// `tracing` に出力する
    pub fn emit(&self) {
        let method = self.method.as_deref();
        let url = self.url.as_deref();
        let error = self.error.as_deref();

        match self.severity {
            Severity::Info => tracing::info!(method, url, error, "{}", self.message),
            Severity::Warn => tracing::warn!(method, url, error, "{}", self.message),
            Severity::Error => tracing::error!(method, url, error, "{}", self.message),
        };
    }
}
