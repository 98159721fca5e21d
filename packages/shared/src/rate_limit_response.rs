//! # レート制限レスポンス
//!
//! クォータ超過時に返す JSON ボディ。
//!
//! `codigo` と `tempoEspera` は標準外のフィールドだが、既存クライアントとの
//! 後方互換のためこの綴りのまま出力する。

use serde::{Deserialize, Serialize};

use crate::texts::rate_limit;

/// レート制限レスポンスボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResponse {
    #[serde(rename = "statusCode")]
    pub status_code:  u16,
    pub error:        String,
    pub message:      String,
    /// 機械可読なコード
    pub codigo:       String,
    /// 待機時間（設定されたウィンドウ文字列そのもの）
    #[serde(rename = "tempoEspera")]
    pub tempo_espera: String,
}

impl RateLimitResponse {
    /// 上限超過
    pub fn exceeded(max: u64, after: &str) -> Self {
        Self {
            status_code:  429,
            error:        rate_limit::ERROR.to_string(),
            message:      rate_limit::message(max, after),
            codigo:       rate_limit::CODE.to_string(),
            tempo_espera: after.to_string(),
        }
    }

    /// BAN 中
    ///
    /// ステータスは超過時と同じ 429 を維持し、文言とコードだけを変える。
    pub fn banned(after: &str) -> Self {
        Self {
            status_code:  429,
            error:        rate_limit::BANNED_ERROR.to_string(),
            message:      rate_limit::BANNED_MESSAGE.to_string(),
            codigo:       rate_limit::BANNED_CODE.to_string(),
            tempo_espera: after.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_exceededのボディが契約どおり() {
        let body = serde_json::to_value(RateLimitResponse::exceeded(100, "1 minute")).unwrap();

        assert_eq!(
            body,
            json!({
                "statusCode": 429,
                "error": "Too Many Requests",
                "message": "You have exceeded the limit of 100 requests per 1 minute. Please try again later.",
                "codigo": "LIMIT_EXCEEDED",
                "tempoEspera": "1 minute"
            })
        );
    }

    #[test]
    fn test_exceededのフィールド順序() {
        let body = serde_json::to_string(&RateLimitResponse::exceeded(5, "10 seconds")).unwrap();

        assert!(body.starts_with(r#"{"statusCode":429,"error":"Too Many Requests","message":"#));
        assert!(body.ends_with(r#""codigo":"LIMIT_EXCEEDED","tempoEspera":"10 seconds"}"#));
    }

    #[test]
    fn test_bannedは429のまま専用コードを返す() {
        let body = serde_json::to_value(RateLimitResponse::banned("1 hour")).unwrap();

        assert_eq!(
            body,
            json!({
                "statusCode": 429,
                "error": "Access Blocked",
                "message": "Your access has been temporarily suspended due to excessive requests.",
                "codigo": "ACCESS_BLOCKED",
                "tempoEspera": "1 hour"
            })
        );
    }
}
