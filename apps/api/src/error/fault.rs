//! # Fault（リクエスト処理中に発生したエラー）

use std::{any::Any, sync::Arc};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use guarita_shared::ValidationIssue;
use thiserror::Error;
use validator::ValidationErrors;

use crate::schema::collect_issues;

/// 受信リクエストがスキーマに合わない
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request does not match the expected schema ({} issue(s))", .issues.len())]
pub struct ValidationFault {
    /// 検出順の問題リスト
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFault {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

impl From<ValidationErrors> for ValidationFault {
    fn from(errors: ValidationErrors) -> Self {
        Self::new(collect_issues(&errors))
    }
}

/// 送信しようとしたレスポンスが宣言したスキーマに合わない
///
/// クライアントではなくサーバー側の実装ミス。ハンドラ完了後に発生するため、
/// メソッドと URL は発生時点のものをエラー自身が保持する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response to {method} {url} does not match the expected schema")]
pub struct SerializationFault {
    pub issues: Vec<ValidationIssue>,
    pub method: String,
    pub url:    String,
}

/// 上記以外の、メッセージを持つエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericFault {
    /// クライアントに返してよいメッセージ（最上位の `Display`）
    pub message: String,
    /// エラーチェーン全体（ログ専用）
    pub detail:  String,
}

/// リクエスト処理中に発生したエラー
///
/// バリアントの並びが分類の優先順位を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Validation(ValidationFault),
    Serialization(SerializationFault),
    Generic(GenericFault),
    /// エラー値ですらないもの。内容はログにのみ使う
    Unknown { description: String },
}

/// [`Fault`] の種類タグ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Validation,
    Serialization,
    Generic,
    Unknown,
}

impl Fault {
    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::Validation(_) => FaultKind::Validation,
            Fault::Serialization(_) => FaultKind::Serialization,
            Fault::Generic(_) => FaultKind::Generic,
            Fault::Unknown { .. } => FaultKind::Unknown,
        }
    }

    /// 任意のエラーを分類する
    ///
    /// 判定順は固定: スキーマ検証 → レスポンス不一致 → 一般エラー。
    /// コンテキストで包まれていても中身の型で判定する。
    pub fn from_error(error: anyhow::Error) -> Self {
        let error = match error.downcast::<ValidationFault>() {
            Ok(fault) => return Fault::Validation(fault),
            Err(error) => error,
        };
        let error = match error.downcast::<SerializationFault>() {
            Ok(fault) => return Fault::Serialization(fault),
            Err(error) => error,
        };

        Fault::Generic(GenericFault {
            message: error.to_string(),
            detail:  format!("{error:#}"),
        })
    }

    /// panic のペイロードを正体不明のエラーとして扱う
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let description = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "panic with a non-string payload".to_string()
        };

        Fault::Unknown { description }
    }
}

impl From<ValidationFault> for Fault {
    fn from(fault: ValidationFault) -> Self {
        Fault::Validation(fault)
    }
}

impl From<SerializationFault> for Fault {
    fn from(fault: SerializationFault) -> Self {
        Fault::Serialization(fault)
    }
}

impl From<anyhow::Error> for Fault {
    fn from(error: anyhow::Error) -> Self {
        Fault::from_error(error)
    }
}

/// レスポンスの拡張領域に格納される Fault
///
/// [`handle_errors`](super::handle_errors) がこれを取り出して最終レスポンスに差し替える。
#[derive(Debug, Clone)]
pub struct RaisedFault(pub Arc<Fault>);

impl IntoResponse for Fault {
    /// 仮の 500 レスポンスに Fault を載せる
    ///
    /// ボディはエラーハンドラが組み立てる。ハンドラが外れている構成では素の 500 になる。
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(RaisedFault(Arc::new(self)));
        response
    }
}
