//! # スキーマ検証
//!
//! リクエスト（ボディ・クエリ文字列・パスパラメータ）とレスポンスボディを
//! `validator` で検証し、違反を [`Fault`] に変換する。
//!
//! - [`ValidatedJson`]: 受信ボディ。JSON として読めない場合も含めて [`ValidationFault`]
//! - [`ValidatedQuery`] / [`ValidatedPath`]: クエリ文字列とパスパラメータ。同じく [`ValidationFault`]
//! - [`ValidatedResponse`]: 送信ボディ。違反は [`SerializationFault`]（サーバー側の不具合）
//!
//! axum 標準の `Json` / `Query` / `Path` の拒否はプレーンテキストの 400 になり、
//! エラーハンドラを通らない。検証が必要な入力はこのモジュールの抽出器で受け取る。

use axum::{
    Json,
    extract::{
        FromRequest,
        FromRequestParts,
        Path,
        Query,
        Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use guarita_shared::ValidationIssue;
use serde::{Serialize, de::DeserializeOwned};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::{
    error::{Fault, SerializationFault, ValidationFault},
    request_context::RequestContext,
};

/// 構造体レベルのバリデーションエラーが格納されるキー
const STRUCT_LEVEL_KEY: &str = "__all__";

/// `ValidationErrors` を平坦な問題リストに変換する
///
/// パスは `items[0].sku` の形式。`validator` はフィールドをハッシュマップで保持するため、
/// 出力が毎回同じになるようフィールド名でソートする。同一フィールド内の順序は保つ。
pub fn collect_issues(errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    collect_into(errors, "", &mut issues);
    issues
}

fn collect_into(errors: &ValidationErrors, prefix: &str, issues: &mut Vec<ValidationIssue>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (field, kind) in fields {
        let field: &str = field.as_ref();
        let path = if field == STRUCT_LEVEL_KEY {
            prefix.to_string()
        } else if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.to_string());
                    issues.push(ValidationIssue::new(&path, error.code.to_string(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_into(nested, &path, issues),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_into(nested, &format!("{path}[{index}]"), issues);
                }
            }
        }
    }
}

/// JSON ボディの抽出失敗を検証エラーの問題に変換する
fn rejection_issue(rejection: &JsonRejection) -> ValidationIssue {
    let code = match rejection {
        JsonRejection::JsonDataError(_) => "invalid_type",
        JsonRejection::JsonSyntaxError(_) => "invalid_json",
        JsonRejection::MissingJsonContentType(_) => "invalid_content_type",
        _ => "invalid_body",
    };
    ValidationIssue::new("", code, rejection.body_text())
}

/// クエリ文字列の抽出失敗を検証エラーの問題に変換する
fn query_rejection_issue(rejection: &QueryRejection) -> ValidationIssue {
    let code = match rejection {
        QueryRejection::FailedToDeserializeQueryString(_) => "invalid_query",
        _ => "invalid_request",
    };
    ValidationIssue::new("", code, rejection.body_text())
}

/// パスパラメータの抽出失敗を検証エラーの問題に変換する
fn path_rejection_issue(rejection: &PathRejection) -> ValidationIssue {
    let code = match rejection {
        PathRejection::FailedToDeserializePathParams(_) => "invalid_params",
        PathRejection::MissingPathParams(_) => "missing_params",
        _ => "invalid_request",
    };
    ValidationIssue::new("", code, rejection.body_text())
}

fn validated<T: Validate>(value: T) -> Result<T, Fault> {
    value.validate().map_err(ValidationFault::from)?;
    Ok(value)
}

/// 検証済みの JSON ボディ
///
/// デシリアライズ後に [`Validate::validate`] を実行する。
/// 失敗時の拒否は [`Fault`] なので、エラーハンドラが 400 に変換する。
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Fault;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| ValidationFault::new(vec![rejection_issue(&rejection)]))?;

        validated(value).map(Self)
    }
}

/// 検証済みのクエリ文字列
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Fault;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationFault::new(vec![query_rejection_issue(&rejection)]))?;

        validated(value).map(Self)
    }
}

/// 検証済みのパスパラメータ
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = Fault;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationFault::new(vec![path_rejection_issue(&rejection)]))?;

        validated(value).map(Self)
    }
}

/// 送信前に検証されるレスポンスボディ
///
/// 不一致が見つかった時点ではハンドラの処理が終わっているため、
/// 生成時のメソッドと URL を保持しておき [`SerializationFault`] に載せる。
#[derive(Debug, Clone)]
pub struct ValidatedResponse<T> {
    method: String,
    url:    String,
    value:  T,
}

impl<T> ValidatedResponse<T> {
    pub fn new(ctx: &RequestContext, value: T) -> Self {
        Self {
            method: ctx.method.clone(),
            url: ctx.url.clone(),
            value,
        }
    }

    fn fault(self, issues: Vec<ValidationIssue>) -> Fault {
        Fault::Serialization(SerializationFault {
            issues,
            method: self.method,
            url: self.url,
        })
    }
}

impl<T> IntoResponse for ValidatedResponse<T>
where
    T: Serialize + Validate,
{
    fn into_response(self) -> Response {
        if let Err(errors) = self.value.validate() {
            let issues = collect_issues(&errors);
            return self.fault(issues).into_response();
        }

        match serde_json::to_vec(&self.value) {
            Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
            Err(e) => {
                let issue = ValidationIssue::new("", "serialize", e.to_string());
                self.fault(vec![issue]).into_response()
            }
        }
    }
}
