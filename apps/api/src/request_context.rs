//! # リクエストコンテキスト
//!
//! エラー分類・ログ・レート制限で必要になる、リクエストの読み取り専用情報。

use std::{
    convert::Infallible,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{Extensions, Method, Request, Uri, request::Parts},
};

/// リクエストのメソッド・URL・クライアント IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    /// パスとクエリ文字列（例: `/orders?page=2`）
    pub url:    String,
    pub ip:     IpAddr,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, url: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ip,
        }
    }

    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::from_components(request.method(), request.uri(), request.extensions())
    }

    fn from_components(method: &Method, uri: &Uri, extensions: &Extensions) -> Self {
        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        Self::new(method.as_str(), url, client_ip(extensions))
    }
}

/// 接続元のソケットアドレスからクライアント IP を取り出す
///
/// `into_make_service_with_connect_info` を使わずに起動された場合（テストなど）は
/// 未指定アドレス `0.0.0.0` になる。プロキシヘッダーは信用しない。
fn client_ip(extensions: &Extensions) -> IpAddr {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_components(&parts.method, &parts.uri, &parts.extensions))
    }
}
