//! HTTP 전송 계층.
//!
//! 토큰 관리자와 요청 계층은 `HttpTransport`만 바라봅니다. 운영에서는
//! `ReqwestTransport`를, 테스트에서는 스크립트 기반 전송 계층을 주입합니다.

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;

/// JSON 요청 Content-Type.
pub const CONTENT_TYPE_JSON: &str = "application/json;charset=UTF-8";

/// HTTP 응답 스냅샷.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// 상태 코드
    pub status: u16,
    /// 응답 헤더 (이름은 소문자)
    pub headers: HashMap<String, String>,
    /// 응답 본문
    pub body: String,
}

impl HttpResponse {
    /// 상태 코드와 본문으로 응답 생성.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// 200 JSON 응답 생성.
    pub fn ok_json(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    /// 헤더 추가.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// 대소문자 구분 없이 헤더 조회.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 2xx 응답 여부.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// JSON POST 전송 추상화.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// JSON 본문으로 POST 요청을 보냅니다.
    ///
    /// 연결 실패/타임아웃만 에러이며, HTTP 에러 상태는 응답으로 반환합니다.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpResponse>;
}

/// reqwest 기반 전송 계층.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// 새 전송 계층 생성.
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// 기존 클라이언트 재사용.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let mut request = self.client.post(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        // 헤더를 먼저 지정했으므로 json()이 Content-Type을 덮어쓰지 않음
        let response = request.json(body).send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        trace!(url, status, "HTTP response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(429, "").with_header("Retry-After", "2");
        assert_eq!(response.header("retry-after"), Some("2"));
        assert_eq!(response.header("RETRY-AFTER"), Some("2"));
        assert!(!response.is_success());
    }
}
